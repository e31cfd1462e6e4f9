pub mod prism;
pub mod stress;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How each stress-majorization sweep moves the nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolvingMethod {
    /// Solve the majorization system per axis with plain conjugate gradient.
    ConjugateGradient,
    /// Solve the majorization system per axis with Jacobi-preconditioned conjugate gradient.
    #[default]
    PreconditionedConjugateGradient,
    /// Move every node to the weighted average of its voters' proposals.
    Localized,
}

impl SolvingMethod {
    pub fn is_conjugate_gradient(self) -> bool {
        !matches!(self, SolvingMethod::Localized)
    }
}

/// Order of node updates in a localized sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdateMethod {
    /// Gauss-Seidel: later nodes in a sweep see the moves of earlier ones.
    Sequential,
    /// Jacobi: every node is computed from the positions at the start of the sweep.
    #[default]
    Parallel,
}

/// Iteration budget of each conjugate-gradient solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MaxIterationMethod {
    /// `max_solver_iterations`.
    FixedMax,
    /// The number of nodes.
    LinearInProblemSize,
    /// `ceil(sqrt(number of nodes))`.
    #[default]
    SqrtOfProblemSize,
}

impl MaxIterationMethod {
    pub fn iterations(self, problem_size: usize, fixed_max: usize) -> usize {
        let n = match self {
            MaxIterationMethod::FixedMax => fixed_max,
            MaxIterationMethod::LinearInProblemSize => problem_size,
            MaxIterationMethod::SqrtOfProblemSize => (problem_size as f64).sqrt().ceil() as usize,
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StressMajorizationSettings {
    pub solving_method: SolvingMethod,
    pub update_method: UpdateMethod,
    /// Sweep cap, honored when `cancel_on_stress_max_iteration` is set.
    pub max_stress_iterations: usize,
    /// Stop once the normalized stress change of a sweep drops below this value.
    pub stress_change_tolerance: f64,
    /// Relative residual at which each conjugate-gradient solve stops.
    pub residual_tolerance: f64,
    pub cancel_on_stress_convergence: bool,
    pub cancel_on_stress_max_iteration: bool,
    /// Stop after the first conjugate-gradient sweep.
    pub cancel_after_first_conjugate: bool,
    /// Solver budget for [`MaxIterationMethod::FixedMax`].
    pub max_solver_iterations: usize,
    pub max_solver_iterations_policy: MaxIterationMethod,
}

impl Default for StressMajorizationSettings {
    fn default() -> Self {
        Self {
            solving_method: SolvingMethod::default(),
            update_method: UpdateMethod::default(),
            max_stress_iterations: 1000,
            stress_change_tolerance: 1e-3,
            residual_tolerance: 0.1,
            cancel_on_stress_convergence: true,
            cancel_on_stress_max_iteration: true,
            cancel_after_first_conjugate: true,
            max_solver_iterations: 100,
            max_solver_iterations_policy: MaxIterationMethod::default(),
        }
    }
}

impl StressMajorizationSettings {
    pub fn validate(&self) -> Result<()> {
        if self.cancel_on_stress_max_iteration && self.max_stress_iterations == 0 {
            return Err(invalid(
                "maxStressIterations",
                self.max_stress_iterations,
                "at least 1 when cancelOnStressMaxIteration is set",
            ));
        }
        let cg_once =
            self.solving_method.is_conjugate_gradient() && self.cancel_after_first_conjugate;
        if !(cg_once || self.cancel_on_stress_convergence || self.cancel_on_stress_max_iteration) {
            return Err(invalid(
                "cancelOnStressConvergence",
                self.cancel_on_stress_convergence,
                "a sweep stopping rule; enable convergence, the sweep cap, or first-conjugate exit",
            ));
        }
        if !(self.stress_change_tolerance.is_finite() && self.stress_change_tolerance >= 0.0) {
            return Err(invalid(
                "stressChangeTolerance",
                self.stress_change_tolerance,
                "a finite, non-negative number",
            ));
        }
        if !(self.residual_tolerance.is_finite() && self.residual_tolerance > 0.0) {
            return Err(invalid(
                "residualTolerance",
                self.residual_tolerance,
                "a finite, positive number",
            ));
        }
        if self.max_solver_iterations_policy == MaxIterationMethod::FixedMax
            && self.max_solver_iterations == 0
        {
            return Err(invalid(
                "maxSolverIterations",
                self.max_solver_iterations,
                "at least 1 with the FixedMax policy",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverlapRemovalSettings {
    /// Jitter radius for coincident centers, in working units.
    pub epsilon: f64,
    pub iterations_max: usize,
    /// Treat `iterations_max` as a hard cap. Without it the loop runs until no overlap remains.
    pub stop_on_max_iterations: bool,
    /// Padding added to every node box (half on each side).
    pub node_separation: f64,
    pub randomization_seed: u64,
    /// Jitter every center before the first iteration, not only coincident ones.
    pub randomize_all_points_on_start: bool,
    /// Compute in inches: coordinates are divided by 72 on input and multiplied back on output.
    pub work_in_inches: bool,
    pub stress_settings: StressMajorizationSettings,
}

impl Default for OverlapRemovalSettings {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            iterations_max: 1000,
            stop_on_max_iterations: false,
            node_separation: 4.0,
            randomization_seed: 1,
            randomize_all_points_on_start: false,
            work_in_inches: false,
            stress_settings: StressMajorizationSettings::default(),
        }
    }
}

impl OverlapRemovalSettings {
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(invalid("epsilon", self.epsilon, "a finite, positive number"));
        }
        if self.stop_on_max_iterations && self.iterations_max == 0 {
            return Err(invalid(
                "iterationsMax",
                self.iterations_max,
                "at least 1 when stopOnMaxIterations is set",
            ));
        }
        validate_node_separation(self.node_separation)?;
        self.stress_settings.validate()
    }

    /// Graph units per working unit.
    pub(crate) fn unit_scale(&self) -> f64 {
        if self.work_in_inches { 72.0 } else { 1.0 }
    }
}

pub(crate) fn validate_node_separation(node_separation: f64) -> Result<()> {
    if node_separation.is_finite() && node_separation >= 0.0 {
        Ok(())
    } else {
        Err(invalid(
            "nodeSeparation",
            node_separation,
            "a finite, non-negative number",
        ))
    }
}

fn invalid(name: &'static str, value: impl ToString, expected: &'static str) -> Error {
    Error::InvalidSetting {
        name,
        value: value.to_string(),
        expected,
    }
}

//! Stress majorization over a vote graph.
//!
//! Every node collects [`Vote`]s: "I want to be `distance` away from `voter`, with strength
//! `weight`". A sweep either solves the majorization system `Lw x = Lx z` per axis by conjugate
//! gradient, or moves each node to the weighted average of its voters' proposals.

mod voting;

pub use voting::{NodeVoting, Vote, VoteBlock};

use tracing::debug;

use narwhal_linalg::{
    CsrBuilder, SolveOutcome, SparseMatrix, Vector as DenseVector, solve_conjugate_gradient,
    solve_preconditioned_conjugate_gradient,
};

use crate::algo::{SolvingMethod, StressMajorizationSettings, UpdateMethod};
use crate::error::{Error, Result};
use crate::geom::{Point, Vector, point};
use crate::progress::{Algorithm, RunContext};

#[derive(Debug, Clone)]
pub struct StressMajorization {
    settings: StressMajorizationSettings,
    positions: Vec<Point>,
    votings: Vec<NodeVoting>,
}

impl StressMajorization {
    /// One empty [`NodeVoting`] per position, each with blocks of the given weights.
    pub fn new(
        settings: StressMajorizationSettings,
        positions: Vec<Point>,
        block_weights: &[f64],
    ) -> Self {
        let votings = (0..positions.len())
            .map(|i| NodeVoting::new(i, block_weights))
            .collect();
        Self {
            settings,
            positions,
            votings,
        }
    }

    /// Uses caller-built votings; `votings[i]` must vote on node `i`.
    pub fn with_votings(
        settings: StressMajorizationSettings,
        positions: Vec<Point>,
        votings: Vec<NodeVoting>,
    ) -> Result<Self> {
        if votings.len() != positions.len() {
            return Err(Error::InvalidArgument(format!(
                "{} votings for {} positions",
                votings.len(),
                positions.len()
            )));
        }
        for (i, voting) in votings.iter().enumerate() {
            if voting.voted_node != i {
                return Err(Error::InvalidArgument(format!(
                    "voting at index {i} is for node {}",
                    voting.voted_node
                )));
            }
            for (_, vote) in voting.weighted_votes() {
                if vote.voter >= positions.len() {
                    return Err(Error::InvalidArgument(format!(
                        "node {i} has a vote from unknown node {}",
                        vote.voter
                    )));
                }
                if !(vote.distance.is_finite() && vote.distance >= 0.0)
                    || !(vote.weight.is_finite() && vote.weight >= 0.0)
                {
                    return Err(Error::InvalidArgument(format!(
                        "vote from {} on {i} has distance {} and weight {}",
                        vote.voter, vote.distance, vote.weight
                    )));
                }
            }
        }
        Ok(Self {
            settings,
            positions,
            votings,
        })
    }

    pub fn settings(&self) -> &StressMajorizationSettings {
        &self.settings
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn set_positions(&mut self, positions: &[Point]) -> Result<()> {
        if positions.len() != self.positions.len() {
            return Err(Error::InvalidArgument(format!(
                "expected {} positions, got {}",
                self.positions.len(),
                positions.len()
            )));
        }
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    pub fn votings(&self) -> &[NodeVoting] {
        &self.votings
    }

    /// Adds `vote` to block `block` of node `target`.
    ///
    /// # Panics
    ///
    /// Panics if `target` or `block` is out of range.
    pub fn add_vote(&mut self, target: usize, block: usize, vote: Vote) {
        self.votings[target].blocks[block].votes.push(vote);
    }

    pub fn clear_votes(&mut self) {
        for voting in &mut self.votings {
            voting.clear_votes();
        }
    }

    /// `sum(block_weight * weight * (|p_voted - p_voter| - distance)^2)` over all votes.
    pub fn stress_value(&self, positions: &[Point]) -> f64 {
        self.votings
            .iter()
            .map(|voting| {
                let p = positions[voting.voted_node];
                voting
                    .weighted_votes()
                    .map(|(block_weight, vote)| {
                        let euclid = (p - positions[vote.voter]).length();
                        let diff = euclid - vote.distance;
                        block_weight * vote.weight * diff * diff
                    })
                    .sum::<f64>()
            })
            .sum()
    }

    /// Conjugate-gradient iteration budget for the current problem size.
    pub fn max_solver_iterations(&self) -> usize {
        self.settings
            .max_solver_iterations_policy
            .iterations(self.positions.len(), self.settings.max_solver_iterations)
    }

    /// One localized sweep: each node moves to the weighted average of its voters' proposals.
    pub fn iterate_single_localized(&mut self) -> &[Point] {
        match self.settings.update_method {
            UpdateMethod::Sequential => {
                for i in 0..self.positions.len() {
                    let next = self.localized_position(i, &self.positions);
                    self.positions[i] = next;
                }
            }
            UpdateMethod::Parallel => {
                let next: Vec<Point> = (0..self.positions.len())
                    .map(|i| self.localized_position(i, &self.positions))
                    .collect();
                self.positions = next;
            }
        }
        &self.positions
    }

    fn localized_position(&self, node: usize, positions: &[Point]) -> Point {
        let p = positions[node];
        let mut sum = Vector::zero();
        let mut total_weight = 0.0;
        for (block_weight, vote) in self.votings[node].weighted_votes() {
            let w = block_weight * vote.weight;
            let q = positions[vote.voter];
            let diff = p - q;
            let euclid = diff.length();
            // No direction to push along.
            if w == 0.0 || euclid == 0.0 {
                continue;
            }
            let proposal = q + diff * (vote.distance / euclid);
            sum += proposal.to_vector() * w;
            total_weight += w;
        }
        if total_weight > 0.0 {
            (sum / total_weight).to_point()
        } else {
            p
        }
    }

    /// One majorization sweep: solves `Lw x = Lx z` for each axis, starting from the current
    /// positions. Checks for cancellation before each solve.
    pub fn iterate_single_conjugate_gradient(
        &mut self,
        ctx: &mut RunContext<'_>,
    ) -> Result<&[Point]> {
        let (lw, lx) = self.majorization_system()?;
        let z_x: DenseVector = self.positions.iter().map(|p| p.x).collect();
        let z_y: DenseVector = self.positions.iter().map(|p| p.y).collect();
        let b_x = lx.multiply(&z_x)?;
        let b_y = lx.multiply(&z_y)?;

        ctx.checkpoint()?;
        let x = self.solve(&lw, &b_x, z_x)?;
        ctx.checkpoint()?;
        let y = self.solve(&lw, &b_y, z_y)?;

        for (i, p) in self.positions.iter_mut().enumerate() {
            *p = point(x.x[i], y.x[i]);
        }
        Ok(&self.positions)
    }

    fn solve(&self, lw: &SparseMatrix, b: &DenseVector, x0: DenseVector) -> Result<SolveOutcome> {
        let max_iterations = self.max_solver_iterations();
        let epsilon = self.settings.residual_tolerance;
        let outcome = match self.settings.solving_method {
            SolvingMethod::ConjugateGradient => {
                solve_conjugate_gradient(lw, b, x0, max_iterations, epsilon)?
            }
            SolvingMethod::PreconditionedConjugateGradient | SolvingMethod::Localized => {
                solve_preconditioned_conjugate_gradient(lw, b, x0, max_iterations, epsilon)?
            }
        };
        Ok(outcome)
    }

    /// Builds the weighted Laplacian `Lw` and the distance-scaled Laplacian `Lx` of the vote
    /// graph. Rows are sorted by column and include the diagonal.
    fn majorization_system(&self) -> Result<(SparseMatrix, SparseMatrix)> {
        let n = self.positions.len();
        let nnz = n + self.votings.iter().map(NodeVoting::vote_count).sum::<usize>();
        let mut lw = CsrBuilder::with_capacity(n, nnz, n);
        let mut lx = CsrBuilder::with_capacity(n, nnz, n);
        let mut row: Vec<(usize, f64, f64)> = Vec::new();

        for (i, voting) in self.votings.iter().enumerate() {
            row.clear();
            let p = self.positions[i];
            let mut w_sum = 0.0;
            let mut x_sum = 0.0;
            for (block_weight, vote) in voting.weighted_votes() {
                if vote.voter == i {
                    continue;
                }
                let w = block_weight * vote.weight;
                let euclid = (p - self.positions[vote.voter]).length();
                let wx = if euclid > 0.0 {
                    w * vote.distance / euclid
                } else {
                    0.0
                };
                row.push((vote.voter, -w, -wx));
                w_sum += w;
                x_sum += wx;
            }
            row.push((i, w_sum, x_sum));
            row.sort_by_key(|&(col, _, _)| col);
            for &(col, w, x) in &row {
                lw.push(col, w);
                lx.push(col, x);
            }
            lw.finish_row();
            lx.finish_row();
        }
        Ok((lw.build()?, lx.build()?))
    }

    /// Repeats sweeps until the stress change, the sweep cap, or the first conjugate-gradient
    /// sweep ends the run, as configured.
    pub fn iterate_all(&mut self, ctx: &mut RunContext<'_>) -> Result<&[Point]> {
        let settings = self.settings;
        let n = self.positions.len();
        let cg_once =
            settings.solving_method.is_conjugate_gradient() && settings.cancel_after_first_conjugate;
        if cg_once {
            ctx.start_listen_to_local_progress(1);
        } else if settings.cancel_on_stress_max_iteration {
            ctx.start_listen_to_local_progress(settings.max_stress_iterations);
        }

        let initial_stress = self.stress_value(&self.positions);
        let mut stress_old = initial_stress;
        let mut sweeps = 0;
        loop {
            if settings.cancel_on_stress_max_iteration && sweeps >= settings.max_stress_iterations {
                break;
            }
            if settings.solving_method.is_conjugate_gradient() {
                self.iterate_single_conjugate_gradient(ctx)?;
            } else {
                self.iterate_single_localized();
            }
            sweeps += 1;
            ctx.progress_step()?;
            if cg_once {
                break;
            }

            let stress_new = self.stress_value(&self.positions);
            let change = if stress_old > 0.0 && n > 0 {
                ((stress_old - stress_new) / stress_old).max(0.0).sqrt() / n as f64
            } else {
                0.0
            };
            stress_old = stress_new;
            if settings.cancel_on_stress_convergence && change < settings.stress_change_tolerance {
                break;
            }
        }

        debug!(
            nodes = n,
            sweeps,
            initial_stress,
            final_stress = self.stress_value(&self.positions),
            "stress majorization finished"
        );
        Ok(&self.positions)
    }
}

impl Algorithm for StressMajorization {
    fn run_internal(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        self.iterate_all(ctx).map(|_| ())
    }
}

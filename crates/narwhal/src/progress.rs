//! Cooperative cancellation and progress reporting for long-running algorithms.
//!
//! An [`Algorithm`] receives a [`RunContext`] and calls its checkpoints (`progress_step`,
//! `checkpoint`, `run_child`) at safe points. A checkpoint fails with [`Error::Canceled`] once the
//! shared [`CancelToken`] is set. Progress callbacks receive strictly increasing ratios in
//! `(0, 1]`, ending with exactly `1.0` on successful completion.
//!
//! Two accounting modes exist. After [`RunContext::start_listen_to_local_progress`] every step
//! advances the ratio by a fixed share. Otherwise the ratio approaches
//! [`ASYMPTOTIC_CEILING`] as steps accumulate, for loops whose length is unknown up front.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Error, Result};

/// Step share used before an algorithm announces its step count.
pub const DEFAULT_STEP_SIZE: f64 = 0.05;
/// Upper bound of the ratio while the step count is unknown.
pub const ASYMPTOTIC_CEILING: f64 = 0.85;
/// Number of unknown-length steps after which the ratio reaches half of the ceiling.
pub const ASYMPTOTIC_HALF_LIFE: f64 = 50.0;

const COMPLETION_SNAP: f64 = 1e-6;

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::Release);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::Acquire)
    }

    /// Returns [`Error::Canceled`] once [`CancelToken::cancel`] has been called.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(Error::Canceled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlgorithmState {
    #[default]
    NotStarted,
    Running,
    Completed,
    Canceled,
    Failed,
}

/// Progress and cancellation state of one algorithm run.
pub struct RunContext<'a> {
    cancel: CancelToken,
    sink: Option<&'a mut dyn FnMut(f64)>,
    state: AlgorithmState,
    ratio: f64,
    last_reported: f64,
    local_step_size: f64,
    local_steps_specified: bool,
    local_step_count: usize,
}

impl Default for RunContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RunContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("state", &self.state)
            .field("ratio", &self.ratio)
            .field("canceled", &self.cancel.is_canceled())
            .finish_non_exhaustive()
    }
}

impl<'a> RunContext<'a> {
    pub fn new() -> Self {
        Self::with_cancel_token(CancelToken::new())
    }

    pub fn with_cancel_token(cancel: CancelToken) -> Self {
        Self {
            cancel,
            sink: None,
            state: AlgorithmState::NotStarted,
            ratio: 0.0,
            last_reported: 0.0,
            local_step_size: DEFAULT_STEP_SIZE,
            local_steps_specified: false,
            local_step_count: 0,
        }
    }

    /// Installs a callback that receives every increase of the progress ratio.
    pub fn on_progress(mut self, sink: &'a mut dyn FnMut(f64)) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    /// Current progress ratio in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        self.ratio
    }

    pub fn check_canceled(&self) -> Result<()> {
        self.cancel.check()
    }

    /// Cancellation checkpoint that does not advance progress.
    pub fn checkpoint(&mut self) -> Result<()> {
        self.progress_steps(0)
    }

    pub fn progress_step(&mut self) -> Result<()> {
        self.progress_steps(1)
    }

    /// Checks for cancellation, then advances progress by `steps`.
    pub fn progress_steps(&mut self, steps: usize) -> Result<()> {
        self.check_canceled()?;
        self.local_step_count += steps;
        if self.local_steps_specified {
            self.ratio += self.local_step_size * steps as f64;
        } else {
            self.ratio = self.ratio.max(asymptotic_ratio(self.local_step_count));
        }
        if (1.0 - self.ratio).abs() < COMPLETION_SNAP {
            self.ratio = 1.0;
        }
        self.ratio = self.ratio.min(1.0);
        self.notify(self.ratio);
        Ok(())
    }

    /// Announces that the remaining work takes `expected_steps` steps.
    pub fn start_listen_to_local_progress(&mut self, expected_steps: usize) {
        self.start_listen_to_local_progress_with_ratio(expected_steps, 1.0);
    }

    /// Announces `expected_steps` steps that together cover `stage_ratio` of this run.
    pub fn start_listen_to_local_progress_with_ratio(
        &mut self,
        expected_steps: usize,
        stage_ratio: f64,
    ) {
        self.local_step_size = stage_ratio / expected_steps.max(1) as f64;
        self.local_steps_specified = true;
        self.local_step_count = 0;
    }

    /// Share of the ratio the next single step would cover.
    pub fn step_share(&self) -> f64 {
        if self.local_steps_specified {
            self.local_step_size
        } else {
            asymptotic_ratio(self.local_step_count + 1) - self.ratio.min(ASYMPTOTIC_CEILING)
        }
    }

    /// Runs `child` inside this run. The child's progress `r` is reported as
    /// `start + stage_ratio * r`, and this run's ratio sits at the end of that window afterwards.
    pub fn run_child<A: Algorithm + ?Sized>(
        &mut self,
        child: &mut A,
        stage_ratio: f64,
    ) -> Result<()> {
        let stage_start = self.ratio;
        let stage_end = (self.ratio + stage_ratio.max(0.0)).min(1.0);
        let cancel = self.cancel.clone();
        let outcome = {
            let mut forward = |r: f64| self.notify(stage_start + (stage_end - stage_start) * r);
            let mut child_ctx = RunContext::with_cancel_token(cancel).on_progress(&mut forward);
            child.run(&mut child_ctx)
        };
        self.ratio = self.ratio.max(stage_end);
        outcome
    }

    /// Runs `child` as one step of this run's announced or asymptotic step sequence.
    pub fn run_child_as_step<A: Algorithm + ?Sized>(&mut self, child: &mut A) -> Result<()> {
        let share = self.step_share();
        self.run_child(child, share)?;
        self.local_step_count += 1;
        Ok(())
    }

    pub(crate) fn begin(&mut self) -> Result<()> {
        self.ratio = 0.0;
        self.last_reported = 0.0;
        self.local_step_size = DEFAULT_STEP_SIZE;
        self.local_steps_specified = false;
        self.local_step_count = 0;
        if self.cancel.is_canceled() {
            self.state = AlgorithmState::Canceled;
            return Err(Error::Canceled);
        }
        self.state = AlgorithmState::Running;
        self.checkpoint()
    }

    pub(crate) fn finish(&mut self, outcome: Result<()>) -> Result<()> {
        let outcome = outcome.and_then(|()| self.check_canceled());
        match &outcome {
            Ok(()) => {
                self.state = AlgorithmState::Completed;
                self.ratio = 1.0;
                self.notify(1.0);
            }
            Err(e) if e.is_canceled() => self.state = AlgorithmState::Canceled,
            Err(_) => self.state = AlgorithmState::Failed,
        }
        outcome
    }

    fn notify(&mut self, ratio: f64) {
        let ratio = ratio.clamp(0.0, 1.0);
        if ratio <= self.last_reported {
            return;
        }
        self.last_reported = ratio;
        if let Some(sink) = self.sink.as_deref_mut() {
            sink(ratio);
        }
    }
}

fn asymptotic_ratio(steps: usize) -> f64 {
    ASYMPTOTIC_CEILING - ASYMPTOTIC_CEILING * ASYMPTOTIC_HALF_LIFE / (ASYMPTOTIC_HALF_LIFE + steps as f64)
}

/// A cancelable, progress-reporting unit of work.
pub trait Algorithm {
    /// The algorithm body. Call the context's checkpoints at safe points.
    fn run_internal(&mut self, ctx: &mut RunContext<'_>) -> Result<()>;

    /// Resets progress, checks for cancellation, runs the body, and records the final state.
    fn run(&mut self, ctx: &mut RunContext<'_>) -> Result<()> {
        ctx.begin()?;
        let outcome = self.run_internal(ctx);
        ctx.finish(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asymptotic_ratio_starts_at_zero_and_stays_below_the_ceiling() {
        assert_eq!(asymptotic_ratio(0), 0.0);
        assert!((asymptotic_ratio(50) - ASYMPTOTIC_CEILING / 2.0).abs() < 1e-12);
        assert!(asymptotic_ratio(1_000_000) < ASYMPTOTIC_CEILING);
    }

    #[test]
    fn step_share_matches_the_announced_step_size() {
        let mut ctx = RunContext::new();
        ctx.start_listen_to_local_progress(4);
        assert!((ctx.step_share() - 0.25).abs() < 1e-12);
        ctx.start_listen_to_local_progress_with_ratio(0, 0.5);
        assert!((ctx.step_share() - 0.5).abs() < 1e-12);
    }
}

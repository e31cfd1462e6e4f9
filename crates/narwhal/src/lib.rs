#![forbid(unsafe_code)]

//! Headless node overlap removal for graph layouts.
//!
//! The entry point is [`ProximityOverlapRemoval`], which moves node centers (never sizes) until
//! no two padded node boxes overlap. [`remove_overlaps`] runs it with default settings.
//! Long-running work reports progress and honors cancellation through [`progress::RunContext`].

pub mod algo;
pub mod error;
pub mod geom;
pub mod graph;
pub mod progress;
mod rng;

pub use narwhal_linalg as linalg;

pub use algo::prism::{OverlapRemovalReport, ProximityOverlapRemoval, count_overlaps};
pub use algo::stress::{NodeVoting, StressMajorization, Vote, VoteBlock};
pub use algo::{
    MaxIterationMethod, OverlapRemovalSettings, SolvingMethod, StressMajorizationSettings,
    UpdateMethod,
};
pub use error::{Error, Result};
pub use graph::{Edge, Graph, Node};
pub use progress::{Algorithm, AlgorithmState, CancelToken, RunContext};

/// Removes node overlaps in place with default settings and the given padding between nodes.
///
/// The default settings iterate until no overlap remains; use [`ProximityOverlapRemoval`] with
/// `stop_on_max_iterations` for a bounded run.
pub fn remove_overlaps(graph: &mut Graph, node_separation: f64) -> Result<OverlapRemovalReport> {
    let settings = OverlapRemovalSettings {
        node_separation,
        ..OverlapRemovalSettings::default()
    };
    ProximityOverlapRemoval::new(settings).remove_overlaps(graph)
}

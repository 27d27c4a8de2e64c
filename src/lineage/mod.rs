pub mod graph;
pub mod stats;
pub mod traversal;

pub use graph::LineageTracker;
pub use stats::GraphStatistics;
pub use traversal::{GraphTraversal, TraversalDirection};

pub mod config;
pub mod error;
pub mod lineage;
pub mod render;
pub mod report;
pub mod simulation;
pub mod types;

pub use error::{LineageError, LineageResult};
pub use lineage::LineageTracker;
pub use types::{EdgeKind, Individual, NodeId};

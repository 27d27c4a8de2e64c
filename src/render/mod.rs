//! Hand-off between the lineage tracker and whatever draws it.
//!
//! The tracker only produces a [`RenderRequest`]: plain node and edge data,
//! an optional highlighted individual with its root path, and a layout
//! choice. Anything that draws implements [`Renderer`] and owns its own
//! canvas for the duration of one call.

pub mod chart;
pub mod formatters;
pub mod layout;
pub mod scene;

pub use chart::FitnessChart;
pub use formatters::{DotRenderer, JsonRenderer, SvgRenderer};
pub use layout::Position;
pub use scene::{Scene, SceneEdge, SceneNode};

use crate::error::{LineageError, LineageResult};
use crate::lineage::LineageTracker;
use crate::types::{EdgeView, NodeId, NodeView};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub const TREE_TITLE: &str = "Family Tree of Population";

/// Supported node placement strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Hierarchical,
    ForceDirected,
    Circular,
    Random,
}

impl LayoutKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutKind::Hierarchical => "hierarchical",
            LayoutKind::ForceDirected => "force-directed",
            LayoutKind::Circular => "circular",
            LayoutKind::Random => "random",
        }
    }
}

impl FromStr for LayoutKind {
    type Err = LineageError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hierarchical" | "dot" => Ok(LayoutKind::Hierarchical),
            "force-directed" | "spring" => Ok(LayoutKind::ForceDirected),
            "circular" => Ok(LayoutKind::Circular),
            "random" => Ok(LayoutKind::Random),
            other => Err(LineageError::ConfigurationError {
                reason: format!("Unsupported layout: {}", other),
            }),
        }
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a renderer needs to draw the family tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub title: String,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub highlight: Option<NodeId>,
    pub highlight_path: Option<Vec<NodeId>>,
    pub layout: LayoutKind,
}

impl RenderRequest {
    /// Consecutive (parent, child) pairs along the highlighted path
    pub fn path_edges(&self) -> Vec<(NodeId, NodeId)> {
        self.highlight_path
            .as_ref()
            .map(|path| path.windows(2).map(|pair| (pair[0], pair[1])).collect())
            .unwrap_or_default()
    }
}

/// Trait for family tree renderers
#[cfg_attr(test, mockall::automock)]
pub trait Renderer {
    fn render(&self, request: &RenderRequest) -> Result<String>;
}

impl LineageTracker {
    /// Snapshot the graph for a renderer, resolving the root path of the
    /// highlighted node when one is given.
    pub fn render_request(
        &self,
        highlight: Option<NodeId>,
        layout: LayoutKind,
    ) -> LineageResult<RenderRequest> {
        let highlight_path = match highlight {
            Some(node_id) => self.path_from_root(node_id)?,
            None => None,
        };

        debug!(
            "Prepared render request: {} nodes, {} edges, layout {}",
            self.len(),
            self.edge_count(),
            layout
        );

        Ok(RenderRequest {
            title: TREE_TITLE.to_string(),
            nodes: self.node_views()?,
            edges: self.edges(),
            highlight,
            highlight_path,
            layout,
        })
    }

    /// Build a request and hand it to `renderer`
    pub fn render_with(
        &self,
        renderer: &dyn Renderer,
        highlight: Option<NodeId>,
        layout: LayoutKind,
    ) -> Result<String> {
        let request = self.render_request(highlight, layout)?;
        renderer.render(&request)
    }
}

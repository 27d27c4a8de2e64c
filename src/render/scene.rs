use crate::config::RenderSettings;
use crate::render::layout::{compute_positions, Position};
use crate::render::{LayoutKind, RenderRequest};
use crate::types::{EdgeKind, NodeId, NodeView};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const HIGHLIGHT_NODE_COLOR: &str = "#ffa500";
pub const HIGHLIGHT_PATH_COLOR: &str = "#ff0000";
pub const HIGHLIGHT_PATH_WIDTH: f64 = 3.0;
pub const EDGE_WIDTH: f64 = 1.0;
pub const EDGE_OPACITY: f64 = 0.7;

/// Viridis anchor colours, evenly spaced over [0, 1]
const VIRIDIS: [(u8, u8, u8); 5] = [
    (0x44, 0x01, 0x54),
    (0x3b, 0x52, 0x8b),
    (0x21, 0x91, 0x8c),
    (0x5e, 0xc9, 0x62),
    (0xfd, 0xe7, 0x25),
];

/// Map a value in [0, 1] onto the viridis colour map, as `#rrggbb`
pub fn viridis(value: f64) -> String {
    let value = if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = value * (VIRIDIS.len() - 1) as f64;
    let lower = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
    let t = scaled - lower as f64;

    let (r0, g0, b0) = VIRIDIS[lower];
    let (r1, g1, b1) = VIRIDIS[lower + 1];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;

    format!("#{:02x}{:02x}{:02x}", mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

pub fn edge_color(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Crossover => "#0000ff",
        EdgeKind::Mutation => "#800080",
        EdgeKind::Generic => "#808080",
    }
}

pub fn node_label(node: &NodeView) -> String {
    format!("{}\n{:.2}", node.id, node.fitness)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub id: NodeId,
    pub label: String,
    pub position: Position,
    pub color: String,
    pub size: f64,
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEdge {
    pub parent: NodeId,
    pub child: NodeId,
    pub kind: EdgeKind,
    pub color: String,
    pub width: f64,
    pub on_highlight_path: bool,
}

/// Fully styled and positioned family tree, ready to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub title: String,
    pub layout: LayoutKind,
    pub width: u32,
    pub height: u32,
    pub nodes: Vec<SceneNode>,
    pub edges: Vec<SceneEdge>,
}

impl Scene {
    pub fn build(request: &RenderRequest, settings: &RenderSettings) -> Self {
        let positions = compute_positions(request, settings);

        let (min_fitness, max_fitness) = request.nodes.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), node| (min.min(node.fitness), max.max(node.fitness)),
        );

        let nodes = request
            .nodes
            .iter()
            .zip(positions)
            .map(|(node, position)| {
                let highlighted = request.highlight == Some(node.id);
                let color = if highlighted {
                    HIGHLIGHT_NODE_COLOR.to_string()
                } else {
                    viridis(normalized(node.fitness, min_fitness, max_fitness))
                };
                SceneNode {
                    id: node.id,
                    label: node_label(node),
                    position,
                    color,
                    size: if highlighted {
                        settings.highlight_node_size
                    } else {
                        settings.node_size
                    },
                    highlighted,
                }
            })
            .collect();

        let path_edges: HashSet<(NodeId, NodeId)> = request.path_edges().into_iter().collect();
        let edges = request
            .edges
            .iter()
            .map(|edge| {
                let on_path = path_edges.contains(&(edge.parent, edge.child));
                SceneEdge {
                    parent: edge.parent,
                    child: edge.child,
                    kind: edge.kind,
                    color: if on_path {
                        HIGHLIGHT_PATH_COLOR.to_string()
                    } else {
                        edge_color(edge.kind).to_string()
                    },
                    width: if on_path { HIGHLIGHT_PATH_WIDTH } else { EDGE_WIDTH },
                    on_highlight_path: on_path,
                }
            })
            .collect();

        Self {
            title: request.title.clone(),
            layout: request.layout,
            width: settings.width,
            height: settings.height,
            nodes,
            edges,
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}

/// Min-max normalisation; a flat fitness landscape maps to the top colour
fn normalized(value: f64, min: f64, max: f64) -> f64 {
    if max - min > f64::EPSILON {
        (value - min) / (max - min)
    } else {
        1.0
    }
}

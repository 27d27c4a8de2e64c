use crate::config::RenderSettings;
use crate::render::scene::{Scene, SceneEdge, SceneNode, EDGE_OPACITY};
use crate::render::{LayoutKind, RenderRequest, Renderer};
use anyhow::Result;
use std::fmt::Write;

const MARGIN: f64 = 40.0;
const TITLE_HEIGHT: f64 = 40.0;

/// Standalone SVG document
pub struct SvgRenderer {
    settings: RenderSettings,
}

impl SvgRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    fn project(&self, node: &SceneNode) -> (f64, f64) {
        let width = self.settings.width as f64 - 2.0 * MARGIN;
        let height = self.settings.height as f64 - 2.0 * MARGIN - TITLE_HEIGHT;
        (
            MARGIN + node.position.x * width,
            MARGIN + TITLE_HEIGHT + node.position.y * height,
        )
    }

    fn write_edge(&self, svg: &mut String, scene: &Scene, edge: &SceneEdge) -> Result<()> {
        let (Some(parent), Some(child)) = (scene.node(edge.parent), scene.node(edge.child)) else {
            return Ok(());
        };
        let (x1, y1) = self.project(parent);
        let (x2, y2) = self.project(child);
        let opacity = if edge.on_highlight_path { 1.0 } else { EDGE_OPACITY };

        writeln!(
            svg,
            r#"  <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{}" stroke-width="{}" stroke-opacity="{}" marker-end="url(#arrow)" data-kind="{}"/>"#,
            x1, y1, x2, y2, edge.color, edge.width, opacity, edge.kind
        )?;
        Ok(())
    }

    fn write_node(&self, svg: &mut String, node: &SceneNode) -> Result<()> {
        let (cx, cy) = self.project(node);
        let radius = node.size.sqrt() / 2.0;
        let mut lines = node.label.lines();

        writeln!(
            svg,
            r#"  <g class="node" data-id="{}"><circle cx="{:.1}" cy="{:.1}" r="{:.1}" fill="{}"/>"#,
            node.id, cx, cy, radius, node.color
        )?;
        writeln!(
            svg,
            r#"    <text x="{:.1}" y="{:.1}" font-size="{}" text-anchor="middle"><tspan x="{:.1}">{}</tspan><tspan x="{:.1}" dy="1.2em">{}</tspan></text></g>"#,
            cx,
            cy + radius + self.settings.label_font_size as f64,
            self.settings.label_font_size,
            cx,
            escape_xml(lines.next().unwrap_or_default()),
            cx,
            escape_xml(lines.next().unwrap_or_default())
        )?;
        Ok(())
    }
}

impl Renderer for SvgRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String> {
        let scene = Scene::build(request, &self.settings);
        let mut svg = String::new();

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = scene.width,
            h = scene.height
        )?;
        svg.push_str(
            "  <defs><marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\"/></marker></defs>\n",
        );
        writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="white"/>"#
        )?;
        writeln!(
            svg,
            r#"  <text x="{:.1}" y="{:.1}" font-size="20" text-anchor="middle">{}</text>"#,
            scene.width as f64 / 2.0,
            MARGIN,
            escape_xml(&scene.title)
        )?;

        // Highlighted path and node are drawn last so they stay on top
        for edge in scene.edges.iter().filter(|edge| !edge.on_highlight_path) {
            self.write_edge(&mut svg, &scene, edge)?;
        }
        for edge in scene.edges.iter().filter(|edge| edge.on_highlight_path) {
            self.write_edge(&mut svg, &scene, edge)?;
        }
        for node in scene.nodes.iter().filter(|node| !node.highlighted) {
            self.write_node(&mut svg, node)?;
        }
        for node in scene.nodes.iter().filter(|node| node.highlighted) {
            self.write_node(&mut svg, node)?;
        }

        svg.push_str("</svg>\n");
        Ok(svg)
    }
}

/// Graphviz DOT source
pub struct DotRenderer {
    settings: RenderSettings,
}

impl DotRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

impl Renderer for DotRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String> {
        let scene = Scene::build(request, &self.settings);
        let pinned = request.layout != LayoutKind::Hierarchical;
        let width_in = self.settings.width as f64 / 100.0;
        let height_in = self.settings.height as f64 / 100.0;
        let mut dot = String::new();

        writeln!(dot, "digraph lineage {{")?;
        writeln!(
            dot,
            "  graph [label=\"{}\", labelloc=t, layout={}, nodesep={}, ranksep={}, size=\"{},{}\"];",
            escape_dot(&scene.title),
            if pinned { "neato" } else { "dot" },
            self.settings.node_separation,
            self.settings.rank_separation,
            width_in,
            height_in
        )?;
        writeln!(
            dot,
            "  node [shape=circle, style=filled, fixedsize=true, fontsize={}];",
            self.settings.label_font_size
        )?;

        for node in &scene.nodes {
            write!(
                dot,
                "  {} [label=\"{}\", fillcolor=\"{}\", width={:.3}",
                node.id,
                escape_dot(&node.label),
                node.color,
                node.size.sqrt() / 72.0
            )?;
            if pinned {
                write!(
                    dot,
                    ", pos=\"{:.3},{:.3}!\"",
                    node.position.x * width_in,
                    (1.0 - node.position.y) * height_in
                )?;
            }
            writeln!(dot, "];")?;
        }

        for edge in &scene.edges {
            writeln!(
                dot,
                "  {} -> {} [color=\"{}\", penwidth={}, type=\"{}\"];",
                edge.parent, edge.child, edge.color, edge.width, edge.kind
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }
}

/// Pretty-printed JSON dump of the styled scene
pub struct JsonRenderer {
    settings: RenderSettings,
}

impl JsonRenderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String> {
        let scene = Scene::build(request, &self.settings);
        Ok(serde_json::to_string_pretty(&scene)?)
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_dot(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::LineageTracker;
    use crate::types::Individual;

    fn create_tracker() -> LineageTracker {
        let mut tracker = LineageTracker::new();
        tracker.add_individual(Individual::new(1.0), &[], None, Some(0)).unwrap();
        tracker.add_individual(Individual::new(2.0), &[0], None, Some(1)).unwrap();
        tracker.add_individual(Individual::new(3.0), &[1], None, Some(2)).unwrap();
        tracker
    }

    #[test]
    fn test_svg_renderer() {
        let tracker = create_tracker();
        let renderer = SvgRenderer::new(RenderSettings::default());
        let svg = tracker
            .render_with(&renderer, Some(2), LayoutKind::Hierarchical)
            .unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains("Family Tree of Population"));
        assert_eq!(svg.matches("<circle").count(), 3);
        assert_eq!(svg.matches("stroke=\"#ff0000\"").count(), 2);
        assert!(svg.contains("fill=\"#ffa500\""));
        assert!(svg.contains("<tspan x=\"800.0\">0</tspan>"));
    }

    #[test]
    fn test_dot_renderer_hierarchical() {
        let tracker = create_tracker();
        let renderer = DotRenderer::new(RenderSettings::default());
        let dot = tracker
            .render_with(&renderer, None, LayoutKind::Hierarchical)
            .unwrap();

        assert!(dot.starts_with("digraph lineage {"));
        assert!(dot.contains("layout=dot, nodesep=0.5, ranksep=1.5"));
        assert!(dot.contains("0 [label=\"0\\n1.00\""));
        assert!(dot.contains("0 -> 1 [color=\"#0000ff\", penwidth=1, type=\"crossover\"];"));
        assert!(!dot.contains("pos="));
    }

    #[test]
    fn test_dot_renderer_pins_other_layouts() {
        let tracker = create_tracker();
        let renderer = DotRenderer::new(RenderSettings::default());
        let dot = tracker.render_with(&renderer, None, LayoutKind::Circular).unwrap();

        assert!(dot.contains("layout=neato"));
        assert_eq!(dot.matches("pos=\"").count(), 3);
    }

    #[test]
    fn test_json_renderer() {
        let tracker = create_tracker();
        let renderer = JsonRenderer::new(RenderSettings::default());
        let json = tracker.render_with(&renderer, Some(1), LayoutKind::Random).unwrap();

        let scene: Scene = serde_json::from_str(&json).unwrap();
        assert_eq!(scene.layout, LayoutKind::Random);
        assert_eq!(scene.nodes.len(), 3);
        assert!(scene.node(1).unwrap().highlighted);
        assert_eq!(scene.edges.iter().filter(|e| e.on_highlight_path).count(), 1);
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape_dot("1\n\"2\""), "1\\n\\\"2\\\"");
    }
}

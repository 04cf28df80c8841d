//! Deterministic SVG renderer.
//!
//! Serializes a [`LayoutResult`] into one self-contained vector document:
//! defs (arrow markers, drop shadow), an inline stylesheet driven by the
//! theme palette, then four z-ordered layers. Iteration follows the
//! insertion order of the layout collections, so equal input produces
//! byte-identical output.

pub mod icons;
pub(crate) mod labels;
pub(crate) mod legend;
pub(crate) mod links;
pub(crate) mod shapes;
pub mod theme;

pub use icons::{default_registry, IconEntry, IconRegistry};
pub use theme::{palette, ThemePalette, VLAN_PALETTE};

use std::fmt::Write as _;

use labels::{escape_xml, fmt, text_width};

use crate::model::{Graph, Label, LayoutNode, LayoutPort, LayoutResult, Point, Rect, Side};

const NODE_FONT: f64 = 12.0;
const LINE_HEIGHT: f64 = 16.0;
const ICON_SIZE: f64 = 48.0;
const ICON_LABEL_GAP: f64 = 6.0;

/// Render with the default theme and the process-global icon registry.
pub fn render_svg(graph: &Graph, layout: &LayoutResult) -> String {
    SvgRenderer::new(graph, layout).render()
}

pub struct SvgRenderer<'a> {
    graph: &'a Graph,
    layout: &'a LayoutResult,
    theme: ThemePalette,
    icons: &'a IconRegistry,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(graph: &'a Graph, layout: &'a LayoutResult) -> Self {
        Self {
            graph,
            layout,
            theme: palette(graph.settings.theme),
            icons: default_registry(),
        }
    }

    pub fn with_icons(mut self, icons: &'a IconRegistry) -> Self {
        self.icons = icons;
        self
    }

    pub fn render(&self) -> String {
        let mut bounds = self.layout.bounds;

        // The legend reserves space outside the content.
        let legend = self.graph.settings.legend.and_then(|position| {
            let bandwidths = legend::used_bandwidths(self.graph);
            if bandwidths.is_empty() {
                return None;
            }
            let rect = legend::legend_rect(position, bounds, legend::legend_size(bandwidths.len()));
            bounds = bounds.union(&rect.expand(8.0));
            Some((bandwidths, rect))
        });

        let mut out = String::new();
        let _ = write!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
            fmt(bounds.x),
            fmt(bounds.y),
            fmt(bounds.width),
            fmt(bounds.height),
            fmt(bounds.width),
            fmt(bounds.height),
        );
        out.push('\n');
        out.push_str(&self.defs());
        out.push_str(&self.stylesheet());

        // Layer 1: subgraph backgrounds.
        for subgraph in self.layout.subgraphs.values() {
            out.push_str(&self.subgraph_markup(subgraph));
        }
        // Layer 2: node backgrounds.
        for node in self.layout.nodes.values() {
            out.push_str(&self.node_background(node));
        }
        // Layer 3: link groups.
        for link in self.layout.links.values() {
            out.push_str(&links::render_link_group(link, &self.layout.nodes, &self.theme));
        }
        // Layer 4: node foregrounds (icon, label, ports).
        for node in self.layout.nodes.values() {
            out.push_str(&self.node_foreground(node));
        }
        // Optional legend on top.
        if let Some((bandwidths, rect)) = legend {
            out.push_str(&legend::render_legend(&bandwidths, rect, &self.theme));
        }

        out.push_str("</svg>\n");
        out
    }

    fn defs(&self) -> String {
        format!(
            concat!(
                "<defs>",
                r#"<marker id="arrow-forward" markerWidth="10" markerHeight="8" refX="9" refY="4" orient="auto" markerUnits="userSpaceOnUse"><path d="M 0 0 L 10 4 L 0 8 Z" fill="{color}"/></marker>"#,
                r#"<marker id="arrow-back" markerWidth="10" markerHeight="8" refX="1" refY="4" orient="auto" markerUnits="userSpaceOnUse"><path d="M 10 0 L 0 4 L 10 8 Z" fill="{color}"/></marker>"#,
                r#"<filter id="drop-shadow" x="-20%" y="-20%" width="140%" height="140%"><feDropShadow dx="0" dy="2" stdDeviation="3" flood-opacity="0.2"/></filter>"#,
                "</defs>\n",
            ),
            color = self.theme.link_stroke,
        )
    }

    fn stylesheet(&self) -> String {
        let t = &self.theme;
        format!(
            concat!(
                "<style>\n",
                "svg {{ background-color: {bg}; }}\n",
                "text {{ font-family: 'Helvetica Neue', Arial, sans-serif; }}\n",
                ".subgraph-label {{ font-size: 13px; font-weight: 600; fill: {subgraph_text}; }}\n",
                ".node-label {{ font-size: 12px; fill: {node_text}; text-anchor: middle; }}\n",
                ".node-label-bold {{ font-size: 12px; font-weight: 600; fill: {node_text}; text-anchor: middle; }}\n",
                ".port-label {{ font-size: 10px; fill: {port_text}; }}\n",
                ".endpoint-label {{ font-size: 10px; fill: {link_text}; }}\n",
                ".link-label {{ font-size: 10px; fill: {link_text}; text-anchor: middle; }}\n",
                ".link, .link-double-outer, .link-double-inner {{ fill: none; }}\n",
                ".legend-title {{ font-size: 11px; font-weight: 600; fill: {node_text}; }}\n",
                ".legend-entry {{ font-size: 10px; fill: {node_text}; }}\n",
                "</style>\n",
            ),
            bg = t.background,
            subgraph_text = t.subgraph_text,
            node_text = t.node_text,
            port_text = t.port_text,
            link_text = t.link_text,
        )
    }

    fn subgraph_markup(&self, layout_subgraph: &crate::model::LayoutSubgraph) -> String {
        let subgraph = &layout_subgraph.subgraph;
        let bounds = layout_subgraph.bounds;
        let fill = subgraph.style.fill.as_deref().unwrap_or(self.theme.subgraph_fill);
        let stroke = subgraph
            .style
            .stroke
            .as_deref()
            .unwrap_or(self.theme.subgraph_stroke);
        let mut out = format!(
            r#"<rect class="subgraph" data-id="{id}" x="{x}" y="{y}" width="{w}" height="{h}" rx="8" fill="{fill}" stroke="{stroke}"/>"#,
            id = escape_xml(&layout_subgraph.id),
            x = fmt(bounds.x),
            y = fmt(bounds.y),
            w = fmt(bounds.width),
            h = fmt(bounds.height),
            fill = fill,
            stroke = stroke,
        );
        if let Some(icon) = subgraph.icon_key().and_then(|k| self.icons.get(k)) {
            out.push_str(&icon_markup(
                icon,
                Point::new(bounds.x + 8.0, bounds.y + 6.0),
                16.0,
                "subgraph-icon",
                &format!(r#" data-id="{}""#, escape_xml(&layout_subgraph.id)),
                self.theme.subgraph_text,
            ));
        }
        let (label_x, anchor) = match subgraph.style.label_position.unwrap_or_default() {
            crate::model::LabelPosition::Left => (bounds.x + 12.0, "start"),
            crate::model::LabelPosition::Center => (bounds.center().x, "middle"),
            crate::model::LabelPosition::Right => (bounds.right() - 12.0, "end"),
        };
        let _ = write!(
            out,
            r#"<text class="subgraph-label" data-id="{}" x="{}" y="{}" text-anchor="{}">{}</text>"#,
            escape_xml(&layout_subgraph.id),
            fmt(label_x),
            fmt(bounds.y + 18.0),
            anchor,
            escape_xml(subgraph.display_label().first_line()),
        );
        out.push('\n');
        out
    }

    fn node_background(&self, node: &LayoutNode) -> String {
        let style = &node.node.style;
        let mut attrs = format!(
            r#" data-id="{}" fill="{}" stroke="{}" stroke-width="{}""#,
            escape_xml(&node.id),
            style.fill.as_deref().unwrap_or(self.theme.node_fill),
            style.stroke.as_deref().unwrap_or(self.theme.node_stroke),
            fmt(style.stroke_width.unwrap_or(1.5)),
        );
        if let Some(dash) = &style.dasharray {
            let _ = write!(attrs, r#" stroke-dasharray="{}""#, escape_xml(dash));
        }
        attrs.push_str(r#" filter="url(#drop-shadow)""#);
        let mut out = shapes::shape_markup(node.node.shape, node.bounds(), "node-bg", &attrs);
        out.push('\n');
        out
    }

    /// Icon and label stacked and vertically centered in the node, then
    /// the port glyphs with their labels.
    fn node_foreground(&self, node: &LayoutNode) -> String {
        let mut out = format!(r#"<g class="node-fg" data-id="{}">"#, escape_xml(&node.id));

        let label = node.node.display_label();
        let icon = node.node.icon_key().and_then(|k| self.icons.lookup([k]));
        let icon_block = if icon.is_some() {
            ICON_SIZE + ICON_LABEL_GAP
        } else {
            0.0
        };
        let content_height = icon_block + label.line_count() as f64 * LINE_HEIGHT;
        let top = node.position.y - content_height / 2.0;

        if let Some(icon) = icon {
            out.push_str(&icon_markup(
                icon,
                Point::new(node.position.x - ICON_SIZE / 2.0, top),
                ICON_SIZE,
                "node-icon",
                "",
                self.theme.node_text,
            ));
        }
        out.push_str(&label_markup(&label, node.position.x, top + icon_block));

        for port in node.ports.values() {
            out.push_str(&self.port_markup(node, port));
        }

        out.push_str("</g>\n");
        out
    }

    fn port_markup(&self, node: &LayoutNode, port: &LayoutPort) -> String {
        let center = Point::new(
            node.position.x + port.position.x,
            node.position.y + port.position.y,
        );
        let mut out = format!(
            r#"<rect class="port" data-port="{}:{}" x="{}" y="{}" width="{}" height="{}" rx="2" fill="{}" stroke="{}"/>"#,
            escape_xml(&node.id),
            escape_xml(&port.id),
            fmt(center.x - port.size.width / 2.0),
            fmt(center.y - port.size.height / 2.0),
            fmt(port.size.width),
            fmt(port.size.height),
            self.theme.port_fill,
            self.theme.port_stroke,
        );
        if port.label.is_empty() {
            return out;
        }

        // Label just outside the port: above/below for top/bottom ports,
        // beyond the glyph for left/right ones.
        let tw = text_width(&port.label, 10.0);
        let (cx, cy, anchor) = match port.side {
            Side::Top => (center.x, center.y - port.size.height / 2.0 - 9.0, "middle"),
            Side::Bottom => (center.x, center.y + port.size.height / 2.0 + 9.0, "middle"),
            Side::Left => (
                center.x - port.size.width / 2.0 - tw / 2.0 - 6.0,
                center.y,
                "middle",
            ),
            Side::Right => (
                center.x + port.size.width / 2.0 + tw / 2.0 + 6.0,
                center.y,
                "middle",
            ),
        };
        let _ = write!(
            out,
            r#"<rect class="port-label-bg" x="{}" y="{}" width="{}" height="{}" rx="3" fill="{}"/><text class="port-label" x="{}" y="{}" text-anchor="{}">{}</text>"#,
            fmt(cx - tw / 2.0 - 3.0),
            fmt(cy - 7.0),
            fmt(tw + 6.0),
            fmt(14.0),
            self.theme.label_bg,
            fmt(cx),
            fmt(cy + 3.5),
            anchor,
            escape_xml(&port.label),
        );
        out
    }
}

/// Inline icon scaled into a `target`-sized box at `origin`.
fn icon_markup(
    icon: &IconEntry,
    origin: Point,
    target: f64,
    class: &str,
    extra_attrs: &str,
    color: &str,
) -> String {
    let vb_extent = icon
        .view_box
        .split_whitespace()
        .nth(2)
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(48.0);
    let scale = target / vb_extent;
    format!(
        r#"<g class="{}"{} transform="translate({},{}) scale({})" fill="{}" stroke="{}">{}</g>"#,
        class,
        extra_attrs,
        fmt(origin.x),
        fmt(origin.y),
        fmt(scale),
        color,
        color,
        icon.body,
    )
}

/// Stacked label lines; the first line is the bold device name.
fn label_markup(label: &Label, center_x: f64, top: f64) -> String {
    let mut out = String::new();
    for (index, line) in label.lines().iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let class = if index == 0 { "node-label-bold" } else { "node-label" };
        let _ = write!(
            out,
            r#"<text class="{}" x="{}" y="{}">{}</text>"#,
            class,
            fmt(center_x),
            fmt(top + index as f64 * LINE_HEIGHT + 12.0),
            escape_xml(line),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LayoutMetadata, Node, Size};
    use indexmap::IndexMap;

    fn single_node_layout() -> (Graph, LayoutResult) {
        let mut graph = Graph::default();
        graph.nodes.push(Node::new("sw1").with_label("Switch 1"));
        let mut nodes = IndexMap::new();
        nodes.insert(
            "sw1".to_string(),
            LayoutNode {
                id: "sw1".to_string(),
                position: Point::new(110.0, 86.0),
                size: Size::new(120.0, 72.0),
                ports: IndexMap::new(),
                node: graph.nodes[0].clone(),
            },
        );
        let layout = LayoutResult {
            nodes,
            links: IndexMap::new(),
            subgraphs: IndexMap::new(),
            bounds: Rect::new(0.0, 0.0, 220.0, 172.0),
            metadata: LayoutMetadata::default(),
        };
        (graph, layout)
    }

    #[test]
    fn test_render_is_deterministic() {
        let (graph, layout) = single_node_layout();
        assert_eq!(render_svg(&graph, &layout), render_svg(&graph, &layout));
    }

    #[test]
    fn test_render_carries_data_ids() {
        let (graph, layout) = single_node_layout();
        let svg = render_svg(&graph, &layout);
        assert!(svg.contains(r#"data-id="sw1""#));
        assert!(svg.contains(r#"viewBox="0 0 220 172""#));
        assert!(svg.contains("Switch 1"));
    }
}

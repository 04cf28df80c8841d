//! Deterministic grid fallback, used when the solver is unavailable or
//! fails unrecoverably. Nodes keep their estimated sizes and flow into a
//! four-column grid in input order; links are direct segments.

use indexmap::IndexMap;

use super::plan::LayoutPlan;
use super::{ports, LayoutConfig};
use crate::graph;
use crate::model::{
    Graph, LayoutLink, LayoutMetadata, LayoutNode, LayoutResult, LayoutSubgraph, Point, Rect,
};

pub(crate) const GRID_COLUMNS: usize = 4;

pub(crate) fn grid_layout(
    graph: &Graph,
    plan: &LayoutPlan,
    config: &LayoutConfig,
    warnings: Vec<String>,
    duration_ms: f64,
) -> LayoutResult {
    if plan.nodes.is_empty() {
        let mut result = LayoutResult::empty("fallback-grid");
        result.metadata.issues = plan.issues.clone();
        result.metadata.warnings = warnings;
        result.metadata.duration_ms = duration_ms;
        result.metadata.node_spacing = plan.node_spacing;
        result.metadata.rank_spacing = plan.rank_spacing;
        return result;
    }

    let cell_width = plan
        .nodes
        .values()
        .map(|p| p.size.width)
        .fold(0.0_f64, f64::max)
        + plan.node_spacing;
    let cell_height = plan
        .nodes
        .values()
        .map(|p| p.size.height)
        .fold(0.0_f64, f64::max)
        + plan.rank_spacing;

    let mut nodes: IndexMap<String, LayoutNode> = IndexMap::new();
    for (index, (id, node_plan)) in plan.nodes.iter().enumerate() {
        let column = index % GRID_COLUMNS;
        let row = index / GRID_COLUMNS;
        let center = Point::new(
            column as f64 * cell_width + cell_width / 2.0,
            row as f64 * cell_height + cell_height / 2.0,
        );
        nodes.insert(
            id.clone(),
            LayoutNode {
                id: id.clone(),
                position: center,
                size: node_plan.size,
                ports: ports::place_ports(node_plan.size, &node_plan.ports, config),
                node: node_plan.node.clone(),
            },
        );
    }

    // Direct start -> end segments, anchored at the port when one exists,
    // otherwise clipped to the node boundary.
    let mut links: IndexMap<String, LayoutLink> = IndexMap::new();
    for link_plan in &plan.links {
        let (Some(from_node), Some(to_node)) = (
            nodes.get(&link_plan.from.node),
            nodes.get(&link_plan.to.node),
        ) else {
            continue;
        };
        let from_center = from_node.position;
        let to_center = to_node.position;
        let start = link_plan
            .from
            .port
            .as_deref()
            .and_then(|p| from_node.port_center(p))
            .unwrap_or_else(|| clip_to_bounds(from_node.bounds(), from_center, to_center));
        let end = link_plan
            .to
            .port
            .as_deref()
            .and_then(|p| to_node.port_center(p))
            .unwrap_or_else(|| clip_to_bounds(to_node.bounds(), to_center, from_center));
        links.insert(
            link_plan.id.clone(),
            LayoutLink {
                id: link_plan.id.clone(),
                from: link_plan.from.node.clone(),
                to: link_plan.to.node.clone(),
                from_endpoint: link_plan.from.clone(),
                to_endpoint: link_plan.to.clone(),
                points: vec![start, end],
                link: link_plan.link.clone(),
            },
        );
    }

    // Group boxes cover their member nodes.
    let mut subgraphs: IndexMap<String, LayoutSubgraph> = IndexMap::new();
    for subgraph in &graph.subgraphs {
        let mut bounds: Option<Rect> = None;
        for layout_node in nodes.values() {
            let member = layout_node
                .node
                .parent
                .as_deref()
                .map(|p| graph::is_descendant(p, &subgraph.id))
                .unwrap_or(false);
            if member {
                let rect = layout_node.bounds_with_ports();
                bounds = Some(match bounds {
                    Some(b) => b.union(&rect),
                    None => rect,
                });
            }
        }
        if let Some(b) = bounds {
            let padded = b.expand(config.subgraph_padding);
            subgraphs.insert(
                subgraph.id.clone(),
                LayoutSubgraph {
                    id: subgraph.id.clone(),
                    bounds: Rect::new(
                        padded.x,
                        padded.y - config.subgraph_label_height,
                        padded.width,
                        padded.height + config.subgraph_label_height,
                    ),
                    subgraph: subgraph.clone(),
                },
            );
        }
    }

    let mut bounds: Option<Rect> = None;
    for layout_node in nodes.values() {
        let rect = layout_node.bounds_with_ports();
        bounds = Some(match bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }
    for layout_subgraph in subgraphs.values() {
        bounds = Some(match bounds {
            Some(b) => b.union(&layout_subgraph.bounds),
            None => layout_subgraph.bounds,
        });
    }
    let bounds = bounds
        .unwrap_or_else(|| Rect::new(0.0, 0.0, 400.0, 300.0))
        .expand(config.bounds_margin);

    LayoutResult {
        nodes,
        links,
        subgraphs,
        bounds,
        metadata: LayoutMetadata {
            algorithm: "fallback-grid".to_string(),
            duration_ms,
            node_spacing: plan.node_spacing,
            rank_spacing: plan.rank_spacing,
            issues: plan.issues.clone(),
            warnings,
        },
    }
}

/// Intersection of the segment `from -> to` with the boundary of `rect`,
/// assuming `from` is the rect center.
fn clip_to_bounds(rect: Rect, from: Point, to: Point) -> Point {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    if dx.abs() < f64::EPSILON && dy.abs() < f64::EPSILON {
        return from;
    }
    let mut t = f64::INFINITY;
    if dx.abs() > f64::EPSILON {
        t = t.min((rect.width / 2.0) / dx.abs());
    }
    if dy.abs() > f64::EPSILON {
        t = t.min((rect.height / 2.0) / dy.abs());
    }
    Point::new(from.x + dx * t, from.y + dy * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_hits_vertical_boundary() {
        let rect = Rect::new(0.0, 0.0, 100.0, 50.0);
        let clipped = clip_to_bounds(rect, rect.center(), Point::new(50.0, 200.0));
        assert!((clipped.y - 50.0).abs() < 1e-9);
        assert!((clipped.x - 50.0).abs() < 1e-9);
    }
}

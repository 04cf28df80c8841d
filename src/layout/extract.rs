//! Extraction of a solver response into a `LayoutResult`.
//!
//! The solver reports root-global top-left coordinates; this pass lifts
//! node centers, classifies ports to a side by proximity to the nearest
//! node edge, snaps same-subgraph route stubs to the node boundary, and
//! synthesizes a three-segment fallback route wherever the solver omitted
//! a section.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::plan::{LayoutPlan, LinkPlan};
use super::LayoutConfig;
use crate::graph;
use crate::model::{
    Direction, Graph, LayoutLink, LayoutMetadata, LayoutNode, LayoutPort, LayoutResult,
    LayoutSubgraph, Point, Rect, Side, Size,
};
use crate::solver::{SolverEdge, SolverNode};

pub(crate) fn extract(
    graph: &Graph,
    plan: &LayoutPlan,
    response: &SolverNode,
    config: &LayoutConfig,
    warnings: Vec<String>,
    duration_ms: f64,
) -> LayoutResult {
    let mut shapes: HashMap<String, &SolverNode> = HashMap::new();
    let mut edges: HashMap<String, &SolverEdge> = HashMap::new();
    collect(response, &mut shapes, &mut edges);

    // Nodes in plan order; geometry from the response.
    let mut nodes: IndexMap<String, LayoutNode> = IndexMap::new();
    for (id, node_plan) in &plan.nodes {
        let Some(shape) = shapes.get(id.as_str()) else {
            continue;
        };
        let size = Size::new(shape.width, shape.height);
        let position = Point::new(shape.x + size.width / 2.0, shape.y + size.height / 2.0);
        let mut placed: IndexMap<String, LayoutPort> = IndexMap::new();
        for port_id in node_plan.ports.keys() {
            let Some(port) = shape.ports.iter().find(|p| &p.id == port_id) else {
                continue;
            };
            let relative = Point::new(port.x, port.y);
            placed.insert(
                port_id.clone(),
                LayoutPort {
                    id: port_id.clone(),
                    label: node_plan.ports[port_id].label.clone(),
                    position: relative,
                    size: Size::new(port.width, port.height),
                    side: classify_side(relative, size),
                },
            );
        }
        nodes.insert(
            id.clone(),
            LayoutNode {
                id: id.clone(),
                position,
                size,
                ports: placed,
                node: node_plan.node.clone(),
            },
        );
    }

    // Group boxes straight from the container geometry.
    let mut subgraphs: IndexMap<String, LayoutSubgraph> = IndexMap::new();
    for subgraph in &graph.subgraphs {
        if let Some(shape) = shapes.get(subgraph.id.as_str()) {
            subgraphs.insert(
                subgraph.id.clone(),
                LayoutSubgraph {
                    id: subgraph.id.clone(),
                    bounds: Rect::new(shape.x, shape.y, shape.width, shape.height),
                    subgraph: subgraph.clone(),
                },
            );
        }
    }

    let mut links: IndexMap<String, LayoutLink> = IndexMap::new();
    for link_plan in &plan.links {
        let points = route_points(link_plan, &edges, &nodes, &subgraphs, graph, plan.direction);
        links.insert(
            link_plan.id.clone(),
            LayoutLink {
                id: link_plan.id.clone(),
                from: link_plan.from.node.clone(),
                to: link_plan.to.node.clone(),
                from_endpoint: link_plan.from.clone(),
                to_endpoint: link_plan.to.clone(),
                points,
                link: link_plan.link.clone(),
            },
        );
    }

    let mut bounds: Option<Rect> = None;
    for node in nodes.values() {
        let rect = node.bounds_with_ports();
        bounds = Some(match bounds {
            Some(b) => b.union(&rect),
            None => rect,
        });
    }
    for subgraph in subgraphs.values() {
        bounds = Some(match bounds {
            Some(b) => b.union(&subgraph.bounds),
            None => subgraph.bounds,
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
            algorithm: "layered".to_string(),
            duration_ms,
            node_spacing: plan.node_spacing,
            rank_spacing: plan.rank_spacing,
            issues: plan.issues.clone(),
            warnings,
        },
    }
}

fn collect<'a>(
    node: &'a SolverNode,
    shapes: &mut HashMap<String, &'a SolverNode>,
    edges: &mut HashMap<String, &'a SolverEdge>,
) {
    for edge in &node.edges {
        edges.insert(edge.id.clone(), edge);
    }
    for child in &node.children {
        shapes.insert(child.id.clone(), child);
        collect(child, shapes, edges);
    }
}

/// Side of the node a port belongs to, by proximity to the nearest edge.
/// `position` is relative to the node center.
fn classify_side(position: Point, size: Size) -> Side {
    let to_top = (position.y + size.height / 2.0).abs();
    let to_bottom = (position.y - size.height / 2.0).abs();
    let to_left = (position.x + size.width / 2.0).abs();
    let to_right = (position.x - size.width / 2.0).abs();
    let mut side = Side::Top;
    let mut best = to_top;
    for (candidate, distance) in [
        (Side::Bottom, to_bottom),
        (Side::Left, to_left),
        (Side::Right, to_right),
    ] {
        if distance < best {
            best = distance;
            side = candidate;
        }
    }
    side
}

fn route_points(
    link_plan: &LinkPlan,
    edges: &HashMap<String, &SolverEdge>,
    nodes: &IndexMap<String, LayoutNode>,
    subgraphs: &IndexMap<String, LayoutSubgraph>,
    graph: &Graph,
    direction: Direction,
) -> Vec<Point> {
    let mut points = edges
        .get(link_plan.id.as_str())
        .and_then(|edge| edge.sections.first())
        .map(|section| section.points())
        .unwrap_or_default();

    if points.len() < 2 {
        points = fallback_route(link_plan, nodes, subgraphs, direction);
    }

    // Clean orthogonal stubs: snap portless endpoints of same-subgraph
    // plain links to the node boundary. Cross-subgraph and HA-internal
    // routes are kept as produced.
    if points.len() >= 2 && !link_plan.ha && same_subgraph(link_plan, graph) {
        if link_plan.from.port.is_none() {
            if let Some(node) = nodes.get(&link_plan.from.node) {
                snap_to_boundary(&mut points[0], node.bounds(), direction);
            }
        }
        if link_plan.to.port.is_none() {
            if let Some(node) = nodes.get(&link_plan.to.node) {
                let last = points.len() - 1;
                snap_to_boundary(&mut points[last], node.bounds(), direction);
            }
        }
    }

    points
}

fn same_subgraph(link_plan: &LinkPlan, graph: &Graph) -> bool {
    if link_plan.from_subgraph || link_plan.to_subgraph {
        return false;
    }
    let parent_of = |node_id: &str| -> Option<String> {
        graph
            .node(node_id)
            .and_then(|n| n.parent.as_deref())
            .and_then(|p| graph::resolve_parent(graph, p))
            .map(|s| s.id.clone())
    };
    parent_of(&link_plan.from.node) == parent_of(&link_plan.to.node)
}

fn snap_to_boundary(point: &mut Point, bounds: Rect, direction: Direction) {
    if direction.is_vertical() {
        let to_top = (point.y - bounds.y).abs();
        let to_bottom = (point.y - bounds.bottom()).abs();
        point.y = if to_bottom <= to_top {
            bounds.bottom()
        } else {
            bounds.y
        };
    } else {
        let to_left = (point.x - bounds.x).abs();
        let to_right = (point.x - bounds.right()).abs();
        point.x = if to_right <= to_left {
            bounds.right()
        } else {
            bounds.x
        };
    }
}

/// Three-segment orthogonal route through the rank midpoint, used when
/// the solver omitted a section.
fn fallback_route(
    link_plan: &LinkPlan,
    nodes: &IndexMap<String, LayoutNode>,
    subgraphs: &IndexMap<String, LayoutSubgraph>,
    direction: Direction,
) -> Vec<Point> {
    let rect_of = |node_id: &str, is_subgraph: bool| -> Option<Rect> {
        if is_subgraph {
            subgraphs.get(node_id).map(|s| s.bounds)
        } else {
            nodes.get(node_id).map(|n| n.bounds())
        }
    };
    let Some(from_rect) = rect_of(&link_plan.from.node, link_plan.from_subgraph) else {
        return Vec::new();
    };
    let Some(to_rect) = rect_of(&link_plan.to.node, link_plan.to_subgraph) else {
        return Vec::new();
    };

    let port_center = |node_id: &str, port: &Option<String>| -> Option<Point> {
        let port = port.as_deref()?;
        nodes.get(node_id).and_then(|n| n.port_center(port))
    };

    let start = port_center(&link_plan.from.node, &link_plan.from.port)
        .unwrap_or_else(|| facing_anchor(from_rect, to_rect, direction));
    let end = port_center(&link_plan.to.node, &link_plan.to.port)
        .unwrap_or_else(|| facing_anchor(to_rect, from_rect, direction));

    if direction.is_vertical() {
        if (start.x - end.x).abs() < 0.5 {
            return vec![start, end];
        }
        let mid = (start.y + end.y) / 2.0;
        vec![
            start,
            Point::new(start.x, mid),
            Point::new(end.x, mid),
            end,
        ]
    } else {
        if (start.y - end.y).abs() < 0.5 {
            return vec![start, end];
        }
        let mid = (start.x + end.x) / 2.0;
        vec![
            start,
            Point::new(mid, start.y),
            Point::new(mid, end.y),
            end,
        ]
    }
}

fn facing_anchor(from: Rect, toward: Rect, direction: Direction) -> Point {
    let fc = from.center();
    let tc = toward.center();
    if direction.is_vertical() {
        if tc.y >= fc.y {
            Point::new(fc.x, from.bottom())
        } else {
            Point::new(fc.x, from.y)
        }
    } else if tc.x >= fc.x {
        Point::new(from.right(), fc.y)
    } else {
        Point::new(from.x, fc.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_side_prefers_nearest_edge() {
        let size = Size::new(120.0, 72.0);
        assert_eq!(classify_side(Point::new(0.0, 42.0), size), Side::Bottom);
        assert_eq!(classify_side(Point::new(0.0, -42.0), size), Side::Top);
        assert_eq!(classify_side(Point::new(-66.0, 0.0), size), Side::Left);
        assert_eq!(classify_side(Point::new(66.0, 0.0), size), Side::Right);
    }
}

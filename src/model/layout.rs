//! Realized geometry produced by the layout engine and consumed by the
//! renderer and the sheet builder.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, Size};
use super::{Link, LinkEndpoint, Node, Subgraph};
use crate::graph::GraphIssue;

/// Which side of a node a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, Side::Left | Side::Right)
    }
}

/// A placed port. `position` is relative to the owning node's center; the
/// port body sits just outside the node boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutPort {
    pub id: String,
    pub label: String,
    pub position: Point,
    pub size: Size,
    pub side: Side,
}

/// A placed node. `position` is the node center in root-global space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub position: Point,
    pub size: Size,
    pub ports: IndexMap<String, LayoutPort>,
    pub node: Node,
}

impl LayoutNode {
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.position, self.size)
    }

    /// Node bounds extended to cover the bodies of all external ports.
    pub fn bounds_with_ports(&self) -> Rect {
        let mut rect = self.bounds();
        for port in self.ports.values() {
            let center = Point::new(
                self.position.x + port.position.x,
                self.position.y + port.position.y,
            );
            rect = rect.union(&Rect::from_center(center, port.size));
        }
        rect
    }

    /// Absolute center of a port, if the node has it.
    pub fn port_center(&self, port_id: &str) -> Option<Point> {
        self.ports.get(port_id).map(|p| {
            Point::new(
                self.position.x + p.position.x,
                self.position.y + p.position.y,
            )
        })
    }
}

/// A routed link. `points` holds the start, any bends, and the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutLink {
    pub id: String,
    pub from: String,
    pub to: String,
    pub from_endpoint: LinkEndpoint,
    pub to_endpoint: LinkEndpoint,
    pub points: Vec<Point>,
    pub link: Link,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutSubgraph {
    pub id: String,
    pub bounds: Rect,
    pub subgraph: Subgraph,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutMetadata {
    /// `layered` for solver output, `fallback-grid` when the grid fallback
    /// produced the geometry.
    pub algorithm: String,
    pub duration_ms: f64,
    pub node_spacing: f64,
    pub rank_spacing: f64,
    /// Malformed input elements that were skipped.
    pub issues: Vec<GraphIssue>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutResult {
    pub nodes: IndexMap<String, LayoutNode>,
    pub links: IndexMap<String, LayoutLink>,
    pub subgraphs: IndexMap<String, LayoutSubgraph>,
    pub bounds: Rect,
    pub metadata: LayoutMetadata,
}

impl LayoutResult {
    /// Result for an empty graph: empty collections, default page bounds.
    pub fn empty(algorithm: &str) -> Self {
        Self {
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            subgraphs: IndexMap::new(),
            bounds: Rect::new(0.0, 0.0, 400.0, 300.0),
            metadata: LayoutMetadata {
                algorithm: algorithm.to_string(),
                ..Default::default()
            },
        }
    }
}

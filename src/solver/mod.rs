//! Layered-layout backend contract.
//!
//! The layout engine submits a tree of solver nodes (containers with
//! children, fixed ports and edges) plus a string-keyed option bag, and
//! reads back absolute coordinates and edge route sections. Backends are
//! pluggable behind [`LayeredLayoutSolver`]; solver-specific types never
//! leak into the public data model.

pub mod layered;

pub use layered::LayeredSolver;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Point, Side};

/// String-typed option bag, mirrored after the option maps of layered
/// layout libraries.
pub type LayoutOptions = IndexMap<String, String>;

/// Option keys the reference backend understands.
pub mod options {
    pub const ALGORITHM: &str = "algorithm";
    pub const DIRECTION: &str = "direction";
    pub const SPACING_NODE_NODE: &str = "spacing.nodeNode";
    pub const SPACING_RANK: &str = "spacing.nodeNodeBetweenLayers";
    pub const SPACING_EDGE_NODE: &str = "spacing.edgeNode";
    pub const SPACING_EDGE_EDGE: &str = "spacing.edgeEdge";
    pub const EDGE_ROUTING: &str = "edgeRouting";
    pub const PORT_CONSTRAINTS: &str = "portConstraints";
    pub const PORT_ORDERING: &str = "judiciousPortOrdering";
    pub const PARTITIONING: &str = "partitioning.activate";
    pub const PARTITION: &str = "partitioning.partition";
    pub const HIERARCHY_HANDLING: &str = "hierarchyHandling";
    pub const COMPACTION: &str = "compaction";
    pub const PADDING: &str = "padding";
    pub const LABEL_HEADROOM: &str = "labelHeadroom";
}

/// A node in the solver request/response tree. Leaf nodes carry fixed
/// sizes; containers carry children and the edges declared at their
/// level. Response coordinates (`x`, `y`) are the top-left corner in
/// root-global space.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub labels: Vec<String>,
    pub ports: Vec<SolverPort>,
    pub children: Vec<SolverNode>,
    pub edges: Vec<SolverEdge>,
    pub layout_options: LayoutOptions,
}

impl SolverNode {
    pub fn leaf(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            ..Default::default()
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.layout_options.get(key).map(|s| s.as_str())
    }

    pub fn option_f64(&self, key: &str) -> Option<f64> {
        self.option(key).and_then(|v| v.parse().ok())
    }

    /// Apply an option to this node and every descendant container.
    pub fn set_option_recursive(&mut self, key: &str, value: &str) {
        self.layout_options
            .insert(key.to_string(), value.to_string());
        for child in &mut self.children {
            if !child.children.is_empty() {
                child.set_option_recursive(key, value);
            }
        }
    }
}

/// A fixed port on a solver node. Request positions are relative to the
/// node center; the response keeps them relative so side classification
/// stays local to the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverPort {
    pub id: String,
    pub width: f64,
    pub height: f64,
    pub side: Side,
    pub x: f64,
    pub y: f64,
    pub labels: Vec<String>,
}

/// An edge between two endpoint references. Each reference is either a
/// bare node id or `node:port`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverEdge {
    pub id: String,
    pub sources: Vec<String>,
    pub targets: Vec<String>,
    pub labels: Vec<String>,
    pub sections: Vec<SolverSection>,
}

impl SolverEdge {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sources: vec![source.into()],
            targets: vec![target.into()],
            ..Default::default()
        }
    }
}

/// Split an endpoint reference into node id and optional port id.
pub fn split_endpoint_ref(r: &str) -> (&str, Option<&str>) {
    match r.split_once(':') {
        Some((node, port)) => (node, Some(port)),
        None => (r, None),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverSection {
    pub start_point: Point,
    pub end_point: Point,
    pub bend_points: Vec<Point>,
}

impl SolverSection {
    pub fn points(&self) -> Vec<Point> {
        let mut points = Vec::with_capacity(self.bend_points.len() + 2);
        points.push(self.start_point);
        points.extend(self.bend_points.iter().copied());
        points.push(self.end_point);
        points
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    /// A documented backend pathology on certain HA topologies; the
    /// engine retries once with compaction disabled.
    #[error("scanline constraint violated: {0}")]
    ScanlineConstraint(String),
    #[error("solver failed: {0}")]
    Failed(String),
    #[error("solver call cancelled")]
    Cancelled,
}

/// A pluggable layered-layout backend. The solve call is the layout
/// engine's one suspension point; implementations must be abortable by
/// dropping the returned future.
#[async_trait]
pub trait LayeredLayoutSolver: Send + Sync {
    async fn solve(&self, request: SolverNode) -> Result<SolverNode, SolverError>;
}

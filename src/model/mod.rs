//! Graph data model for network topology diagrams.
//!
//! Everything in this module is a plain value type: a `Graph` is the
//! declarative input (devices, cables, groupings), the `layout` submodule
//! holds the realized geometry produced by the layout engine. Collection
//! order is significant throughout; the layout and the renderer both
//! iterate in the order elements were declared.

pub mod geometry;
pub mod layout;

pub use geometry::{Point, Rect, Size};
pub use layout::{
    LayoutLink, LayoutMetadata, LayoutNode, LayoutPort, LayoutResult, LayoutSubgraph, Side,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rect,
    Rounded,
    Circle,
    Diamond,
    Hexagon,
    Cylinder,
    Stadium,
    Trapezoid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    #[default]
    Solid,
    Dashed,
    Thick,
    Double,
    Invisible,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arrow {
    #[default]
    None,
    Forward,
    Back,
    Both,
}

/// Link capacity class. Rendered as that many parallel strokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bandwidth {
    #[serde(rename = "1G")]
    OneG,
    #[serde(rename = "10G")]
    TenG,
    #[serde(rename = "25G")]
    TwentyFiveG,
    #[serde(rename = "40G")]
    FortyG,
    #[serde(rename = "100G")]
    HundredG,
}

impl Bandwidth {
    pub const ALL: [Bandwidth; 5] = [
        Bandwidth::OneG,
        Bandwidth::TenG,
        Bandwidth::TwentyFiveG,
        Bandwidth::FortyG,
        Bandwidth::HundredG,
    ];

    pub fn stroke_count(&self) -> usize {
        match self {
            Bandwidth::OneG => 1,
            Bandwidth::TenG => 2,
            Bandwidth::TwentyFiveG => 3,
            Bandwidth::FortyG => 4,
            Bandwidth::HundredG => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Bandwidth::OneG => "1G",
            Bandwidth::TenG => "10G",
            Bandwidth::TwentyFiveG => "25G",
            Bandwidth::FortyG => "40G",
            Bandwidth::HundredG => "100G",
        }
    }
}

/// Redundancy protocol tag. A tagged link implies its two endpoints form
/// an HA pair and are laid out co-planar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Redundancy {
    Ha,
    Vc,
    Vss,
    Vpc,
    Mlag,
    Stack,
    #[serde(untagged)]
    Other(String),
}

impl Redundancy {
    /// Visual default when the link does not set an explicit type.
    pub fn default_link_type(&self) -> LinkType {
        match self {
            Redundancy::Stack => LinkType::Thick,
            Redundancy::Other(_) => LinkType::Solid,
            _ => LinkType::Double,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    #[serde(rename = "TB")]
    Tb,
    #[serde(rename = "BT")]
    Bt,
    #[serde(rename = "LR")]
    Lr,
    #[serde(rename = "RL")]
    Rl,
}

impl Direction {
    /// True when ranks stack vertically (top-bottom or bottom-top).
    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Tb | Direction::Bt)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Tb => "TB",
            Direction::Bt => "BT",
            Direction::Lr => "LR",
            Direction::Rl => "RL",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRouting {
    #[default]
    Orthogonal,
    Polyline,
    Splines,
    Straight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// A display label: either one line of text or an ordered list of lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Text(String),
    Lines(Vec<String>),
}

impl Label {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Label::Text(s) => vec![s.as_str()],
            Label::Lines(lines) => lines.iter().map(|s| s.as_str()).collect(),
        }
    }

    pub fn first_line(&self) -> &str {
        match self {
            Label::Text(s) => s,
            Label::Lines(lines) => lines.first().map(|s| s.as_str()).unwrap_or(""),
        }
    }

    pub fn line_count(&self) -> usize {
        match self {
            Label::Text(_) => 1,
            Label::Lines(lines) => lines.len().max(1),
        }
    }

    pub fn longest_line_chars(&self) -> usize {
        self.lines()
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
    }
}

impl Default for Label {
    fn default() -> Self {
        Label::Text(String::new())
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        Label::Text(s.to_string())
    }
}

impl From<String> for Label {
    fn from(s: String) -> Self {
        Label::Text(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub dasharray: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkStyle {
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub dasharray: Option<String>,
    pub min_length: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelPosition {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubgraphStyle {
    pub fill: Option<String>,
    pub stroke: Option<String>,
    pub padding: Option<f64>,
    pub node_spacing: Option<f64>,
    pub rank_spacing: Option<f64>,
    pub label_position: Option<LabelPosition>,
}

/// A device or abstract endpoint in the topology.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: Option<Label>,
    pub shape: NodeShape,
    /// Device-class tag (`router`, `switch`, `firewall`, ...) used for the
    /// default icon when no explicit icon key is set.
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub vendor: Option<String>,
    pub service: Option<String>,
    pub model: Option<String>,
    pub resource: Option<String>,
    /// Optional layer hint: nodes sharing a rank are forced onto one layer.
    pub rank: Option<i32>,
    /// Containing subgraph id, possibly slash-nested (`dc1/rack2`).
    pub parent: Option<String>,
    pub style: NodeStyle,
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_shape(mut self, shape: NodeShape) -> Self {
        self.shape = shape;
        self
    }

    /// Label to draw: explicit label, falling back to the id.
    pub fn display_label(&self) -> Label {
        self.label
            .clone()
            .unwrap_or_else(|| Label::Text(self.id.clone()))
    }

    /// Icon lookup key in precedence order, if any icon applies.
    pub fn icon_key(&self) -> Option<&str> {
        self.resource
            .as_deref()
            .or(self.model.as_deref())
            .or(self.service.as_deref())
            .or(self.vendor.as_deref())
            .or(self.device_type.as_deref())
    }
}

/// One end of a link. Deserializes from a bare `"node"` / `"node:port"`
/// string or from the full structured form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LinkEndpoint {
    pub node: String,
    pub port: Option<String>,
    pub ip: Option<String>,
    /// Pin reference into a subgraph: `node` names the subgraph, `pin` is
    /// resolved through its pin table to a `device:port` binding.
    pub pin: Option<String>,
}

impl LinkEndpoint {
    pub fn node(id: impl Into<String>) -> Self {
        Self {
            node: id.into(),
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointRef {
    Id(String),
    Endpoint(LinkEndpoint),
}

impl EndpointRef {
    /// Normalize to the structured form. Bare `"node:port"` strings split
    /// on the first colon.
    pub fn to_endpoint(&self) -> LinkEndpoint {
        match self {
            EndpointRef::Id(s) => match s.split_once(':') {
                Some((node, port)) => LinkEndpoint {
                    node: node.to_string(),
                    port: Some(port.to_string()),
                    ..Default::default()
                },
                None => LinkEndpoint::node(s.clone()),
            },
            EndpointRef::Endpoint(e) => e.clone(),
        }
    }

    pub fn node_id(&self) -> String {
        self.to_endpoint().node
    }
}

impl From<&str> for EndpointRef {
    fn from(s: &str) -> Self {
        EndpointRef::Id(s.to_string())
    }
}

impl From<LinkEndpoint> for EndpointRef {
    fn from(e: LinkEndpoint) -> Self {
        EndpointRef::Endpoint(e)
    }
}

/// A cable between two endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(default)]
    pub id: Option<String>,
    pub from: EndpointRef,
    pub to: EndpointRef,
    #[serde(default)]
    pub label: Option<Label>,
    #[serde(default, rename = "type")]
    pub link_type: Option<LinkType>,
    #[serde(default)]
    pub arrow: Option<Arrow>,
    #[serde(default)]
    pub bandwidth: Option<Bandwidth>,
    #[serde(default)]
    pub redundancy: Option<Redundancy>,
    #[serde(default)]
    pub vlan: Vec<u32>,
    #[serde(default)]
    pub style: LinkStyle,
}

impl Link {
    pub fn new(from: impl Into<EndpointRef>, to: impl Into<EndpointRef>) -> Self {
        Self {
            id: None,
            from: from.into(),
            to: to.into(),
            label: None,
            link_type: None,
            arrow: None,
            bandwidth: None,
            redundancy: None,
            vlan: Vec::new(),
            style: LinkStyle::default(),
        }
    }

    pub fn with_redundancy(mut self, redundancy: Redundancy) -> Self {
        self.redundancy = Some(redundancy);
        self
    }

    pub fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = Some(bandwidth);
        self
    }

    pub fn is_redundancy(&self) -> bool {
        self.redundancy.is_some()
    }

    /// Explicit type, else the redundancy default, else solid.
    pub fn effective_type(&self) -> LinkType {
        if let Some(t) = self.link_type {
            return t;
        }
        self.redundancy
            .as_ref()
            .map(|r| r.default_link_type())
            .unwrap_or_default()
    }

    pub fn effective_arrow(&self) -> Arrow {
        self.arrow.unwrap_or_default()
    }

    pub fn stroke_count(&self) -> usize {
        self.bandwidth.map(|b| b.stroke_count()).unwrap_or(1)
    }
}

/// A rectangular grouping of nodes and nested subgraphs. Ids may be
/// slash-nested; the parent is the prefix up to the last slash unless set
/// explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Subgraph {
    pub id: String,
    pub label: Option<Label>,
    pub parent: Option<String>,
    pub direction: Option<Direction>,
    /// Marks the subgraph as a navigable sheet root; defaults to the id
    /// for top-level subgraphs during sheet building.
    pub file: Option<String>,
    /// Pin name -> `device:port` binding, for links targeting the group.
    pub pins: IndexMap<String, String>,
    pub style: SubgraphStyle,
    pub vendor: Option<String>,
    pub service: Option<String>,
    pub model: Option<String>,
    pub resource: Option<String>,
}

impl Subgraph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn display_label(&self) -> Label {
        self.label
            .clone()
            .unwrap_or_else(|| Label::Text(self.id.clone()))
    }

    pub fn icon_key(&self) -> Option<&str> {
        self.resource
            .as_deref()
            .or(self.model.as_deref())
            .or(self.service.as_deref())
            .or(self.vendor.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphSettings {
    pub direction: Direction,
    pub theme: Theme,
    pub node_spacing: Option<f64>,
    pub rank_spacing: Option<f64>,
    pub edge_routing: EdgeRouting,
    pub legend: Option<LegendPosition>,
}

/// The declarative input: a pile of nodes, links and groupings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Graph {
    pub name: Option<String>,
    pub settings: GraphSettings,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub subgraphs: Vec<Subgraph>,
}

impl Graph {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn subgraph(&self, id: &str) -> Option<&Subgraph> {
        self.subgraphs.iter().find(|s| s.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_ref_splits_port() {
        let e = EndpointRef::Id("sw1:ge-0/0/1".to_string()).to_endpoint();
        assert_eq!(e.node, "sw1");
        assert_eq!(e.port.as_deref(), Some("ge-0/0/1"));
    }

    #[test]
    fn test_link_type_defaults_follow_redundancy() {
        let mut link = Link::new("a", "b").with_redundancy(Redundancy::Vpc);
        assert_eq!(link.effective_type(), LinkType::Double);
        link.redundancy = Some(Redundancy::Stack);
        assert_eq!(link.effective_type(), LinkType::Thick);
        link.link_type = Some(LinkType::Dashed);
        assert_eq!(link.effective_type(), LinkType::Dashed);
    }

    #[test]
    fn test_label_deserializes_from_string_or_lines() {
        let single: Label = serde_json::from_str("\"core-1\"").unwrap();
        assert_eq!(single.lines(), vec!["core-1"]);
        let multi: Label = serde_json::from_str("[\"core-1\", \"10.0.0.1\"]").unwrap();
        assert_eq!(multi.line_count(), 2);
    }

    #[test]
    fn test_bandwidth_stroke_counts() {
        let counts: Vec<usize> = Bandwidth::ALL.iter().map(|b| b.stroke_count()).collect();
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    }
}

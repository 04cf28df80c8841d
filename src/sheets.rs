//! Hierarchical sheet builder.
//!
//! Splits a root graph into navigable sheets: the root sheet verbatim,
//! plus one sheet per top-level subgraph with its content renormalized to
//! stand alone. Edges crossing a sheet's boundary are represented by
//! virtual export connectors: one stadium node per (direction,
//! counterpart) group and one dashed forward link per member edge.

use async_trait::async_trait;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::graph;
use crate::layout::HierarchicalLayout;
use crate::model::{
    Arrow, EndpointRef, Graph, Label, LayoutResult, Link, LinkEndpoint, LinkType, Node, NodeShape,
    Subgraph,
};

pub const ROOT_SHEET_ID: &str = "root";
/// Prefixes of synthesized elements; consumers can filter them out.
pub const EXPORT_NODE_PREFIX: &str = "__export_";
pub const EXPORT_LINK_PREFIX: &str = "__export_link_";

/// One navigable view: the root graph or a top-level subgraph expanded
/// with export connectors.
#[derive(Debug, Clone)]
pub struct SheetData {
    pub id: String,
    pub label: String,
    pub parent_id: Option<String>,
    pub graph: Graph,
    pub layout: LayoutResult,
}

/// Seam for the per-sheet sub-layout; tests inject deterministic engines.
#[async_trait]
pub trait LayoutEngine: Send + Sync {
    async fn layout_async(&self, graph: &Graph) -> LayoutResult;
}

#[async_trait]
impl LayoutEngine for HierarchicalLayout {
    async fn layout_async(&self, graph: &Graph) -> LayoutResult {
        HierarchicalLayout::layout_async(self, graph).await
    }
}

/// Build the sheet map: always a `root` sheet, plus one sheet per
/// top-level subgraph (its `file` attribute, defaulting to its id).
pub async fn build_hierarchical_sheets(
    graph: &Graph,
    root_layout: LayoutResult,
    engine: &dyn LayoutEngine,
) -> IndexMap<String, SheetData> {
    let mut sheets: IndexMap<String, SheetData> = IndexMap::new();
    sheets.insert(
        ROOT_SHEET_ID.to_string(),
        SheetData {
            id: ROOT_SHEET_ID.to_string(),
            label: graph.name.clone().unwrap_or_else(|| "root".to_string()),
            parent_id: None,
            graph: graph.clone(),
            layout: root_layout,
        },
    );

    for subgraph in &graph.subgraphs {
        if !graph::is_top_level(graph, subgraph) {
            continue;
        }
        let sheet_id = subgraph.file.clone().unwrap_or_else(|| subgraph.id.clone());
        if sheets.contains_key(&sheet_id) {
            warn!(sheet = sheet_id.as_str(), "duplicate sheet id; skipping");
            continue;
        }
        let child_graph = build_child_graph(graph, subgraph);
        debug!(
            sheet = sheet_id.as_str(),
            nodes = child_graph.nodes.len(),
            links = child_graph.links.len(),
            "laying out child sheet"
        );
        let layout = engine.layout_async(&child_graph).await;
        sheets.insert(
            sheet_id.clone(),
            SheetData {
                id: sheet_id,
                label: subgraph.display_label().first_line().to_string(),
                parent_id: Some(ROOT_SHEET_ID.to_string()),
                graph: child_graph,
                layout,
            },
        );
    }

    sheets
}

/// Self-contained graph for one top-level subgraph: its nodes and direct
/// child subgraphs with the parent prefix stripped, internal links, and
/// export connectors for every boundary-crossing link.
fn build_child_graph(graph: &Graph, subgraph: &Subgraph) -> Graph {
    let prefix = &subgraph.id;
    let nested_prefix = format!("{}/", prefix);

    let inside = |node: &Node| -> bool {
        node.parent
            .as_deref()
            .map(|p| graph::is_descendant(p, prefix))
            .unwrap_or(false)
    };

    let mut child = Graph {
        name: Some(subgraph.display_label().first_line().to_string()),
        settings: graph.settings.clone(),
        nodes: Vec::new(),
        links: Vec::new(),
        subgraphs: Vec::new(),
    };
    if let Some(direction) = subgraph.direction {
        child.settings.direction = direction;
    }

    // Nodes, with the sheet prefix stripped from their parents.
    for node in graph.nodes.iter().filter(|n| inside(n)) {
        let mut node = node.clone();
        node.parent = node.parent.as_deref().and_then(|p| {
            if p == prefix {
                None
            } else {
                p.strip_prefix(&nested_prefix).map(|s| s.to_string())
            }
        });
        child.nodes.push(node);
    }

    // Direct child subgraphs only; deeper nesting re-resolves through the
    // renormalized ids.
    for nested in &graph.subgraphs {
        let Some(suffix) = nested.id.strip_prefix(&nested_prefix) else {
            continue;
        };
        if suffix.contains('/') {
            continue;
        }
        let mut nested = nested.clone();
        nested.id = suffix.to_string();
        nested.parent = None;
        child.subgraphs.push(nested);
    }

    // Internal links stay; boundary links become export connectors.
    let mut crossings: Vec<Crossing> = Vec::new();
    for link in &graph.links {
        let from = resolve_device(graph, &link.from);
        let to = resolve_device(graph, &link.to);
        let (Some(from), Some(to)) = (from, to) else { continue };
        let from_inside = graph.node(&from.node).map(inside).unwrap_or(false);
        let to_inside = graph.node(&to.node).map(inside).unwrap_or(false);
        match (from_inside, to_inside) {
            (true, true) => child.links.push(link.clone()),
            (true, false) => crossings.push(Crossing {
                inside: from,
                counterpart: to,
                outgoing: true,
            }),
            (false, true) => crossings.push(Crossing {
                inside: to,
                counterpart: from,
                outgoing: false,
            }),
            (false, false) => {}
        }
    }

    add_export_connectors(graph, &mut child, crossings);
    child
}

struct Crossing {
    inside: LinkEndpoint,
    counterpart: LinkEndpoint,
    outgoing: bool,
}

/// Group boundary crossings by (direction, counterpart top-level
/// subgraph) and synthesize one stadium connector node per group plus one
/// dashed forward-arrow link per member.
fn add_export_connectors(graph: &Graph, child: &mut Graph, crossings: Vec<Crossing>) {
    let mut groups: IndexMap<String, Vec<Crossing>> = IndexMap::new();
    for crossing in crossings {
        let counterpart_top = counterpart_top_level(graph, &crossing.counterpart);
        let direction = if crossing.outgoing { "out" } else { "in" };
        let key = format!("{}_{}", direction, counterpart_top);
        groups.entry(key).or_default().push(crossing);
    }

    for (key, members) in groups {
        let connector_id = format!("{}{}", EXPORT_NODE_PREFIX, key);
        let counterpart_top = counterpart_top_level(graph, &members[0].counterpart);

        let label = connector_label(graph, &counterpart_top, &members);
        let mut connector = Node::new(connector_id.clone())
            .with_label(label)
            .with_shape(NodeShape::Stadium);
        connector.metadata.insert(
            "export.subgraph".to_string(),
            serde_json::Value::String(counterpart_top),
        );
        let targets: Vec<serde_json::Value> = members
            .iter()
            .map(|m| {
                let port = m.counterpart.port.as_deref().unwrap_or("");
                serde_json::Value::String(if port.is_empty() {
                    m.counterpart.node.clone()
                } else {
                    format!("{}:{}", m.counterpart.node, port)
                })
            })
            .collect();
        connector.metadata.insert(
            "export.targets".to_string(),
            serde_json::Value::Array(targets),
        );
        child.nodes.push(connector);

        for (index, member) in members.iter().enumerate() {
            let device = EndpointRef::Endpoint(member.inside.clone());
            let connector_ref = EndpointRef::Id(connector_id.clone());
            let (from, to) = if member.outgoing {
                (device, connector_ref)
            } else {
                (connector_ref, device)
            };
            let mut link = Link::new(from, to);
            link.id = Some(format!("{}{}_{}", EXPORT_LINK_PREFIX, key, index));
            link.link_type = Some(LinkType::Dashed);
            link.arrow = Some(Arrow::Forward);
            child.links.push(link);
        }
    }
}

/// Top-level subgraph the counterpart endpoint belongs to, or `root`.
fn counterpart_top_level(graph: &Graph, counterpart: &LinkEndpoint) -> String {
    graph
        .node(&counterpart.node)
        .and_then(|n| n.parent.as_deref())
        .map(graph::top_level)
        .map(|s| s.to_string())
        .unwrap_or_else(|| "root".to_string())
}

fn connector_label(graph: &Graph, counterpart_top: &str, members: &[Crossing]) -> Label {
    if let Some(subgraph) = graph.subgraph(counterpart_top) {
        return Label::Text(subgraph.display_label().first_line().to_string());
    }
    // Root-level counterpart: name the device when the group is uniform.
    let first = &members[0].counterpart.node;
    if members.iter().all(|m| &m.counterpart.node == first) {
        if let Some(node) = graph.node(first) {
            return Label::Text(node.display_label().first_line().to_string());
        }
    }
    Label::Text("root".to_string())
}

/// Re-prefix a renormalized child-sheet id back into root-graph form.
/// Inverse of the prefix stripping done during sheet extraction.
pub fn denormalize_id(sheet_subgraph: &str, child_id: &str) -> String {
    format!("{}/{}", sheet_subgraph, child_id)
}

pub fn is_export_node(id: &str) -> bool {
    id.starts_with(EXPORT_NODE_PREFIX)
}

pub fn is_export_link(id: &str) -> bool {
    id.starts_with(EXPORT_LINK_PREFIX)
}

fn resolve_device(graph: &Graph, r: &EndpointRef) -> Option<LinkEndpoint> {
    graph::resolve_endpoint(graph, r).ok()
}

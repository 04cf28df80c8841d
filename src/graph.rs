//! Graph utilities: subgraph hierarchy traversal, endpoint resolution,
//! link-id generation and input validation.
//!
//! Subgraph ids may be slash-nested (`cloud/aws/vpc`). Traversal goes
//! through the helpers here; raw string manipulation is confined to the
//! ingest/egress boundaries (sheet renormalization).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{EndpointRef, Graph, LinkEndpoint, Subgraph};

/// A malformed input element the layout engine skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphIssue {
    pub element: String,
    pub reason: String,
}

impl GraphIssue {
    pub fn new(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            element: element.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("link endpoint references unknown node `{0}`")]
    UnknownEndpoint(String),
    #[error("malformed pin `{pin}` on subgraph `{subgraph}`: {reason}")]
    MalformedPin {
        subgraph: String,
        pin: String,
        reason: String,
    },
}

/// Top-level segment of a possibly nested subgraph id.
pub fn top_level(id: &str) -> &str {
    id.split('/').next().unwrap_or(id)
}

/// Parent id of a nested subgraph id: the prefix up to the last slash.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once('/').map(|(prefix, _)| prefix)
}

/// True when `id` equals `ancestor` or sits anywhere below it.
pub fn is_descendant(id: &str, ancestor: &str) -> bool {
    id == ancestor || id.starts_with(&format!("{}/", ancestor))
}

/// Effective parent of a subgraph: the explicit field, else the slash
/// prefix of its id.
pub fn subgraph_parent(subgraph: &Subgraph) -> Option<String> {
    subgraph
        .parent
        .clone()
        .or_else(|| parent_id(&subgraph.id).map(|p| p.to_string()))
}

/// Direct child subgraphs of `parent` (one level down only).
pub fn direct_children<'a>(graph: &'a Graph, parent: &str) -> Vec<&'a Subgraph> {
    graph
        .subgraphs
        .iter()
        .filter(|s| subgraph_parent(s).as_deref() == Some(parent))
        .collect()
}

/// True when the subgraph has no parent among the graph's subgraphs.
pub fn is_top_level(graph: &Graph, subgraph: &Subgraph) -> bool {
    match subgraph_parent(subgraph) {
        None => true,
        Some(p) => graph.subgraph(&p).is_none(),
    }
}

/// Resolve a node's parent to a subgraph in the same graph. A nested
/// parent id resolves if the exact id exists, or via its top-level
/// segment.
pub fn resolve_parent<'a>(graph: &'a Graph, parent: &str) -> Option<&'a Subgraph> {
    graph
        .subgraph(parent)
        .or_else(|| graph.subgraph(top_level(parent)))
}

/// Any top-level subgraph present means the graph splits into navigable
/// sheets.
pub fn has_hierarchical_content(graph: &Graph) -> bool {
    graph.subgraphs.iter().any(|s| is_top_level(graph, s))
}

/// Stable id for a link: the explicit id, else `{from}-{to}-{index}` from
/// the link's position in the input sequence.
pub fn effective_link_id(link: &crate::model::Link, index: usize) -> String {
    link.id.clone().unwrap_or_else(|| {
        format!(
            "{}-{}-{}",
            link.from.node_id(),
            link.to.node_id(),
            index
        )
    })
}

/// Normalize an endpoint reference and resolve pin references through the
/// subgraph pin table. The returned endpoint always names a device.
pub fn resolve_endpoint(graph: &Graph, r: &EndpointRef) -> Result<LinkEndpoint, GraphError> {
    let endpoint = r.to_endpoint();

    if let Some(pin) = &endpoint.pin {
        let subgraph = graph.subgraph(&endpoint.node).ok_or_else(|| {
            GraphError::MalformedPin {
                subgraph: endpoint.node.clone(),
                pin: pin.clone(),
                reason: "subgraph not found".to_string(),
            }
        })?;
        let binding = subgraph.pins.get(pin).ok_or_else(|| GraphError::MalformedPin {
            subgraph: subgraph.id.clone(),
            pin: pin.clone(),
            reason: "pin not declared".to_string(),
        })?;
        let (device, port) =
            binding
                .split_once(':')
                .ok_or_else(|| GraphError::MalformedPin {
                    subgraph: subgraph.id.clone(),
                    pin: pin.clone(),
                    reason: format!("binding `{}` is not device:port", binding),
                })?;
        if !graph.has_node(device) {
            return Err(GraphError::UnknownEndpoint(device.to_string()));
        }
        return Ok(LinkEndpoint {
            node: device.to_string(),
            port: Some(port.to_string()),
            ip: endpoint.ip.clone(),
            pin: None,
        });
    }

    if !graph.has_node(&endpoint.node) {
        return Err(GraphError::UnknownEndpoint(endpoint.node.clone()));
    }
    Ok(endpoint)
}

/// Validate a graph, returning one issue per offending element. The
/// layout engine skips these elements and carries the list in its result
/// metadata.
pub fn validate(graph: &Graph) -> Vec<GraphIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for node in &graph.nodes {
        if !seen.insert(node.id.as_str()) {
            issues.push(GraphIssue::new(
                node.id.clone(),
                "duplicate node id".to_string(),
            ));
        }
        if let Some(parent) = &node.parent {
            if resolve_parent(graph, parent).is_none() {
                issues.push(GraphIssue::new(
                    node.id.clone(),
                    format!("unknown parent subgraph `{}`", parent),
                ));
            }
        }
    }

    for (index, link) in graph.links.iter().enumerate() {
        let id = effective_link_id(link, index);
        for r in [&link.from, &link.to] {
            // Links may target a subgraph box directly; that is not
            // dangling.
            let endpoint = r.to_endpoint();
            if endpoint.pin.is_none() && graph.subgraph(&endpoint.node).is_some() {
                continue;
            }
            if let Err(e) = resolve_endpoint(graph, r) {
                issues.push(GraphIssue::new(id.clone(), e.to_string()));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Node};

    fn sample_graph() -> Graph {
        let mut graph = Graph::default();
        graph.subgraphs.push(Subgraph::new("dc1"));
        graph.subgraphs.push(Subgraph::new("dc1/rack1"));
        graph.nodes.push(Node::new("sw1").with_parent("dc1/rack1"));
        graph.nodes.push(Node::new("core"));
        graph.links.push(Link::new("sw1", "core"));
        graph
    }

    #[test]
    fn test_hierarchy_helpers() {
        assert_eq!(top_level("dc1/rack1/shelf"), "dc1");
        assert_eq!(parent_id("dc1/rack1"), Some("dc1"));
        assert_eq!(parent_id("dc1"), None);
        assert!(is_descendant("dc1/rack1", "dc1"));
        assert!(!is_descendant("dc10", "dc1"));
    }

    #[test]
    fn test_validate_accepts_nested_parent() {
        let graph = sample_graph();
        assert!(validate(&graph).is_empty());
    }

    #[test]
    fn test_validate_flags_dangling_endpoint() {
        let mut graph = sample_graph();
        graph.links.push(Link::new("sw1", "ghost"));
        let issues = validate(&graph);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].reason.contains("ghost"));
    }

    #[test]
    fn test_pin_resolution() {
        let mut graph = sample_graph();
        graph.subgraphs[0]
            .pins
            .insert("uplink".to_string(), "sw1:xe-0/0/0".to_string());
        let r = EndpointRef::Endpoint(LinkEndpoint {
            node: "dc1".to_string(),
            pin: Some("uplink".to_string()),
            ..Default::default()
        });
        let resolved = resolve_endpoint(&graph, &r).unwrap();
        assert_eq!(resolved.node, "sw1");
        assert_eq!(resolved.port.as_deref(), Some("xe-0/0/0"));
    }
}

//! Pre-solver planning: validated nodes and links, port assignments and
//! estimated sizes, all in input order.

use indexmap::IndexMap;

use super::ports::{self, HaPair};
use super::{sizing, LayoutConfig};
use crate::graph::{self, GraphIssue};
use crate::model::{Direction, Graph, Link, LinkEndpoint, Node, Side, Size};

#[derive(Debug, Clone)]
pub(crate) struct PortPlan {
    pub id: String,
    pub label: String,
    pub side: Side,
}

#[derive(Debug, Clone)]
pub(crate) struct NodePlan {
    pub node: Node,
    pub size: Size,
    pub ports: IndexMap<String, PortPlan>,
}

#[derive(Debug, Clone)]
pub(crate) struct LinkPlan {
    pub id: String,
    pub link: Link,
    pub from: LinkEndpoint,
    pub to: LinkEndpoint,
    /// Endpoint targets a subgraph box rather than a device.
    pub from_subgraph: bool,
    pub to_subgraph: bool,
    /// Set when the link is the internal edge of an HA pair.
    pub ha: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct LayoutPlan {
    pub nodes: IndexMap<String, NodePlan>,
    pub links: Vec<LinkPlan>,
    pub pairs: Vec<HaPair>,
    pub issues: Vec<GraphIssue>,
    pub direction: Direction,
    pub node_spacing: f64,
    pub rank_spacing: f64,
}

/// Build the layout plan: skip malformed elements (listing them as
/// issues), resolve endpoints, detect HA pairs, assign port sides and
/// estimate node sizes.
pub(crate) fn build_plan(graph: &Graph, config: &LayoutConfig) -> LayoutPlan {
    let issues = graph::validate(graph);
    let direction = graph.settings.direction;

    // Nodes, first occurrence wins on duplicate ids.
    let mut nodes: IndexMap<String, NodePlan> = IndexMap::new();
    for node in &graph.nodes {
        nodes.entry(node.id.clone()).or_insert_with(|| NodePlan {
            node: node.clone(),
            size: Size::default(),
            ports: IndexMap::new(),
        });
    }

    // Links with resolvable endpoints. A bare subgraph id is a valid
    // endpoint (the link attaches to the group box).
    let mut links: Vec<LinkPlan> = Vec::new();
    for (index, link) in graph.links.iter().enumerate() {
        let id = graph::effective_link_id(link, index);
        let mut resolved = Vec::with_capacity(2);
        let mut ok = true;
        for r in [&link.from, &link.to] {
            let raw = r.to_endpoint();
            if raw.pin.is_none() && graph.subgraph(&raw.node).is_some() {
                resolved.push((raw, true));
                continue;
            }
            match graph::resolve_endpoint(graph, r) {
                Ok(endpoint) => resolved.push((endpoint, false)),
                Err(_) => {
                    ok = false;
                    break;
                }
            }
        }
        if !ok {
            // Already reported by validate(); just skip.
            continue;
        }
        let (to, to_subgraph) = resolved.pop().unwrap();
        let (from, from_subgraph) = resolved.pop().unwrap();
        links.push(LinkPlan {
            id,
            link: link.clone(),
            from,
            to,
            from_subgraph,
            to_subgraph,
            ha: false,
        });
    }

    let pairs = ports::detect_ha_pairs(&links);

    // Mark HA internal edges: redundancy links whose endpoints are
    // exactly one pair.
    for link in &mut links {
        if link.link.is_redundancy() {
            if let Some(pair) = ports::pair_of(&pairs, &link.from.node) {
                link.ha = pair.contains(&link.to.node) && link.from.node != link.to.node;
            }
        }
    }

    assign_ports(&mut nodes, &mut links, &pairs, direction);

    // Sizes depend on labels, icons and the planned ports.
    for plan in nodes.values_mut() {
        plan.size = sizing::estimate_size(&plan.node, &plan.ports, config);
    }

    LayoutPlan {
        nodes,
        links,
        pairs,
        issues,
        direction,
        node_spacing: graph.settings.node_spacing.unwrap_or(config.node_spacing),
        rank_spacing: graph.settings.rank_spacing.unwrap_or(config.rank_spacing),
    }
}

/// Assign a side to every named port, in link order. HA links synthesize
/// facing ports even when unnamed; plain links only get ports their
/// endpoints name. The first side assignment for a port id wins.
fn assign_ports(
    nodes: &mut IndexMap<String, NodePlan>,
    links: &mut [LinkPlan],
    pairs: &[HaPair],
    direction: Direction,
) {
    for (index, link) in links.iter_mut().enumerate() {
        if link.ha {
            let pair = ports::pair_of(pairs, &link.from.node).expect("ha link has a pair");
            let (from_side, to_side) = ports::ha_sides(direction);
            let (from_side, to_side) = if link.from.node == pair.left {
                (from_side, to_side)
            } else {
                (to_side, from_side)
            };
            if link.from.port.is_none() {
                link.from.port = Some(format!("__ha_{}", index));
            }
            if link.to.port.is_none() {
                link.to.port = Some(format!("__ha_{}", index));
            }
            add_port(nodes, &link.from, from_side);
            add_port(nodes, &link.to, to_side);
            continue;
        }
        if !link.from_subgraph && link.from.port.is_some() {
            add_port(nodes, &link.from, ports::source_side(direction));
        }
        if !link.to_subgraph && link.to.port.is_some() {
            add_port(nodes, &link.to, ports::target_side(direction));
        }
    }
}

fn add_port(nodes: &mut IndexMap<String, NodePlan>, endpoint: &LinkEndpoint, side: Side) {
    let Some(port) = &endpoint.port else { return };
    let Some(plan) = nodes.get_mut(&endpoint.node) else { return };
    let label = if port.starts_with("__ha_") {
        String::new()
    } else {
        port.clone()
    };
    plan.ports.entry(port.clone()).or_insert_with(|| PortPlan {
        id: port.clone(),
        label,
        side,
    });
}

//! Multi-source graph merge.
//!
//! Combines a base graph with any number of overlays. Each overlay either
//! carries explicit merge rules (match strategy, on-match and on-unmatched
//! behavior) or falls back to the legacy id-collision strategy. Incidents
//! are reported, not raised; the only raising path is the `error`
//! collision strategy.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::{Graph, Label, Node, NodeShape, Subgraph};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSource {
    pub name: String,
    pub graph: Graph,
    #[serde(default)]
    pub rules: Option<MergeRules>,
}

impl GraphSource {
    pub fn new(name: impl Into<String>, graph: Graph) -> Self {
        Self {
            name: name.into(),
            graph,
            rules: None,
        }
    }

    pub fn with_rules(mut self, rules: MergeRules) -> Self {
        self.rules = Some(rules);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    #[default]
    Id,
    Name,
    Attribute,
    Manual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnMatch {
    #[default]
    MergeProperties,
    KeepBase,
    KeepOverlay,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OnUnmatched {
    #[default]
    AddToRoot,
    AddToSubgraph,
    Ignore,
}

/// Legacy id-collision handling, used when an overlay has no rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeIdConflict {
    #[default]
    KeepFirst,
    KeepLast,
    PrefixSource,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeRules {
    #[serde(rename = "match")]
    pub match_by: MatchStrategy,
    /// Dotted metadata path for `match = attribute`.
    pub match_attribute: Option<String>,
    /// Overlay id -> base id for `match = manual`.
    pub manual_map: IndexMap<String, String>,
    pub on_match: OnMatch,
    pub on_unmatched: OnUnmatched,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MergeOptions {
    pub node_id_conflict: NodeIdConflict,
}

#[derive(Debug, Error)]
pub enum MergeError {
    #[error("node id `{id}` from source `{source_name}` conflicts with an existing node")]
    NodeIdConflict { id: String, source_name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStats {
    pub accepted_nodes: usize,
    pub accepted_links: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkipReport {
    pub source: String,
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeResult {
    pub graph: Graph,
    pub sources: IndexMap<String, SourceStats>,
    pub skipped_nodes: Vec<SkipReport>,
    pub skipped_links: Vec<SkipReport>,
    /// Overlay id -> merged id for every matched or renamed node.
    pub applied_id_mappings: IndexMap<String, String>,
}

/// Merge N source graphs. The first source is the base; later sources
/// overlay it in order.
pub fn merge_graphs(
    sources: &[GraphSource],
    options: &MergeOptions,
) -> Result<MergeResult, MergeError> {
    let mut result = MergeResult::default();
    let Some((base, overlays)) = sources.split_first() else {
        return Ok(result);
    };

    result.graph = base.graph.clone();
    result.sources.insert(
        base.name.clone(),
        SourceStats {
            accepted_nodes: base.graph.nodes.len(),
            accepted_links: base.graph.links.len(),
        },
    );

    for overlay in overlays {
        let stats = match &overlay.rules {
            Some(rules) => merge_overlay(&mut result, overlay, rules)?,
            None => merge_legacy(&mut result, overlay, options.node_id_conflict)?,
        };
        result.sources.insert(overlay.name.clone(), stats);
    }

    Ok(result)
}

fn merge_overlay(
    result: &mut MergeResult,
    overlay: &GraphSource,
    rules: &MergeRules,
) -> Result<SourceStats, MergeError> {
    let mut stats = SourceStats::default();
    let mut mapping: IndexMap<String, String> = IndexMap::new();

    for node in &overlay.graph.nodes {
        match find_match(&result.graph, node, rules) {
            Some(base_id) => {
                mapping.insert(node.id.clone(), base_id.clone());
                result
                    .applied_id_mappings
                    .insert(node.id.clone(), base_id.clone());
                stats.accepted_nodes += 1;
                let base_node = result
                    .graph
                    .nodes
                    .iter_mut()
                    .find(|n| n.id == base_id)
                    .expect("matched node exists");
                match rules.on_match {
                    OnMatch::KeepBase => {}
                    OnMatch::MergeProperties => merge_node_properties(base_node, node),
                    OnMatch::KeepOverlay => {
                        let mut replacement = node.clone();
                        replacement.id = base_id;
                        *base_node = replacement;
                    }
                }
            }
            None => match rules.on_unmatched {
                OnUnmatched::Ignore => {
                    result.skipped_nodes.push(SkipReport {
                        source: overlay.name.clone(),
                        id: node.id.clone(),
                        reason: "unmatched".to_string(),
                    });
                }
                OnUnmatched::AddToRoot | OnUnmatched::AddToSubgraph => {
                    if result.graph.has_node(&node.id) {
                        result.skipped_nodes.push(SkipReport {
                            source: overlay.name.clone(),
                            id: node.id.clone(),
                            reason: "id already present in merged graph".to_string(),
                        });
                        continue;
                    }
                    let mut node = node.clone();
                    if rules.on_unmatched == OnUnmatched::AddToSubgraph {
                        let container = source_subgraph(&mut result.graph, &overlay.name);
                        let keep = node
                            .parent
                            .as_deref()
                            .map(|p| crate::graph::resolve_parent(&result.graph, p).is_some())
                            .unwrap_or(false);
                        if !keep {
                            node.parent = Some(container);
                        }
                    }
                    stats.accepted_nodes += 1;
                    result.graph.nodes.push(node);
                }
            },
        }
    }

    // Subgraphs union by id, base wins on collision.
    for subgraph in &overlay.graph.subgraphs {
        if result.graph.subgraph(&subgraph.id).is_none() {
            result.graph.subgraphs.push(subgraph.clone());
        }
    }

    copy_links(result, overlay, &mapping, &mut stats);
    Ok(stats)
}

fn merge_legacy(
    result: &mut MergeResult,
    overlay: &GraphSource,
    conflict: NodeIdConflict,
) -> Result<SourceStats, MergeError> {
    let mut stats = SourceStats::default();
    let mut mapping: IndexMap<String, String> = IndexMap::new();

    for node in &overlay.graph.nodes {
        if !result.graph.has_node(&node.id) {
            stats.accepted_nodes += 1;
            result.graph.nodes.push(node.clone());
            continue;
        }
        match conflict {
            NodeIdConflict::KeepFirst => {
                result.skipped_nodes.push(SkipReport {
                    source: overlay.name.clone(),
                    id: node.id.clone(),
                    reason: "id conflict (keep-first)".to_string(),
                });
            }
            NodeIdConflict::KeepLast => {
                let existing = result
                    .graph
                    .nodes
                    .iter_mut()
                    .find(|n| n.id == node.id)
                    .expect("conflicting node exists");
                *existing = node.clone();
                stats.accepted_nodes += 1;
            }
            NodeIdConflict::PrefixSource => {
                let renamed = format!("{}__{}", overlay.name, node.id);
                mapping.insert(node.id.clone(), renamed.clone());
                result
                    .applied_id_mappings
                    .insert(node.id.clone(), renamed.clone());
                let mut node = node.clone();
                node.id = renamed;
                stats.accepted_nodes += 1;
                result.graph.nodes.push(node);
            }
            NodeIdConflict::Error => {
                return Err(MergeError::NodeIdConflict {
                    id: node.id.clone(),
                    source_name: overlay.name.clone(),
                });
            }
        }
    }

    for subgraph in &overlay.graph.subgraphs {
        if result.graph.subgraph(&subgraph.id).is_none() {
            result.graph.subgraphs.push(subgraph.clone());
        }
    }

    copy_links(result, overlay, &mapping, &mut stats);
    Ok(stats)
}

/// Copy overlay links with endpoints remapped through the id-translation
/// table; links that do not resolve after the merge are skipped and
/// reported.
fn copy_links(
    result: &mut MergeResult,
    overlay: &GraphSource,
    mapping: &IndexMap<String, String>,
    stats: &mut SourceStats,
) {
    for (index, link) in overlay.graph.links.iter().enumerate() {
        let mut link = link.clone();
        let mut resolvable = true;
        for endpoint_ref in [&mut link.from, &mut link.to] {
            let mut endpoint = endpoint_ref.to_endpoint();
            if let Some(mapped) = mapping.get(&endpoint.node) {
                endpoint.node = mapped.clone();
            }
            if !result.graph.has_node(&endpoint.node)
                && result.graph.subgraph(&endpoint.node).is_none()
            {
                resolvable = false;
            }
            *endpoint_ref = crate::model::EndpointRef::Endpoint(endpoint);
        }
        if resolvable {
            stats.accepted_links += 1;
            result.graph.links.push(link);
        } else {
            let id = crate::graph::effective_link_id(&link, index);
            debug!(link = id.as_str(), source = overlay.name.as_str(), "skipping unresolvable link");
            result.skipped_links.push(SkipReport {
                source: overlay.name.clone(),
                id,
                reason: "endpoint not resolvable after merge".to_string(),
            });
        }
    }
}

fn find_match(base: &Graph, node: &Node, rules: &MergeRules) -> Option<String> {
    match rules.match_by {
        MatchStrategy::Id => base.node(&node.id).map(|n| n.id.clone()),
        MatchStrategy::Name => {
            let wanted = normalized_name(node);
            base.nodes
                .iter()
                .find(|n| normalized_name(n) == wanted)
                .map(|n| n.id.clone())
        }
        MatchStrategy::Attribute => {
            let path = rules.match_attribute.as_deref()?;
            let wanted = metadata_at(node, path)?;
            base.nodes
                .iter()
                .find(|n| metadata_at(n, path) == Some(wanted.clone()))
                .map(|n| n.id.clone())
        }
        MatchStrategy::Manual => {
            let target = rules.manual_map.get(&node.id)?;
            base.node(target).map(|n| n.id.clone())
        }
    }
}

fn normalized_name(node: &Node) -> String {
    node.display_label()
        .first_line()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Value at a dotted path into node metadata.
fn metadata_at(node: &Node, path: &str) -> Option<serde_json::Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = node.metadata.get(first)?.clone();
    for segment in segments {
        current = current.get(segment)?.clone();
    }
    Some(current)
}

/// Shallow merge: overlay wins on scalar fields, metadata maps merge
/// shallowly, the base id is preserved.
fn merge_node_properties(base: &mut Node, overlay: &Node) {
    if overlay.label.is_some() {
        base.label = overlay.label.clone();
    }
    if overlay.shape != NodeShape::default() {
        base.shape = overlay.shape;
    }
    if overlay.device_type.is_some() {
        base.device_type = overlay.device_type.clone();
    }
    if overlay.vendor.is_some() {
        base.vendor = overlay.vendor.clone();
    }
    if overlay.service.is_some() {
        base.service = overlay.service.clone();
    }
    if overlay.model.is_some() {
        base.model = overlay.model.clone();
    }
    if overlay.resource.is_some() {
        base.resource = overlay.resource.clone();
    }
    if overlay.rank.is_some() {
        base.rank = overlay.rank;
    }
    if overlay.parent.is_some() {
        base.parent = overlay.parent.clone();
    }
    if overlay.style.fill.is_some() {
        base.style.fill = overlay.style.fill.clone();
    }
    if overlay.style.stroke.is_some() {
        base.style.stroke = overlay.style.stroke.clone();
    }
    if overlay.style.stroke_width.is_some() {
        base.style.stroke_width = overlay.style.stroke_width;
    }
    if overlay.style.dasharray.is_some() {
        base.style.dasharray = overlay.style.dasharray.clone();
    }
    for (key, value) in &overlay.metadata {
        base.metadata.insert(key.clone(), value.clone());
    }
}

/// Synthesized subgraph for unmatched nodes of a source; created once.
fn source_subgraph(graph: &mut Graph, source: &str) -> String {
    let id = source.replace([' ', '/'], "-");
    if graph.subgraph(&id).is_none() {
        graph
            .subgraphs
            .push(Subgraph::new(id.clone()).with_label(Label::Text(source.to_string())));
    }
    id
}

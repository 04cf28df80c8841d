use nettopo::merge::{
    merge_graphs, GraphSource, MatchStrategy, MergeError, MergeOptions, MergeRules,
    NodeIdConflict, OnMatch, OnUnmatched,
};
use nettopo::model::{Graph, Link, Node};

fn base_graph() -> Graph {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("fw-a").with_label("Firewall A"));
    graph.nodes.push(Node::new("core").with_label("Core"));
    graph.links.push(Link::new("fw-a", "core"));
    graph
}

fn overlay_graph() -> Graph {
    let mut graph = Graph::default();
    let mut fw = Node::new("fw_primary").with_label("Firewall A");
    fw.metadata.insert(
        "vendor".to_string(),
        serde_json::Value::String("cisco".to_string()),
    );
    graph.nodes.push(fw);
    graph.links.push(Link::new("fw_primary", "fw_primary"));
    graph
}

#[test]
fn test_merge_by_name_combines_properties() {
    let overlay = GraphSource::new("inventory", overlay_graph()).with_rules(MergeRules {
        match_by: MatchStrategy::Name,
        on_match: OnMatch::MergeProperties,
        ..Default::default()
    });
    let sources = vec![GraphSource::new("base", base_graph()), overlay];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    assert_eq!(result.graph.nodes.len(), 2, "matched node merged, not added");

    let fw = result.graph.node("fw-a").expect("base id preserved");
    assert_eq!(fw.display_label().first_line(), "Firewall A");
    assert_eq!(
        fw.metadata.get("vendor"),
        Some(&serde_json::Value::String("cisco".to_string()))
    );
    assert_eq!(
        result.applied_id_mappings.get("fw_primary").map(|s| s.as_str()),
        Some("fw-a")
    );
}

#[test]
fn test_keep_base_is_left_biased() {
    let mut overlay = overlay_graph();
    overlay.nodes[0].label = Some("Totally Different".into());
    // Match manually so the divergent label cannot break the match.
    let mut manual = MergeRules {
        match_by: MatchStrategy::Manual,
        on_match: OnMatch::KeepBase,
        ..Default::default()
    };
    manual
        .manual_map
        .insert("fw_primary".to_string(), "fw-a".to_string());
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("inventory", overlay).with_rules(manual),
    ];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    let fw = result.graph.node("fw-a").unwrap();
    assert_eq!(fw.display_label().first_line(), "Firewall A");
    assert!(fw.metadata.get("vendor").is_none(), "metadata untouched too");
}

#[test]
fn test_unmatched_nodes_go_to_source_subgraph() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("probe-1"));
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("netbox", overlay).with_rules(MergeRules {
            match_by: MatchStrategy::Id,
            on_unmatched: OnUnmatched::AddToSubgraph,
            ..Default::default()
        }),
    ];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    let probe = result.graph.node("probe-1").unwrap();
    assert_eq!(probe.parent.as_deref(), Some("netbox"));
    assert!(result.graph.subgraph("netbox").is_some());
}

#[test]
fn test_unmatched_ignore_reports_skip() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("probe-1"));
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("netbox", overlay).with_rules(MergeRules {
            on_unmatched: OnUnmatched::Ignore,
            ..Default::default()
        }),
    ];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    assert!(result.graph.node("probe-1").is_none());
    assert_eq!(result.skipped_nodes.len(), 1);
    assert_eq!(result.skipped_nodes[0].reason, "unmatched");
}

#[test]
fn test_overlay_links_are_remapped_through_translations() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("fw_primary").with_label("Firewall A"));
    overlay.nodes.push(Node::new("edge-1"));
    overlay.links.push(Link::new("fw_primary", "edge-1"));

    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("inventory", overlay).with_rules(MergeRules {
            match_by: MatchStrategy::Name,
            ..Default::default()
        }),
    ];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    let remapped = result
        .graph
        .links
        .iter()
        .find(|l| l.to.node_id() == "edge-1")
        .expect("overlay link kept");
    assert_eq!(remapped.from.node_id(), "fw-a");
}

#[test]
fn test_unresolvable_overlay_link_is_skipped_and_reported() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("edge-1"));
    overlay.links.push(Link::new("edge-1", "ghost"));
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("inventory", overlay),
    ];

    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    assert_eq!(result.skipped_links.len(), 1);
    assert!(result.skipped_links[0].reason.contains("not resolvable"));
}

#[test]
fn test_legacy_keep_first_and_keep_last() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("fw-a").with_label("Replacement"));

    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("second", overlay.clone()),
    ];
    let keep_first = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    assert_eq!(
        keep_first.graph.node("fw-a").unwrap().display_label().first_line(),
        "Firewall A"
    );
    assert_eq!(keep_first.skipped_nodes.len(), 1);

    let keep_last = merge_graphs(
        &sources,
        &MergeOptions {
            node_id_conflict: NodeIdConflict::KeepLast,
        },
    )
    .unwrap();
    assert_eq!(
        keep_last.graph.node("fw-a").unwrap().display_label().first_line(),
        "Replacement"
    );
}

#[test]
fn test_legacy_prefix_source_renames_and_remaps() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("fw-a").with_label("Other FW"));
    overlay.nodes.push(Node::new("edge-1"));
    overlay.links.push(Link::new("fw-a", "edge-1"));

    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("second", overlay),
    ];
    let result = merge_graphs(
        &sources,
        &MergeOptions {
            node_id_conflict: NodeIdConflict::PrefixSource,
        },
    )
    .unwrap();

    assert!(result.graph.node("second__fw-a").is_some());
    assert_eq!(
        result.applied_id_mappings.get("fw-a").map(|s| s.as_str()),
        Some("second__fw-a")
    );
    let remapped = result
        .graph
        .links
        .iter()
        .find(|l| l.to.node_id() == "edge-1")
        .unwrap();
    assert_eq!(remapped.from.node_id(), "second__fw-a");
}

#[test]
fn test_legacy_error_strategy_raises() {
    let mut overlay = Graph::default();
    overlay.nodes.push(Node::new("fw-a"));
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("second", overlay),
    ];
    let err = merge_graphs(
        &sources,
        &MergeOptions {
            node_id_conflict: NodeIdConflict::Error,
        },
    )
    .unwrap_err();
    assert!(matches!(err, MergeError::NodeIdConflict { .. }));
}

#[test]
fn test_merge_reports_per_source_counts() {
    let sources = vec![
        GraphSource::new("base", base_graph()),
        GraphSource::new("second", overlay_graph()),
    ];
    let result = merge_graphs(&sources, &MergeOptions::default()).unwrap();
    assert_eq!(result.sources["base"].accepted_nodes, 2);
    assert_eq!(result.sources["base"].accepted_links, 1);
    assert_eq!(result.sources["second"].accepted_nodes, 1);
}

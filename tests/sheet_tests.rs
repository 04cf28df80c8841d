use nettopo::model::{Arrow, Graph, Link, LinkType, Node, NodeShape, Subgraph};
use nettopo::sheets::{
    build_hierarchical_sheets, denormalize_id, is_export_link, is_export_node,
};
use nettopo::HierarchicalLayout;

fn hierarchical_graph() -> Graph {
    let mut graph = Graph::default();
    graph.subgraphs.push(Subgraph::new("dc1").with_label("DC 1"));
    graph.nodes.push(Node::new("leaf1").with_parent("dc1"));
    graph.nodes.push(Node::new("leaf2").with_parent("dc1"));
    graph.nodes.push(Node::new("core"));
    graph.links.push(Link::new("leaf1", "core"));
    graph.links.push(Link::new("leaf2", "core"));
    graph
}

#[tokio::test]
async fn test_root_sheet_plus_one_per_top_level_subgraph() {
    let graph = hierarchical_graph();
    let engine = HierarchicalLayout::new();
    let root_layout = engine.layout_async(&graph).await;
    let sheets = build_hierarchical_sheets(&graph, root_layout, &engine).await;

    assert_eq!(sheets.len(), 2);
    assert!(sheets.contains_key("root"));
    assert!(sheets.contains_key("dc1"));
    assert_eq!(sheets["dc1"].parent_id.as_deref(), Some("root"));
    assert_eq!(sheets["dc1"].label, "DC 1");

    // The root sheet keeps the original graph: group box, external peer
    // and the two crossing links.
    let root = &sheets["root"];
    assert_eq!(root.graph.nodes.len(), 3);
    assert_eq!(root.graph.links.len(), 2);
    assert!(root.layout.subgraphs.contains_key("dc1"));
}

#[tokio::test]
async fn test_child_sheet_synthesizes_export_connector() {
    let graph = hierarchical_graph();
    let engine = HierarchicalLayout::new();
    let root_layout = engine.layout_async(&graph).await;
    let sheets = build_hierarchical_sheets(&graph, root_layout, &engine).await;

    let dc1 = &sheets["dc1"];
    // Both crossings target the same root-level device, so they share
    // one stadium connector labeled after it.
    let connectors: Vec<&Node> = dc1
        .graph
        .nodes
        .iter()
        .filter(|n| is_export_node(&n.id))
        .collect();
    assert_eq!(connectors.len(), 1);
    let connector = connectors[0];
    assert_eq!(connector.id, "__export_out_root");
    assert_eq!(connector.shape, NodeShape::Stadium);
    assert_eq!(connector.display_label().first_line(), "core");

    let virtual_links: Vec<&Link> = dc1
        .graph
        .links
        .iter()
        .filter(|l| l.id.as_deref().map(is_export_link).unwrap_or(false))
        .collect();
    assert_eq!(virtual_links.len(), 2);
    for link in &virtual_links {
        assert_eq!(link.link_type, Some(LinkType::Dashed));
        assert_eq!(link.arrow, Some(Arrow::Forward));
        assert_eq!(link.to.node_id(), connector.id);
    }
}

#[tokio::test]
async fn test_child_sheets_are_self_contained() {
    let graph = hierarchical_graph();
    let engine = HierarchicalLayout::new();
    let root_layout = engine.layout_async(&graph).await;
    let sheets = build_hierarchical_sheets(&graph, root_layout, &engine).await;

    for (id, sheet) in &sheets {
        if id == "root" {
            continue;
        }
        let node_ids: Vec<&str> = sheet.graph.nodes.iter().map(|n| n.id.as_str()).collect();
        for link in &sheet.graph.links {
            assert!(
                node_ids.contains(&link.from.node_id().as_str()),
                "sheet {} has external from endpoint",
                id
            );
            assert!(
                node_ids.contains(&link.to.node_id().as_str()),
                "sheet {} has external to endpoint",
                id
            );
        }
    }
}

#[tokio::test]
async fn test_incoming_crossings_point_from_connector_to_device() {
    let mut graph = hierarchical_graph();
    graph.links.push(Link::new("core", "leaf1"));
    let engine = HierarchicalLayout::new();
    let root_layout = engine.layout_async(&graph).await;
    let sheets = build_hierarchical_sheets(&graph, root_layout, &engine).await;

    let dc1 = &sheets["dc1"];
    let incoming: Vec<&Link> = dc1
        .graph
        .links
        .iter()
        .filter(|l| is_export_node(&l.from.node_id()))
        .collect();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].from.node_id(), "__export_in_root");
    assert_eq!(incoming[0].to.node_id(), "leaf1");
}

#[tokio::test]
async fn test_nested_subgraph_ids_are_renormalized_invertibly() {
    let mut graph = Graph::default();
    graph.subgraphs.push(Subgraph::new("dc1"));
    graph.subgraphs.push(Subgraph::new("dc1/rack1"));
    graph.nodes.push(Node::new("r1").with_parent("dc1/rack1"));
    graph.nodes.push(Node::new("gw").with_parent("dc1"));
    graph.links.push(Link::new("r1", "gw"));

    let engine = HierarchicalLayout::new();
    let root_layout = engine.layout_async(&graph).await;
    let sheets = build_hierarchical_sheets(&graph, root_layout, &engine).await;

    let dc1 = &sheets["dc1"];
    let rack = dc1
        .graph
        .subgraphs
        .iter()
        .find(|s| s.id == "rack1")
        .expect("nested subgraph renormalized");
    assert_eq!(denormalize_id("dc1", &rack.id), "dc1/rack1");

    let r1 = dc1.graph.nodes.iter().find(|n| n.id == "r1").unwrap();
    assert_eq!(r1.parent.as_deref(), Some("rack1"));
    // The internal link stayed a plain link.
    assert_eq!(
        dc1.graph
            .links
            .iter()
            .filter(|l| l.id.as_deref().map(is_export_link).unwrap_or(false))
            .count(),
        0
    );
}

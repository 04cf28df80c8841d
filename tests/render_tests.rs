use nettopo::model::{
    Bandwidth, Graph, LegendPosition, Link, LinkEndpoint, LinkType, Node, Theme,
};
use nettopo::render::VLAN_PALETTE;
use nettopo::{render_svg, HierarchicalLayout};

fn two_node_graph() -> Graph {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("a"));
    graph.nodes.push(Node::new("b"));
    graph.links.push(Link::new("a", "b"));
    graph
}

fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

#[tokio::test]
async fn test_rendering_is_a_pure_function_of_the_layout() {
    let graph = two_node_graph();
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let first = render_svg(&graph, &layout);
    let second = render_svg(&graph, &layout);
    assert_eq!(first, second, "no wall clock or randomness in the output");
}

#[tokio::test]
async fn test_single_node_svg_has_one_node_and_no_subgraph() {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("only").with_label("Only"));
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, r#"class="node-bg""#), 1);
    assert_eq!(count(&svg, r#"class="subgraph""#), 0);
}

#[tokio::test]
async fn test_forty_gig_renders_four_parallel_strokes() {
    let mut graph = two_node_graph();
    graph.links[0].bandwidth = Some(Bandwidth::FortyG);
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, r#"<path class="link""#), 4);

    // Offsets are centered around the route at the fixed stroke spacing,
    // so the leftmost and rightmost strokes sit nine units apart.
    let link = layout.links.values().next().unwrap();
    let x = link.points[0].x;
    for offset in [-4.5, -1.5, 1.5, 4.5] {
        let expected = format!("M {} ", fmt(x + offset));
        assert!(
            svg.contains(&expected),
            "missing stroke at offset {}",
            offset
        );
    }
}

// Mirror of the renderer's coordinate formatting, for assertions.
fn fmt(value: f64) -> String {
    let mut s = format!("{:.2}", (value * 100.0).round() / 100.0);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

#[tokio::test]
async fn test_vlan_coloring_uses_sum_modulo_palette() {
    let mut graph = two_node_graph();
    graph.links[0].vlan = vec![10];
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert!(svg.contains(&format!(r#"stroke="{}""#, VLAN_PALETTE[10])));

    graph.links[0].vlan = vec![10, 20];
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert!(svg.contains(&format!(r#"stroke="{}""#, VLAN_PALETTE[30 % 12])));
    assert!(svg.contains("VLAN 10,20"));
}

#[tokio::test]
async fn test_double_type_with_bandwidth_applies_double_to_first_stroke() {
    let mut graph = two_node_graph();
    graph.links[0].link_type = Some(LinkType::Double);
    graph.links[0].bandwidth = Some(Bandwidth::TenG);
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    // Bandwidth still multiplies strokes; the double effect hits only the
    // first of the two.
    assert_eq!(count(&svg, r#"class="link-double-outer""#), 1);
    assert_eq!(count(&svg, r#"class="link-double-inner""#), 1);
    assert_eq!(count(&svg, r#"<path class="link""#), 2);
}

#[tokio::test]
async fn test_endpoint_ip_labels_are_rendered() {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("a"));
    graph.nodes.push(Node::new("b"));
    graph.links.push(Link::new(
        LinkEndpoint::node("a").with_port("eth0").with_ip("10.0.0.1"),
        LinkEndpoint::node("b").with_ip("10.0.0.2"),
    ));
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, r#"class="endpoint-label""#), 2);
    assert!(svg.contains("10.0.0.1"));
    assert!(svg.contains("10.0.0.2"));
}

#[tokio::test]
async fn test_legend_lists_used_bandwidths_outside_content() {
    let mut graph = two_node_graph();
    graph.links[0].bandwidth = Some(Bandwidth::TenG);
    graph.settings.legend = Some(LegendPosition::BottomRight);
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, r#"class="legend""#), 1);
    assert!(svg.contains(">10G</text>"));
    // The viewBox grew beyond the layout bounds to make room.
    assert!(!svg.contains(&format!(
        r#"viewBox="{} {} {} {}""#,
        fmt(layout.bounds.x),
        fmt(layout.bounds.y),
        fmt(layout.bounds.width),
        fmt(layout.bounds.height)
    )));
}

#[tokio::test]
async fn test_dark_theme_changes_palette() {
    let graph = two_node_graph();
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let light = render_svg(&graph, &layout);

    let mut dark_graph = graph.clone();
    dark_graph.settings.theme = Theme::Dark;
    let dark = render_svg(&dark_graph, &layout);
    assert_ne!(light, dark);
    assert!(dark.contains("#1c2229"));
}

#[tokio::test]
async fn test_invisible_link_emits_no_path() {
    let mut graph = two_node_graph();
    graph.links[0].link_type = Some(LinkType::Invisible);
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, r#"<path class="link""#), 0);
    assert_eq!(count(&svg, r#"class="link-group""#), 1);
}

#[tokio::test]
async fn test_shapes_render_dedicated_elements() {
    use nettopo::model::NodeShape;
    let mut graph = Graph::default();
    for (id, shape) in [
        ("r", NodeShape::Rect),
        ("c", NodeShape::Circle),
        ("d", NodeShape::Diamond),
        ("cy", NodeShape::Cylinder),
        ("s", NodeShape::Stadium),
    ] {
        graph.nodes.push(Node::new(id).with_shape(shape));
    }
    let layout = HierarchicalLayout::new().layout_async(&graph).await;
    let svg = render_svg(&graph, &layout);
    assert_eq!(count(&svg, "<circle class=\"node-bg\""), 1);
    assert_eq!(count(&svg, "<polygon class=\"node-bg\""), 1, "diamond");
    assert_eq!(count(&svg, "<g class=\"node-bg\""), 1, "cylinder group");
    assert_eq!(count(&svg, "<rect class=\"node-bg\""), 2, "rect + stadium");
}

pub mod api;
pub mod cli;
pub mod graph;
pub mod layout;
pub mod merge;
pub mod model;
pub mod render;
pub mod sheets;
pub mod solver;

// Re-export for convenience
pub use api::{render_network, Artifact, SheetArtifact};
pub use layout::{HierarchicalLayout, LayoutConfig};
pub use merge::{merge_graphs, GraphSource, MergeOptions, MergeResult};
pub use model::{Graph, LayoutResult};
pub use render::{render_svg, IconRegistry, SvgRenderer};
pub use sheets::{build_hierarchical_sheets, LayoutEngine, SheetData};
pub use solver::{LayeredLayoutSolver, LayeredSolver};

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Link, Node};

    #[tokio::test]
    async fn test_layout_and_render_two_switches() {
        let mut graph = Graph::default();
        graph.nodes.push(Node::new("sw1").with_label("Switch 1"));
        graph.nodes.push(Node::new("sw2").with_label("Switch 2"));
        graph.links.push(Link::new("sw1", "sw2"));

        let engine = HierarchicalLayout::new();
        let layout = engine.layout_async(&graph).await;
        assert_eq!(layout.nodes.len(), 2);
        assert_eq!(layout.links.len(), 1);
        assert_eq!(layout.metadata.algorithm, "layered");

        let svg = render_svg(&graph, &layout);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"data-id="sw1""#));
    }

    #[tokio::test]
    async fn test_render_network_artifact() {
        let mut graph = Graph::default();
        graph.name = Some("Lab".to_string());
        graph.nodes.push(Node::new("r1"));

        let artifact = render_network(&graph).await;
        assert_eq!(artifact.name, "Lab");
        assert!(!artifact.hierarchical);
        assert_eq!(artifact.node_count, 1);
        assert!(artifact.sheets.contains_key("root"));
    }
}

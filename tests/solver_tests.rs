use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nettopo::model::{Graph, Link, Node, Redundancy};
use nettopo::solver::{options, LayeredLayoutSolver, LayeredSolver, SolverError, SolverNode};
use nettopo::HierarchicalLayout;

struct FailingSolver;

#[async_trait]
impl LayeredLayoutSolver for FailingSolver {
    async fn solve(&self, _request: SolverNode) -> Result<SolverNode, SolverError> {
        Err(SolverError::Failed("backend unavailable".to_string()))
    }
}

/// Fails the first call with the scanline pathology, then delegates to
/// the real solver while recording the retried request.
struct ScanlineOnceSolver {
    calls: AtomicUsize,
    retried_compaction: Mutex<Option<String>>,
    inner: LayeredSolver,
}

impl ScanlineOnceSolver {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            retried_compaction: Mutex::new(None),
            inner: LayeredSolver::new(),
        }
    }
}

#[async_trait]
impl LayeredLayoutSolver for ScanlineOnceSolver {
    async fn solve(&self, request: SolverNode) -> Result<SolverNode, SolverError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(SolverError::ScanlineConstraint(
                "scanlineConstraintCalculator".to_string(),
            ));
        }
        *self.retried_compaction.lock().unwrap() = request
            .option(options::COMPACTION)
            .map(|s| s.to_string());
        self.inner.solve(request).await
    }
}

fn ha_graph() -> Graph {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("fw-a"));
    graph.nodes.push(Node::new("fw-b"));
    graph.nodes.push(Node::new("core"));
    graph
        .links
        .push(Link::new("fw-a", "fw-b").with_redundancy(Redundancy::Ha));
    graph.links.push(Link::new("fw-a", "core"));
    graph
}

#[tokio::test]
async fn test_unrecoverable_failure_degrades_to_grid() {
    let engine = HierarchicalLayout::with_solver(Arc::new(FailingSolver));
    let layout = engine.layout_async(&ha_graph()).await;
    assert_eq!(layout.metadata.algorithm, "fallback-grid");
    assert_eq!(layout.nodes.len(), 3);
    assert_eq!(layout.links.len(), 2);
    assert!(!layout.metadata.warnings.is_empty());
}

#[tokio::test]
async fn test_scanline_failure_retries_once_without_compaction() {
    let solver = Arc::new(ScanlineOnceSolver::new());
    let engine = HierarchicalLayout::with_solver(solver.clone());
    let layout = engine.layout_async(&ha_graph()).await;

    assert_eq!(solver.calls.load(Ordering::SeqCst), 2, "exactly one retry");
    assert_eq!(
        solver.retried_compaction.lock().unwrap().as_deref(),
        Some("false")
    );
    assert_eq!(layout.metadata.algorithm, "layered");
    assert!(layout.metadata.warnings.is_empty());
}

#[tokio::test]
async fn test_grid_fallback_flows_four_columns_in_input_order() {
    let mut graph = Graph::default();
    for i in 0..6 {
        graph.nodes.push(Node::new(format!("n{}", i)));
    }
    let engine = HierarchicalLayout::with_solver(Arc::new(FailingSolver));
    let layout = engine.layout_async(&graph).await;

    let x = |id: &str| layout.nodes[id].position.x;
    let y = |id: &str| layout.nodes[id].position.y;
    // Fifth node wraps to the second row, first column.
    assert!((x("n0") - x("n4")).abs() < 1e-9);
    assert!(y("n4") > y("n0"));
    assert!(x("n1") > x("n0"));
    assert!((y("n0") - y("n3")).abs() < 1e-9);
}

#[test]
fn test_synchronous_layout_returns_grid_immediately() {
    let mut graph = Graph::default();
    graph.nodes.push(Node::new("a"));
    graph.nodes.push(Node::new("b"));
    graph.links.push(Link::new("a", "b"));

    let layout = HierarchicalLayout::new().layout(&graph);
    assert_eq!(layout.metadata.algorithm, "fallback-grid");
    // Direct start -> end segment.
    assert_eq!(layout.links["a-b-0"].points.len(), 2);
}

#[tokio::test]
async fn test_solver_response_reports_root_global_edge_sections() {
    use nettopo::solver::SolverEdge;
    let mut root = SolverNode::leaf("__root", 0.0, 0.0);
    let mut group = SolverNode::leaf("group", 0.0, 0.0);
    group.children = vec![
        SolverNode::leaf("a", 100.0, 50.0),
        SolverNode::leaf("b", 100.0, 50.0),
    ];
    group.edges = vec![SolverEdge::new("a-b-0", "a", "b")];
    root.children = vec![group];

    let response = LayeredSolver::new().solve(root).await.unwrap();
    let group = &response.children[0];
    let a = &group.children[0];
    let section = &group.edges[0].sections[0];
    // The section starts on a's boundary in absolute coordinates, not in
    // container-local ones.
    assert!((section.start_point.y - (a.y + a.height)).abs() < 1e-9);
    assert!(a.y > 0.0, "nested child offset by container origin");
}

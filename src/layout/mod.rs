//! Hierarchical layout engine.
//!
//! Drives the full pipeline: validation, size estimation, port planning,
//! HA-pair containers, lowest-common-ancestor edge containment, the
//! layered solver call (with the scanline retry policy), and extraction
//! of the response into a [`LayoutResult`]. The engine never panics on a
//! well-formed graph; malformed elements are skipped and listed in the
//! result metadata, and unrecoverable solver failures degrade to a
//! deterministic grid.

pub(crate) mod extract;
pub(crate) mod fallback;
pub(crate) mod plan;
pub(crate) mod ports;
pub(crate) mod sizing;

use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::graph;
use crate::model::{EdgeRouting, Graph, LayoutResult, LinkType, Subgraph};
use crate::solver::{
    options, LayeredLayoutSolver, LayeredSolver, SolverEdge, SolverError, SolverNode, SolverPort,
};
use plan::{LayoutPlan, LinkPlan};

/// Tunable layout constants. The defaults match the standard diagram
/// metrics used by the renderer's font estimates.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    pub node_min_width: f64,
    pub node_min_height: f64,
    pub h_padding: f64,
    pub v_padding: f64,
    pub icon_size: f64,
    pub icon_label_gap: f64,
    pub icon_max_width_fraction: f64,
    pub line_height: f64,
    pub char_width: f64,
    pub port_width: f64,
    pub port_height: f64,
    pub min_port_spacing: f64,
    pub port_label_char_width: f64,
    pub port_label_padding: f64,
    pub node_spacing: f64,
    pub rank_spacing: f64,
    pub edge_edge_spacing: f64,
    pub edge_node_spacing: f64,
    pub ha_padding: f64,
    pub ha_partner_gap: f64,
    pub subgraph_padding: f64,
    pub subgraph_label_height: f64,
    pub bounds_margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_min_width: 120.0,
            node_min_height: 72.0,
            h_padding: 24.0,
            v_padding: 16.0,
            icon_size: 48.0,
            icon_label_gap: 6.0,
            icon_max_width_fraction: 0.6,
            line_height: 16.0,
            char_width: 7.2,
            port_width: 18.0,
            port_height: 12.0,
            min_port_spacing: 28.0,
            port_label_char_width: 6.0,
            port_label_padding: 8.0,
            node_spacing: 64.0,
            rank_spacing: 96.0,
            edge_edge_spacing: 12.0,
            edge_node_spacing: 16.0,
            ha_padding: 2.0,
            ha_partner_gap: 4.0,
            // Wide enough to cover outside-node port labels at the group
            // edge, not just the port bodies.
            subgraph_padding: 32.0,
            subgraph_label_height: 28.0,
            bounds_margin: 50.0,
        }
    }
}

/// The hierarchical layout engine. Holds no state across calls; multiple
/// layouts may run in parallel on independent graphs.
pub struct HierarchicalLayout {
    solver: Arc<dyn LayeredLayoutSolver>,
    config: LayoutConfig,
}

impl Default for HierarchicalLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HierarchicalLayout {
    pub fn new() -> Self {
        Self {
            solver: Arc::new(LayeredSolver::new()),
            config: LayoutConfig::default(),
        }
    }

    pub fn with_solver(solver: Arc<dyn LayeredLayoutSolver>) -> Self {
        Self {
            solver,
            config: LayoutConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Synchronous convenience: returns the deterministic grid fallback
    /// immediately. Callers that want the layered result await
    /// [`Self::layout_async`].
    pub fn layout(&self, graph: &Graph) -> LayoutResult {
        let started = Instant::now();
        let plan = plan::build_plan(graph, &self.config);
        fallback::grid_layout(
            graph,
            &plan,
            &self.config,
            Vec::new(),
            started.elapsed().as_secs_f64() * 1000.0,
        )
    }

    /// The real pipeline: plan, solve, extract. Falls back to the grid on
    /// unrecoverable solver failure instead of raising.
    pub async fn layout_async(&self, graph: &Graph) -> LayoutResult {
        let started = Instant::now();
        let plan = plan::build_plan(graph, &self.config);
        if plan.nodes.is_empty() {
            let mut result = LayoutResult::empty("layered");
            result.metadata.issues = plan.issues.clone();
            result.metadata.node_spacing = plan.node_spacing;
            result.metadata.rank_spacing = plan.rank_spacing;
            result.metadata.duration_ms = started.elapsed().as_secs_f64() * 1000.0;
            return result;
        }

        let request = self.build_request(graph, &plan);
        let mut warnings = Vec::new();
        let response = match self.solver.solve(request.clone()).await {
            Ok(response) => Some(response),
            Err(SolverError::ScanlineConstraint(message)) => {
                // Known backend pathology on certain HA topologies: retry
                // exactly once with post-layout compaction disabled for
                // the whole tree.
                warn!(message = message.as_str(), "scanline failure, retrying without compaction");
                let mut retry = request;
                retry.set_option_recursive(options::COMPACTION, "false");
                match self.solver.solve(retry).await {
                    Ok(response) => Some(response),
                    Err(e) => {
                        warnings.push(format!("solver failed after retry: {}", e));
                        None
                    }
                }
            }
            Err(e) => {
                warnings.push(format!("solver failed: {}", e));
                None
            }
        };

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        match response {
            Some(response) => {
                debug!(nodes = plan.nodes.len(), "extracting solver response");
                extract::extract(graph, &plan, &response, &self.config, warnings, duration_ms)
            }
            None => {
                warn!("using grid fallback layout");
                fallback::grid_layout(graph, &plan, &self.config, warnings, duration_ms)
            }
        }
    }

    /// Assemble the recursive container tree for the solver: subgraph
    /// containers per the hierarchy, HA containers wrapping redundancy
    /// pairs, leaves with fixed ports, and every edge declared at the
    /// lowest common ancestor of its endpoints.
    fn build_request(&self, graph: &Graph, plan: &LayoutPlan) -> SolverNode {
        let config = &self.config;

        // Direct container of every node (a resolved subgraph id), and of
        // every subgraph.
        let mut node_container: IndexMap<String, Option<String>> = IndexMap::new();
        for (id, node_plan) in &plan.nodes {
            let container = node_plan
                .node
                .parent
                .as_deref()
                .and_then(|p| graph::resolve_parent(graph, p))
                .map(|s| s.id.clone());
            node_container.insert(id.clone(), container);
        }

        // HA pairs whose partners share a container become solver
        // containers of their own.
        let mut pair_container: IndexMap<String, String> = IndexMap::new();
        for pair in &plan.pairs {
            let left = node_container.get(&pair.left).cloned().flatten();
            let right = node_container.get(&pair.right).cloned().flatten();
            if left != right {
                warn!(
                    left = pair.left.as_str(),
                    right = pair.right.as_str(),
                    "HA partners live in different subgraphs; pair not grouped"
                );
                continue;
            }
            pair_container.insert(
                pair.container_id(),
                left.unwrap_or_else(|| ROOT_ID.to_string()),
            );
        }
        let in_grouped_pair = |node: &str| -> Option<String> {
            plan.pairs
                .iter()
                .find(|p| p.contains(node) && pair_container.contains_key(&p.container_id()))
                .map(|p| p.container_id())
        };

        // Container shells.
        let mut containers: IndexMap<String, SolverNode> = IndexMap::new();
        containers.insert(ROOT_ID.to_string(), self.root_shell(graph, plan));
        for subgraph in &graph.subgraphs {
            containers.insert(subgraph.id.clone(), self.subgraph_shell(subgraph));
        }
        for (id, _) in &pair_container {
            containers.insert(id.clone(), self.ha_shell(id, plan));
        }

        // Leaves go into their HA container, else their subgraph, else
        // the root.
        for (id, node_plan) in &plan.nodes {
            let mut leaf = SolverNode::leaf(id.clone(), node_plan.size.width, node_plan.size.height);
            leaf.labels = node_plan
                .node
                .display_label()
                .lines()
                .iter()
                .map(|l| l.to_string())
                .collect();
            if let Some(rank) = node_plan.node.rank {
                leaf.layout_options
                    .insert(options::PARTITION.to_string(), rank.to_string());
            }
            for port in ports::place_ports(node_plan.size, &node_plan.ports, config).values() {
                leaf.ports.push(SolverPort {
                    id: port.id.clone(),
                    width: port.size.width,
                    height: port.size.height,
                    side: port.side,
                    x: port.position.x,
                    y: port.position.y,
                    labels: if port.label.is_empty() {
                        Vec::new()
                    } else {
                        vec![port.label.clone()]
                    },
                });
            }
            let parent = in_grouped_pair(id)
                .or_else(|| node_container.get(id).cloned().flatten())
                .unwrap_or_else(|| ROOT_ID.to_string());
            attach(&mut containers, &parent, Attachment::Child(leaf));
        }

        // Edges: HA internals inside their pair container, everything
        // else at the LCA of its endpoints.
        for link in &plan.links {
            let edge = solver_edge(link);
            if link.ha {
                if let Some(container_id) = in_grouped_pair(&link.from.node) {
                    attach(&mut containers, &container_id, Attachment::Edge(edge));
                    continue;
                }
            }
            let container_id = self.edge_container(graph, link, &node_container);
            attach(&mut containers, &container_id, Attachment::Edge(edge));
        }

        // Assemble the tree bottom-up: fold HA containers into their
        // parents, then subgraphs in reverse declaration order so nested
        // groups fold before their parents.
        let mut parent_of: Vec<(String, String)> = Vec::new();
        for (id, parent) in &pair_container {
            parent_of.push((id.clone(), parent.clone()));
        }
        for subgraph in graph.subgraphs.iter().rev() {
            let parent = graph::subgraph_parent(subgraph)
                .and_then(|p| graph::resolve_parent(graph, &p).map(|s| s.id.clone()))
                .unwrap_or_else(|| ROOT_ID.to_string());
            parent_of.push((subgraph.id.clone(), parent));
        }
        for (id, parent) in parent_of {
            if let Some(container) = containers.shift_remove(&id) {
                attach(&mut containers, &parent, Attachment::Child(container));
            }
        }

        containers
            .shift_remove(ROOT_ID)
            .expect("root container always present")
    }

    fn root_shell(&self, graph: &Graph, plan: &LayoutPlan) -> SolverNode {
        let config = &self.config;
        let mut root = SolverNode::leaf(ROOT_ID, 0.0, 0.0);
        let set = |root: &mut SolverNode, key: &str, value: String| {
            root.layout_options.insert(key.to_string(), value);
        };

        let stroke = max_stroke_width(&plan.links);
        // A link's minLength hint stretches the whole rank gap; the
        // layered model has no per-edge slack.
        let min_length = plan
            .links
            .iter()
            .filter_map(|l| l.link.style.min_length)
            .fold(0.0_f64, f64::max);
        set(&mut root, options::ALGORITHM, "layered".to_string());
        set(
            &mut root,
            options::DIRECTION,
            plan.direction.as_str().to_string(),
        );
        set(
            &mut root,
            options::SPACING_NODE_NODE,
            plan.node_spacing.to_string(),
        );
        set(
            &mut root,
            options::SPACING_RANK,
            plan.rank_spacing.max(min_length).to_string(),
        );
        set(
            &mut root,
            options::SPACING_EDGE_EDGE,
            (config.edge_edge_spacing + stroke).to_string(),
        );
        set(
            &mut root,
            options::SPACING_EDGE_NODE,
            (config.edge_node_spacing + stroke / 2.0).to_string(),
        );
        set(
            &mut root,
            options::EDGE_ROUTING,
            edge_routing_option(graph.settings.edge_routing).to_string(),
        );
        set(&mut root, options::PORT_CONSTRAINTS, "FIXED_POS".to_string());
        set(&mut root, options::PORT_ORDERING, "true".to_string());
        set(
            &mut root,
            options::HIERARCHY_HANDLING,
            "INCLUDE_CHILDREN".to_string(),
        );
        set(&mut root, options::PADDING, config.bounds_margin.to_string());
        if plan.nodes.values().any(|n| n.node.rank.is_some()) {
            set(&mut root, options::PARTITIONING, "true".to_string());
        }
        root
    }

    fn subgraph_shell(&self, subgraph: &Subgraph) -> SolverNode {
        let config = &self.config;
        let mut shell = SolverNode::leaf(subgraph.id.clone(), 0.0, 0.0);
        shell.labels = subgraph
            .display_label()
            .lines()
            .iter()
            .map(|l| l.to_string())
            .collect();
        if let Some(direction) = subgraph.direction {
            shell
                .layout_options
                .insert(options::DIRECTION.to_string(), direction.as_str().to_string());
        }
        if let Some(spacing) = subgraph.style.node_spacing {
            shell
                .layout_options
                .insert(options::SPACING_NODE_NODE.to_string(), spacing.to_string());
        }
        if let Some(spacing) = subgraph.style.rank_spacing {
            shell
                .layout_options
                .insert(options::SPACING_RANK.to_string(), spacing.to_string());
        }
        let padding = subgraph.style.padding.unwrap_or(config.subgraph_padding);
        shell
            .layout_options
            .insert(options::PADDING.to_string(), padding.to_string());
        shell.layout_options.insert(
            options::LABEL_HEADROOM.to_string(),
            config.subgraph_label_height.to_string(),
        );
        shell
    }

    /// HA pairs become near-zero-padding compound nodes laid out across
    /// the rank axis so the partners end up co-planar.
    fn ha_shell(&self, id: &str, plan: &LayoutPlan) -> SolverNode {
        let config = &self.config;
        let mut shell = SolverNode::leaf(id, 0.0, 0.0);
        let direction = if plan.direction.is_vertical() {
            "LR"
        } else {
            "TB"
        };
        shell
            .layout_options
            .insert(options::DIRECTION.to_string(), direction.to_string());
        shell.layout_options.insert(
            options::SPACING_NODE_NODE.to_string(),
            config.ha_partner_gap.to_string(),
        );
        shell.layout_options.insert(
            options::SPACING_RANK.to_string(),
            config.ha_partner_gap.to_string(),
        );
        shell
            .layout_options
            .insert(options::PADDING.to_string(), config.ha_padding.to_string());
        shell
    }

    /// Container an edge is declared in: the lowest common ancestor of
    /// its endpoints. When the LCA is an endpoint subgraph itself, its
    /// parent is used instead.
    fn edge_container(
        &self,
        graph: &Graph,
        link: &LinkPlan,
        node_container: &IndexMap<String, Option<String>>,
    ) -> String {
        let path_of = |node: &str, is_subgraph: bool| -> Vec<String> {
            if is_subgraph {
                let mut path = subgraph_path(graph, node);
                path.push(node.to_string());
                path
            } else {
                match node_container.get(node).cloned().flatten() {
                    Some(container) => {
                        let mut path = subgraph_path(graph, &container);
                        path.push(container);
                        path
                    }
                    None => Vec::new(),
                }
            }
        };

        let from_path = path_of(&link.from.node, link.from_subgraph);
        let to_path = path_of(&link.to.node, link.to_subgraph);
        let mut lca: Vec<&String> = Vec::new();
        for (a, b) in from_path.iter().zip(to_path.iter()) {
            if a == b {
                lca.push(a);
            } else {
                break;
            }
        }
        // An endpoint subgraph may not contain its own edge.
        while let Some(&last) = lca.last() {
            let is_endpoint = (link.from_subgraph && *last == link.from.node)
                || (link.to_subgraph && *last == link.to.node);
            if is_endpoint {
                lca.pop();
            } else {
                break;
            }
        }
        lca.last()
            .map(|s| s.to_string())
            .unwrap_or_else(|| ROOT_ID.to_string())
    }
}

pub(crate) const ROOT_ID: &str = "__root";

/// Ancestor chain of a subgraph id, root-first, excluding the subgraph
/// itself.
fn subgraph_path(graph: &Graph, id: &str) -> Vec<String> {
    let mut path = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut current = graph
        .subgraph(id)
        .and_then(|s| graph::subgraph_parent(s))
        .and_then(|p| graph::resolve_parent(graph, &p).map(|s| s.id.clone()));
    while let Some(ancestor) = current {
        if !seen.insert(ancestor.clone()) {
            break;
        }
        path.push(ancestor.clone());
        current = graph
            .subgraph(&ancestor)
            .and_then(|s| graph::subgraph_parent(s))
            .and_then(|p| graph::resolve_parent(graph, &p).map(|s| s.id.clone()));
    }
    path.reverse();
    path
}

enum Attachment {
    Child(SolverNode),
    Edge(SolverEdge),
}

fn attach(containers: &mut IndexMap<String, SolverNode>, parent: &str, attachment: Attachment) {
    let key = if containers.contains_key(parent) {
        parent.to_string()
    } else {
        ROOT_ID.to_string()
    };
    let container = containers.get_mut(&key).expect("container exists");
    match attachment {
        Attachment::Child(child) => container.children.push(child),
        Attachment::Edge(edge) => container.edges.push(edge),
    }
}

fn solver_edge(link: &LinkPlan) -> SolverEdge {
    let endpoint_ref = |node: &str, port: &Option<String>| -> String {
        match port {
            Some(p) => format!("{}:{}", node, p),
            None => node.to_string(),
        }
    };
    SolverEdge::new(
        link.id.clone(),
        endpoint_ref(&link.from.node, &link.from.port),
        endpoint_ref(&link.to.node, &link.to.port),
    )
}

/// Widest visual extent of any link: base stroke plus the parallel
/// bandwidth strokes. Edge spacing scales with it so thick links stay
/// clear of nodes and each other.
fn max_stroke_width(links: &[LinkPlan]) -> f64 {
    links
        .iter()
        .map(|l| {
            let base = l.link.style.stroke_width.unwrap_or(match l.link.effective_type() {
                LinkType::Thick => 3.5,
                LinkType::Double => 5.0,
                _ => 1.5,
            });
            base + (l.link.stroke_count().saturating_sub(1)) as f64 * 3.0
        })
        .fold(0.0_f64, f64::max)
}

fn edge_routing_option(routing: EdgeRouting) -> &'static str {
    match routing {
        EdgeRouting::Orthogonal => "ORTHOGONAL",
        EdgeRouting::Polyline => "POLYLINE",
        EdgeRouting::Splines => "SPLINES",
        EdgeRouting::Straight => "STRAIGHT",
    }
}

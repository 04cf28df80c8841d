//! Built-in Sugiyama-style reference backend.
//!
//! Lays out each container of the request tree bottom-up: cycle breaking,
//! longest-path layer assignment (honoring partition hints), barycenter
//! crossing reduction seeded by insertion order, coordinate assignment
//! with the container's spacing options, then global port re-slotting and
//! orthogonal edge routing. All phases are deterministic: stable sorts,
//! fixed iteration counts, no randomness.

use std::collections::HashMap;

use async_trait::async_trait;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use super::{
    options, split_endpoint_ref, LayeredLayoutSolver, SolverEdge, SolverError, SolverNode,
    SolverPort, SolverSection,
};
use crate::model::{Direction, Point, Rect, Side};

/// Default reference implementation of [`LayeredLayoutSolver`].
#[derive(Debug, Default)]
pub struct LayeredSolver;

impl LayeredSolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LayeredLayoutSolver for LayeredSolver {
    async fn solve(&self, mut request: SolverNode) -> Result<SolverNode, SolverError> {
        let defaults = ContainerOptions::defaults().merged_with(&request);
        layout_container(&mut request, &defaults)?;
        request.x = 0.0;
        request.y = 0.0;
        absolutize(&mut request);
        if request.option(options::PORT_ORDERING) == Some("true") {
            reorder_ports(&mut request);
        }
        route_all_edges(&mut request, &defaults);
        Ok(request)
    }
}

/// Per-container options, inherited downward and overridable per node.
#[derive(Debug, Clone)]
struct ContainerOptions {
    direction: Direction,
    node_spacing: f64,
    rank_spacing: f64,
    edge_routing: String,
    compaction: bool,
    padding: f64,
    label_headroom: f64,
}

impl ContainerOptions {
    fn defaults() -> Self {
        Self {
            direction: Direction::Tb,
            node_spacing: 64.0,
            rank_spacing: 96.0,
            edge_routing: "ORTHOGONAL".to_string(),
            compaction: true,
            padding: 24.0,
            label_headroom: 0.0,
        }
    }

    fn merged_with(&self, node: &SolverNode) -> Self {
        let mut merged = self.clone();
        if let Some(d) = node.option(options::DIRECTION) {
            merged.direction = parse_direction(d);
        }
        if let Some(v) = node.option_f64(options::SPACING_NODE_NODE) {
            merged.node_spacing = v;
        }
        if let Some(v) = node.option_f64(options::SPACING_RANK) {
            merged.rank_spacing = v;
        }
        if let Some(v) = node.option(options::EDGE_ROUTING) {
            merged.edge_routing = v.to_string();
        }
        if let Some(v) = node.option(options::COMPACTION) {
            merged.compaction = v != "false";
        }
        if let Some(v) = node.option_f64(options::PADDING) {
            merged.padding = v;
        }
        if let Some(v) = node.option_f64(options::LABEL_HEADROOM) {
            merged.label_headroom = v;
        } else {
            merged.label_headroom = 0.0;
        }
        merged
    }
}

fn parse_direction(s: &str) -> Direction {
    match s {
        "BT" => Direction::Bt,
        "LR" => Direction::Lr,
        "RL" => Direction::Rl,
        _ => Direction::Tb,
    }
}

/// Recursively lay out a container's direct children. Child coordinates
/// are set relative to the container's top-left corner; the container's
/// own size grows to fit content plus padding and label headroom.
fn layout_container(
    node: &mut SolverNode,
    inherited: &ContainerOptions,
) -> Result<(), SolverError> {
    if node.children.is_empty() {
        return Ok(());
    }
    let opts = inherited.merged_with(node);

    for child in &mut node.children {
        layout_container(child, &opts)?;
    }

    // Resolved options are written back so the routing pass can read them
    // without re-deriving the inheritance chain.
    node.layout_options.insert(
        options::DIRECTION.to_string(),
        opts.direction.as_str().to_string(),
    );
    node.layout_options.insert(
        options::EDGE_ROUTING.to_string(),
        opts.edge_routing.clone(),
    );

    let n = node.children.len();
    let child_index = descendant_index(node);

    // Adjacency between direct children, derived from the edges declared
    // at this container.
    let mut edges: Vec<(usize, usize)> = Vec::new();
    for edge in &node.edges {
        let src = edge
            .sources
            .first()
            .and_then(|r| child_index.get(split_endpoint_ref(r).0));
        let tgt = edge
            .targets
            .first()
            .and_then(|r| child_index.get(split_endpoint_ref(r).0));
        if let (Some(&s), Some(&t)) = (src, tgt) {
            if s != t {
                edges.push((s, t));
            }
        }
    }

    let dag_edges = break_cycles(n, &edges);
    let mut layers_of = assign_layers(n, &dag_edges)?;
    apply_partitions(node, &mut layers_of, &dag_edges);

    let layer_count = layers_of.iter().copied().max().map(|m| m + 1).unwrap_or(0);
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
    for (i, &l) in layers_of.iter().enumerate() {
        layers[l].push(i);
    }
    minimize_crossings(&mut layers, &dag_edges);
    debug!(
        container = node.id.as_str(),
        layers = layer_count,
        children = n,
        "assigned layers"
    );

    assign_coordinates(node, &layers, &dag_edges, &opts);
    Ok(())
}

/// Map every descendant node id (including each direct child's own id) to
/// the index of the direct child that contains it.
fn descendant_index(node: &SolverNode) -> HashMap<String, usize> {
    fn collect(node: &SolverNode, index: usize, out: &mut HashMap<String, usize>) {
        out.insert(node.id.clone(), index);
        for child in &node.children {
            collect(child, index, out);
        }
    }
    let mut out = HashMap::new();
    for (i, child) in node.children.iter().enumerate() {
        collect(child, i, &mut out);
    }
    out
}

/// Reverse back edges found by a depth-first sweep so the layering graph
/// is acyclic. Duplicate edges collapse.
fn break_cycles(n: usize, edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(s, t) in edges {
        adjacency[s].push(t);
    }

    // 0 = white, 1 = gray, 2 = black
    let mut color = vec![0u8; n];
    let mut reversed: Vec<(usize, usize)> = Vec::new();

    fn dfs(
        v: usize,
        adjacency: &[Vec<usize>],
        color: &mut [u8],
        reversed: &mut Vec<(usize, usize)>,
    ) {
        color[v] = 1;
        for &w in &adjacency[v] {
            match color[w] {
                0 => dfs(w, adjacency, color, reversed),
                1 => reversed.push((v, w)),
                _ => {}
            }
        }
        color[v] = 2;
    }

    for v in 0..n {
        if color[v] == 0 {
            dfs(v, &adjacency, &mut color, &mut reversed);
        }
    }

    let mut dag: Vec<(usize, usize)> = Vec::new();
    for &(s, t) in edges {
        let edge = if reversed.contains(&(s, t)) { (t, s) } else { (s, t) };
        if !dag.contains(&edge) {
            dag.push(edge);
        }
    }
    dag
}

/// Longest-path layering over the acyclic child graph.
fn assign_layers(n: usize, dag_edges: &[(usize, usize)]) -> Result<Vec<usize>, SolverError> {
    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for v in 0..n {
        graph.add_node(v);
    }
    for &(s, t) in dag_edges {
        graph.add_edge(s, t, ());
    }

    let order = toposort(&graph, None)
        .map_err(|c| SolverError::Failed(format!("cycle remained after breaking at {:?}", c.node_id())))?;

    let mut layer = vec![0usize; n];
    for &v in &order {
        for &(s, t) in dag_edges {
            if s == v {
                layer[t] = layer[t].max(layer[v] + 1);
            }
        }
    }
    Ok(layer)
}

/// Force children carrying a partition hint onto shared layers, ordered
/// by ascending partition value, then push successors back down.
fn apply_partitions(node: &SolverNode, layers_of: &mut [usize], dag_edges: &[(usize, usize)]) {
    let mut partitions: Vec<(i64, usize)> = Vec::new();
    for (i, child) in node.children.iter().enumerate() {
        if let Some(p) = child
            .option(options::PARTITION)
            .and_then(|v| v.parse::<i64>().ok())
        {
            partitions.push((p, i));
        }
    }
    if partitions.is_empty() {
        return;
    }

    let mut values: Vec<i64> = partitions.iter().map(|&(p, _)| p).collect();
    values.sort_unstable();
    values.dedup();

    for (rank, value) in values.iter().enumerate() {
        let members: Vec<usize> = partitions
            .iter()
            .filter(|&&(p, _)| p == *value)
            .map(|&(_, i)| i)
            .collect();
        let forced = members
            .iter()
            .map(|&i| layers_of[i])
            .max()
            .unwrap_or(0)
            .max(rank);
        for &i in &members {
            layers_of[i] = forced;
        }
    }

    // Restore the downward invariant, but never move a partitioned child:
    // the hint wins over edge direction.
    let pinned: Vec<bool> = {
        let mut pinned = vec![false; layers_of.len()];
        for &(_, i) in &partitions {
            pinned[i] = true;
        }
        pinned
    };
    for _ in 0..layers_of.len() {
        let mut changed = false;
        for &(s, t) in dag_edges {
            if !pinned[t] && layers_of[t] <= layers_of[s] {
                layers_of[t] = layers_of[s] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Barycenter sweeps, keeping the ordering with the fewest crossings.
fn minimize_crossings(layers: &mut Vec<Vec<usize>>, dag_edges: &[(usize, usize)]) {
    if layers.len() < 2 {
        return;
    }
    let mut best = layers.clone();
    let mut best_crossings = count_crossings(layers, dag_edges);

    for sweep in 0..4 {
        let downward = sweep % 2 == 0;
        let range: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len() - 1).rev().collect()
        };
        for l in range {
            let reference = if downward { l - 1 } else { l + 1 };
            let position: HashMap<usize, usize> = layers[reference]
                .iter()
                .enumerate()
                .map(|(i, &v)| (v, i))
                .collect();
            let mut keyed: Vec<(f64, usize, usize)> = layers[l]
                .iter()
                .enumerate()
                .map(|(i, &v)| {
                    let neighbors: Vec<usize> = dag_edges
                        .iter()
                        .filter_map(|&(s, t)| {
                            if downward && t == v {
                                position.get(&s).copied()
                            } else if !downward && s == v {
                                position.get(&t).copied()
                            } else {
                                None
                            }
                        })
                        .collect();
                    let barycenter = if neighbors.is_empty() {
                        i as f64
                    } else {
                        neighbors.iter().sum::<usize>() as f64 / neighbors.len() as f64
                    };
                    (barycenter, i, v)
                })
                .collect();
            keyed.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            layers[l] = keyed.into_iter().map(|(_, _, v)| v).collect();
        }
        let crossings = count_crossings(layers, dag_edges);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }
    *layers = best;
}

fn count_crossings(layers: &[Vec<usize>], dag_edges: &[(usize, usize)]) -> usize {
    let mut layer_of = HashMap::new();
    let mut pos_of = HashMap::new();
    for (l, layer) in layers.iter().enumerate() {
        for (i, &v) in layer.iter().enumerate() {
            layer_of.insert(v, l);
            pos_of.insert(v, i);
        }
    }
    let mut crossings = 0;
    for (a, &(s1, t1)) in dag_edges.iter().enumerate() {
        for &(s2, t2) in dag_edges.iter().skip(a + 1) {
            if layer_of.get(&s1) == layer_of.get(&s2) && layer_of.get(&t1) == layer_of.get(&t2) {
                let (p1, p2) = (pos_of[&s1] as i64, pos_of[&s2] as i64);
                let (q1, q2) = (pos_of[&t1] as i64, pos_of[&t2] as i64);
                if (p1 - p2) * (q1 - q2) < 0 {
                    crossings += 1;
                }
            }
        }
    }
    crossings
}

/// Place children layer by layer, center each layer on the widest one,
/// then size the container to fit content plus padding.
fn assign_coordinates(
    node: &mut SolverNode,
    layers: &[Vec<usize>],
    dag_edges: &[(usize, usize)],
    opts: &ContainerOptions,
) {
    let vertical = opts.direction.is_vertical();

    let cross_extent = |c: &SolverNode| if vertical { c.width } else { c.height };
    let rank_extent = |c: &SolverNode| if vertical { c.height } else { c.width };

    // Cross-axis centers per child, sequential within each layer.
    let mut cross_center: Vec<f64> = vec![0.0; node.children.len()];
    let mut layer_widths: Vec<f64> = Vec::with_capacity(layers.len());
    for layer in layers {
        let mut cursor = 0.0;
        for &v in layer {
            let extent = cross_extent(&node.children[v]);
            cross_center[v] = cursor + extent / 2.0;
            cursor += extent + opts.node_spacing;
        }
        layer_widths.push((cursor - opts.node_spacing).max(0.0));
    }
    let max_width = layer_widths.iter().cloned().fold(0.0_f64, f64::max);
    for (layer, width) in layers.iter().zip(&layer_widths) {
        let offset = (max_width - width) / 2.0;
        for &v in layer {
            cross_center[v] += offset;
        }
    }

    if opts.compaction {
        compact_layers(layers, dag_edges, &mut cross_center, node, opts, vertical);
    }

    // Compaction may have shifted content; renormalize so the cross axis
    // starts at zero and the content extent is tight.
    let mut cross_min = f64::INFINITY;
    let mut cross_max = f64::NEG_INFINITY;
    for (i, child) in node.children.iter().enumerate() {
        let half = cross_extent(child) / 2.0;
        cross_min = cross_min.min(cross_center[i] - half);
        cross_max = cross_max.max(cross_center[i] + half);
    }
    if cross_min.is_finite() {
        for center in cross_center.iter_mut() {
            *center -= cross_min;
        }
    }
    let content_width = if cross_min.is_finite() {
        cross_max - cross_min
    } else {
        0.0
    };

    // Rank-axis placement: each layer is as thick as its tallest child,
    // children center-aligned within the layer.
    let mut rank_cursor = 0.0;
    let mut rank_center: Vec<f64> = vec![0.0; node.children.len()];
    for layer in layers {
        let thickness = layer
            .iter()
            .map(|&v| rank_extent(&node.children[v]))
            .fold(0.0_f64, f64::max);
        for &v in layer {
            rank_center[v] = rank_cursor + thickness / 2.0;
        }
        rank_cursor += thickness + opts.rank_spacing;
    }
    let content_rank = (rank_cursor - opts.rank_spacing).max(0.0);
    let content_cross = content_width;

    let origin_cross = opts.padding;
    let origin_rank = opts.padding + opts.label_headroom;

    for (i, child) in node.children.iter_mut().enumerate() {
        let (mut cross, mut rank) = (cross_center[i], rank_center[i]);
        // BT and RL flip the rank axis.
        if matches!(opts.direction, Direction::Bt | Direction::Rl) {
            rank = content_rank - rank;
        }
        cross += origin_cross;
        rank += origin_rank;
        if vertical {
            child.x = cross - child.width / 2.0;
            child.y = rank - child.height / 2.0;
        } else {
            child.x = rank - child.width / 2.0;
            child.y = cross - child.height / 2.0;
        }
    }

    let (content_w, content_h) = if vertical {
        (content_cross, content_rank)
    } else {
        (content_rank, content_cross)
    };
    node.width = node
        .width
        .max(content_w + opts.padding * 2.0);
    node.height = node
        .height
        .max(content_h + opts.padding * 2.0 + opts.label_headroom);
}

/// One gentle compaction pass: pull each child toward the barycenter of
/// its layer neighbors, clamped so within-layer spacing is preserved.
fn compact_layers(
    layers: &[Vec<usize>],
    dag_edges: &[(usize, usize)],
    cross_center: &mut [f64],
    node: &SolverNode,
    opts: &ContainerOptions,
    vertical: bool,
) {
    let cross_extent = |c: &SolverNode| if vertical { c.width } else { c.height };

    for layer in layers {
        let desired: Vec<Option<f64>> = layer
            .iter()
            .map(|&v| {
                let neighbors: Vec<f64> = dag_edges
                    .iter()
                    .filter_map(|&(s, t)| {
                        if s == v {
                            Some(cross_center[t])
                        } else if t == v {
                            Some(cross_center[s])
                        } else {
                            None
                        }
                    })
                    .collect();
                if neighbors.is_empty() {
                    None
                } else {
                    Some(neighbors.iter().sum::<f64>() / neighbors.len() as f64)
                }
            })
            .collect();

        // Left-to-right, clamping against the previous sibling.
        let mut min_pos = f64::NEG_INFINITY;
        for (slot, &v) in layer.iter().enumerate() {
            let half = cross_extent(&node.children[v]) / 2.0;
            let lower = if min_pos.is_finite() {
                min_pos + opts.node_spacing + half
            } else {
                f64::NEG_INFINITY
            };
            let mut pos = desired[slot].unwrap_or(cross_center[v]);
            if lower.is_finite() {
                pos = pos.max(lower);
            }
            cross_center[v] = pos;
            min_pos = cross_center[v] + half;
        }
    }
}

/// Shift every child subtree into its parent's coordinate space.
fn absolutize(node: &mut SolverNode) {
    let (ox, oy) = (node.x, node.y);
    for child in &mut node.children {
        child.x += ox;
        child.y += oy;
        absolutize(child);
    }
}

/// Re-slot ports along their fixed side, ordered by the cross-axis
/// coordinate of the connected node. This is the backend-enforced
/// realization of the port tie-break rule: sides never change, only slot
/// order within a side.
fn reorder_ports(root: &mut SolverNode) {
    let mut centers: HashMap<String, Point> = HashMap::new();
    let mut neighbor_of: HashMap<(String, String), String> = HashMap::new();
    collect_centers(root, &mut centers);
    collect_port_neighbors(root, &mut neighbor_of);

    apply_port_order(root, &centers, &neighbor_of);
}

fn collect_centers(node: &SolverNode, out: &mut HashMap<String, Point>) {
    for child in &node.children {
        out.insert(
            child.id.clone(),
            Point::new(child.x + child.width / 2.0, child.y + child.height / 2.0),
        );
        collect_centers(child, out);
    }
}

fn collect_port_neighbors(node: &SolverNode, out: &mut HashMap<(String, String), String>) {
    for edge in &node.edges {
        let src = edge.sources.first().map(|s| s.as_str()).unwrap_or("");
        let tgt = edge.targets.first().map(|s| s.as_str()).unwrap_or("");
        let (src_node, src_port) = split_endpoint_ref(src);
        let (tgt_node, tgt_port) = split_endpoint_ref(tgt);
        if let Some(p) = src_port {
            out.entry((src_node.to_string(), p.to_string()))
                .or_insert_with(|| tgt_node.to_string());
        }
        if let Some(p) = tgt_port {
            out.entry((tgt_node.to_string(), p.to_string()))
                .or_insert_with(|| src_node.to_string());
        }
    }
    for child in &node.children {
        collect_port_neighbors(child, out);
    }
}

fn apply_port_order(
    node: &mut SolverNode,
    centers: &HashMap<String, Point>,
    neighbor_of: &HashMap<(String, String), String>,
) {
    for child in &mut node.children {
        apply_port_order(child, centers, neighbor_of);
    }
    if node.ports.is_empty() {
        return;
    }

    let node_id = node.id.clone();
    let (w, h) = (node.width, node.height);
    for side in [Side::Top, Side::Bottom, Side::Left, Side::Right] {
        let mut group: Vec<usize> = node
            .ports
            .iter()
            .enumerate()
            .filter(|(_, p)| p.side == side)
            .map(|(i, _)| i)
            .collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|&a, &b| {
            let key = |i: usize| -> f64 {
                let port = &node.ports[i];
                neighbor_of
                    .get(&(node_id.clone(), port.id.clone()))
                    .and_then(|n| centers.get(n))
                    .map(|c| if side.is_horizontal() { c.y } else { c.x })
                    .unwrap_or(f64::MAX)
            };
            key(a)
                .partial_cmp(&key(b))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        let extent = if side.is_horizontal() { h } else { w };
        let slot = extent / group.len() as f64;
        for (slot_index, &port_index) in group.iter().enumerate() {
            let along = -extent / 2.0 + slot * (slot_index as f64 + 0.5);
            let port = &mut node.ports[port_index];
            match side {
                Side::Top => {
                    port.x = along;
                    port.y = -h / 2.0 - port.height / 2.0;
                }
                Side::Bottom => {
                    port.x = along;
                    port.y = h / 2.0 + port.height / 2.0;
                }
                Side::Left => {
                    port.x = -w / 2.0 - port.width / 2.0;
                    port.y = along;
                }
                Side::Right => {
                    port.x = w / 2.0 + port.width / 2.0;
                    port.y = along;
                }
            }
        }
    }
}

/// Route every edge in the tree with the owning container's routing
/// style, in root-global coordinates.
fn route_all_edges(root: &mut SolverNode, defaults: &ContainerOptions) {
    let mut rects: HashMap<String, Rect> = HashMap::new();
    let mut ports: HashMap<(String, String), Point> = HashMap::new();
    collect_geometry(root, &mut rects, &mut ports);
    rects.insert(
        root.id.clone(),
        Rect::new(root.x, root.y, root.width, root.height),
    );

    route_container(root, defaults, &rects, &ports);
}

fn collect_geometry(
    node: &SolverNode,
    rects: &mut HashMap<String, Rect>,
    ports: &mut HashMap<(String, String), Point>,
) {
    for child in &node.children {
        rects.insert(
            child.id.clone(),
            Rect::new(child.x, child.y, child.width, child.height),
        );
        for port in &child.ports {
            ports.insert(
                (child.id.clone(), port.id.clone()),
                Point::new(
                    child.x + child.width / 2.0 + port.x,
                    child.y + child.height / 2.0 + port.y,
                ),
            );
        }
        collect_geometry(child, rects, ports);
    }
}

fn route_container(
    node: &mut SolverNode,
    inherited: &ContainerOptions,
    rects: &HashMap<String, Rect>,
    ports: &HashMap<(String, String), Point>,
) {
    let opts = inherited.merged_with(node);
    let vertical = opts.direction.is_vertical();
    let orthogonal = matches!(opts.edge_routing.as_str(), "ORTHOGONAL" | "POLYLINE");

    for edge in &mut node.edges {
        let Some(source) = edge.sources.first() else { continue };
        let Some(target) = edge.targets.first() else { continue };
        let Some((start, end)) = resolve_anchors(source, target, vertical, rects, ports) else {
            continue;
        };
        edge.sections = vec![route_section(start, end, vertical, orthogonal)];
    }

    for child in &mut node.children {
        route_container(child, &opts, rects, ports);
    }
}

/// Anchor an endpoint reference: the port center when a port is named,
/// otherwise the midpoint of the facing node boundary.
fn resolve_anchors(
    source: &str,
    target: &str,
    vertical: bool,
    rects: &HashMap<String, Rect>,
    ports: &HashMap<(String, String), Point>,
) -> Option<(Point, Point)> {
    let (src_node, src_port) = split_endpoint_ref(source);
    let (tgt_node, tgt_port) = split_endpoint_ref(target);
    let src_rect = *rects.get(src_node)?;
    let tgt_rect = *rects.get(tgt_node)?;

    let port_point = |node: &str, port: Option<&str>| -> Option<Point> {
        port.and_then(|p| ports.get(&(node.to_string(), p.to_string())).copied())
    };

    let start = port_point(src_node, src_port)
        .unwrap_or_else(|| boundary_anchor(&src_rect, &tgt_rect, vertical));
    let end = port_point(tgt_node, tgt_port)
        .unwrap_or_else(|| boundary_anchor(&tgt_rect, &src_rect, vertical));
    Some((start, end))
}

fn boundary_anchor(from: &Rect, toward: &Rect, vertical: bool) -> Point {
    let fc = from.center();
    let tc = toward.center();
    if vertical {
        if (tc.y - fc.y).abs() < 0.5 {
            // Same rank: face each other horizontally.
            if tc.x >= fc.x {
                Point::new(from.right(), fc.y)
            } else {
                Point::new(from.x, fc.y)
            }
        } else if tc.y > fc.y {
            Point::new(fc.x, from.bottom())
        } else {
            Point::new(fc.x, from.y)
        }
    } else if (tc.x - fc.x).abs() < 0.5 {
        if tc.y >= fc.y {
            Point::new(fc.x, from.bottom())
        } else {
            Point::new(fc.x, from.y)
        }
    } else if tc.x > fc.x {
        Point::new(from.right(), fc.y)
    } else {
        Point::new(from.x, fc.y)
    }
}

/// Straight when the endpoints align on the cross axis, otherwise a
/// three-segment orthogonal route through the rank midpoint.
fn route_section(start: Point, end: Point, vertical: bool, orthogonal: bool) -> SolverSection {
    let mut section = SolverSection {
        start_point: start,
        end_point: end,
        bend_points: Vec::new(),
    };
    if !orthogonal {
        return section;
    }
    if vertical {
        if (start.x - end.x).abs() >= 0.5 {
            let mid = (start.y + end.y) / 2.0;
            section.bend_points = vec![Point::new(start.x, mid), Point::new(end.x, mid)];
        }
    } else if (start.y - end.y).abs() >= 0.5 {
        let mid = (start.x + end.x) / 2.0;
        section.bend_points = vec![Point::new(mid, start.y), Point::new(mid, end.y)];
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::LayoutOptions;

    fn run(request: SolverNode) -> SolverNode {
        let solver = LayeredSolver::new();
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(solver.solve(request))
            .unwrap()
    }

    fn chain_request() -> SolverNode {
        let mut root = SolverNode::leaf("__root", 0.0, 0.0);
        root.children = vec![
            SolverNode::leaf("a", 120.0, 72.0),
            SolverNode::leaf("b", 120.0, 72.0),
        ];
        root.edges = vec![SolverEdge::new("a-b-0", "a", "b")];
        root.layout_options = LayoutOptions::new();
        root
    }

    #[test]
    fn test_chain_stacks_vertically() {
        let result = run(chain_request());
        let a = &result.children[0];
        let b = &result.children[1];
        assert!((a.x - b.x).abs() < 1e-9, "chain nodes share a column");
        assert!(b.y > a.y + a.height, "second node sits a full rank below");
    }

    #[test]
    fn test_chain_edge_is_straight() {
        let result = run(chain_request());
        let edge = &result.edges[0];
        assert_eq!(edge.sections.len(), 1);
        assert!(edge.sections[0].bend_points.is_empty());
        let section = &edge.sections[0];
        let a = &result.children[0];
        assert!((section.start_point.y - (a.y + a.height)).abs() < 1e-9);
    }

    #[test]
    fn test_lr_direction_places_side_by_side() {
        let mut request = chain_request();
        request
            .layout_options
            .insert(options::DIRECTION.to_string(), "LR".to_string());
        let result = run(request);
        let a = &result.children[0];
        let b = &result.children[1];
        assert!((a.y - b.y).abs() < 1e-9);
        assert!(b.x > a.x + a.width);
    }

    #[test]
    fn test_cycle_does_not_panic() {
        let mut request = chain_request();
        request.edges.push(SolverEdge::new("b-a-1", "b", "a"));
        let result = run(request);
        assert_eq!(result.children.len(), 2);
    }

    #[test]
    fn test_partition_forces_shared_layer() {
        let mut root = SolverNode::leaf("__root", 0.0, 0.0);
        let mut a = SolverNode::leaf("a", 100.0, 60.0);
        let mut b = SolverNode::leaf("b", 100.0, 60.0);
        a.layout_options
            .insert(options::PARTITION.to_string(), "1".to_string());
        b.layout_options
            .insert(options::PARTITION.to_string(), "1".to_string());
        root.children = vec![a, b, SolverNode::leaf("c", 100.0, 60.0)];
        root.edges = vec![
            SolverEdge::new("a-b-0", "a", "b"),
            SolverEdge::new("b-c-1", "b", "c"),
        ];
        let result = run(root);
        let a = &result.children[0];
        let b = &result.children[1];
        assert!(
            (a.y - b.y).abs() < 1e-9,
            "partitioned nodes share a layer even across an edge"
        );
    }
}

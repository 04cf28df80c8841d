//! Top-level orchestration: graph in, rendered artifact out.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph;
use crate::layout::HierarchicalLayout;
use crate::model::{Graph, Rect};
use crate::render::render_svg;
use crate::sheets::{self, ROOT_SHEET_ID};

/// One rendered sheet of an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetArtifact {
    pub svg: String,
    pub view_box: String,
    pub label: String,
    pub parent_id: Option<String>,
}

/// The service-facing render result: every sheet rendered, plus counts
/// for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub id: String,
    pub name: String,
    pub hierarchical: bool,
    pub sheets: IndexMap<String, SheetArtifact>,
    pub root_sheet_id: String,
    pub node_count: usize,
    pub edge_count: usize,
}

/// Lay out the graph, split it into sheets when it has hierarchical
/// content, and render every sheet.
pub async fn render_network(graph: &Graph) -> Artifact {
    let engine = HierarchicalLayout::new();
    let layout = engine.layout_async(graph).await;
    let hierarchical = graph::has_hierarchical_content(graph);
    let name = graph.name.clone().unwrap_or_else(|| "network".to_string());
    info!(
        name = name.as_str(),
        hierarchical, "rendering network artifact"
    );

    let sheet_map = sheets::build_hierarchical_sheets(graph, layout, &engine).await;
    let mut rendered: IndexMap<String, SheetArtifact> = IndexMap::new();
    for (id, sheet) in &sheet_map {
        rendered.insert(
            id.clone(),
            SheetArtifact {
                svg: render_svg(&sheet.graph, &sheet.layout),
                view_box: view_box_string(sheet.layout.bounds),
                label: sheet.label.clone(),
                parent_id: sheet.parent_id.clone(),
            },
        );
    }

    Artifact {
        id: slug(&name),
        name,
        hierarchical,
        sheets: rendered,
        root_sheet_id: ROOT_SHEET_ID.to_string(),
        node_count: graph.nodes.len(),
        edge_count: graph.links.len(),
    }
}

fn view_box_string(bounds: Rect) -> String {
    use crate::render::labels::fmt;
    format!(
        "{} {} {} {}",
        fmt(bounds.x),
        fmt(bounds.y),
        fmt(bounds.width),
        fmt(bounds.height)
    )
}

fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        "network".to_string()
    } else {
        out
    }
}

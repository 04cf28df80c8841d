//! Deterministic per-node size estimation.
//!
//! Runs before any solver call. Height comes from the icon/label stack,
//! width from the widest of three demands: the icon box, the longest
//! label line, and the port slots. Ports live outside the node, so the
//! node only needs enough width to land them within its horizontal
//! extent; label-driven port spacing keeps adjacent port labels apart.

use indexmap::IndexMap;

use super::plan::PortPlan;
use super::LayoutConfig;
use crate::model::{Node, Side, Size};

pub(crate) fn estimate_size(
    node: &Node,
    ports: &IndexMap<String, PortPlan>,
    config: &LayoutConfig,
) -> Size {
    let label = node.display_label();
    let has_icon = node.icon_key().is_some();

    let icon_height = if has_icon { config.icon_size } else { 0.0 };
    let icon_gap = if has_icon { config.icon_label_gap } else { 0.0 };
    let label_height = label.line_count() as f64 * config.line_height;
    let mut height = (icon_height + icon_gap + label_height + config.v_padding * 2.0)
        .max(config.node_min_height);

    // Icon demand: the icon box may take at most a configured fraction of
    // the final width so ports keep room.
    let icon_demand = if has_icon {
        config.icon_size / config.icon_max_width_fraction
    } else {
        0.0
    };

    let label_demand =
        label.longest_line_chars() as f64 * config.char_width + config.h_padding * 2.0;

    let spacing = port_spacing(ports, config);
    let top = count_side(ports, Side::Top);
    let bottom = count_side(ports, Side::Bottom);
    let port_demand = top.max(bottom) as f64 * spacing + config.h_padding * 2.0;

    let width = config
        .node_min_width
        .max(icon_demand)
        .max(label_demand)
        .max(port_demand);

    // Left/right ports demand height the same way.
    let side_count = count_side(ports, Side::Left).max(count_side(ports, Side::Right));
    if side_count > 0 {
        height = height.max(side_count as f64 * config.min_port_spacing + config.v_padding * 2.0);
    }

    Size::new(width, height)
}

/// Slot width for this node's ports: wide enough for the longest port
/// label, never narrower than the configured minimum.
pub(crate) fn port_spacing(ports: &IndexMap<String, PortPlan>, config: &LayoutConfig) -> f64 {
    let longest = ports
        .values()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    config
        .min_port_spacing
        .max(longest as f64 * config.port_label_char_width + config.port_label_padding)
}

fn count_side(ports: &IndexMap<String, PortPlan>, side: Side) -> usize {
    ports.values().filter(|p| p.side == side).count()
}

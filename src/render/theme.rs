//! Theme palettes. A narrow color map governs every stroke and fill the
//! input does not set per-element; VLAN-tagged links pick from a fixed
//! 12-color palette instead.

use crate::model::Theme;

#[derive(Debug, Clone)]
pub struct ThemePalette {
    pub background: &'static str,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub node_text: &'static str,
    pub subgraph_fill: &'static str,
    pub subgraph_stroke: &'static str,
    pub subgraph_text: &'static str,
    pub link_stroke: &'static str,
    pub link_inner: &'static str,
    pub link_text: &'static str,
    pub port_fill: &'static str,
    pub port_stroke: &'static str,
    pub port_text: &'static str,
    pub label_bg: &'static str,
    pub legend_bg: &'static str,
    pub legend_stroke: &'static str,
}

pub fn palette(theme: Theme) -> ThemePalette {
    match theme {
        Theme::Light => ThemePalette {
            background: "#ffffff",
            node_fill: "#ffffff",
            node_stroke: "#37474f",
            node_text: "#263238",
            subgraph_fill: "#eceff1",
            subgraph_stroke: "#90a4ae",
            subgraph_text: "#455a64",
            link_stroke: "#607d8b",
            link_inner: "#ffffff",
            link_text: "#37474f",
            port_fill: "#cfd8dc",
            port_stroke: "#546e7a",
            port_text: "#37474f",
            label_bg: "#ffffff",
            legend_bg: "#ffffff",
            legend_stroke: "#b0bec5",
        },
        Theme::Dark => ThemePalette {
            background: "#1c2229",
            node_fill: "#263238",
            node_stroke: "#b0bec5",
            node_text: "#eceff1",
            subgraph_fill: "#232b33",
            subgraph_stroke: "#546e7a",
            subgraph_text: "#b0bec5",
            link_stroke: "#78909c",
            link_inner: "#1c2229",
            link_text: "#cfd8dc",
            port_fill: "#37474f",
            port_stroke: "#90a4ae",
            port_text: "#cfd8dc",
            label_bg: "#1c2229",
            legend_bg: "#232b33",
            legend_stroke: "#546e7a",
        },
    }
}

/// Fixed VLAN palette; the color index is the sum of the link's VLAN ids
/// modulo the palette size.
pub const VLAN_PALETTE: [&str; 12] = [
    "#e53935", "#d81b60", "#8e24aa", "#5e35b1", "#3949ab", "#1e88e5",
    "#00897b", "#43a047", "#c0ca33", "#fb8c00", "#f4511e", "#6d4c41",
];

pub fn vlan_color(vlans: &[u32]) -> Option<&'static str> {
    if vlans.is_empty() {
        return None;
    }
    let sum: u64 = vlans.iter().map(|v| *v as u64).sum();
    Some(VLAN_PALETTE[(sum % VLAN_PALETTE.len() as u64) as usize])
}

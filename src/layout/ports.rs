//! Port side selection, slot distribution and HA pair detection.
//!
//! Sides are fixed before the solver runs: a plain link leaves the source
//! on its rank-facing side and enters the target on the opposite one; a
//! redundancy link puts its ports on the partners' facing inner sides.
//! Within a side, ports are distributed into equal slots.

use indexmap::IndexMap;

use super::plan::{LinkPlan, PortPlan};
use super::LayoutConfig;
use crate::model::{Direction, LayoutPort, Point, Side, Size};

/// Side a plain link leaves its source node on.
pub(crate) fn source_side(direction: Direction) -> Side {
    match direction {
        Direction::Tb => Side::Bottom,
        Direction::Bt => Side::Top,
        Direction::Lr => Side::Right,
        Direction::Rl => Side::Left,
    }
}

/// Side a plain link enters its target node on.
pub(crate) fn target_side(direction: Direction) -> Side {
    source_side(direction).opposite()
}

/// Facing sides for an HA pair: (side on the `from` partner, side on the
/// `to` partner). Partners sit side-by-side across the rank axis, so the
/// ports face each other.
pub(crate) fn ha_sides(direction: Direction) -> (Side, Side) {
    if direction.is_vertical() {
        (Side::Right, Side::Left)
    } else {
        (Side::Bottom, Side::Top)
    }
}

/// Port glyph extent for a side; rotated for left/right ports.
pub(crate) fn port_size(side: Side, config: &LayoutConfig) -> Size {
    if side.is_horizontal() {
        Size::new(config.port_height, config.port_width)
    } else {
        Size::new(config.port_width, config.port_height)
    }
}

/// Slot-center position of port `slot` of `count` on a side, relative to
/// the node center. The port body sits half its extent outside the node
/// boundary.
pub(crate) fn slot_position(
    node_size: Size,
    side: Side,
    slot: usize,
    count: usize,
    config: &LayoutConfig,
) -> Point {
    let size = port_size(side, config);
    let extent = if side.is_horizontal() {
        node_size.height
    } else {
        node_size.width
    };
    let step = extent / count.max(1) as f64;
    let along = -extent / 2.0 + step * (slot as f64 + 0.5);
    match side {
        Side::Top => Point::new(along, -node_size.height / 2.0 - size.height / 2.0),
        Side::Bottom => Point::new(along, node_size.height / 2.0 + size.height / 2.0),
        Side::Left => Point::new(-node_size.width / 2.0 - size.width / 2.0, along),
        Side::Right => Point::new(node_size.width / 2.0 + size.width / 2.0, along),
    }
}

/// Distribute a node's planned ports into their slots. Used by the grid
/// fallback and to seed the solver request; the solver may re-slot within
/// each side afterwards.
pub(crate) fn place_ports(
    node_size: Size,
    ports: &IndexMap<String, PortPlan>,
    config: &LayoutConfig,
) -> IndexMap<String, LayoutPort> {
    let mut placed = IndexMap::new();
    for side in [Side::Top, Side::Bottom, Side::Left, Side::Right] {
        let group: Vec<&PortPlan> = ports.values().filter(|p| p.side == side).collect();
        for (slot, plan) in group.iter().enumerate() {
            placed.insert(
                plan.id.clone(),
                LayoutPort {
                    id: plan.id.clone(),
                    label: plan.label.clone(),
                    position: slot_position(node_size, side, slot, group.len(), config),
                    size: port_size(side, config),
                    side,
                },
            );
        }
    }
    // Preserve declaration order in the result map.
    let mut ordered = IndexMap::new();
    for id in ports.keys() {
        if let Some(port) = placed.shift_remove(id) {
            ordered.insert(id.clone(), port);
        }
    }
    ordered
}

/// An HA pair implied by a redundancy-tagged link. The `from` endpoint is
/// the left partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HaPair {
    pub left: String,
    pub right: String,
}

impl HaPair {
    pub fn container_id(&self) -> String {
        format!("__ha_{}_{}", self.left, self.right)
    }

    pub fn contains(&self, node: &str) -> bool {
        self.left == node || self.right == node
    }
}

/// Collect HA pairs from redundancy-tagged links. A node belongs to at
/// most one pair; extra redundancy links between the same partners join
/// the existing pair, links that would chain a third node are left as
/// plain links.
pub(crate) fn detect_ha_pairs(links: &[LinkPlan]) -> Vec<HaPair> {
    let mut pairs: Vec<HaPair> = Vec::new();
    for link in links {
        if !link.link.is_redundancy() || link.from_subgraph || link.to_subgraph {
            continue;
        }
        let (a, b) = (link.from.node.clone(), link.to.node.clone());
        if a == b {
            continue;
        }
        let existing = pairs.iter().find(|p| p.contains(&a) || p.contains(&b));
        match existing {
            Some(pair) if pair.contains(&a) && pair.contains(&b) => {}
            Some(_) => {
                tracing::warn!(
                    from = a.as_str(),
                    to = b.as_str(),
                    "redundancy link would chain a third partner; treating as plain link"
                );
            }
            None => pairs.push(HaPair { left: a, right: b }),
        }
    }
    pairs
}

pub(crate) fn pair_of<'a>(pairs: &'a [HaPair], node: &str) -> Option<&'a HaPair> {
    pairs.iter().find(|p| p.contains(node))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_positions_are_equal_intervals() {
        let config = LayoutConfig::default();
        let size = Size::new(120.0, 72.0);
        let p0 = slot_position(size, Side::Bottom, 0, 3, &config);
        let p1 = slot_position(size, Side::Bottom, 1, 3, &config);
        let p2 = slot_position(size, Side::Bottom, 2, 3, &config);
        assert!((p1.x - p0.x - 40.0).abs() < 1e-9);
        assert!((p2.x - p1.x - 40.0).abs() < 1e-9);
        // Bottom ports sit half their extent below the boundary.
        assert!((p0.y - (36.0 + config.port_height / 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_ha_sides_face_each_other() {
        let (from, to) = ha_sides(Direction::Tb);
        assert_eq!(from, Side::Right);
        assert_eq!(to, Side::Left);
        let (from, to) = ha_sides(Direction::Lr);
        assert_eq!(from, Side::Bottom);
        assert_eq!(to, Side::Top);
    }
}

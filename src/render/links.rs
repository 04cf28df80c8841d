//! Link rendering: parallel bandwidth strokes, the double-line redundancy
//! effect, VLAN coloring, center/VLAN labels and endpoint labels.

use indexmap::IndexMap;

use super::labels::{escape_xml, fmt, hash_prefers_left, text_width};
use super::theme::{vlan_color, ThemePalette};
use crate::model::{Arrow, LayoutLink, LayoutNode, LinkType, Point};

/// Center-to-center spacing of parallel bandwidth strokes.
pub(crate) const STROKE_SPACING: f64 = 3.0;
/// Corner radius for rounded joins, clamped per bend to half the shorter
/// adjacent segment.
pub(crate) const CORNER_RADIUS: f64 = 6.0;

const LABEL_FONT: f64 = 10.0;

/// Copy a polyline, offsetting every point along the perpendicular of its
/// segment. At a bend where the perpendicular direction changes, both the
/// incoming and the outgoing offset point are kept, so parallel copies
/// share the bend topology instead of collapsing into a miter.
pub(crate) fn offset_polyline(points: &[Point], offset: f64) -> Vec<Point> {
    if points.len() < 2 || offset == 0.0 {
        return points.to_vec();
    }

    let perpendicular = |a: Point, b: Point| -> Option<(f64, f64)> {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let len = (dx * dx + dy * dy).sqrt();
        if len < f64::EPSILON {
            return None;
        }
        Some((-dy / len, dx / len))
    };

    let mut perps: Vec<(f64, f64)> = Vec::with_capacity(points.len() - 1);
    let mut last = (0.0, 1.0);
    for pair in points.windows(2) {
        let p = perpendicular(pair[0], pair[1]).unwrap_or(last);
        perps.push(p);
        last = p;
    }

    let shift = |p: Point, (nx, ny): (f64, f64)| Point::new(p.x + nx * offset, p.y + ny * offset);

    let mut out = Vec::with_capacity(points.len() + 2);
    out.push(shift(points[0], perps[0]));
    for i in 1..points.len() - 1 {
        let incoming = perps[i - 1];
        let outgoing = perps[i];
        let same = (incoming.0 * outgoing.0 + incoming.1 * outgoing.1) > 0.999;
        if same {
            out.push(shift(points[i], outgoing));
        } else {
            out.push(shift(points[i], incoming));
            out.push(shift(points[i], outgoing));
        }
    }
    out.push(shift(points[points.len() - 1], perps[perps.len() - 1]));
    out.dedup_by(|a, b| (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9);
    out
}

/// Path data with rounded joins: at every interior point the path enters
/// and leaves on the adjacent segments and turns through a quadratic
/// curve, with the radius clamped to half the shorter segment.
pub(crate) fn rounded_path(points: &[Point], radius: f64) -> String {
    if points.len() < 2 {
        return String::new();
    }
    let mut d = format!("M {} {}", fmt(points[0].x), fmt(points[0].y));
    for i in 1..points.len() - 1 {
        let prev = points[i - 1];
        let here = points[i];
        let next = points[i + 1];
        let len_in = prev.distance_to(here);
        let len_out = here.distance_to(next);
        let r = radius.min(len_in / 2.0).min(len_out / 2.0);
        if r < 0.1 || len_in < f64::EPSILON || len_out < f64::EPSILON {
            d.push_str(&format!(" L {} {}", fmt(here.x), fmt(here.y)));
            continue;
        }
        let entry = Point::new(
            here.x - (here.x - prev.x) / len_in * r,
            here.y - (here.y - prev.y) / len_in * r,
        );
        let exit = Point::new(
            here.x + (next.x - here.x) / len_out * r,
            here.y + (next.y - here.y) / len_out * r,
        );
        d.push_str(&format!(
            " L {} {} Q {} {} {} {}",
            fmt(entry.x),
            fmt(entry.y),
            fmt(here.x),
            fmt(here.y),
            fmt(exit.x),
            fmt(exit.y),
        ));
    }
    let last = points[points.len() - 1];
    d.push_str(&format!(" L {} {}", fmt(last.x), fmt(last.y)));
    d
}

/// Parallel-stroke offsets for a bandwidth class: centered around zero at
/// the fixed stroke spacing.
pub(crate) fn stroke_offsets(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| (i as f64 - (count as f64 - 1.0) / 2.0) * STROKE_SPACING)
        .collect()
}

/// The full `<g class="link-group">` for one routed link.
pub(crate) fn render_link_group(
    link: &LayoutLink,
    nodes: &IndexMap<String, LayoutNode>,
    theme: &ThemePalette,
) -> String {
    let mut out = format!(
        r#"<g class="link-group" data-id="{}">"#,
        escape_xml(&link.id)
    );
    let link_type = link.link.effective_type();
    if link_type == LinkType::Invisible || link.points.len() < 2 {
        out.push_str("</g>\n");
        return out;
    }

    let color = link
        .link
        .style
        .stroke
        .clone()
        .or_else(|| vlan_color(&link.link.vlan).map(|c| c.to_string()))
        .unwrap_or_else(|| theme.link_stroke.to_string());
    let base_width = link.link.style.stroke_width.unwrap_or(match link_type {
        LinkType::Thick => 3.5,
        _ => 1.5,
    });
    let dasharray = link
        .link
        .style
        .dasharray
        .clone()
        .or_else(|| (link_type == LinkType::Dashed).then(|| "6 4".to_string()));
    let dash_attr = dasharray
        .map(|d| format!(r#" stroke-dasharray="{}""#, escape_xml(&d)))
        .unwrap_or_default();
    let marker_attr = match link.link.effective_arrow() {
        Arrow::None => String::new(),
        Arrow::Forward => r#" marker-end="url(#arrow-forward)""#.to_string(),
        Arrow::Back => r#" marker-start="url(#arrow-back)""#.to_string(),
        Arrow::Both => {
            r#" marker-end="url(#arrow-forward)" marker-start="url(#arrow-back)""#.to_string()
        }
    };

    for (index, offset) in stroke_offsets(link.link.stroke_count()).iter().enumerate() {
        let stroke_points = offset_polyline(&link.points, *offset);
        let d = rounded_path(&stroke_points, CORNER_RADIUS);
        let markers = if index == 0 { marker_attr.as_str() } else { "" };
        if index == 0 && link_type == LinkType::Double {
            // Three overlaid paths: thicker outer, thin inner in the
            // background color, then the main stroke.
            out.push_str(&format!(
                r#"<path class="link-double-outer" d="{}" stroke="{}" stroke-width="5"{}/>"#,
                d, escape_xml(&color), dash_attr
            ));
            out.push_str(&format!(
                r#"<path class="link-double-inner" d="{}" stroke="{}" stroke-width="3"/>"#,
                d, theme.link_inner
            ));
        }
        out.push_str(&format!(
            r#"<path class="link" d="{}" stroke="{}" stroke-width="{}"{}{}/>"#,
            d,
            escape_xml(&color),
            fmt(base_width),
            dash_attr,
            markers
        ));
    }

    let mid = polyline_midpoint(&link.points);
    let mut label_y = mid.y;
    if let Some(label) = &link.link.label {
        out.push_str(&label_with_background(
            label.first_line(),
            Point::new(mid.x, label_y - 8.0),
            "link-label",
            theme,
        ));
        label_y += 14.0;
    }
    if !link.link.vlan.is_empty() {
        let text = format!(
            "VLAN {}",
            link.link
                .vlan
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        );
        out.push_str(&label_with_background(
            &text,
            Point::new(mid.x, label_y + 8.0),
            "link-label",
            theme,
        ));
    }

    let vertical = {
        let first = link.points[0];
        let last = link.points[link.points.len() - 1];
        (last.y - first.y).abs() >= (last.x - first.x).abs()
    };
    if let Some(ip) = &link.from_endpoint.ip {
        out.push_str(&endpoint_label(
            ip,
            nodes.get(&link.from),
            link.from_endpoint.port.as_deref(),
            link.points[0],
            mid,
            vertical,
            theme,
        ));
    }
    if let Some(ip) = &link.to_endpoint.ip {
        out.push_str(&endpoint_label(
            ip,
            nodes.get(&link.to),
            link.to_endpoint.port.as_deref(),
            link.points[link.points.len() - 1],
            mid,
            vertical,
            theme,
        ));
    }

    out.push_str("</g>\n");
    out
}

/// Point halfway along the polyline's arc length.
pub(crate) fn polyline_midpoint(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    if points.len() == 1 {
        return points[0];
    }
    let total: f64 = points.windows(2).map(|w| w[0].distance_to(w[1])).sum();
    let mut remaining = total / 2.0;
    for pair in points.windows(2) {
        let len = pair[0].distance_to(pair[1]);
        if len >= remaining && len > f64::EPSILON {
            let t = remaining / len;
            return Point::new(
                pair[0].x + (pair[1].x - pair[0].x) * t,
                pair[0].y + (pair[1].y - pair[0].y) * t,
            );
        }
        remaining -= len;
    }
    points[points.len() - 1]
}

/// IP label next to a port, offset perpendicular to the link direction.
/// A centered port on a vertical link falls back to the name-hash
/// tie-break so the side never flips between runs.
fn endpoint_label(
    ip: &str,
    node: Option<&LayoutNode>,
    port: Option<&str>,
    route_end: Point,
    mid: Point,
    vertical: bool,
    theme: &ThemePalette,
) -> String {
    let anchor = node
        .and_then(|n| port.and_then(|p| n.port_center(p)))
        .unwrap_or(route_end);
    let tw = text_width(ip, LABEL_FONT);

    let center = if vertical {
        let port_dx = node
            .and_then(|n| port.and_then(|p| n.ports.get(p)))
            .map(|p| p.position.x)
            .unwrap_or(0.0);
        let left = if port_dx.abs() > 0.5 {
            port_dx < 0.0
        } else {
            hash_prefers_left(port.unwrap_or(ip))
        };
        let x = if left {
            anchor.x - tw / 2.0 - 12.0
        } else {
            anchor.x + tw / 2.0 + 12.0
        };
        let y = if mid.y >= anchor.y {
            anchor.y + 14.0
        } else {
            anchor.y - 14.0
        };
        Point::new(x, y)
    } else {
        // Horizontal link: just below the line, pulled toward the middle.
        let x = if mid.x >= anchor.x {
            anchor.x + tw / 2.0 + 10.0
        } else {
            anchor.x - tw / 2.0 - 10.0
        };
        Point::new(x, anchor.y + 12.0)
    };

    label_with_background(ip, center, "endpoint-label", theme)
}

/// Text centered on `center` over a rounded background rect sized from
/// the font metrics.
fn label_with_background(
    text: &str,
    center: Point,
    class: &str,
    theme: &ThemePalette,
) -> String {
    let tw = text_width(text, LABEL_FONT);
    let (w, h) = (tw + 8.0, 14.0);
    format!(
        r#"<rect class="port-label-bg" x="{}" y="{}" width="{}" height="{}" rx="3" fill="{}"/><text class="{}" x="{}" y="{}" text-anchor="middle">{}</text>"#,
        fmt(center.x - w / 2.0),
        fmt(center.y - h / 2.0),
        fmt(w),
        fmt(h),
        theme.label_bg,
        class,
        fmt(center.x),
        fmt(center.y + 3.5),
        escape_xml(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stroke_offsets_forty_gig() {
        assert_eq!(stroke_offsets(4), vec![-4.5, -1.5, 1.5, 4.5]);
        assert_eq!(stroke_offsets(1), vec![0.0]);
    }

    #[test]
    fn test_offset_polyline_keeps_straight_segment_parallel() {
        let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)];
        let shifted = offset_polyline(&points, 3.0);
        // Perpendicular of a downward segment points to negative x.
        assert!((shifted[0].x + 3.0).abs() < 1e-9);
        assert!((shifted[1].x + 3.0).abs() < 1e-9);
        assert_eq!(shifted.len(), 2);
    }

    #[test]
    fn test_offset_polyline_inserts_point_at_bend() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 50.0),
            Point::new(80.0, 50.0),
        ];
        let shifted = offset_polyline(&points, 3.0);
        assert_eq!(shifted.len(), 4, "orthogonal bend keeps both offsets");
        // Every output segment is parallel to one of the inputs.
        for pair in shifted.windows(2) {
            let dx = (pair[1].x - pair[0].x).abs();
            let dy = (pair[1].y - pair[0].y).abs();
            assert!(dx < 1e-9 || dy < 1e-9);
        }
    }

    #[test]
    fn test_polyline_midpoint_walks_arc_length() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 10.0),
            Point::new(90.0, 10.0),
        ];
        let mid = polyline_midpoint(&points);
        assert!((mid.y - 10.0).abs() < 1e-9);
        assert!((mid.x - 40.0).abs() < 1e-9);
    }
}

//! Bandwidth legend: lists the bandwidth classes a graph uses with their
//! parallel-stroke glyphs, anchored to one corner of the drawing. The
//! render bounds grow so the legend never overlaps content.

use super::labels::fmt;
use super::links::stroke_offsets;
use super::theme::ThemePalette;
use crate::model::{Bandwidth, Graph, LegendPosition, Point, Rect, Size};

const LEGEND_WIDTH: f64 = 150.0;
const ROW_HEIGHT: f64 = 18.0;
const LEGEND_GAP: f64 = 16.0;

/// Bandwidth classes present in the graph, in ascending enum order.
pub(crate) fn used_bandwidths(graph: &Graph) -> Vec<Bandwidth> {
    Bandwidth::ALL
        .iter()
        .copied()
        .filter(|b| graph.links.iter().any(|l| l.bandwidth == Some(*b)))
        .collect()
}

pub(crate) fn legend_size(entries: usize) -> Size {
    Size::new(LEGEND_WIDTH, 30.0 + entries as f64 * ROW_HEIGHT + 8.0)
}

/// Place the legend box outside the content on the requested corner.
pub(crate) fn legend_rect(position: LegendPosition, content: Rect, size: Size) -> Rect {
    let x = match position {
        LegendPosition::TopLeft | LegendPosition::BottomLeft => content.x,
        LegendPosition::TopRight | LegendPosition::BottomRight => content.right() - size.width,
    };
    let y = match position {
        LegendPosition::TopLeft | LegendPosition::TopRight => content.y - size.height - LEGEND_GAP,
        LegendPosition::BottomLeft | LegendPosition::BottomRight => content.bottom() + LEGEND_GAP,
    };
    Rect::new(x, y, size.width, size.height)
}

pub(crate) fn render_legend(
    bandwidths: &[Bandwidth],
    rect: Rect,
    theme: &ThemePalette,
) -> String {
    let mut out = format!(
        r#"<g class="legend"><rect x="{}" y="{}" width="{}" height="{}" rx="6" fill="{}" stroke="{}"/>"#,
        fmt(rect.x),
        fmt(rect.y),
        fmt(rect.width),
        fmt(rect.height),
        theme.legend_bg,
        theme.legend_stroke,
    );
    out.push_str(&format!(
        r#"<text class="legend-title" x="{}" y="{}">Bandwidth</text>"#,
        fmt(rect.x + 10.0),
        fmt(rect.y + 18.0),
    ));

    for (row, bandwidth) in bandwidths.iter().enumerate() {
        let row_center = Point::new(rect.x + 10.0, rect.y + 30.0 + row as f64 * ROW_HEIGHT + 9.0);
        for offset in stroke_offsets(bandwidth.stroke_count()) {
            let y = row_center.y + offset;
            out.push_str(&format!(
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="1.5"/>"#,
                fmt(row_center.x),
                fmt(y),
                fmt(row_center.x + 36.0),
                fmt(y),
                theme.link_stroke,
            ));
        }
        out.push_str(&format!(
            r#"<text class="legend-entry" x="{}" y="{}">{}</text>"#,
            fmt(row_center.x + 46.0),
            fmt(row_center.y + 3.5),
            bandwidth.label(),
        ));
    }

    out.push_str("</g>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Link, Theme};

    #[test]
    fn test_used_bandwidths_in_enum_order() {
        let mut graph = Graph::default();
        graph
            .links
            .push(Link::new("a", "b").with_bandwidth(Bandwidth::HundredG));
        graph
            .links
            .push(Link::new("b", "c").with_bandwidth(Bandwidth::TenG));
        assert_eq!(
            used_bandwidths(&graph),
            vec![Bandwidth::TenG, Bandwidth::HundredG]
        );
    }

    #[test]
    fn test_legend_sits_outside_content() {
        let content = Rect::new(0.0, 0.0, 500.0, 400.0);
        let size = legend_size(2);
        let rect = legend_rect(LegendPosition::BottomRight, content, size);
        assert!(rect.y >= content.bottom());
        assert!((rect.right() - content.right()).abs() < 1e-9);
        let _ = super::render_legend(
            &[Bandwidth::TenG],
            rect,
            &super::super::theme::palette(Theme::Light),
        );
    }
}

//! Per-shape emitters for node backgrounds. Each shape is a closed set
//! variant with a dedicated emitter; all emitters produce one element
//! carrying the given class, attributes and data id.

use super::labels::fmt;
use crate::model::{NodeShape, Rect};

/// Markup for a node background of the given shape filling `bounds`.
/// `attrs` carries the presentation attributes (fill/stroke overrides)
/// and the `data-id`.
pub(crate) fn shape_markup(shape: NodeShape, bounds: Rect, class: &str, attrs: &str) -> String {
    match shape {
        NodeShape::Rect => rect_markup(bounds, 0.0, class, attrs),
        NodeShape::Rounded => rect_markup(bounds, 8.0, class, attrs),
        NodeShape::Stadium => rect_markup(bounds, bounds.height / 2.0, class, attrs),
        NodeShape::Circle => {
            let c = bounds.center();
            let r = bounds.width.min(bounds.height) / 2.0;
            format!(
                r#"<circle class="{}" cx="{}" cy="{}" r="{}"{}/>"#,
                class,
                fmt(c.x),
                fmt(c.y),
                fmt(r),
                attrs
            )
        }
        NodeShape::Diamond => {
            let c = bounds.center();
            polygon_markup(
                &[
                    (c.x, bounds.y),
                    (bounds.right(), c.y),
                    (c.x, bounds.bottom()),
                    (bounds.x, c.y),
                ],
                class,
                attrs,
            )
        }
        NodeShape::Hexagon => {
            let c = bounds.center();
            // Horizontal half-extent of the points is cos(30) of the half
            // width.
            let hw = 0.866 * bounds.width / 2.0;
            let inner = hw / 2.0;
            polygon_markup(
                &[
                    (c.x - hw, c.y),
                    (c.x - inner, bounds.y),
                    (c.x + inner, bounds.y),
                    (c.x + hw, c.y),
                    (c.x + inner, bounds.bottom()),
                    (c.x - inner, bounds.bottom()),
                ],
                class,
                attrs,
            )
        }
        NodeShape::Cylinder => cylinder_markup(bounds, class, attrs),
        NodeShape::Trapezoid => {
            let inset = 0.15 * bounds.width;
            polygon_markup(
                &[
                    (bounds.x + inset, bounds.y),
                    (bounds.right() - inset, bounds.y),
                    (bounds.right(), bounds.bottom()),
                    (bounds.x, bounds.bottom()),
                ],
                class,
                attrs,
            )
        }
    }
}

fn rect_markup(bounds: Rect, radius: f64, class: &str, attrs: &str) -> String {
    let corner = if radius > 0.0 {
        format!(r#" rx="{}" ry="{}""#, fmt(radius), fmt(radius))
    } else {
        String::new()
    };
    format!(
        r#"<rect class="{}" x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
        class,
        fmt(bounds.x),
        fmt(bounds.y),
        fmt(bounds.width),
        fmt(bounds.height),
        corner,
        attrs
    )
}

fn polygon_markup(points: &[(f64, f64)], class: &str, attrs: &str) -> String {
    let list = points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt(*x), fmt(*y)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(r#"<polygon class="{}" points="{}"{}/>"#, class, list, attrs)
}

/// Cylinder: side walls joined by the bottom arc, plus the top ellipse.
fn cylinder_markup(bounds: Rect, class: &str, attrs: &str) -> String {
    let rx = bounds.width / 2.0;
    let ry = (bounds.height * 0.12).min(bounds.width / 2.0);
    let c = bounds.center();
    let top = bounds.y + ry;
    let bottom = bounds.bottom() - ry;
    let body = format!(
        "M {} {} L {} {} A {} {} 0 0 0 {} {} L {} {} A {} {} 0 0 0 {} {} Z",
        fmt(bounds.x),
        fmt(top),
        fmt(bounds.x),
        fmt(bottom),
        fmt(rx),
        fmt(ry),
        fmt(bounds.right()),
        fmt(bottom),
        fmt(bounds.right()),
        fmt(top),
        fmt(rx),
        fmt(ry),
        fmt(bounds.x),
        fmt(top),
    );
    format!(
        r#"<g class="{}"{}><path d="{}"/><ellipse cx="{}" cy="{}" rx="{}" ry="{}"/></g>"#,
        class,
        attrs,
        body,
        fmt(c.x),
        fmt(top),
        fmt(rx),
        fmt(ry),
    )
}

//! Text helpers shared by the renderer: XML escaping, width estimation,
//! coordinate formatting and the deterministic endpoint tie-break hash.

use sha2::{Digest, Sha256};

/// Escape text for use in SVG content and attribute values.
pub(crate) fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Estimated rendered width of a text run.
pub(crate) fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.6
}

/// Stable coordinate formatting: two decimals with trailing zeros
/// trimmed, so equal input yields byte-identical output.
pub(crate) fn fmt(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    // Negative zero would leak a sign into the output.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    let mut s = format!("{:.2}", rounded);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

/// Deterministic left/right tie-break for a centered port: even digest
/// byte goes left, odd goes right.
pub(crate) fn hash_prefers_left(name: &str) -> bool {
    let digest = Sha256::digest(name.as_bytes());
    digest[0] % 2 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn test_fmt_trims_trailing_zeros() {
        assert_eq!(fmt(12.0), "12");
        assert_eq!(fmt(12.5), "12.5");
        assert_eq!(fmt(12.345), "12.35");
        assert_eq!(fmt(-0.0), "0");
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_prefers_left("eth0"), hash_prefers_left("eth0"));
    }
}

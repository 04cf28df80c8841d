//! Device icon registry.
//!
//! A pure lookup over an immutable set of icon entries. The renderer
//! receives a registry explicitly; a process-global default populated
//! with the built-in device glyphs exists as a convenience shim and is
//! initialized exactly once.

use std::sync::OnceLock;

use indexmap::IndexMap;

/// An inline SVG glyph. `body` is the markup inside the icon's own
/// coordinate system given by `view_box`.
#[derive(Debug, Clone)]
pub struct IconEntry {
    pub id: String,
    pub view_box: String,
    pub body: String,
}

impl IconEntry {
    pub fn new(id: impl Into<String>, view_box: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            view_box: view_box.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IconRegistry {
    entries: IndexMap<String, IconEntry>,
}

impl IconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in device glyphs.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (key, body) in BUILTIN_ICONS {
            registry.register(*key, IconEntry::new(*key, "0 0 48 48", *body));
        }
        registry
    }

    pub fn register(&mut self, key: impl Into<String>, entry: IconEntry) {
        self.entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<&IconEntry> {
        self.entries.get(key)
    }

    /// First hit across a precedence-ordered key list.
    pub fn lookup<'a>(&self, keys: impl IntoIterator<Item = &'a str>) -> Option<&IconEntry> {
        keys.into_iter().find_map(|k| self.entries.get(k))
    }
}

/// Process-global default registry. Read-only after first use.
pub fn default_registry() -> &'static IconRegistry {
    static REGISTRY: OnceLock<IconRegistry> = OnceLock::new();
    REGISTRY.get_or_init(IconRegistry::with_builtins)
}

const BUILTIN_ICONS: &[(&str, &str)] = &[
    (
        "router",
        r#"<circle cx="24" cy="24" r="20" fill="none" stroke-width="3"/><path d="M14 18 L26 18 L22 13 M34 30 L22 30 L26 35 M18 34 L18 22 L13 26 M30 14 L30 26 L35 22" fill="none" stroke-width="2.5"/>"#,
    ),
    (
        "switch",
        r#"<rect x="4" y="14" width="40" height="20" rx="3" fill="none" stroke-width="3"/><path d="M12 21 L24 21 L21 17 M36 27 L24 27 L27 31" fill="none" stroke-width="2.5"/>"#,
    ),
    (
        "firewall",
        r#"<rect x="6" y="10" width="36" height="28" rx="2" fill="none" stroke-width="3"/><path d="M6 19 L42 19 M6 28 L42 28 M18 10 L18 19 M30 19 L30 28 M18 28 L18 38" fill="none" stroke-width="2"/>"#,
    ),
    (
        "server",
        r#"<rect x="10" y="6" width="28" height="36" rx="2" fill="none" stroke-width="3"/><path d="M10 16 L38 16 M10 26 L38 26" fill="none" stroke-width="2"/><circle cx="16" cy="11" r="1.5"/><circle cx="16" cy="21" r="1.5"/><circle cx="16" cy="31" r="1.5"/>"#,
    ),
    (
        "load-balancer",
        r#"<rect x="18" y="4" width="12" height="10" rx="2" fill="none" stroke-width="2.5"/><path d="M24 14 L24 22 M24 22 L10 30 M24 22 L24 34 M24 22 L38 30" fill="none" stroke-width="2.5"/><rect x="4" y="34" width="12" height="10" rx="2" fill="none" stroke-width="2.5"/><rect x="18" y="34" width="12" height="10" rx="2" fill="none" stroke-width="2.5"/><rect x="32" y="34" width="12" height="10" rx="2" fill="none" stroke-width="2.5"/>"#,
    ),
    (
        "cloud",
        r#"<path d="M14 34 a8 8 0 0 1 0 -16 a10 10 0 0 1 19 -3 a8 8 0 0 1 1 19 Z" fill="none" stroke-width="3"/>"#,
    ),
    (
        "storage",
        r#"<ellipse cx="24" cy="10" rx="16" ry="5" fill="none" stroke-width="3"/><path d="M8 10 L8 38 a16 5 0 0 0 32 0 L40 10" fill="none" stroke-width="3"/><path d="M8 24 a16 5 0 0 0 32 0" fill="none" stroke-width="2"/>"#,
    ),
    (
        "wireless",
        r#"<circle cx="24" cy="38" r="3"/><path d="M16 30 a11 11 0 0 1 16 0 M10 23 a19 19 0 0 1 28 0 M5 16 a26 26 0 0 1 38 0" fill="none" stroke-width="3"/>"#,
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_precedence() {
        let registry = IconRegistry::with_builtins();
        let hit = registry.lookup(["no-such-model", "firewall"]).unwrap();
        assert_eq!(hit.id, "firewall");
        assert!(registry.lookup(["nope"]).is_none());
    }
}

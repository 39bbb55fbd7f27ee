//! Schema registry
//!
//! Declares, per address pattern, which value rule applies. The table is
//! open: a new tracked entity is one more [`SchemaEntry`].

use serde::{Deserialize, Serialize};

/// Which hand an address refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Derive the side from an address name: anything mentioning `right`
    /// is the right hand, everything else the left.
    pub fn from_address(name: &str) -> Self {
        if name.contains("right") {
            Side::Right
        } else {
            Side::Left
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value rule for an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// `{"connected": bool}` handshake
    Connect,
    /// Hand tracking: visibility booleans or positional samples
    Tracked { side: Side },
}

/// One registered address pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaEntry {
    /// Address name without the leading `/`
    pub name: String,
    pub kind: EntryKind,
}

impl SchemaEntry {
    /// Number of arguments every entry expects
    pub const ARG_COUNT: usize = 1;

    pub fn connect() -> Self {
        Self {
            name: "connect".to_string(),
            kind: EntryKind::Connect,
        }
    }

    /// Tracked entity; the side is derived from the name
    pub fn tracked(name: impl Into<String>) -> Self {
        let name = name.into();
        let side = Side::from_address(&name);
        Self {
            name,
            kind: EntryKind::Tracked { side },
        }
    }

    /// Whether `key` names a visibility flag rather than positional data
    pub fn is_visibility_key(key: &str) -> bool {
        key.to_lowercase().contains("visible")
    }
}

/// Table of recognized address patterns
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    entries: Vec<SchemaEntry>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registry that only knows the `connect` handshake
    pub fn connect_only() -> Self {
        let mut registry = Self::new();
        registry.register(SchemaEntry::connect());
        registry
    }

    /// Add an entry, replacing any previous entry with the same name
    pub fn register(&mut self, entry: SchemaEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
        } else {
            self.entries.push(entry);
        }
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, entry: SchemaEntry) -> Self {
        self.register(entry);
        self
    }

    /// Look up an address name (leading `/` already stripped)
    pub fn lookup(&self, name: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Registered names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SchemaRegistry {
    /// `connect`, `left_hand` and `right_hand`
    fn default() -> Self {
        Self::connect_only()
            .with(SchemaEntry::tracked("left_hand"))
            .with(SchemaEntry::tracked("right_hand"))
    }
}

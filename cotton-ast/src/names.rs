use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interned representation of a string name. Every name comparison in the
/// interpreter is an integer compare on one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameId(pub u64);

impl std::fmt::Display for NameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Placeholder returned when an id has no interned string.
pub const INVALID_NAME: &str = "[INVALID NAMEID]";

/// Bidirectional string interner. Ids are handed out monotonically starting
/// at 1 and are stable for the lifetime of the table; nothing is ever
/// removed.
#[derive(Debug, Default)]
pub struct NameTable {
    ids: HashMap<String, NameId>,
    strings: HashMap<NameId, String>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, allocating the next one on first sight.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = NameId(self.ids.len() as u64 + 1);
        self.ids.insert(name.to_string(), id);
        self.strings.insert(id, name.to_string());
        id
    }

    /// The string interned under `id`, if any.
    pub fn lookup(&self, id: NameId) -> Option<&str> {
        self.strings.get(&id).map(|s| s.as_str())
    }

    /// Infallible variant of [`lookup`](Self::lookup) for messages.
    pub fn resolve(&self, id: NameId) -> &str {
        self.lookup(id).unwrap_or(INVALID_NAME)
    }

    pub fn contains(&self, id: NameId) -> bool {
        self.strings.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// All interned names, for "did you mean" suggestions.
    pub fn iter(&self) -> impl Iterator<Item = (NameId, &str)> {
        self.strings.iter().map(|(id, s)| (*id, s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_stable() {
        let mut table = NameTable::new();
        let a = table.intern("alpha");
        let b = table.intern("beta");
        assert_ne!(a, b);
        assert_eq!(table.intern("alpha"), a);
        assert_eq!(table.intern("beta"), b);
    }

    #[test]
    fn test_lookup_round_trip() {
        let mut table = NameTable::new();
        for name in ["x", "y", "__add__", "a_long_identifier"] {
            let id = table.intern(name);
            assert_eq!(table.lookup(id), Some(name));
            assert!(table.contains(id));
        }
    }

    #[test]
    fn test_unknown_id() {
        let table = NameTable::new();
        assert_eq!(table.lookup(NameId(42)), None);
        assert_eq!(table.resolve(NameId(42)), INVALID_NAME);
        assert!(!table.contains(NameId(42)));
    }

    #[test]
    fn test_distinct_strings_distinct_ids() {
        let mut table = NameTable::new();
        let mut seen = std::collections::HashSet::new();
        for i in 0..100 {
            let id = table.intern(&format!("name{}", i));
            assert!(seen.insert(id));
        }
        assert_eq!(table.len(), 100);
    }
}

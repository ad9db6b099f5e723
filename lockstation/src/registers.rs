//! Register store
//!
//! The lock station exposes a small set of named key slots ("registers").
//! The set of names is fixed when the store is created; only the values
//! change afterwards, in response to operator actions.

/// In-memory view of the station's registers. Each register holds at most
/// one key string, with the empty string meaning "no key assigned".
pub struct RegisterStore {
    /// Slots in listing order. The set is tiny, so a vector doubles as
    /// both the lookup table and the stable ordering.
    slots: Vec<(String, String)>,
}

impl RegisterStore {
    /// Returns a store for the given register names, all unassigned.
    /// Duplicate names collapse to their first occurrence.
    pub fn new<S: AsRef<str>>(names: &[S]) -> RegisterStore {
        let mut slots: Vec<(String, String)> = Vec::new();
        for name in names {
            let name = name.as_ref();
            if !slots.iter().any(|(n, _)| n == name) {
                slots.push((name.to_string(), String::new()));
            }
        }
        RegisterStore { slots }
    }

    /// The key currently held by `name`. Returns the empty string both for
    /// an unassigned register and for a name outside the register set.
    pub fn get(&self, name: &str) -> &str {
        self.slots
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, key)| key.as_str())
            .unwrap_or("")
    }

    /// Associates `key` with `name`. Any string is accepted, including the
    /// empty one. Returns false, storing nothing, if `name` is not part of
    /// the register set.
    pub fn set(&mut self, name: &str, key: &str) -> bool {
        if let Some(slot) = self.slots.iter_mut().find(|(n, _)| n == name) {
            slot.1 = key.to_string();
            true
        } else {
            false
        }
    }

    /// Removes the key held by `name`. Equivalent to `set(name, "")`.
    pub fn clear(&mut self, name: &str) -> bool {
        self.set(name, "")
    }

    /// Register names in their stable listing order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(n, _)| n.as_str())
    }

    /// Number of registers in the fixed set.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_store() -> RegisterStore {
        RegisterStore::new(&["EXX", "EYX", "EZX"])
    }

    #[test]
    fn starts_empty() {
        let store = reference_store();
        assert_eq!(store.len(), 3);
        for name in ["EXX", "EYX", "EZX"] {
            assert_eq!(store.get(name), "");
        }
    }

    #[test]
    fn set_then_get() {
        let mut store = reference_store();
        assert!(store.set("EXX", "abc123"));
        assert_eq!(store.get("EXX"), "abc123");
        assert_eq!(store.get("EYX"), "");
    }

    #[test]
    fn set_overwrites() {
        let mut store = reference_store();
        store.set("EYX", "first");
        store.set("EYX", "second");
        assert_eq!(store.get("EYX"), "second");
    }

    #[test]
    fn clear_returns_to_empty() {
        let mut store = reference_store();
        store.set("EZX", "k");
        assert!(store.clear("EZX"));
        assert_eq!(store.get("EZX"), "");
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mut store = reference_store();
        assert!(!store.set("NOPE", "k"));
        assert!(!store.clear("NOPE"));
        assert_eq!(store.get("NOPE"), "");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn listing_order_is_stable() {
        let mut store = reference_store();
        store.set("EYX", "k");
        store.clear("EYX");
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, ["EXX", "EYX", "EZX"]);
    }

    #[test]
    fn duplicate_names_collapse() {
        let store = RegisterStore::new(&["EXX", "EXX", "EYX"]);
        let names: Vec<&str> = store.names().collect();
        assert_eq!(names, ["EXX", "EYX"]);
    }

    #[test]
    fn empty_key_is_accepted() {
        let mut store = reference_store();
        assert!(store.set("EXX", ""));
        assert_eq!(store.get("EXX"), "");
    }
}

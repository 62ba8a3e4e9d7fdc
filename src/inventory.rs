//! Strict top-level access to the inventory

use crate::error::RenderError;
use crate::value::{Mapping, Value};

/// Borrowed view of the inventory for one render call
#[derive(Debug, Clone, Copy)]
pub struct Inventory<'a> {
    root: &'a Value,
    entries: &'a Mapping,
}

impl<'a> Inventory<'a> {
    /// Wrap an inventory value, which must be a mapping
    pub fn new(root: &'a Value) -> Result<Self, RenderError> {
        let entries = root.as_mapping()?;
        Ok(Self { root, entries })
    }

    /// The inventory as a value (the template's root `.`)
    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// Value stored under `key`; no dotted-path traversal
    pub fn lookup(&self, key: &str) -> Result<&'a Value, RenderError> {
        self.entries
            .get(key)
            .ok_or_else(|| RenderError::MissingKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    fn sample() -> Value {
        [
            ("KeyOne", Value::from("v1")),
            ("KeyTwo", Value::Int(2)),
            (
                "Nested",
                [("KeyA", Value::from("a"))].into_iter().collect::<Value>(),
            ),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_lookup_returns_stored_value() {
        let root = sample();
        let inventory = Inventory::new(&root).unwrap();
        for (key, value) in root.as_mapping().unwrap() {
            assert_eq!(inventory.lookup(key), Ok(value));
        }
    }

    #[test]
    fn test_lookup_missing_key() {
        let root = sample();
        let inventory = Inventory::new(&root).unwrap();
        assert_eq!(
            inventory.lookup("Missing"),
            Err(RenderError::MissingKey("Missing".into()))
        );
    }

    #[test]
    fn test_lookup_does_not_traverse_paths() {
        let root = sample();
        let inventory = Inventory::new(&root).unwrap();
        assert!(inventory.lookup("Nested.KeyA").is_err());
    }

    #[test]
    fn test_inventory_must_be_mapping() {
        let root = Value::Sequence(vec![]);
        assert_eq!(
            Inventory::new(&root).err(),
            Some(RenderError::TypeMismatch {
                expected: "mapping",
                actual: ValueKind::Sequence
            })
        );
    }
}

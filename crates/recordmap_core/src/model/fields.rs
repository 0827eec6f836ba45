//! Fixed-key field storage for one record.
//!
//! # Responsibility
//! - Hold one value per table column, in column order.
//! - Provide hydrate/clear/serialize operations over that state.
//!
//! # Invariants
//! - The key set is exactly the column list given at construction; no
//!   operation adds or removes keys.
//! - A missing value is stored as explicit `Value::Null`.

use crate::model::value::Value;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::sync::Arc;

/// Column-name -> value state of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStore {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl FieldStore {
    /// Creates a store with every column set to null.
    pub fn new(columns: Arc<[String]>) -> Self {
        let values = vec![Value::Null; columns.len()];
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the value of `column`, or `None` when it is not a column.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|index| &self.values[index])
    }

    /// Sets `column` and returns the previous value.
    ///
    /// Returns `None` without changing anything when `column` is not a column.
    pub fn set(&mut self, column: &str, value: Value) -> Option<Value> {
        let index = self.position(column)?;
        Some(std::mem::replace(&mut self.values[index], value))
    }

    /// Copies known columns from `row`, leaving the rest untouched.
    ///
    /// Columns present in `row` are overwritten (including with null). Absent
    /// columns keep any value already set, so fields populated before
    /// hydration are not clobbered; unset fields remain null. Unknown keys in
    /// `row` are ignored.
    pub fn hydrate(&mut self, row: &HashMap<String, Value>) {
        for (index, column) in self.columns.iter().enumerate() {
            if let Some(value) = row.get(column) {
                self.values[index] = value.clone();
            }
        }
    }

    /// Resets every column to null.
    pub fn clear(&mut self) {
        self.values.iter_mut().for_each(|value| *value = Value::Null);
    }

    /// Returns a snapshot of all fields in column order.
    pub fn to_map(&self) -> FieldMap {
        FieldMap {
            entries: self
                .columns
                .iter()
                .cloned()
                .zip(self.values.iter().cloned())
                .collect(),
        }
    }

    /// Iterates `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }
}

/// Ordered snapshot of a record's fields, detached from the record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_row(self) -> HashMap<String, Value> {
        self.entries.into_iter().collect()
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::FieldStore;
    use crate::model::value::Value;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn store() -> FieldStore {
        let columns: Arc<[String]> = vec!["id".to_string(), "x".to_string(), "y".to_string()].into();
        FieldStore::new(columns)
    }

    #[test]
    fn new_store_has_every_column_null() {
        let store = store();
        assert_eq!(store.columns().len(), 3);
        assert!(store.iter().all(|(_, value)| value.is_null()));
    }

    #[test]
    fn hydrate_preserves_preset_fields_missing_from_row() {
        let mut store = store();
        store.set("x", Value::Integer(5));

        let row = HashMap::from([("y".to_string(), Value::from("b"))]);
        store.hydrate(&row);

        assert_eq!(store.get("x"), Some(&Value::Integer(5)));
        assert_eq!(store.get("y"), Some(&Value::from("b")));
        assert_eq!(store.get("id"), Some(&Value::Null));
    }

    #[test]
    fn hydrate_ignores_unknown_keys() {
        let mut store = store();
        let row = HashMap::from([("rogue".to_string(), Value::Integer(1))]);
        store.hydrate(&row);

        assert_eq!(store.get("rogue"), None);
        assert_eq!(store.to_map().len(), 3);
    }

    #[test]
    fn set_rejects_unknown_columns() {
        let mut store = store();
        assert_eq!(store.set("rogue", Value::Integer(1)), None);
        assert_eq!(store.set("x", Value::Integer(1)), Some(Value::Null));
    }

    #[test]
    fn clear_nulls_every_column_and_keeps_keys() {
        let mut store = store();
        store.set("id", Value::Integer(3));
        store.set("x", Value::from("a"));
        store.clear();

        let map = store.to_map();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["id", "x", "y"]);
        assert!(map.iter().all(|(_, value)| value.is_null()));
    }
}

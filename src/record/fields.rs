//! Field tables - the shared payload contract for registered kinds
//!
//! A kind's constructor declares its schema by building a default table;
//! records of that kind then carry their own copy with edited values.
//! Values are a small closed set: scalars, text, references to other
//! records, and asset slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::prefab::PrefabAsset;
use super::reference::RecordRef;

/// One field value
///
/// Untagged on the wire: scalars and text serialize as JSON primitives,
/// references and assets as objects. A reference is recognized by its
/// mandatory `category` key; anything else object-shaped must match the
/// asset layout exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Reference(RecordRef),
    Asset(PrefabAsset),
}

impl FieldValue {
    /// Short label for the value's type, for editor display and reports
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "Bool",
            FieldValue::Int(_) => "Int",
            FieldValue::Float(_) => "Float",
            FieldValue::Text(_) => "Text",
            FieldValue::Reference(_) => "Reference",
            FieldValue::Asset(_) => "Asset",
        }
    }

    /// Align a decoded value with the schema default it replaces
    ///
    /// JSON cannot distinguish `3` from `3.0`, so an integer stored for a
    /// float field comes back as `Int`; this nudges it to the declared type.
    pub fn coerced_like(self, schema: &FieldValue) -> FieldValue {
        match (&self, schema) {
            (FieldValue::Int(i), FieldValue::Float(_)) => FieldValue::Float(*i as f64),
            _ => self,
        }
    }
}

/// Named fields of one record, ordered by field name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTable {
    fields: BTreeMap<String, FieldValue>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, used by kind constructors
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// References held by this table's fields
    pub fn references(&self) -> impl Iterator<Item = &RecordRef> {
        self.fields.values().filter_map(|v| match v {
            FieldValue::Reference(r) => Some(r),
            _ => None,
        })
    }

    /// Asset slots held by this table's fields
    pub fn assets(&self) -> impl Iterator<Item = &PrefabAsset> {
        self.fields.values().filter_map(|v| match v {
            FieldValue::Asset(a) => Some(a),
            _ => None,
        })
    }
}

//! The per-entity contract consumed by the generic entity service.
//!
//! An [`Entity`] describes one record type: how a create payload is validated
//! into a record, how a partial patch is applied, which fields are unique,
//! filterable, searchable and sortable, and which aggregates `stats` reports.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::ValidationError;

/// A field value that must be unique (case-insensitively) across the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    pub field: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(field: &'static str, value: impl Into<String>) -> Self {
        Self { field, value: value.into() }
    }

    pub fn collides_with(&self, other: &UniqueKey) -> bool {
        self.field == other.field && self.value.to_lowercase() == other.value.to_lowercase()
    }
}

/// Comparable projection of a record field used for sorting.
#[derive(Debug, Clone, PartialEq)]
pub enum SortValue {
    Int(i64),
    Float(f64),
    Text(String),
    Time(DateTime<Utc>),
}

impl SortValue {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_lowercase())
    }

    /// Total order; values of different kinds compare equal.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Time(a), Self::Time(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

pub trait Entity: Clone + Debug + Serialize + Send + Sync + 'static {
    /// Create payload, decoded from the request body before validation.
    type Create: DeserializeOwned + Debug + Send + Sync + 'static;
    /// Partial update payload; absent fields are left untouched.
    type Patch: DeserializeOwned + Debug + Send + Sync + 'static;
    type Stats: Serialize + Debug + Send + 'static;

    /// Display name, e.g. `Item`.
    const NAME: &'static str;
    /// Collection name used in URLs and messages, e.g. `items`.
    const PLURAL: &'static str;
    /// Fields a create body must carry.
    const REQUIRED_FIELDS: &'static [&'static str];
    /// Query parameters accepted as equality filters by `get_all`.
    const FILTER_FIELDS: &'static [&'static str];
    const SORT_FIELDS: &'static [&'static str];

    fn id(&self) -> u64;
    fn touch(&mut self, at: DateTime<Utc>);

    /// Validate every field of `input` and build the record with the given id.
    fn from_create(id: u64, input: Self::Create, now: DateTime<Utc>) -> Result<Self, ValidationError>;

    /// Validate and apply the present fields, returning their names.
    /// Callers apply onto a copy, so a failure part way leaves the stored record intact.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<Vec<&'static str>, ValidationError>;

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// String form of a filterable field, compared case-insensitively.
    fn filter_value(&self, field: &str) -> Option<String>;

    fn sort_value(&self, field: &str) -> Option<SortValue>;

    /// Text fields matched by `search`.
    fn search_fields(&self) -> Vec<&str>;

    fn stats(records: &[Self]) -> Self::Stats;
}

/// Implements `id` and `touch` of [`Entity`] for records with
/// `id`, `created_at` and `updated_at` fields.
#[macro_export]
macro_rules! record_meta {
    () => {
        fn id(&self) -> u64 { self.id }
        fn touch(&mut self, at: ::chrono::DateTime<::chrono::Utc>) {
            // 时钟回拨时保持 updated_at >= created_at
            self.updated_at = at.max(self.created_at);
        }
    };
}

/// Increments the counter for `key`, keeping keys sorted for stable output.
pub fn bump(counts: &mut std::collections::BTreeMap<String, usize>, key: impl Into<String>) {
    *counts.entry(key.into()).or_insert(0) += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_keys_collide_case_insensitively() {
        let a = UniqueKey::new("name", "Widget");
        assert!(a.collides_with(&UniqueKey::new("name", "WIDGET")));
        assert!(!a.collides_with(&UniqueKey::new("sku", "widget")));
    }

    #[test]
    fn sort_values_order_within_kind() {
        assert_eq!(SortValue::Float(1.5).compare(&SortValue::Float(2.0)), Ordering::Less);
        assert_eq!(SortValue::text("b").compare(&SortValue::text("A")), Ordering::Greater);
        assert_eq!(SortValue::Int(1).compare(&SortValue::text("a")), Ordering::Equal);
    }
}

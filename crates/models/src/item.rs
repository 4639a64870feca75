use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{bump, Entity, SortValue, UniqueKey};
use crate::errors::ValidationError;
use crate::status::ItemStatus;
use crate::validation::{self as v, EnumField};

pub const NAME_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;
pub const CATEGORY_MAX: usize = 50;
pub const DEFAULT_CATEGORY: &str = "general";

/// Generic stock item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub quantity: u64,
    pub price: f64,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create and patch payload; every field raw until validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ItemInput {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub category: Option<Value>,
    pub quantity: Option<Value>,
    pub price: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub total_quantity: u64,
    /// Sum of `price * quantity`, rounded to cents.
    pub total_value: f64,
}

fn category(raw: Option<&Value>) -> Result<String, ValidationError> {
    Ok(v::optional_string("category", raw, CATEGORY_MAX)?.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()))
}

impl Entity for Item {
    type Create = ItemInput;
    type Patch = ItemInput;
    type Stats = ItemStats;

    const NAME: &'static str = "Item";
    const PLURAL: &'static str = "items";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name"];
    const FILTER_FIELDS: &'static [&'static str] = &["status", "category"];
    const SORT_FIELDS: &'static [&'static str] =
        &["id", "name", "category", "quantity", "price", "status", "createdAt", "updatedAt"];

    crate::record_meta!();

    fn from_create(id: u64, input: ItemInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: v::required_string("name", input.name.as_ref(), NAME_MAX)?,
            description: v::optional_string("description", input.description.as_ref(), DESCRIPTION_MAX)?,
            category: category(input.category.as_ref())?,
            quantity: match &input.quantity {
                Some(raw) => v::non_negative_int("quantity", Some(raw))?,
                None => 0,
            },
            price: match &input.price {
                Some(raw) => v::price("price", Some(raw), true)?,
                None => 0.0,
            },
            status: match &input.status {
                Some(raw) => v::enum_value(Some(raw))?,
                None => ItemStatus::default(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ItemInput) -> Result<Vec<&'static str>, ValidationError> {
        let mut changed = Vec::new();
        if let Some(raw) = &patch.name {
            self.name = v::required_string("name", Some(raw), NAME_MAX)?;
            changed.push("name");
        }
        if let Some(raw) = &patch.description {
            self.description = v::optional_string("description", Some(raw), DESCRIPTION_MAX)?;
            changed.push("description");
        }
        if let Some(raw) = &patch.category {
            self.category = category(Some(raw))?;
            changed.push("category");
        }
        if let Some(raw) = &patch.quantity {
            self.quantity = v::non_negative_int("quantity", Some(raw))?;
            changed.push("quantity");
        }
        if let Some(raw) = &patch.price {
            self.price = v::price("price", Some(raw), true)?;
            changed.push("price");
        }
        if let Some(raw) = &patch.status {
            self.status = v::enum_value(Some(raw))?;
            changed.push("status");
        }
        Ok(changed)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::new("name", &self.name)]
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.as_str().to_string()),
            "category" => Some(self.category.clone()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "id" => SortValue::Int(self.id as i64),
            "name" => SortValue::text(&self.name),
            "category" => SortValue::text(&self.category),
            "quantity" => SortValue::Int(self.quantity as i64),
            "price" => SortValue::Float(self.price),
            "status" => SortValue::text(self.status.as_str()),
            "createdAt" => SortValue::Time(self.created_at),
            "updatedAt" => SortValue::Time(self.updated_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.category.as_str()];
        if let Some(d) = &self.description {
            fields.push(d.as_str());
        }
        fields
    }

    fn stats(records: &[Self]) -> ItemStats {
        let mut stats = ItemStats { total: records.len(), ..Default::default() };
        for item in records {
            bump(&mut stats.by_status, item.status.as_str());
            bump(&mut stats.by_category, item.category.as_str());
            stats.total_quantity = stats.total_quantity.saturating_add(item.quantity);
            stats.total_value += item.price * item.quantity as f64;
        }
        stats.total_value = v::round2(stats.total_value);
        stats
    }
}

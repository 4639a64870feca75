use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{bump, Entity, SortValue, UniqueKey};
use crate::errors::ValidationError;
use crate::status::ProductStatus;
use crate::validation::{self as v, EnumField};

pub const NAME_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 1000;
pub const CATEGORY_MAX: usize = 50;
pub const SKU_MAX: usize = 50;
/// Products with fewer units in stock count as low stock.
pub const LOW_STOCK_THRESHOLD: u64 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price: f64,
    pub stock: u64,
    pub sku: Option<String>,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: Option<Value>,
    pub description: Option<Value>,
    pub category: Option<Value>,
    pub price: Option<Value>,
    pub stock: Option<Value>,
    pub sku: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub total_stock: u64,
    pub inventory_value: f64,
    pub average_price: f64,
    pub low_stock: usize,
    pub out_of_stock: usize,
}

impl Entity for Product {
    type Create = ProductInput;
    type Patch = ProductInput;
    type Stats = ProductStats;

    const NAME: &'static str = "Product";
    const PLURAL: &'static str = "products";
    const REQUIRED_FIELDS: &'static [&'static str] = &["name", "category", "price"];
    const FILTER_FIELDS: &'static [&'static str] = &["status", "category"];
    const SORT_FIELDS: &'static [&'static str] =
        &["id", "name", "category", "price", "stock", "status", "createdAt", "updatedAt"];

    crate::record_meta!();

    fn from_create(id: u64, input: ProductInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: v::required_string("name", input.name.as_ref(), NAME_MAX)?,
            description: v::optional_string("description", input.description.as_ref(), DESCRIPTION_MAX)?,
            category: v::required_string("category", input.category.as_ref(), CATEGORY_MAX)?,
            price: v::price("price", input.price.as_ref(), false)?,
            stock: match &input.stock {
                Some(raw) => v::non_negative_int("stock", Some(raw))?,
                None => 0,
            },
            sku: v::optional_string("sku", input.sku.as_ref(), SKU_MAX)?.map(|s| s.to_uppercase()),
            status: match &input.status {
                Some(raw) => v::enum_value(Some(raw))?,
                None => ProductStatus::default(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ProductInput) -> Result<Vec<&'static str>, ValidationError> {
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
            self.category = v::required_string("category", Some(raw), CATEGORY_MAX)?;
            changed.push("category");
        }
        if let Some(raw) = &patch.price {
            self.price = v::price("price", Some(raw), false)?;
            changed.push("price");
        }
        if let Some(raw) = &patch.stock {
            self.stock = v::non_negative_int("stock", Some(raw))?;
            changed.push("stock");
        }
        if let Some(raw) = &patch.sku {
            self.sku = v::optional_string("sku", Some(raw), SKU_MAX)?.map(|s| s.to_uppercase());
            changed.push("sku");
        }
        if let Some(raw) = &patch.status {
            self.status = v::enum_value(Some(raw))?;
            changed.push("status");
        }
        Ok(changed)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        let mut keys = vec![UniqueKey::new("name", &self.name)];
        if let Some(sku) = &self.sku {
            keys.push(UniqueKey::new("sku", sku));
        }
        keys
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
            "price" => SortValue::Float(self.price),
            "stock" => SortValue::Int(self.stock as i64),
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
        if let Some(sku) = &self.sku {
            fields.push(sku.as_str());
        }
        fields
    }

    fn stats(records: &[Self]) -> ProductStats {
        let mut stats = ProductStats { total: records.len(), ..Default::default() };
        let mut price_sum = 0.0;
        for p in records {
            bump(&mut stats.by_status, p.status.as_str());
            bump(&mut stats.by_category, p.category.as_str());
            stats.total_stock = stats.total_stock.saturating_add(p.stock);
            stats.inventory_value += p.price * p.stock as f64;
            price_sum += p.price;
            if p.stock == 0 {
                stats.out_of_stock += 1;
            } else if p.stock < LOW_STOCK_THRESHOLD {
                stats.low_stock += 1;
            }
        }
        stats.inventory_value = v::round2(stats.inventory_value);
        if !records.is_empty() {
            stats.average_price = v::round2(price_sum / records.len() as f64);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: Value) -> ProductInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn price_must_be_positive() {
        let err = Product::from_create(1, input(json!({"name": "Lamp", "category": "home", "price": 0})), Utc::now())
            .unwrap_err();
        assert_eq!(err.message, "price must be greater than 0");
    }

    #[test]
    fn huge_price_is_rejected_and_stock_sum_saturates() {
        let err = Product::from_create(1, input(json!({"name": "Big", "category": "c", "price": 1e307})), Utc::now())
            .unwrap_err();
        assert_eq!(err.message, "price is out of range");

        let now = Utc::now();
        let mut a = Product::from_create(1, input(json!({"name": "a", "category": "c", "price": 1})), now).unwrap();
        a.stock = u64::MAX;
        let b = Product::from_create(2, input(json!({"name": "b", "category": "c", "price": 1, "stock": 3})), now).unwrap();
        let stats = Product::stats(&[a, b]);
        assert_eq!(stats.total_stock, u64::MAX);
        assert!(stats.inventory_value.is_finite());
    }

    #[test]
    fn sku_is_unique_key_when_present() {
        let p = Product::from_create(
            1,
            input(json!({"name": "Lamp", "category": "home", "price": 20, "sku": "lmp-1"})),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(p.sku.as_deref(), Some("LMP-1"));
        assert_eq!(p.unique_keys().len(), 2);
    }

    #[test]
    fn stats_report_stock_levels() {
        let now = Utc::now();
        let a = Product::from_create(1, input(json!({"name": "a", "category": "c", "price": 10, "stock": 3})), now).unwrap();
        let b = Product::from_create(2, input(json!({"name": "b", "category": "c", "price": 20, "stock": 0})), now).unwrap();
        let c = Product::from_create(3, input(json!({"name": "c", "category": "d", "price": 30, "stock": 50})), now).unwrap();
        let stats = Product::stats(&[a, b, c]);
        assert_eq!(stats.inventory_value, 1530.0);
        assert_eq!(stats.average_price, 20.0);
        assert_eq!(stats.low_stock, 1);
        assert_eq!(stats.out_of_stock, 1);
        assert_eq!(stats.by_category.get("c"), Some(&2));
    }
}

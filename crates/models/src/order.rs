use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{bump, Entity, SortValue};
use crate::errors::ValidationError;
use crate::status::OrderStatus;
use crate::validation::{self as v, EnumField};

pub const CUSTOMER_NAME_MAX: usize = 100;
pub const PRODUCT_NAME_MAX: usize = 200;

/// Single-line customer order. `total` is derived from `quantity * unit_price`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    pub customer_name: String,
    pub customer_email: String,
    pub product_name: String,
    pub quantity: u64,
    pub unit_price: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub customer_name: Option<Value>,
    pub customer_email: Option<Value>,
    pub product_name: Option<Value>,
    pub quantity: Option<Value>,
    pub unit_price: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Sum of order totals, cancelled orders excluded.
    pub revenue: f64,
    pub average_order_value: f64,
    pub units_sold: u64,
}

fn line_total(quantity: u64, unit_price: f64) -> f64 {
    v::round2(quantity as f64 * unit_price)
}

impl Entity for Order {
    type Create = OrderInput;
    type Patch = OrderInput;
    type Stats = OrderStats;

    const NAME: &'static str = "Order";
    const PLURAL: &'static str = "orders";
    const REQUIRED_FIELDS: &'static [&'static str] =
        &["customerName", "customerEmail", "productName", "quantity", "unitPrice"];
    const FILTER_FIELDS: &'static [&'static str] = &["status", "customerEmail"];
    const SORT_FIELDS: &'static [&'static str] =
        &["id", "customerName", "quantity", "unitPrice", "total", "status", "createdAt", "updatedAt"];

    crate::record_meta!();

    fn from_create(id: u64, input: OrderInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let quantity = v::positive_int("quantity", input.quantity.as_ref())?;
        let unit_price = v::price("unitPrice", input.unit_price.as_ref(), false)?;
        Ok(Self {
            id,
            customer_name: v::required_string("customerName", input.customer_name.as_ref(), CUSTOMER_NAME_MAX)?,
            customer_email: v::email("customerEmail", input.customer_email.as_ref())?,
            product_name: v::required_string("productName", input.product_name.as_ref(), PRODUCT_NAME_MAX)?,
            quantity,
            unit_price,
            total: line_total(quantity, unit_price),
            status: match &input.status {
                Some(raw) => v::enum_value(Some(raw))?,
                None => OrderStatus::default(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: OrderInput) -> Result<Vec<&'static str>, ValidationError> {
        let mut changed = Vec::new();
        if let Some(raw) = &patch.customer_name {
            self.customer_name = v::required_string("customerName", Some(raw), CUSTOMER_NAME_MAX)?;
            changed.push("customerName");
        }
        if let Some(raw) = &patch.customer_email {
            self.customer_email = v::email("customerEmail", Some(raw))?;
            changed.push("customerEmail");
        }
        if let Some(raw) = &patch.product_name {
            self.product_name = v::required_string("productName", Some(raw), PRODUCT_NAME_MAX)?;
            changed.push("productName");
        }
        if let Some(raw) = &patch.quantity {
            self.quantity = v::positive_int("quantity", Some(raw))?;
            changed.push("quantity");
        }
        if let Some(raw) = &patch.unit_price {
            self.unit_price = v::price("unitPrice", Some(raw), false)?;
            changed.push("unitPrice");
        }
        if let Some(raw) = &patch.status {
            self.status = v::enum_value(Some(raw))?;
            changed.push("status");
        }
        self.total = line_total(self.quantity, self.unit_price);
        Ok(changed)
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.as_str().to_string()),
            "customerEmail" => Some(self.customer_email.clone()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "id" => SortValue::Int(self.id as i64),
            "customerName" => SortValue::text(&self.customer_name),
            "quantity" => SortValue::Int(self.quantity as i64),
            "unitPrice" => SortValue::Float(self.unit_price),
            "total" => SortValue::Float(self.total),
            "status" => SortValue::text(self.status.as_str()),
            "createdAt" => SortValue::Time(self.created_at),
            "updatedAt" => SortValue::Time(self.updated_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.customer_name.as_str(), self.customer_email.as_str(), self.product_name.as_str()]
    }

    fn stats(records: &[Self]) -> OrderStats {
        let mut stats = OrderStats { total: records.len(), ..Default::default() };
        let mut counted = 0usize;
        for order in records {
            bump(&mut stats.by_status, order.status.as_str());
            if order.status != OrderStatus::Cancelled {
                stats.revenue += order.total;
                stats.units_sold = stats.units_sold.saturating_add(order.quantity);
                counted += 1;
            }
        }
        stats.revenue = v::round2(stats.revenue);
        if counted > 0 {
            stats.average_order_value = v::round2(stats.revenue / counted as f64);
        }
        stats
    }
}

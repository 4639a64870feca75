use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{bump, Entity, SortValue};
use crate::errors::ValidationError;
use crate::status::ReviewStatus;
use crate::validation::{self as v, EnumField};

pub const AUTHOR_MAX: usize = 100;
pub const TITLE_MAX: usize = 200;
pub const COMMENT_MAX: usize = 2000;
pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: u64,
    pub product_id: u64,
    pub author: String,
    pub rating: u8,
    pub title: Option<String>,
    pub comment: Option<String>,
    pub status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    pub product_id: Option<Value>,
    pub author: Option<Value>,
    pub rating: Option<Value>,
    pub title: Option<Value>,
    pub comment: Option<Value>,
    pub status: Option<Value>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Count per star, `"1"` through `"5"`.
    pub rating_distribution: BTreeMap<String, usize>,
    pub average_rating: f64,
}

fn rating(raw: Option<&Value>) -> Result<u8, ValidationError> {
    // 范围已限定在 1..=5，转换不会溢出
    Ok(v::int_in_range("rating", raw, RATING_MIN, RATING_MAX)? as u8)
}

impl Entity for Review {
    type Create = ReviewInput;
    type Patch = ReviewInput;
    type Stats = ReviewStats;

    const NAME: &'static str = "Review";
    const PLURAL: &'static str = "reviews";
    const REQUIRED_FIELDS: &'static [&'static str] = &["productId", "author", "rating"];
    const FILTER_FIELDS: &'static [&'static str] = &["status", "productId", "rating"];
    const SORT_FIELDS: &'static [&'static str] = &["id", "productId", "author", "rating", "status", "createdAt", "updatedAt"];

    crate::record_meta!();

    fn from_create(id: u64, input: ReviewInput, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            product_id: v::positive_int("productId", input.product_id.as_ref())?,
            author: v::required_string("author", input.author.as_ref(), AUTHOR_MAX)?,
            rating: rating(input.rating.as_ref())?,
            title: v::optional_string("title", input.title.as_ref(), TITLE_MAX)?,
            comment: v::optional_string("comment", input.comment.as_ref(), COMMENT_MAX)?,
            status: match &input.status {
                Some(raw) => v::enum_value(Some(raw))?,
                None => ReviewStatus::default(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    fn apply_patch(&mut self, patch: ReviewInput) -> Result<Vec<&'static str>, ValidationError> {
        let mut changed = Vec::new();
        if let Some(raw) = &patch.product_id {
            self.product_id = v::positive_int("productId", Some(raw))?;
            changed.push("productId");
        }
        if let Some(raw) = &patch.author {
            self.author = v::required_string("author", Some(raw), AUTHOR_MAX)?;
            changed.push("author");
        }
        if let Some(raw) = &patch.rating {
            self.rating = rating(Some(raw))?;
            changed.push("rating");
        }
        if let Some(raw) = &patch.title {
            self.title = v::optional_string("title", Some(raw), TITLE_MAX)?;
            changed.push("title");
        }
        if let Some(raw) = &patch.comment {
            self.comment = v::optional_string("comment", Some(raw), COMMENT_MAX)?;
            changed.push("comment");
        }
        if let Some(raw) = &patch.status {
            self.status = v::enum_value(Some(raw))?;
            changed.push("status");
        }
        Ok(changed)
    }

    fn filter_value(&self, field: &str) -> Option<String> {
        match field {
            "status" => Some(self.status.as_str().to_string()),
            "productId" => Some(self.product_id.to_string()),
            "rating" => Some(self.rating.to_string()),
            _ => None,
        }
    }

    fn sort_value(&self, field: &str) -> Option<SortValue> {
        Some(match field {
            "id" => SortValue::Int(self.id as i64),
            "productId" => SortValue::Int(self.product_id as i64),
            "author" => SortValue::text(&self.author),
            "rating" => SortValue::Int(i64::from(self.rating)),
            "status" => SortValue::text(self.status.as_str()),
            "createdAt" => SortValue::Time(self.created_at),
            "updatedAt" => SortValue::Time(self.updated_at),
            _ => return None,
        })
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.author.as_str()];
        fields.extend(self.title.as_deref());
        fields.extend(self.comment.as_deref());
        fields
    }

    fn stats(records: &[Self]) -> ReviewStats {
        let mut stats = ReviewStats { total: records.len(), ..Default::default() };
        for star in RATING_MIN..=RATING_MAX {
            stats.rating_distribution.insert(star.to_string(), 0);
        }
        let mut sum = 0u64;
        for review in records {
            bump(&mut stats.by_status, review.status.as_str());
            bump(&mut stats.rating_distribution, review.rating.to_string());
            sum += u64::from(review.rating);
        }
        if !records.is_empty() {
            stats.average_rating = v::round2(sum as f64 / records.len() as f64);
        }
        stats
    }
}

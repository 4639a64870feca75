//! Decoding of list query parameters (`?status=..&sort=..&order=..&page=..&limit=..`).

use std::collections::HashMap;

use serde::Serialize;

use crate::errors::ServiceError;
use crate::pagination::Pagination;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Filtering, sorting and paging options for `get_all`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// `(field, value)` equality filters; fields the entity does not filter on are ignored.
    pub filters: Vec<(String, String)>,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub pagination: Option<Pagination>,
}

/// One page (or all) of the filtered records plus the filtered total.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing<E> {
    pub records: Vec<E>,
    pub total: usize,
}

const RESERVED: [&str; 4] = ["sort", "order", "page", "limit"];

fn positive(name: &str, raw: &str) -> Result<usize, ServiceError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ServiceError::validation(format!("{name} must be a positive integer"))),
    }
}

impl ListQuery {
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(field.into());
        self.order = order;
        self
    }

    pub fn paged(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }

    /// Build from raw query parameters. Blank values are treated as absent.
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ServiceError> {
        let get = |key: &str| params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

        let order = match get("order") {
            None => SortOrder::Asc,
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            Some(_) => return Err(ServiceError::validation("Invalid sort order. Must be one of: asc, desc")),
        };

        let page = get("page").map(|p| positive("page", p)).transpose()?;
        let limit = get("limit").map(|l| positive("limit", l)).transpose()?;
        let pagination = match (page, limit) {
            (None, None) => None,
            (page, limit) => Some(Pagination {
                page: page.unwrap_or(1),
                per_page: limit.unwrap_or(Pagination::default().per_page),
            }),
        };

        let mut filters: Vec<(String, String)> = params
            .iter()
            .filter(|(k, v)| !RESERVED.contains(&k.as_str()) && !v.trim().is_empty())
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect();
        // HashMap 迭代顺序不稳定，排序后便于比较
        filters.sort();

        Ok(Self { filters, sort: get("sort").map(str::to_string), order, pagination })
    }
}

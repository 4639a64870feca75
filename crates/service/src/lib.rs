//! Service layer for the inventory API.
//! - One generic `EntityService` per entity, holding its records in memory.
//! - Validation rules come from the `models` crate; this crate adds identity,
//!   uniqueness, querying, bulk execution and auditing.
//! - `EntityCrud` is the trait seam the HTTP layer depends on.

pub mod errors;
pub mod pagination;
pub mod storage;
pub mod query;
pub mod audit;
pub mod bulk;
pub mod metrics;
pub mod entity_service;
pub mod crud;
pub mod registry;

pub use bulk::{BulkMode, BulkOutcome, PatchRequest};
pub use crud::{DynCrud, EntityCrud};
pub use entity_service::{parse_id, Deleted, EntityService, ServiceSettings};
pub use errors::ServiceError;
pub use query::{ListQuery, Listing, SortOrder};
pub use registry::Services;

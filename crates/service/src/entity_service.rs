//! Generic CRUD-with-validation engine.
//!
//! One [`EntityService`] owns the collection of one entity type. All per-entity
//! rules come from the [`Entity`] implementation; the service adds identity,
//! timestamps, uniqueness, querying, bulk execution and the audit trail.
//!
//! Every mutation holds the write lock for its whole duration, so operations
//! (including whole atomic batches) are observed either fully applied or not at all.

use chrono::{DateTime, Utc};
use models::Entity;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::bulk::{BulkMode, BulkOutcome, PatchRequest};
use crate::errors::ServiceError;
use crate::metrics::observe;
use crate::query::{ListQuery, Listing, SortOrder};
use crate::storage::memory_store::EntityStore;

pub const DEFAULT_MAX_BULK: usize = 100;
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Tunables shared by every entity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    pub max_bulk: usize,
    pub audit_capacity: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self { max_bulk: DEFAULT_MAX_BULK, audit_capacity: DEFAULT_AUDIT_CAPACITY }
    }
}

/// Confirmation returned by delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub id: u64,
}

/// Decode a path or payload id: a positive integer, given as text.
pub fn parse_id(raw: &str) -> Result<u64, ServiceError> {
    match raw.trim().parse::<u64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ServiceError::validation("Invalid id: must be a positive integer")),
    }
}

/// Same as [`parse_id`] for ids embedded in JSON bodies (number or string).
pub fn parse_id_value(raw: &Value) -> Result<u64, ServiceError> {
    match raw {
        Value::Number(n) => n
            .as_u64()
            .filter(|id| *id >= 1)
            .ok_or_else(|| ServiceError::validation("Invalid id: must be a positive integer")),
        Value::String(s) => parse_id(s),
        _ => Err(ServiceError::validation("Invalid id: must be a positive integer")),
    }
}

fn decode_element<T: DeserializeOwned>(raw: Value) -> Result<T, ServiceError> {
    serde_json::from_value(raw).map_err(|e| ServiceError::validation(format!("Invalid element: {e}")))
}

#[derive(Debug, Clone)]
struct State<E> {
    store: EntityStore<E>,
    audit: AuditLog,
}

pub struct EntityService<E: Entity> {
    state: RwLock<State<E>>,
    settings: ServiceSettings,
}

impl<E: Entity> Default for EntityService<E> {
    fn default() -> Self { Self::new(ServiceSettings::default()) }
}

impl<E: Entity> EntityService<E> {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            state: RwLock::new(State { store: EntityStore::new(), audit: AuditLog::new(settings.audit_capacity) }),
            settings,
        }
    }

    pub fn settings(&self) -> ServiceSettings { self.settings }

    /// Copy of the matching records, optionally sorted and paginated.
    pub async fn get_all(&self, query: ListQuery) -> Result<Listing<E>, ServiceError> {
        let res = self.list_inner(query).await;
        observe(E::NAME, "list", &res);
        res
    }

    async fn list_inner(&self, query: ListQuery) -> Result<Listing<E>, ServiceError> {
        if let Some(field) = &query.sort {
            if !E::SORT_FIELDS.contains(&field.as_str()) {
                return Err(ServiceError::validation(format!(
                    "Invalid sort field. Must be one of: {}",
                    E::SORT_FIELDS.join(", ")
                )));
            }
        }
        let filters: Vec<(&str, String)> = query
            .filters
            .iter()
            .filter(|(field, _)| E::FILTER_FIELDS.contains(&field.as_str()))
            .map(|(field, value)| (field.as_str(), value.to_lowercase()))
            .collect();

        let mut records: Vec<E> = {
            let state = self.state.read().await;
            state
                .store
                .records()
                .iter()
                .filter(|r| {
                    filters.iter().all(|(field, wanted)| {
                        r.filter_value(field).is_some_and(|v| v.to_lowercase() == *wanted)
                    })
                })
                .cloned()
                .collect()
        };

        if let Some(field) = &query.sort {
            // sort_by 是稳定排序，相同键保持插入顺序
            records.sort_by(|a, b| {
                let ord = match (a.sort_value(field), b.sort_value(field)) {
                    (Some(x), Some(y)) => x.compare(&y),
                    _ => std::cmp::Ordering::Equal,
                };
                match query.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let total = records.len();
        let records = match query.pagination {
            Some(p) => p.apply(records),
            None => records,
        };
        Ok(Listing { records, total })
    }

    pub async fn get_by_id(&self, id: u64) -> Result<E, ServiceError> {
        let res = {
            let state = self.state.read().await;
            state.store.get(id).cloned().ok_or_else(|| ServiceError::not_found(E::NAME, id))
        };
        observe(E::NAME, "get", &res);
        res
    }

    pub async fn create(&self, input: E::Create) -> Result<E, ServiceError> {
        let res = {
            let mut state = self.state.write().await;
            Self::create_in(&mut state, input, Utc::now())
        };
        match &res {
            Ok(r) => info!(entity = E::NAME, id = r.id(), event = "created", "entity created"),
            Err(e) => debug!(entity = E::NAME, error = %e, event = "create_rejected", "entity create rejected"),
        }
        observe(E::NAME, "create", &res);
        res
    }

    pub async fn update(&self, id: u64, patch: E::Patch) -> Result<E, ServiceError> {
        let res = {
            let mut state = self.state.write().await;
            Self::update_in(&mut state, id, patch, Utc::now())
        };
        match &res {
            Ok(_) => info!(entity = E::NAME, id, event = "updated", "entity updated"),
            Err(e) => debug!(entity = E::NAME, id, error = %e, event = "update_rejected", "entity update rejected"),
        }
        observe(E::NAME, "update", &res);
        res
    }

    pub async fn delete(&self, id: u64) -> Result<Deleted, ServiceError> {
        let res = {
            let mut state = self.state.write().await;
            Self::delete_in(&mut state, id, Utc::now())
        };
        if res.is_ok() {
            info!(entity = E::NAME, id, event = "deleted", "entity deleted");
        }
        observe(E::NAME, "delete", &res);
        res
    }

    /// Aggregates over the whole collection, computed in one pass.
    pub async fn stats(&self) -> E::Stats {
        let state = self.state.read().await;
        let stats = E::stats(state.store.records());
        drop(state);
        observe::<()>(E::NAME, "stats", &Ok(()));
        stats
    }

    /// Case-insensitive substring match over the entity's text fields.
    /// A missing or blank query matches nothing.
    pub async fn search(&self, query: Option<&str>) -> Vec<E> {
        let needle = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q.to_lowercase(),
            _ => return Vec::new(),
        };
        let state = self.state.read().await;
        let found: Vec<E> = state
            .store
            .records()
            .iter()
            .filter(|r| r.search_fields().iter().any(|f| f.to_lowercase().contains(&needle)))
            .cloned()
            .collect();
        drop(state);
        observe::<()>(E::NAME, "search", &Ok(()));
        found
    }

    /// Newest audit entries first.
    pub async fn audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        self.state.read().await.audit.recent(limit)
    }

    pub async fn count(&self) -> usize {
        self.state.read().await.store.len()
    }

    /// Elements are raw JSON create payloads, decoded one by one so a malformed
    /// element only fails its own index.
    pub async fn bulk_create(&self, inputs: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError> {
        let res = self
            .run_batch("create", inputs, mode, |state, raw, now| {
                let input: E::Create = decode_element(raw)?;
                Self::create_in(state, input, now)
            })
            .await;
        observe(E::NAME, "bulk_create", &res);
        res
    }

    /// Elements are raw `{"id": .., "changes": {..}}` objects.
    pub async fn bulk_update(&self, changes: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError> {
        let res = self
            .run_batch("update", changes, mode, |state, raw, now| {
                let req: PatchRequest<E::Patch> = decode_element(raw)?;
                let id = parse_id_value(&req.id)?;
                Self::update_in(state, id, req.changes, now)
            })
            .await;
        observe(E::NAME, "bulk_update", &res);
        res
    }

    pub async fn bulk_delete(&self, ids: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<Deleted>, ServiceError> {
        let res = self
            .run_batch("delete", ids, mode, |state, raw, now| {
                let id = parse_id_value(&raw)?;
                Self::delete_in(state, id, now)
            })
            .await;
        observe(E::NAME, "bulk_delete", &res);
        res
    }

    /// Shared batch driver. Independent mode collects per-index outcomes;
    /// atomic mode snapshots the state and restores it on the first failure.
    async fn run_batch<I, T, F>(&self, verb: &str, inputs: Vec<I>, mode: BulkMode, mut op: F) -> Result<BulkOutcome<T>, ServiceError>
    where
        F: FnMut(&mut State<E>, I, DateTime<Utc>) -> Result<T, ServiceError>,
    {
        self.check_batch(verb, inputs.len())?;
        let now = Utc::now();
        let mut state = self.state.write().await;
        let mut outcome = BulkOutcome::default();
        match mode {
            BulkMode::Independent => {
                for (index, input) in inputs.into_iter().enumerate() {
                    outcome.push(index, op(&mut state, input, now));
                }
            }
            BulkMode::Atomic => {
                let snapshot = state.clone();
                for (index, input) in inputs.into_iter().enumerate() {
                    match op(&mut state, input, now) {
                        Ok(v) => outcome.succeeded.push(v),
                        Err(e) => {
                            *state = snapshot;
                            warn!(entity = E::NAME, index, error = %e, event = "bulk_rolled_back", "atomic bulk {verb} rolled back");
                            return Err(e.at_index(index));
                        }
                    }
                }
            }
        }
        info!(
            entity = E::NAME,
            event = "bulk",
            operation = verb,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "bulk {verb} finished"
        );
        Ok(outcome)
    }

    fn check_batch(&self, verb: &str, len: usize) -> Result<(), ServiceError> {
        if len == 0 {
            return Err(ServiceError::validation(format!("No {} provided", E::PLURAL)));
        }
        if len > self.settings.max_bulk {
            return Err(ServiceError::validation(format!(
                "Cannot {verb} more than {} {} at once",
                self.settings.max_bulk,
                E::PLURAL
            )));
        }
        Ok(())
    }

    fn check_unique(store: &EntityStore<E>, candidate: &E, exclude: Option<u64>) -> Result<(), ServiceError> {
        for key in candidate.unique_keys() {
            let clash = store
                .records()
                .iter()
                .filter(|r| Some(r.id()) != exclude)
                .any(|r| r.unique_keys().iter().any(|k| k.collides_with(&key)));
            if clash {
                return Err(ServiceError::validation(format!(
                    "{} with {} \"{}\" already exists",
                    E::NAME,
                    key.field,
                    key.value
                )));
            }
        }
        Ok(())
    }

    fn create_in(state: &mut State<E>, input: E::Create, now: DateTime<Utc>) -> Result<E, ServiceError> {
        let record = E::from_create(state.store.next_id(), input, now)?;
        Self::check_unique(&state.store, &record, None)?;
        state.store.insert(record.clone());
        state.audit.record(AuditAction::Create, record.id(), Vec::new(), now);
        Ok(record)
    }

    fn update_in(state: &mut State<E>, id: u64, patch: E::Patch, now: DateTime<Utc>) -> Result<E, ServiceError> {
        let index = state.store.position(id).ok_or_else(|| ServiceError::not_found(E::NAME, id))?;
        let mut working = state.store.records()[index].clone();
        let changed = working.apply_patch(patch)?;
        if changed.is_empty() {
            return Err(ServiceError::validation("No fields to update"));
        }
        Self::check_unique(&state.store, &working, Some(id))?;
        working.touch(now);
        state.store.replace(index, working.clone());
        state.audit.record(
            AuditAction::Update,
            id,
            changed.into_iter().map(str::to_string).collect(),
            now,
        );
        Ok(working)
    }

    fn delete_in(state: &mut State<E>, id: u64, now: DateTime<Utc>) -> Result<Deleted, ServiceError> {
        state.store.remove(id).ok_or_else(|| ServiceError::not_found(E::NAME, id))?;
        state.audit.record(AuditAction::Delete, id, Vec::new(), now);
        Ok(Deleted { id })
    }
}

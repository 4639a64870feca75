//! Object-safe view of an entity service, used by the HTTP controllers.

use std::sync::Arc;

use async_trait::async_trait;
use models::Entity;
use serde_json::Value;

use crate::audit::AuditEntry;
use crate::bulk::{BulkMode, BulkOutcome};
use crate::entity_service::{Deleted, EntityService};
use crate::errors::ServiceError;
use crate::query::{ListQuery, Listing};

/// CRUD, query and bulk operations over one entity collection.
#[async_trait]
pub trait EntityCrud<E: Entity>: Send + Sync {
    async fn get_all(&self, query: ListQuery) -> Result<Listing<E>, ServiceError>;
    async fn get_by_id(&self, id: u64) -> Result<E, ServiceError>;
    async fn create(&self, input: E::Create) -> Result<E, ServiceError>;
    async fn update(&self, id: u64, patch: E::Patch) -> Result<E, ServiceError>;
    async fn delete(&self, id: u64) -> Result<Deleted, ServiceError>;

    async fn stats(&self) -> E::Stats;
    async fn search(&self, query: Option<String>) -> Vec<E>;
    async fn audit_log(&self, limit: usize) -> Vec<AuditEntry>;

    async fn bulk_create(&self, inputs: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError>;
    async fn bulk_update(&self, changes: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError>;
    async fn bulk_delete(&self, ids: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<Deleted>, ServiceError>;
}

pub type DynCrud<E> = Arc<dyn EntityCrud<E>>;

#[async_trait]
impl<E: Entity> EntityCrud<E> for EntityService<E> {
    async fn get_all(&self, query: ListQuery) -> Result<Listing<E>, ServiceError> {
        EntityService::get_all(self, query).await
    }

    async fn get_by_id(&self, id: u64) -> Result<E, ServiceError> {
        EntityService::get_by_id(self, id).await
    }

    async fn create(&self, input: E::Create) -> Result<E, ServiceError> {
        EntityService::create(self, input).await
    }

    async fn update(&self, id: u64, patch: E::Patch) -> Result<E, ServiceError> {
        EntityService::update(self, id, patch).await
    }

    async fn delete(&self, id: u64) -> Result<Deleted, ServiceError> {
        EntityService::delete(self, id).await
    }

    async fn stats(&self) -> E::Stats {
        EntityService::stats(self).await
    }

    async fn search(&self, query: Option<String>) -> Vec<E> {
        EntityService::search(self, query.as_deref()).await
    }

    async fn audit_log(&self, limit: usize) -> Vec<AuditEntry> {
        EntityService::audit_log(self, limit).await
    }

    async fn bulk_create(&self, inputs: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError> {
        EntityService::bulk_create(self, inputs, mode).await
    }

    async fn bulk_update(&self, changes: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<E>, ServiceError> {
        EntityService::bulk_update(self, changes, mode).await
    }

    async fn bulk_delete(&self, ids: Vec<Value>, mode: BulkMode) -> Result<BulkOutcome<Deleted>, ServiceError> {
        EntityService::bulk_delete(self, ids, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::item::ItemInput;
    use models::Item;
    use serde_json::json;

    #[tokio::test]
    async fn trait_object_dispatches_to_service() {
        let crud: DynCrud<Item> = Arc::new(EntityService::<Item>::default());
        let input: ItemInput = serde_json::from_value(json!({"name": "Widget"})).unwrap();
        let created = crud.create(input).await.unwrap();
        assert_eq!(crud.get_by_id(created.id).await.unwrap().name, "Widget");
        assert_eq!(crud.search(Some("widg".into())).await.len(), 1);
        assert_eq!(crud.audit_log(10).await.len(), 1);
    }
}

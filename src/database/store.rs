use std::sync::Arc;

use async_trait::async_trait;

use crate::database::entity::Entity;
use crate::database::manager::DatabaseError;

/// Storage primitives the repositories are built on.
///
/// Implementations perform no JSON-aware filtering; every query over a JSON
/// column goes through `fetch_all`.
#[async_trait]
pub trait EntityStore<T: Entity>: Send + Sync {
    /// Every row of the table
    async fn fetch_all(&self) -> Result<Vec<T>, DatabaseError>;

    async fn fetch_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError>;

    /// Insert when the entity has no id yet, otherwise upsert. Returns the row
    /// as stored, including a generated id.
    async fn persist(&self, entity: T) -> Result<T, DatabaseError>;

    /// Whether a row was deleted
    async fn remove(&self, id: &T::Id) -> Result<bool, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.fetch_all().await?.len() as i64)
    }
}

/// Hands out the store backing an entity type
pub trait StoreProvider: Send + Sync {
    fn store<T: Entity>(&self) -> Arc<dyn EntityStore<T>>;
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::database::entity::Entity;
use crate::database::manager::DatabaseError;
use crate::database::store::EntityStore;

/// Conventional create/read/update/delete surface shared by every repository
#[async_trait]
pub trait CrudRepository<T: Entity>: Send + Sync {
    async fn find_all(&self) -> Result<Vec<T>, DatabaseError>;

    async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError>;

    /// Like `find_by_id`, but a missing row is an error
    async fn find_404(&self, id: &T::Id) -> Result<T, DatabaseError> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("{} record {} not found", T::TABLE, id)))
    }

    async fn save(&self, entity: T) -> Result<T, DatabaseError>;

    async fn delete_by_id(&self, id: &T::Id) -> Result<bool, DatabaseError>;

    async fn count(&self) -> Result<i64, DatabaseError>;

    async fn exists_by_id(&self, id: &T::Id) -> Result<bool, DatabaseError> {
        Ok(self.find_by_id(id).await?.is_some())
    }
}

/// Plain relational repository: every call goes straight to the store
pub struct BaseRepository<T: Entity> {
    store: Arc<dyn EntityStore<T>>,
}

impl<T: Entity> Clone for BaseRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Entity> BaseRepository<T> {
    pub fn new(store: Arc<dyn EntityStore<T>>) -> Self {
        Self { store }
    }

    pub fn table_name(&self) -> &'static str {
        T::TABLE
    }
}

#[async_trait]
impl<T: Entity> CrudRepository<T> for BaseRepository<T> {
    async fn find_all(&self) -> Result<Vec<T>, DatabaseError> {
        self.store.fetch_all().await
    }

    async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError> {
        self.store.fetch_by_id(id).await
    }

    async fn save(&self, entity: T) -> Result<T, DatabaseError> {
        self.store.persist(entity).await
    }

    async fn delete_by_id(&self, id: &T::Id) -> Result<bool, DatabaseError> {
        self.store.remove(id).await
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        self.store.count().await
    }
}

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::database::entity::{Entity, EntityId};
use crate::database::manager::DatabaseError;
use crate::database::store::{EntityStore, StoreProvider};

struct Table<T> {
    rows: Vec<T>,
    sequence: u64,
}

impl<T: Entity> Table<T> {
    /// Gives the entity a fresh id, or moves the sequence past the one it has
    fn assign_id(&mut self, entity: &mut T) {
        match entity.id() {
            None => {
                self.sequence += 1;
                entity.set_id(T::Id::generate(self.sequence));
            }
            Some(id) => {
                if let Some(hint) = id.sequence_hint() {
                    self.sequence = self.sequence.max(hint);
                }
            }
        }
    }
}

/// In-process table keeping rows in insertion order
pub struct MemoryStore<T: Entity> {
    table: RwLock<Table<T>>,
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table { rows: Vec::new(), sequence: 0 }),
        }
    }

    /// Store a row exactly as given, bypassing id assignment when it already
    /// has one. Used to seed fixtures, including rows with broken JSON.
    pub async fn insert_raw(&self, mut entity: T) -> T {
        let mut table = self.table.write().await;
        table.assign_id(&mut entity);
        table.rows.push(entity.clone());
        entity
    }
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for MemoryStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>, DatabaseError> {
        Ok(self.table.read().await.rows.clone())
    }

    async fn fetch_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|row| row.id().as_ref() == Some(id)).cloned())
    }

    async fn persist(&self, mut entity: T) -> Result<T, DatabaseError> {
        let mut table = self.table.write().await;
        let supplied = entity.id();
        table.assign_id(&mut entity);

        let existing = match &supplied {
            Some(id) => table.rows.iter().position(|row| row.id().as_ref() == Some(id)),
            None => None,
        };
        match existing {
            Some(index) => table.rows[index] = entity.clone(),
            None => table.rows.push(entity.clone()),
        }
        Ok(entity)
    }

    async fn remove(&self, id: &T::Id) -> Result<bool, DatabaseError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|row| row.id().as_ref() != Some(id));
        Ok(table.rows.len() != before)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        Ok(self.table.read().await.rows.len() as i64)
    }
}

/// One shared `MemoryStore` per entity type
#[derive(Default)]
pub struct MemoryProvider {
    stores: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concrete store handle, for seeding and inspection
    pub fn table<T: Entity>(&self) -> Arc<MemoryStore<T>> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Arc::new(MemoryStore::<T>::new()) as Arc<dyn Any + Send + Sync>);

        match Arc::clone(entry).downcast::<MemoryStore<T>>() {
            Ok(store) => store,
            // keyed by TypeId, so the slot always holds this type
            Err(_) => {
                let store = Arc::new(MemoryStore::<T>::new());
                *entry = store.clone() as Arc<dyn Any + Send + Sync>;
                store
            }
        }
    }
}

impl StoreProvider for MemoryProvider {
    fn store<T: Entity>(&self) -> Arc<dyn EntityStore<T>> {
        self.table::<T>()
    }
}

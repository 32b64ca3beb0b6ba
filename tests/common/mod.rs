#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use jsonrepo::config::JsonQueryConfig;
use jsonrepo::database::models::{Device, DeviceRepository};
use jsonrepo::database::{
    DatabaseError, Entity, EntityStore, JsonRepositoryImpl, MemoryProvider, MemoryStore, RepositoryFactory,
    StoreProvider,
};

pub fn factory() -> RepositoryFactory<MemoryProvider> {
    RepositoryFactory::new(MemoryProvider::new(), JsonQueryConfig::default())
}

/// A device repository plus direct access to its backing table
pub fn devices() -> (Arc<MemoryStore<Device>>, JsonRepositoryImpl<Device>) {
    let factory = factory();
    let repository = factory
        .create::<DeviceRepository>()
        .expect("device repository should assemble");
    (factory.provider().table::<Device>(), repository)
}

/// Seeds one device per document, stored as given
pub async fn seed(store: &MemoryStore<Device>, documents: &[&str]) -> Vec<Device> {
    let mut seeded = Vec::new();
    for (i, document) in documents.iter().enumerate() {
        seeded.push(store.insert_raw(Device::with_properties_json(format!("device-{}", i), *document)).await);
    }
    seeded
}

pub fn ids(devices: &[Device]) -> Vec<i64> {
    devices.iter().filter_map(|d| d.id).collect()
}

pub fn json(document: &str) -> Value {
    serde_json::from_str(document).expect("fixture JSON should parse")
}

/// Relational layer whose every call fails
pub struct FailingProvider;

struct FailingStore;

#[async_trait]
impl<T: Entity> EntityStore<T> for FailingStore {
    async fn fetch_all(&self) -> Result<Vec<T>, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn fetch_by_id(&self, _id: &T::Id) -> Result<Option<T>, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn persist(&self, _entity: T) -> Result<T, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }

    async fn remove(&self, _id: &T::Id) -> Result<bool, DatabaseError> {
        Err(DatabaseError::QueryError("connection reset".to_string()))
    }
}

impl StoreProvider for FailingProvider {
    fn store<T: Entity>(&self) -> Arc<dyn EntityStore<T>> {
        Arc::new(FailingStore)
    }
}

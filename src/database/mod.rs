pub mod entity;
pub mod factory;
pub mod json_fields;
pub mod json_repository;
pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod store;

pub use entity::{Column, Entity, EntityId, SqlType};
pub use factory::{Crud, JsonQueryable, RepositoryContract, RepositoryFactory};
pub use json_fields::{DiscoveryError, EntityFields, FieldDescriptor, FieldRegistry, JsonColumn, JsonEntity};
pub use json_repository::{JsonRepository, JsonRepositoryImpl};
pub use manager::{DatabaseError, DatabaseManager};
pub use memory::{MemoryProvider, MemoryStore};
pub use postgres::{PgProvider, PgStore};
pub use repository::{BaseRepository, CrudRepository};
pub use store::{EntityStore, StoreProvider};

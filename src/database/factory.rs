//! Builds repositories from a declared contract.
//!
//! A contract names the entity and which capabilities the repository has. A
//! plain [`Crud`] contract yields a [`BaseRepository`]; a [`JsonQueryable`]
//! contract runs field discovery and wraps the base in a
//! [`JsonRepositoryImpl`]. Discovery problems surface from
//! [`RepositoryFactory::create`], before any query runs.

use std::marker::PhantomData;
use std::sync::Arc;

use tracing::info;

use crate::config::JsonQueryConfig;
use crate::database::entity::Entity;
use crate::database::json_fields::{DiscoveryError, FieldRegistry, JsonEntity};
use crate::database::json_repository::JsonRepositoryImpl;
use crate::database::repository::BaseRepository;
use crate::database::store::StoreProvider;

pub trait RepositoryContract {
    type Entity: Entity;
    type Repository: Send + Sync + 'static;

    /// Whether the assembled repository answers JSON queries
    const JSON_QUERIES: bool;

    fn assemble(
        base: BaseRepository<Self::Entity>,
        fields: &FieldRegistry,
        config: &JsonQueryConfig,
    ) -> Result<Self::Repository, DiscoveryError>;

    /// JSON column names wired into the repository, for diagnostics
    fn json_columns(fields: &FieldRegistry) -> Result<Vec<&'static str>, DiscoveryError>;
}

/// CRUD only
pub struct Crud<T>(PhantomData<fn() -> T>);

/// CRUD plus the JSON query operations
pub struct JsonQueryable<T>(PhantomData<fn() -> T>);

impl<T: Entity> RepositoryContract for Crud<T> {
    type Entity = T;
    type Repository = BaseRepository<T>;

    const JSON_QUERIES: bool = false;

    fn assemble(
        base: BaseRepository<T>,
        _fields: &FieldRegistry,
        _config: &JsonQueryConfig,
    ) -> Result<Self::Repository, DiscoveryError> {
        Ok(base)
    }

    fn json_columns(_fields: &FieldRegistry) -> Result<Vec<&'static str>, DiscoveryError> {
        Ok(Vec::new())
    }
}

impl<T: JsonEntity> RepositoryContract for JsonQueryable<T> {
    type Entity = T;
    type Repository = JsonRepositoryImpl<T>;

    const JSON_QUERIES: bool = true;

    fn assemble(
        base: BaseRepository<T>,
        fields: &FieldRegistry,
        config: &JsonQueryConfig,
    ) -> Result<Self::Repository, DiscoveryError> {
        let discovered = fields.discover::<T>()?;
        Ok(JsonRepositoryImpl::new(base, discovered, config.clone()))
    }

    fn json_columns(fields: &FieldRegistry) -> Result<Vec<&'static str>, DiscoveryError> {
        Ok(fields
            .discover::<T>()?
            .columns()
            .iter()
            .map(|column| column.name())
            .collect())
    }
}

pub struct RepositoryFactory<P: StoreProvider> {
    provider: Arc<P>,
    fields: Arc<FieldRegistry>,
    config: JsonQueryConfig,
}

impl<P: StoreProvider> Clone for RepositoryFactory<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            fields: Arc::clone(&self.fields),
            config: self.config.clone(),
        }
    }
}

impl<P: StoreProvider> RepositoryFactory<P> {
    pub fn new(provider: P, config: JsonQueryConfig) -> Self {
        Self {
            provider: Arc::new(provider),
            fields: Arc::new(FieldRegistry::new()),
            config,
        }
    }

    pub fn create<R: RepositoryContract>(&self) -> Result<R::Repository, DiscoveryError> {
        let base = BaseRepository::new(self.provider.store::<R::Entity>());
        let repository = R::assemble(base, &self.fields, &self.config)?;
        let json_columns = R::json_columns(&self.fields)?;

        info!(
            table = <R::Entity as Entity>::TABLE,
            json_queries = R::JSON_QUERIES,
            json_columns = ?json_columns,
            "Created repository"
        );
        Ok(repository)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn field_registry(&self) -> &FieldRegistry {
        &self.fields
    }
}

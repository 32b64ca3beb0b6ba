//! Full-scan queries over JSON-bearing columns.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::JsonQueryConfig;
use crate::database::entity::Entity;
use crate::database::json_fields::{EntityFields, JsonColumn, JsonEntity};
use crate::database::manager::DatabaseError;
use crate::database::repository::{BaseRepository, CrudRepository};
use crate::json::{self, JsonPredicate, QueryValue};

/// JSON query operations layered on top of CRUD.
///
/// An entity matches when any of its JSON columns matches. Rows whose JSON
/// does not parse simply don't match; only a failing fetch is an error.
#[async_trait]
pub trait JsonRepository<T: Entity>: CrudRepository<T> {
    /// Entities with a JSON scalar containing `needle`, ignoring case
    async fn json_search_by_value(&self, needle: &str) -> Result<Vec<T>, DatabaseError>;

    /// Entities whose JSON holds `key` at any depth
    async fn json_search_by_key(&self, key: &str) -> Result<Vec<T>, DatabaseError>;

    /// Entities whose JSON holds `key` with a value equal to `value`
    async fn json_search_by_key_and_value(
        &self,
        key: &str,
        value: QueryValue,
    ) -> Result<Vec<T>, DatabaseError>;

    async fn json_search_first_by_key_and_value(
        &self,
        key: &str,
        value: QueryValue,
    ) -> Result<Option<T>, DatabaseError>;

    /// Stops scanning at the first matching entity
    async fn exists_by_key_and_value(&self, key: &str, value: QueryValue) -> Result<bool, DatabaseError>;

    async fn count_by_key(&self, key: &str) -> Result<i64, DatabaseError>;
}

/// Repository for entities with JSON columns: CRUD goes to the wrapped base
/// repository, JSON queries scan every row.
pub struct JsonRepositoryImpl<T: JsonEntity> {
    base: BaseRepository<T>,
    fields: Arc<EntityFields<T>>,
    config: JsonQueryConfig,
}

impl<T: JsonEntity> JsonRepositoryImpl<T> {
    pub fn new(base: BaseRepository<T>, fields: Arc<EntityFields<T>>, config: JsonQueryConfig) -> Self {
        Self { base, fields, config }
    }

    pub fn json_columns(&self) -> &[JsonColumn<T>] {
        self.fields.columns()
    }

    /// Matching entities in fetch order
    async fn scan(&self, predicate: &JsonPredicate) -> Result<Vec<T>, DatabaseError> {
        if self.fields.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let entities = self.base.find_all().await?;
        let scanned = entities.len();
        let matches: Vec<T> = entities
            .into_iter()
            .filter(|entity| self.entity_matches(entity, predicate))
            .collect();

        self.report(predicate, scanned, matches.len(), started);
        Ok(matches)
    }

    /// First matching entity in fetch order; stops scanning there
    async fn scan_first(&self, predicate: &JsonPredicate) -> Result<Option<T>, DatabaseError> {
        if self.fields.is_empty() {
            return Ok(None);
        }

        let started = Instant::now();
        let entities = self.base.find_all().await?;
        let total = entities.len();
        let found = entities
            .into_iter()
            .enumerate()
            .find(|(_, entity)| self.entity_matches(entity, predicate));

        let scanned = found.as_ref().map_or(total, |(index, _)| index + 1);
        self.report(predicate, scanned, usize::from(found.is_some()), started);
        Ok(found.map(|(_, entity)| entity))
    }

    fn entity_matches(&self, entity: &T, predicate: &JsonPredicate) -> bool {
        self.fields
            .columns()
            .iter()
            .any(|column| self.column_matches(column, entity, predicate))
    }

    fn column_matches(&self, column: &JsonColumn<T>, entity: &T, predicate: &JsonPredicate) -> bool {
        let raw = column.read(entity);
        if self.config.raw_precheck && !raw.trim().is_empty() && !predicate.may_match_raw(raw) {
            return false;
        }

        match json::parse_field(raw) {
            Ok(document) => predicate.evaluate(&document),
            Err(e) => {
                if self.config.log_parse_failures {
                    debug!(
                        table = T::TABLE,
                        column = column.name(),
                        error = %e,
                        "skipping unparseable JSON column"
                    );
                }
                false
            }
        }
    }

    fn report(&self, predicate: &JsonPredicate, scanned: usize, matched: usize, started: Instant) {
        let elapsed = started.elapsed();
        debug!(
            table = T::TABLE,
            predicate = predicate.name(),
            scanned,
            matched,
            elapsed_ms = elapsed.as_millis() as u64,
            "JSON column scan"
        );
        if self.config.enable_slow_scan_warning && elapsed.as_millis() as u64 >= self.config.slow_scan_threshold_ms {
            warn!(
                table = T::TABLE,
                predicate = predicate.name(),
                scanned,
                elapsed_ms = elapsed.as_millis() as u64,
                "slow JSON column scan"
            );
        }
    }
}

#[async_trait]
impl<T: JsonEntity> CrudRepository<T> for JsonRepositoryImpl<T> {
    async fn find_all(&self) -> Result<Vec<T>, DatabaseError> {
        self.base.find_all().await
    }

    async fn find_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError> {
        self.base.find_by_id(id).await
    }

    async fn save(&self, entity: T) -> Result<T, DatabaseError> {
        self.base.save(entity).await
    }

    async fn delete_by_id(&self, id: &T::Id) -> Result<bool, DatabaseError> {
        self.base.delete_by_id(id).await
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        self.base.count().await
    }
}

#[async_trait]
impl<T: JsonEntity> JsonRepository<T> for JsonRepositoryImpl<T> {
    async fn json_search_by_value(&self, needle: &str) -> Result<Vec<T>, DatabaseError> {
        self.scan(&JsonPredicate::value_contains(needle)).await
    }

    async fn json_search_by_key(&self, key: &str) -> Result<Vec<T>, DatabaseError> {
        self.scan(&JsonPredicate::has_key(key)).await
    }

    async fn json_search_by_key_and_value(
        &self,
        key: &str,
        value: QueryValue,
    ) -> Result<Vec<T>, DatabaseError> {
        self.scan(&JsonPredicate::key_equals(key, value)).await
    }

    async fn json_search_first_by_key_and_value(
        &self,
        key: &str,
        value: QueryValue,
    ) -> Result<Option<T>, DatabaseError> {
        self.scan_first(&JsonPredicate::key_equals(key, value)).await
    }

    async fn exists_by_key_and_value(&self, key: &str, value: QueryValue) -> Result<bool, DatabaseError> {
        Ok(self.scan_first(&JsonPredicate::key_equals(key, value)).await?.is_some())
    }

    async fn count_by_key(&self, key: &str) -> Result<i64, DatabaseError> {
        Ok(self.json_search_by_key(key).await?.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::json_fields::FieldRegistry;
    use crate::database::memory::MemoryStore;
    use crate::database::models::Device;

    fn repository(config: JsonQueryConfig) -> (Arc<MemoryStore<Device>>, JsonRepositoryImpl<Device>) {
        let store = Arc::new(MemoryStore::<Device>::new());
        let fields = FieldRegistry::new().discover::<Device>().unwrap();
        let repo = JsonRepositoryImpl::new(BaseRepository::new(store.clone()), fields, config);
        (store, repo)
    }

    #[tokio::test]
    async fn precheck_does_not_change_results() -> anyhow::Result<()> {
        let with = JsonQueryConfig { raw_precheck: true, ..JsonQueryConfig::default() };
        let without = JsonQueryConfig { raw_precheck: false, ..JsonQueryConfig::default() };
        let (store_a, checked) = repository(with);
        let (store_b, unchecked) = repository(without);

        for raw in [r#"{"n": 1e2}"#, r#"{"s": "café"}"#, r#"{"s": "Hello"}"#, "not json", ""] {
            store_a.insert_raw(Device::with_properties_json("d", raw)).await;
            store_b.insert_raw(Device::with_properties_json("d", raw)).await;
        }

        for needle in ["100", ".0", "café", "hello", "zzz", ""] {
            let a: Vec<_> = checked.json_search_by_value(needle).await?.into_iter().map(|d| d.id).collect();
            let b: Vec<_> = unchecked.json_search_by_value(needle).await?.into_iter().map(|d| d.id).collect();
            assert_eq!(a, b, "needle {:?}", needle);
        }
        Ok(())
    }

    #[tokio::test]
    async fn first_match_follows_fetch_order() -> anyhow::Result<()> {
        let (store, repo) = repository(JsonQueryConfig::default());
        store.insert_raw(Device::with_properties_json("broken", r#"{"zone": "#)).await;
        store.insert_raw(Device::with_properties_json("other", r#"{"zone": 2}"#)).await;
        let first = store.insert_raw(Device::with_properties_json("first", r#"{"zone": 1}"#)).await;
        store.insert_raw(Device::with_properties_json("second", r#"{"zone": 1}"#)).await;

        let found = repo.json_search_first_by_key_and_value("zone", 1.into()).await?;
        assert_eq!(found.map(|d| d.id), Some(first.id));
        assert!(repo.json_search_first_by_key_and_value("zone", 3.into()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn exists_agrees_with_search() -> anyhow::Result<()> {
        let (store, repo) = repository(JsonQueryConfig::default());
        store.insert_raw(Device::with_properties_json("a", r#"{"x": 1}"#)).await;
        store.insert_raw(Device::with_properties_json("b", r#"{"x": 2}"#)).await;

        assert!(repo.exists_by_key_and_value("x", 2.into()).await?);
        assert!(!repo.exists_by_key_and_value("x", 3.into()).await?);
        Ok(())
    }
}

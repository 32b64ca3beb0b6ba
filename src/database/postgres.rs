use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{self, postgres::{PgArguments, PgRow}, PgPool, Row};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::database::entity::{Column, Entity};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::store::{EntityStore, StoreProvider};

/// Table-backed store. Rows travel as `row_to_json` documents and are decoded
/// with serde, so entities need no row mapping code of their own.
pub struct PgStore<T> {
    pool: PgPool,
    config: DatabaseConfig,
    _phantom: PhantomData<fn() -> T>,
}

impl<T: Entity> PgStore<T> {
    pub fn new(pool: PgPool, config: DatabaseConfig) -> Self {
        Self {
            pool,
            config,
            _phantom: PhantomData,
        }
    }

    /// Logs a finished statement and warns when it ran past the threshold
    fn report(&self, operation: &'static str, sql: &str, started: Instant) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if self.config.enable_query_logging {
            debug!(table = T::TABLE, operation, sql, elapsed_ms, "SQL statement");
        }
        if self.is_slow(elapsed_ms) {
            warn!(table = T::TABLE, operation, sql, elapsed_ms, "slow SQL statement");
        }
    }

    fn is_slow(&self, elapsed_ms: u64) -> bool {
        self.config.enable_slow_query_warning && elapsed_ms >= self.config.slow_query_threshold_ms
    }

    fn table() -> String {
        DatabaseManager::quote_identifier(T::TABLE)
    }

    fn id_placeholder(index: usize) -> String {
        let cast = T::column(T::ID_COLUMN).map_or("text", |column| column.sql_type.cast());
        format!("${}::{}", index, cast)
    }

    fn decode(row: &PgRow) -> Result<T, DatabaseError> {
        let value: Value = row.try_get("row")?;
        serde_json::from_value(value).map_err(|e| DatabaseError::Decode {
            table: T::TABLE,
            message: e.to_string(),
        })
    }

    fn encode(entity: &T) -> Result<Map<String, Value>, DatabaseError> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DatabaseError::QueryError(format!(
                "{} entity must serialize to an object",
                T::TABLE
            ))),
            Err(e) => Err(DatabaseError::QueryError(e.to_string())),
        }
    }

    fn id_param(id: &T::Id) -> Result<Value, DatabaseError> {
        serde_json::to_value(id).map_err(|e| DatabaseError::QueryError(e.to_string()))
    }

    fn upsert_sql(columns: &[&Column], with_id: bool) -> String {
        let names: Vec<String> = columns
            .iter()
            .map(|column| DatabaseManager::quote_identifier(column.name))
            .collect();
        let placeholders: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, column)| format!("${}::{}", i + 1, column.sql_type.cast()))
            .collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            Self::table(),
            names.join(", "),
            placeholders.join(", ")
        );

        if with_id {
            let mut updates: Vec<String> = columns
                .iter()
                .filter(|column| !column.primary_key)
                .map(|column| {
                    let name = DatabaseManager::quote_identifier(column.name);
                    format!("{} = EXCLUDED.{}", name, name)
                })
                .collect();
            let id = DatabaseManager::quote_identifier(T::ID_COLUMN);
            if updates.is_empty() {
                updates.push(format!("{} = EXCLUDED.{}", id, id));
            }
            sql.push_str(&format!(" ON CONFLICT ({}) DO UPDATE SET {}", id, updates.join(", ")));
        }

        format!(
            "WITH saved AS ({} RETURNING *) SELECT row_to_json(saved) AS row FROM saved",
            sql
        )
    }
}

#[async_trait]
impl<T: Entity> EntityStore<T> for PgStore<T> {
    async fn fetch_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} ORDER BY {}) t",
            Self::table(),
            DatabaseManager::quote_identifier(T::ID_COLUMN)
        );
        let started = Instant::now();
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        self.report("fetch_all", &sql, started);
        rows.iter().map(Self::decode).collect()
    }

    async fn fetch_by_id(&self, id: &T::Id) -> Result<Option<T>, DatabaseError> {
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE {} = {}) t",
            Self::table(),
            DatabaseManager::quote_identifier(T::ID_COLUMN),
            Self::id_placeholder(1)
        );
        let id = Self::id_param(id)?;
        let started = Instant::now();
        let row = bind_param(sqlx::query(&sql), &id)
            .fetch_optional(&self.pool)
            .await?;
        self.report("fetch_by_id", &sql, started);
        row.as_ref().map(Self::decode).transpose()
    }

    async fn persist(&self, entity: T) -> Result<T, DatabaseError> {
        let mut values = Self::encode(&entity)?;
        let with_id = entity.id().is_some();
        let columns: Vec<&Column> = T::COLUMNS
            .iter()
            .filter(|column| with_id || column.name != T::ID_COLUMN)
            .collect();
        let params: Vec<Value> = columns
            .iter()
            .map(|column| values.remove(column.name).unwrap_or(Value::Null))
            .collect();

        let sql = Self::upsert_sql(&columns, with_id);
        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_param(q, p);
        }
        let started = Instant::now();
        let row = q.fetch_one(&self.pool).await?;
        self.report("persist", &sql, started);
        Self::decode(&row)
    }

    async fn remove(&self, id: &T::Id) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            Self::table(),
            DatabaseManager::quote_identifier(T::ID_COLUMN),
            Self::id_placeholder(1)
        );
        let id = Self::id_param(id)?;
        let started = Instant::now();
        let result = bind_param(sqlx::query(&sql), &id).execute(&self.pool).await?;
        self.report("remove", &sql, started);
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) AS count FROM {}", Self::table());
        let started = Instant::now();
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        self.report("count", &sql, started);
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// Serves `PgStore`s sharing one pool
#[derive(Clone)]
pub struct PgProvider {
    pool: PgPool,
    config: DatabaseConfig,
}

impl PgProvider {
    pub fn new(pool: PgPool, config: DatabaseConfig) -> Self {
        Self { pool, config }
    }
}

impl StoreProvider for PgProvider {
    fn store<T: Entity>(&self) -> Arc<dyn EntityStore<T>> {
        Arc::new(PgStore::<T>::new(self.pool.clone(), self.config.clone()))
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres doesn't have u64; cast down if safe
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Device;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn insert_without_id_omits_id_column() {
        let columns: Vec<&Column> = Device::COLUMNS.iter().filter(|c| c.name != "id").collect();
        let sql = PgStore::<Device>::upsert_sql(&columns, false);
        assert_eq!(
            sql,
            "WITH saved AS (INSERT INTO \"devices\" (\"name\", \"properties\") VALUES ($1::text, $2::text) RETURNING *) SELECT row_to_json(saved) AS row FROM saved"
        );
    }

    #[test]
    fn insert_with_id_upserts() {
        let columns: Vec<&Column> = Device::COLUMNS.iter().collect();
        let sql = PgStore::<Device>::upsert_sql(&columns, true);
        assert!(sql.contains("VALUES ($1::bigint, $2::text, $3::text)"));
        assert!(sql.contains(
            "ON CONFLICT (\"id\") DO UPDATE SET \"name\" = EXCLUDED.\"name\", \"properties\" = EXCLUDED.\"properties\""
        ));
    }

    #[tokio::test]
    async fn slow_threshold_follows_config() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/devices")
            .unwrap();
        let config = DatabaseConfig {
            slow_query_threshold_ms: 50,
            ..DatabaseConfig::default()
        };
        let store = PgStore::<Device>::new(pool.clone(), config.clone());
        assert!(!store.is_slow(49));
        assert!(store.is_slow(50));

        let quiet = PgStore::<Device>::new(pool, DatabaseConfig { enable_slow_query_warning: false, ..config });
        assert!(!quiet.is_slow(10_000));
    }

    #[test]
    fn id_placeholder_casts_to_column_type() {
        assert_eq!(PgStore::<Device>::id_placeholder(1), "$1::bigint");
    }
}

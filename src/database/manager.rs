use sqlx::{postgres::PgPoolOptions, PgPool};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::entity::{Entity, SqlType};

/// Errors from the relational layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Failed to decode {table} row: {message}")]
    Decode { table: &'static str, message: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Connection pool cache, one pool per database name
pub struct DatabaseManager {
    pools: Arc<RwLock<HashMap<String, PgPool>>>,
    config: DatabaseConfig,
}

impl DatabaseManager {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            pools: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Pool for the database named in DATABASE_URL
    pub async fn default_pool(&self) -> Result<PgPool, DatabaseError> {
        let name = Self::default_database_name()?;
        self.get_pool(&name).await
    }

    /// Pool for another database on the same server (validated name)
    pub async fn pool(&self, database_name: &str) -> Result<PgPool, DatabaseError> {
        if !Self::is_valid_db_name(database_name) {
            return Err(DatabaseError::InvalidDatabaseName(database_name.to_string()));
        }
        self.get_pool(database_name).await
    }

    /// Get existing pool or create a new one lazily
    async fn get_pool(&self, database_name: &str) -> Result<PgPool, DatabaseError> {
        // Fast path: try read lock
        {
            let pools = self.pools.read().await;
            if let Some(pool) = pools.get(database_name) {
                return Ok(pool.clone());
            }
        }

        let connection_string = Self::build_connection_string(database_name)?;

        let pool = PgPoolOptions::new()
            .max_connections(self.config.max_connections)
            .acquire_timeout(Duration::from_secs(self.config.connection_timeout))
            .connect(&connection_string)
            .await?;

        // Another caller may have raced us here; keep whichever pool landed first
        let pool = {
            let mut pools = self.pools.write().await;
            pools.entry(database_name.to_string()).or_insert(pool).clone()
        };

        info!("Created database pool for: {}", database_name);
        Ok(pool)
    }

    fn base_url() -> Result<url::Url, DatabaseError> {
        let base = std::env::var("DATABASE_URL")
            .map_err(|_| DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(&base).map_err(|_| DatabaseError::InvalidDatabaseUrl)
    }

    fn default_database_name() -> Result<String, DatabaseError> {
        let url = Self::base_url()?;
        let name = url.path().trim_start_matches('/');
        if name.is_empty() {
            return Err(DatabaseError::InvalidDatabaseUrl);
        }
        Ok(name.to_string())
    }

    fn build_connection_string(database_name: &str) -> Result<String, DatabaseError> {
        let mut url = Self::base_url()?;
        // Replace the path to the database name (ensure leading slash)
        url.set_path(&format!("/{}", database_name));
        Ok(url.into())
    }

    /// Pings the default pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        let pool = self.default_pool().await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Create the table for an entity if it does not exist yet
    pub async fn create_table<T: Entity>(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query(&Self::table_ddl::<T>()).execute(pool).await?;
        info!("Ensured table {}", T::TABLE);
        Ok(())
    }

    pub fn table_ddl<T: Entity>() -> String {
        let columns: Vec<String> = T::COLUMNS
            .iter()
            .map(|column| {
                let mut definition = format!("{} {}", Self::quote_identifier(column.name), column.sql_type.ddl());
                if column.primary_key {
                    definition.push_str(" PRIMARY KEY");
                    if column.sql_type == SqlType::Uuid {
                        definition.push_str(" DEFAULT gen_random_uuid()");
                    }
                } else if !column.nullable {
                    definition.push_str(" NOT NULL");
                }
                definition
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            Self::quote_identifier(T::TABLE),
            columns.join(", ")
        )
    }

    /// Quote SQL identifier to prevent injection
    pub fn quote_identifier(name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Close and remove all pools (e.g., on shutdown)
    pub async fn close_all(&self) {
        let mut pools = self.pools.write().await;
        for (name, pool) in pools.drain() {
            pool.close().await;
            info!("Closed database pool: {}", name);
        }
    }

    /// Database names are limited to ASCII alphanumerics and underscores
    fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= 63
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// PostgreSQL column types used by entity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    BigSerial,
    BigInt,
    Uuid,
    Text,
    Varchar,
    Boolean,
    Timestamptz,
    Jsonb,
}

impl SqlType {
    /// Whether values are stored as plain text
    pub fn is_textual(&self) -> bool {
        matches!(self, SqlType::Text | SqlType::Varchar)
    }

    pub fn ddl(&self) -> &'static str {
        match self {
            SqlType::BigSerial => "BIGSERIAL",
            SqlType::BigInt => "BIGINT",
            SqlType::Uuid => "UUID",
            SqlType::Text => "TEXT",
            SqlType::Varchar => "VARCHAR",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Timestamptz => "TIMESTAMPTZ",
            SqlType::Jsonb => "JSONB",
        }
    }

    /// Type name for casting bound parameters
    pub fn cast(&self) -> &'static str {
        match self {
            SqlType::BigSerial | SqlType::BigInt => "bigint",
            SqlType::Uuid => "uuid",
            SqlType::Text => "text",
            SqlType::Varchar => "varchar",
            SqlType::Boolean => "boolean",
            SqlType::Timestamptz => "timestamptz",
            SqlType::Jsonb => "jsonb",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ddl())
    }
}

/// One column of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub primary_key: bool,
    pub nullable: bool,
}

impl Column {
    pub const fn id(name: &'static str, sql_type: SqlType) -> Self {
        Self { name, sql_type, primary_key: true, nullable: false }
    }

    pub const fn required(name: &'static str, sql_type: SqlType) -> Self {
        Self { name, sql_type, primary_key: false, nullable: false }
    }

    pub const fn optional(name: &'static str, sql_type: SqlType) -> Self {
        Self { name, sql_type, primary_key: false, nullable: true }
    }
}

/// Primary key types the stores know how to generate
pub trait EntityId:
    Clone + PartialEq + fmt::Debug + fmt::Display + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// New key for a row inserted without one; `sequence` starts at 1
    fn generate(sequence: u64) -> Self;

    /// Sequence position this key occupies, if it came from `generate`'s
    /// counter. Stores advance their counter past it.
    fn sequence_hint(&self) -> Option<u64> {
        None
    }
}

impl EntityId for i64 {
    fn generate(sequence: u64) -> Self {
        sequence as i64
    }

    fn sequence_hint(&self) -> Option<u64> {
        u64::try_from(*self).ok()
    }
}

impl EntityId for Uuid {
    fn generate(_sequence: u64) -> Self {
        Uuid::new_v4()
    }
}

/// A relational row type. Serde field names must equal column names.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Id: EntityId;

    const TABLE: &'static str;
    const COLUMNS: &'static [Column];
    const ID_COLUMN: &'static str = "id";

    /// `None` until the row has been persisted
    fn id(&self) -> Option<Self::Id>;

    fn set_id(&mut self, id: Self::Id);

    fn column(name: &str) -> Option<&'static Column> {
        Self::COLUMNS.iter().find(|column| column.name == name)
    }
}

//! Declaration and discovery of JSON-bearing text columns.
//!
//! An entity lists its JSON columns through [`JsonEntity::json_columns`];
//! [`FieldRegistry`] checks the declaration against the entity's table
//! schema once per type and caches the result.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

use crate::database::entity::{Entity, SqlType};

/// Misdeclared JSON columns. These are programming errors in an entity
/// definition and surface when its repository is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("{entity}: JSON column with an empty name")]
    EmptyColumnName { entity: &'static str },

    #[error("{entity}: JSON column '{column}' declared twice")]
    DuplicateColumn { entity: &'static str, column: &'static str },

    #[error("{entity}: JSON column '{column}' is not a column of the table")]
    UnknownColumn { entity: &'static str, column: &'static str },

    #[error("{entity}: JSON column '{column}' is stored as {sql_type}, expected a text column")]
    NotTextColumn {
        entity: &'static str,
        column: &'static str,
        sql_type: SqlType,
    },
}

/// Accessor for one JSON-bearing column of `T`
pub struct JsonColumn<T> {
    name: &'static str,
    read: fn(&T) -> Option<&str>,
}

impl<T> JsonColumn<T> {
    pub const fn new(name: &'static str, read: fn(&T) -> Option<&str>) -> Self {
        Self { name, read }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw stored text; an absent value reads as empty
    pub fn read<'a>(&self, entity: &'a T) -> &'a str {
        (self.read)(entity).unwrap_or("")
    }
}

impl<T> fmt::Debug for JsonColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonColumn").field("name", &self.name).finish()
    }
}

/// Entities that can be searched through their JSON columns.
///
/// The default declares none, which leaves the entity unsearchable: every
/// JSON query against it returns nothing.
pub trait JsonEntity: Entity {
    fn json_columns() -> Vec<JsonColumn<Self>> {
        Vec::new()
    }
}

/// Names a JSON column of an entity table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub entity: &'static str,
    pub column: &'static str,
}

/// Validated JSON columns of one entity type
pub struct EntityFields<T> {
    columns: Vec<JsonColumn<T>>,
}

impl<T> fmt::Debug for EntityFields<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityFields").field("columns", &self.columns).finish()
    }
}

impl<T: Entity> EntityFields<T> {
    pub fn columns(&self) -> &[JsonColumn<T>] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        self.columns
            .iter()
            .map(|column| FieldDescriptor {
                entity: T::TABLE,
                column: column.name,
            })
            .collect()
    }
}

/// Per-type cache of discovered JSON columns.
///
/// Two callers racing on the same type may both validate it; the first
/// result stored wins and both get the same columns.
#[derive(Default)]
pub struct FieldRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discover<T: JsonEntity>(&self) -> Result<Arc<EntityFields<T>>, DiscoveryError> {
        let key = TypeId::of::<T>();

        // Fast path: try read lock
        {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(fields) = entries
                .get(&key)
                .and_then(|entry| Arc::clone(entry).downcast::<EntityFields<T>>().ok())
            {
                return Ok(fields);
            }
        }

        let fields = Arc::new(Self::validate::<T>()?);
        debug!(
            entity = T::TABLE,
            columns = ?fields.descriptors().iter().map(|d| d.column).collect::<Vec<_>>(),
            "discovered JSON columns"
        );

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(key)
            .or_insert_with(|| fields.clone() as Arc<dyn Any + Send + Sync>);
        Ok(Arc::clone(entry).downcast::<EntityFields<T>>().unwrap_or(fields))
    }

    /// Whether the type has been discovered already
    pub fn is_cached<T: JsonEntity>(&self) -> bool {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.contains_key(&TypeId::of::<T>())
    }

    fn validate<T: JsonEntity>() -> Result<EntityFields<T>, DiscoveryError> {
        let columns = T::json_columns();
        for (i, json_column) in columns.iter().enumerate() {
            let name = json_column.name;
            if name.is_empty() {
                return Err(DiscoveryError::EmptyColumnName { entity: T::TABLE });
            }
            if columns[..i].iter().any(|earlier| earlier.name == name) {
                return Err(DiscoveryError::DuplicateColumn { entity: T::TABLE, column: name });
            }
            let column = T::column(name).ok_or(DiscoveryError::UnknownColumn {
                entity: T::TABLE,
                column: name,
            })?;
            if !column.sql_type.is_textual() {
                return Err(DiscoveryError::NotTextColumn {
                    entity: T::TABLE,
                    column: name,
                    sql_type: column.sql_type,
                });
            }
        }
        Ok(EntityFields { columns })
    }
}

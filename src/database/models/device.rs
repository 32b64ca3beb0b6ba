use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::database::entity::{Column, Entity, SqlType};
use crate::database::json_fields::{JsonColumn, JsonEntity};

/// A managed device with free-form properties stored as a JSON object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: Option<i64>,
    pub name: String,
    #[serde(default = "empty_object")]
    pub properties: String,
}

fn empty_object() -> String {
    "{}".to_string()
}

fn properties_json(device: &Device) -> Option<&str> {
    Some(device.properties.as_str())
}

impl Device {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            properties: empty_object(),
        }
    }

    /// Keeps `text` as stored, unvalidated. Empty text becomes `{}`.
    pub fn with_properties_json(name: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: None,
            name: name.into(),
            properties: if text.is_empty() { empty_object() } else { text },
        }
    }

    pub fn with_properties(name: impl Into<String>, properties: Map<String, Value>) -> Self {
        let mut device = Self::new(name);
        device.set_properties(properties);
        device
    }

    /// Decoded properties. Stored text that is not a JSON object reads as
    /// an empty map.
    pub fn properties(&self) -> Map<String, Value> {
        if self.properties.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&self.properties) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                error!(device = ?self.id, found = %other, "device properties are not a JSON object");
                Map::new()
            }
            Err(e) => {
                error!(device = ?self.id, error = %e, "failed to decode device properties");
                Map::new()
            }
        }
    }

    pub fn set_properties(&mut self, properties: Map<String, Value>) {
        self.properties = Value::Object(properties).to_string();
    }

    pub fn property(&self, key: &str) -> Option<Value> {
        self.properties().remove(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let mut properties = self.properties();
        properties.insert(key.into(), value.into());
        self.set_properties(properties);
    }

    /// Returns the previous value, if any
    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        let mut properties = self.properties();
        let previous = properties.remove(key);
        if previous.is_some() {
            self.set_properties(properties);
        }
        previous
    }
}

impl Entity for Device {
    type Id = i64;

    const TABLE: &'static str = "devices";
    const COLUMNS: &'static [Column] = &[
        Column::id("id", SqlType::BigSerial),
        Column::required("name", SqlType::Text),
        Column::required("properties", SqlType::Text),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl JsonEntity for Device {
    fn json_columns() -> Vec<JsonColumn<Self>> {
        vec![JsonColumn::new("properties", properties_json)]
    }
}

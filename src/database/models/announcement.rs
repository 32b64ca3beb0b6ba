use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::database::entity::{Column, Entity, SqlType};
use crate::database::json_fields::{JsonColumn, JsonEntity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Option<i64>,
    pub title: String,
    pub body: String,
    /// JSON array of tag strings
    #[serde(default = "empty_array")]
    pub tags: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn empty_array() -> String {
    "[]".to_string()
}

fn tags_json(announcement: &Announcement) -> Option<&str> {
    Some(announcement.tags.as_str())
}

impl Announcement {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            tags: empty_array(),
            is_public: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn tags_list(&self) -> Vec<String> {
        if self.tags.trim().is_empty() {
            return Vec::new();
        }
        serde_json::from_str(&self.tags).unwrap_or_else(|e| {
            error!(announcement = ?self.id, error = %e, "failed to decode announcement tags");
            Vec::new()
        })
    }

    pub fn set_tags_list<S: AsRef<str>>(&mut self, tags: &[S]) {
        let tags: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
        self.tags = serde_json::Value::from(tags).to_string();
    }
}

impl Entity for Announcement {
    type Id = i64;

    const TABLE: &'static str = "announcements";
    const COLUMNS: &'static [Column] = &[
        Column::id("id", SqlType::BigSerial),
        Column::required("title", SqlType::Varchar),
        Column::required("body", SqlType::Text),
        Column::required("tags", SqlType::Text),
        Column::required("is_public", SqlType::Boolean),
        Column::required("created_at", SqlType::Timestamptz),
        Column::required("updated_at", SqlType::Timestamptz),
    ];

    fn id(&self) -> Option<i64> {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }
}

impl JsonEntity for Announcement {
    fn json_columns() -> Vec<JsonColumn<Self>> {
        vec![JsonColumn::new("tags", tags_json)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_json_text() {
        let mut announcement = Announcement::new("Maintenance", "Saturday night");
        assert!(announcement.tags_list().is_empty());

        announcement.set_tags_list(&["ops", "downtime"]);
        assert_eq!(announcement.tags, r#"["ops","downtime"]"#);
        assert_eq!(announcement.tags_list(), vec!["ops", "downtime"]);
    }

    #[test]
    fn malformed_tags_read_as_empty() {
        let mut announcement = Announcement::new("t", "b");
        announcement.tags = "[oops".to_string();
        assert!(announcement.tags_list().is_empty());
    }
}

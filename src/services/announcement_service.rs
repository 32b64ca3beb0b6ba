use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::database::manager::DatabaseError;
use crate::database::models::Announcement;
use crate::database::JsonRepository;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnouncementDto {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_public")]
    pub is_public: bool,
}

fn default_public() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum AnnouncementError {
    #[error("Announcement title must not be blank")]
    BlankTitle,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub struct AnnouncementService<R: JsonRepository<Announcement>> {
    repository: R,
}

impl<R: JsonRepository<Announcement>> AnnouncementService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub async fn create_announcement(&self, dto: AnnouncementDto) -> Result<Announcement, AnnouncementError> {
        let title = dto.title.trim();
        if title.is_empty() {
            return Err(AnnouncementError::BlankTitle);
        }

        let mut announcement = Announcement::new(title, dto.body);
        announcement.is_public = dto.is_public;
        announcement.set_tags_list(&dto.tags);
        Ok(self.repository.save(announcement).await?)
    }

    /// Title or body matches first, then tag matches, each announcement once
    pub async fn search_announcements(&self, text: &str) -> Result<Vec<Announcement>, AnnouncementError> {
        let lowered = text.to_lowercase();
        let by_text = self.repository.find_all().await?.into_iter().filter(|a| {
            a.title.to_lowercase().contains(&lowered) || a.body.to_lowercase().contains(&lowered)
        });
        let by_tags = self.repository.json_search_by_value(text).await?;

        let mut seen = HashSet::new();
        Ok(by_text.chain(by_tags).filter(|a| seen.insert(a.id)).collect())
    }

    /// Announcements carrying exactly `tag`, ignoring case
    pub async fn tagged(&self, tag: &str) -> Result<Vec<Announcement>, AnnouncementError> {
        let folded = tag.to_lowercase();
        Ok(self
            .repository
            .json_search_by_value(tag)
            .await?
            .into_iter()
            .filter(|a| a.tags_list().iter().any(|t| t.to_lowercase() == folded))
            .collect())
    }
}

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::database::manager::DatabaseError;
use crate::database::models::Device;
use crate::database::JsonRepository;
use crate::json::QueryValue;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceDto {
    pub name: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device name must not be blank")]
    BlankName,
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

pub struct DeviceService<R: JsonRepository<Device>> {
    repository: R,
}

impl<R: JsonRepository<Device>> DeviceService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub async fn create_device(&self, dto: DeviceDto) -> Result<Device, DeviceError> {
        let name = Self::validate_name(&dto.name)?;
        let device = Device::with_properties(name, dto.properties);
        Ok(self.repository.save(device).await?)
    }

    pub async fn get_device(&self, id: i64) -> Result<Option<Device>, DeviceError> {
        Ok(self.repository.find_by_id(&id).await?)
    }

    /// `None` when no device has this id
    pub async fn update_device(&self, id: i64, dto: DeviceDto) -> Result<Option<Device>, DeviceError> {
        let name = Self::validate_name(&dto.name)?;
        let Some(mut existing) = self.repository.find_by_id(&id).await? else {
            return Ok(None);
        };
        existing.name = name.to_string();
        existing.set_properties(dto.properties);
        Ok(Some(self.repository.save(existing).await?))
    }

    pub async fn delete_device(&self, id: i64) -> Result<bool, DeviceError> {
        Ok(self.repository.delete_by_id(&id).await?)
    }

    /// Name matches first, then property value matches, each device once
    pub async fn search_devices(&self, text: &str) -> Result<Vec<Device>, DeviceError> {
        let lowered = text.to_lowercase();
        let by_name = self
            .repository
            .find_all()
            .await?
            .into_iter()
            .filter(|device| device.name.to_lowercase().contains(&lowered));
        let by_json = self.repository.json_search_by_value(text).await?;

        let mut seen = HashSet::new();
        Ok(by_name
            .chain(by_json)
            .filter(|device| seen.insert(device.id))
            .collect())
    }

    pub async fn find_by_property(&self, key: &str, value: QueryValue) -> Result<Vec<Device>, DeviceError> {
        Ok(self.repository.json_search_by_key_and_value(key, value).await?)
    }

    pub async fn first_by_property(&self, key: &str, value: QueryValue) -> Result<Option<Device>, DeviceError> {
        Ok(self.repository.json_search_first_by_key_and_value(key, value).await?)
    }

    pub async fn has_property_value(&self, key: &str, value: QueryValue) -> Result<bool, DeviceError> {
        Ok(self.repository.exists_by_key_and_value(key, value).await?)
    }

    pub async fn devices_with_property(&self, key: &str) -> Result<Vec<Device>, DeviceError> {
        Ok(self.repository.json_search_by_key(key).await?)
    }

    pub async fn count_with_property(&self, key: &str) -> Result<i64, DeviceError> {
        Ok(self.repository.count_by_key(key).await?)
    }

    fn validate_name(name: &str) -> Result<&str, DeviceError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DeviceError::BlankName);
        }
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JsonQueryConfig;
    use crate::database::memory::MemoryProvider;
    use crate::database::models::DeviceRepository;
    use crate::database::{CrudRepository, JsonRepositoryImpl, RepositoryFactory};
    use serde_json::json;

    fn service() -> DeviceService<JsonRepositoryImpl<Device>> {
        let factory = RepositoryFactory::new(MemoryProvider::new(), JsonQueryConfig::default());
        DeviceService::new(factory.create::<DeviceRepository>().unwrap())
    }

    fn dto(name: &str, properties: Value) -> DeviceDto {
        DeviceDto {
            name: name.to_string(),
            properties: properties.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn blank_names_are_rejected() -> anyhow::Result<()> {
        let service = service();
        let err = service.create_device(dto("   ", json!({}))).await.unwrap_err();
        assert!(matches!(err, DeviceError::BlankName));
        assert_eq!(service.repository().count().await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn update_replaces_name_and_properties() -> anyhow::Result<()> {
        let service = service();
        let created = service.create_device(dto("lamp", json!({"watts": 40}))).await?;
        let id = created.id.unwrap();

        let updated = service
            .update_device(id, dto("desk lamp", json!({"watts": 60})))
            .await?
            .unwrap();
        assert_eq!(updated.name, "desk lamp");
        assert_eq!(updated.property("watts"), Some(json!(60)));

        assert!(service.update_device(id + 100, dto("x", json!({}))).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_reports_missing_devices() -> anyhow::Result<()> {
        let service = service();
        let created = service.create_device(dto("lamp", json!({}))).await?;
        let id = created.id.unwrap();
        assert!(service.delete_device(id).await?);
        assert!(!service.delete_device(id).await?);
        assert!(service.get_device(id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn search_combines_name_and_properties_without_duplicates() -> anyhow::Result<()> {
        let service = service();
        let kitchen = service.create_device(dto("Kitchen sensor", json!({"room": "kitchen"}))).await?;
        let hall = service.create_device(dto("Hall light", json!({"note": "near KITCHEN"}))).await?;
        service.create_device(dto("Garage door", json!({"room": "garage"}))).await?;

        let found = service.search_devices("kitchen").await?;
        let ids: Vec<_> = found.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![kitchen.id, hall.id]);
        Ok(())
    }

    #[tokio::test]
    async fn property_queries_delegate_to_repository() -> anyhow::Result<()> {
        let service = service();
        service.create_device(dto("a", json!({"zone": 1, "online": true}))).await?;
        service.create_device(dto("b", json!({"zone": 2}))).await?;
        service.create_device(dto("c", json!({"zone": 1}))).await?;

        assert_eq!(service.find_by_property("zone", 1.into()).await?.len(), 2);
        assert_eq!(service.first_by_property("zone", 2.into()).await?.unwrap().name, "b");
        assert!(service.has_property_value("online", true.into()).await?);
        assert!(!service.has_property_value("online", false.into()).await?);
        assert_eq!(service.devices_with_property("online").await?.len(), 1);
        assert_eq!(service.count_with_property("zone").await?, 3);
        Ok(())
    }
}

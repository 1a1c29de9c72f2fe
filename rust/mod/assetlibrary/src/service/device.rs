use cdf_core::{ListParams, ListResult, now_rfc3339};
use tracing::info;

use crate::model::{CreateDevice, Device, EventType, ObjectType};
use crate::service::{AssetLibraryError, AssetLibraryService, normalize, normalize_path};

impl AssetLibraryService {
    /// Register a device with its direct group memberships.
    pub fn create_device(&self, input: CreateDevice) -> Result<Device, AssetLibraryError> {
        let device_id = normalize(&input.device_id);
        if device_id.is_empty() {
            return Err(AssetLibraryError::Validation("deviceId is required".into()));
        }

        let _writes = self.write_lock();
        let mut groups: Vec<String> = Vec::with_capacity(input.groups.len());
        for value in &input.groups {
            let path = self.existing_group_path(value)?;
            if !groups.contains(&path) {
                groups.push(path);
            }
        }

        let now = now_rfc3339();
        let device = Device {
            device_id,
            description: input.description,
            groups,
            created_at: now.clone(),
            updated_at: now,
        };
        if !self.store.insert_device(&device)? {
            return Err(AssetLibraryError::Conflict(format!(
                "device '{}' already exists",
                device.device_id
            )));
        }

        info!(device_id = %device.device_id, "device created");
        self.emit(
            ObjectType::Device,
            &device.device_id,
            EventType::Create,
            serde_json::to_value(&device).ok(),
        );
        Ok(device)
    }

    /// Get a device by id.
    pub fn get_device(&self, device_id: &str) -> Result<Device, AssetLibraryError> {
        let device_id = normalize(device_id);
        self.store
            .get_device(&device_id)?
            .ok_or_else(|| AssetLibraryError::NotFound(format!("device '{}' not found", device_id)))
    }

    /// List devices ordered by id.
    pub fn list_devices(&self, params: &ListParams) -> Result<ListResult<Device>, AssetLibraryError> {
        let all = self.store.list_devices()?;
        Ok(self.page_limit(params).paginate(all))
    }

    /// Delete a device by id.
    pub fn delete_device(&self, device_id: &str) -> Result<(), AssetLibraryError> {
        let _writes = self.write_lock();
        let device = self.get_device(device_id)?;
        self.store.delete_device(&device.device_id)?;

        info!(device_id = %device.device_id, "device deleted");
        self.emit(
            ObjectType::Device,
            &device.device_id,
            EventType::Delete,
            serde_json::to_value(&device).ok(),
        );
        Ok(())
    }

    /// Add a device to a group. Already being a member is not an error.
    pub fn attach_device_to_group(
        &self,
        device_id: &str,
        group_path: &str,
    ) -> Result<Device, AssetLibraryError> {
        let _writes = self.write_lock();
        let mut device = self.get_device(device_id)?;
        let path = self.existing_group_path(group_path)?;
        if device.groups.contains(&path) {
            return Ok(device);
        }

        device.groups.push(path);
        device.updated_at = now_rfc3339();
        self.store.put_device(&device)?;

        info!(device_id = %device.device_id, groups = ?device.groups, "device attached to group");
        self.emit(
            ObjectType::Device,
            &device.device_id,
            EventType::Modify,
            serde_json::to_value(&device).ok(),
        );
        Ok(device)
    }

    /// Remove a device from a group it is a direct member of.
    pub fn detach_device_from_group(
        &self,
        device_id: &str,
        group_path: &str,
    ) -> Result<Device, AssetLibraryError> {
        let _writes = self.write_lock();
        let mut device = self.get_device(device_id)?;
        let path = normalize_path(group_path)?;
        let Some(pos) = device.groups.iter().position(|g| *g == path) else {
            return Err(AssetLibraryError::NotFound(format!(
                "device '{}' is not a member of '{}'",
                device.device_id, path
            )));
        };

        device.groups.remove(pos);
        device.updated_at = now_rfc3339();
        self.store.put_device(&device)?;

        info!(device_id = %device.device_id, groups = ?device.groups, "device detached from group");
        self.emit(
            ObjectType::Device,
            &device.device_id,
            EventType::Modify,
            serde_json::to_value(&device).ok(),
        );
        Ok(device)
    }

    fn existing_group_path(&self, value: &str) -> Result<String, AssetLibraryError> {
        let path = normalize_path(value)?;
        if !self.group_exists(&path)? {
            return Err(AssetLibraryError::NotFound(format!("group '{}' not found", path)));
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateGroup;
    use crate::service::testing::test_service;

    fn seed(svc: &AssetLibraryService) {
        for name in ["site1", "site2"] {
            svc.create_group(CreateGroup {
                name: name.to_string(),
                parent_path: None,
                description: None,
            })
            .unwrap();
        }
    }

    #[test]
    fn test_device_lifecycle() {
        let (_dir, svc, events) = test_service();
        seed(&svc);

        let device = svc
            .create_device(CreateDevice {
                device_id: "Sensor-01".into(),
                description: Some("rooftop".into()),
                groups: vec!["/Site1".into(), "/site1".into()],
            })
            .unwrap();
        assert_eq!(device.device_id, "sensor-01");
        assert_eq!(device.groups, vec!["/site1"]);

        let device = svc.attach_device_to_group("sensor-01", "/site2").unwrap();
        assert_eq!(device.groups, vec!["/site1", "/site2"]);

        // Attaching twice changes nothing.
        let again = svc.attach_device_to_group("sensor-01", "/site2").unwrap();
        assert_eq!(again.groups, device.groups);

        let device = svc.detach_device_from_group("SENSOR-01", "/site1").unwrap();
        assert_eq!(device.groups, vec!["/site2"]);
        assert!(matches!(
            svc.detach_device_from_group("sensor-01", "/site1"),
            Err(AssetLibraryError::NotFound(_))
        ));

        assert_eq!(svc.list_devices(&ListParams::default()).unwrap().total, 1);
        svc.delete_device("sensor-01").unwrap();
        assert!(matches!(svc.get_device("sensor-01"), Err(AssetLibraryError::NotFound(_))));

        let device_events: Vec<EventType> = events
            .events()
            .into_iter()
            .filter(|(t, _, _)| *t == ObjectType::Device)
            .map(|(_, _, e)| e)
            .collect();
        assert_eq!(
            device_events,
            vec![EventType::Create, EventType::Modify, EventType::Modify, EventType::Delete]
        );
    }

    #[test]
    fn test_create_device_errors() {
        let (_dir, svc, _events) = test_service();
        seed(&svc);

        assert!(matches!(
            svc.create_device(CreateDevice {
                device_id: "".into(),
                description: None,
                groups: vec![],
            }),
            Err(AssetLibraryError::Validation(_))
        ));
        assert!(matches!(
            svc.create_device(CreateDevice {
                device_id: "d1".into(),
                description: None,
                groups: vec!["/ghost".into()],
            }),
            Err(AssetLibraryError::NotFound(_))
        ));

        svc.create_device(CreateDevice {
            device_id: "d1".into(),
            description: None,
            groups: vec![],
        })
        .unwrap();
        assert!(matches!(
            svc.create_device(CreateDevice {
                device_id: "D1".into(),
                description: None,
                groups: vec![],
            }),
            Err(AssetLibraryError::Conflict(_))
        ));
        assert!(matches!(
            svc.attach_device_to_group("d1", "/ghost"),
            Err(AssetLibraryError::NotFound(_))
        ));
    }
}

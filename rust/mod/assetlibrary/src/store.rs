//! Asset graph storage.
//!
//! [`GraphStore`] is the seam the service talks to. Implementations supply
//! vertex persistence; the ancestry walk and the attached-policy traversals
//! are provided on top of it so every backend answers them the same way.

use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use cdf_kv::KVStore;

use crate::model::{
    AttachedPolicyRow, Device, Group, Policy, GROUP_LABEL, ROOT_GROUP_PATH, vertex_id,
};
use crate::service::AssetLibraryError;

const GROUP_PREFIX: &str = "assetlibrary:group:";
const DEVICE_PREFIX: &str = "assetlibrary:device:";
const POLICY_PREFIX: &str = "assetlibrary:policy:";

/// Graph datastore holding groups, devices and policies.
pub trait GraphStore: Send + Sync {
    fn get_group(&self, path: &str) -> Result<Option<Group>, AssetLibraryError>;
    fn put_group(&self, group: &Group) -> Result<(), AssetLibraryError>;
    /// Store a new group. `Ok(false)` if the path is already taken.
    fn insert_group(&self, group: &Group) -> Result<bool, AssetLibraryError>;
    fn delete_group(&self, path: &str) -> Result<(), AssetLibraryError>;
    /// All groups, ordered by path.
    fn list_groups(&self) -> Result<Vec<Group>, AssetLibraryError>;

    fn get_device(&self, device_id: &str) -> Result<Option<Device>, AssetLibraryError>;
    fn put_device(&self, device: &Device) -> Result<(), AssetLibraryError>;
    fn insert_device(&self, device: &Device) -> Result<bool, AssetLibraryError>;
    fn delete_device(&self, device_id: &str) -> Result<(), AssetLibraryError>;
    /// All devices, ordered by id.
    fn list_devices(&self) -> Result<Vec<Device>, AssetLibraryError>;

    fn get_policy(&self, policy_id: &str) -> Result<Option<Policy>, AssetLibraryError>;
    fn put_policy(&self, policy: &Policy) -> Result<(), AssetLibraryError>;
    fn insert_policy(&self, policy: &Policy) -> Result<bool, AssetLibraryError>;
    fn delete_policy(&self, policy_id: &str) -> Result<(), AssetLibraryError>;
    /// Policies ordered by id, optionally restricted to one type.
    fn list_policies(&self, policy_type: Option<&str>) -> Result<Vec<Policy>, AssetLibraryError>;

    /// Direct children of a group.
    fn list_child_groups(&self, path: &str) -> Result<Vec<Group>, AssetLibraryError> {
        Ok(self
            .list_groups()?
            .into_iter()
            .filter(|g| g.parent_path == path)
            .collect())
    }

    /// Devices that are direct members of a group.
    fn list_devices_in_group(&self, path: &str) -> Result<Vec<Device>, AssetLibraryError> {
        Ok(self
            .list_devices()?
            .into_iter()
            .filter(|d| d.groups.iter().any(|g| g == path))
            .collect())
    }

    /// Walk `parent_path` edges from `path` up to the root.
    ///
    /// Returns `[path, parent, ..., "/"]`. An unknown group ends the walk
    /// early; a loop in the parent chain is a storage error.
    fn ancestor_paths(&self, path: &str) -> Result<Vec<String>, AssetLibraryError> {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        let mut current = Some(path.to_string());

        while let Some(p) = current {
            if !visited.insert(p.clone()) {
                return Err(AssetLibraryError::Storage(format!(
                    "group hierarchy loops through {}",
                    p
                )));
            }
            chain.push(p.clone());
            if p == ROOT_GROUP_PATH {
                break;
            }
            current = self.get_group(&p)?.map(|g| g.parent_path);
        }

        Ok(chain)
    }

    /// Policies of `policy_type` scoped to any ancestor of the device's groups.
    ///
    /// Each row carries the device's own group vertices as `groups`.
    /// An unknown device yields no rows.
    fn list_device_attached_policies(
        &self,
        device_id: &str,
        policy_type: &str,
    ) -> Result<Vec<AttachedPolicyRow>, AssetLibraryError> {
        let own_groups = match self.get_device(device_id)? {
            Some(device) => device.groups,
            None => return Ok(Vec::new()),
        };
        let rows = self.attached_rows(&own_groups, Some(policy_type))?;
        debug!(device_id, policy_type, candidates = rows.len(), "device attached policies");
        Ok(rows)
    }

    /// Policies (optionally of one type) scoped to any ancestor of the given groups.
    ///
    /// Each row carries the queried group vertices as `groups`.
    fn list_group_attached_policies(
        &self,
        group_paths: &[String],
        policy_type: Option<&str>,
    ) -> Result<Vec<AttachedPolicyRow>, AssetLibraryError> {
        let rows = self.attached_rows(group_paths, policy_type)?;
        debug!(?group_paths, ?policy_type, candidates = rows.len(), "group attached policies");
        Ok(rows)
    }

    /// Shared traversal: own groups → ancestry → policies applying into it.
    fn attached_rows(
        &self,
        own_paths: &[String],
        policy_type: Option<&str>,
    ) -> Result<Vec<AttachedPolicyRow>, AssetLibraryError> {
        let mut ancestry = HashSet::new();
        for path in own_paths {
            ancestry.extend(self.ancestor_paths(path)?);
        }

        let groups: Vec<String> = own_paths
            .iter()
            .map(|p| vertex_id(GROUP_LABEL, p))
            .collect();

        let rows = self
            .list_policies(policy_type)?
            .into_iter()
            .filter(|p| p.applies_to.iter().any(|g| ancestry.contains(g)))
            .map(|p| AttachedPolicyRow {
                policy_groups: Some(
                    p.applies_to.iter().map(|g| vertex_id(GROUP_LABEL, g)).collect(),
                ),
                groups: Some(groups.clone()),
                policy_id: p.policy_id,
                policy_type: p.policy_type,
                description: p.description,
                document: p.document,
            })
            .collect();

        Ok(rows)
    }
}

/// GraphStore backed by a [`KVStore`]; every vertex is a JSON value.
///
/// Key layout: `assetlibrary:group:{path}`, `assetlibrary:device:{id}`,
/// `assetlibrary:policy:{id}`.
pub struct KvGraphStore {
    kv: Arc<dyn KVStore>,
}

impl KvGraphStore {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self { kv }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AssetLibraryError> {
        match self.kv.get(key)? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| AssetLibraryError::Internal(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), AssetLibraryError> {
        let data = serde_json::to_vec(value)
            .map_err(|e| AssetLibraryError::Internal(e.to_string()))?;
        self.kv.set(key, &data)?;
        Ok(())
    }

    fn insert_json<T: Serialize>(&self, key: &str, value: &T) -> Result<bool, AssetLibraryError> {
        let data = serde_json::to_vec(value)
            .map_err(|e| AssetLibraryError::Internal(e.to_string()))?;
        Ok(self.kv.insert_if_absent(key, &data)?)
    }

    fn scan_json<T: DeserializeOwned>(&self, prefix: &str) -> Result<Vec<T>, AssetLibraryError> {
        let mut items = Vec::new();
        for (key, bytes) in self.kv.scan(prefix)? {
            let item = serde_json::from_slice(&bytes)
                .map_err(|e| AssetLibraryError::Internal(format!("{}: {}", key, e)))?;
            items.push(item);
        }
        Ok(items)
    }
}

impl GraphStore for KvGraphStore {
    fn get_group(&self, path: &str) -> Result<Option<Group>, AssetLibraryError> {
        self.get_json(&format!("{}{}", GROUP_PREFIX, path))
    }

    fn put_group(&self, group: &Group) -> Result<(), AssetLibraryError> {
        self.put_json(&format!("{}{}", GROUP_PREFIX, group.group_path), group)
    }

    fn insert_group(&self, group: &Group) -> Result<bool, AssetLibraryError> {
        self.insert_json(&format!("{}{}", GROUP_PREFIX, group.group_path), group)
    }

    fn delete_group(&self, path: &str) -> Result<(), AssetLibraryError> {
        self.kv.delete(&format!("{}{}", GROUP_PREFIX, path))?;
        Ok(())
    }

    fn list_groups(&self) -> Result<Vec<Group>, AssetLibraryError> {
        self.scan_json(GROUP_PREFIX)
    }

    fn get_device(&self, device_id: &str) -> Result<Option<Device>, AssetLibraryError> {
        self.get_json(&format!("{}{}", DEVICE_PREFIX, device_id))
    }

    fn put_device(&self, device: &Device) -> Result<(), AssetLibraryError> {
        self.put_json(&format!("{}{}", DEVICE_PREFIX, device.device_id), device)
    }

    fn insert_device(&self, device: &Device) -> Result<bool, AssetLibraryError> {
        self.insert_json(&format!("{}{}", DEVICE_PREFIX, device.device_id), device)
    }

    fn delete_device(&self, device_id: &str) -> Result<(), AssetLibraryError> {
        self.kv.delete(&format!("{}{}", DEVICE_PREFIX, device_id))?;
        Ok(())
    }

    fn list_devices(&self) -> Result<Vec<Device>, AssetLibraryError> {
        self.scan_json(DEVICE_PREFIX)
    }

    fn get_policy(&self, policy_id: &str) -> Result<Option<Policy>, AssetLibraryError> {
        self.get_json(&format!("{}{}", POLICY_PREFIX, policy_id))
    }

    fn put_policy(&self, policy: &Policy) -> Result<(), AssetLibraryError> {
        self.put_json(&format!("{}{}", POLICY_PREFIX, policy.policy_id), policy)
    }

    fn insert_policy(&self, policy: &Policy) -> Result<bool, AssetLibraryError> {
        self.insert_json(&format!("{}{}", POLICY_PREFIX, policy.policy_id), policy)
    }

    fn delete_policy(&self, policy_id: &str) -> Result<(), AssetLibraryError> {
        self.kv.delete(&format!("{}{}", POLICY_PREFIX, policy_id))?;
        Ok(())
    }

    fn list_policies(&self, policy_type: Option<&str>) -> Result<Vec<Policy>, AssetLibraryError> {
        let all: Vec<Policy> = self.scan_json(POLICY_PREFIX)?;
        Ok(match policy_type {
            Some(t) => all.into_iter().filter(|p| p.policy_type == t).collect(),
            None => all,
        })
    }
}

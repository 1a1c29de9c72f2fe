use cdf_core::{ListParams, ListResult, now_rfc3339};
use tracing::info;

use crate::model::{CreateGroup, EventType, Group, ObjectType, ROOT_GROUP_PATH, child_path};
use crate::service::{AssetLibraryError, AssetLibraryService, normalize, normalize_path};

impl AssetLibraryService {
    /// Create a group under an existing parent (the root by default).
    pub fn create_group(&self, input: CreateGroup) -> Result<Group, AssetLibraryError> {
        let name = normalize(&input.name);
        if name.is_empty() {
            return Err(AssetLibraryError::Validation("group name is required".into()));
        }
        if name.contains('/') {
            return Err(AssetLibraryError::Validation(format!(
                "group name '{}' cannot contain '/'",
                name
            )));
        }

        let _writes = self.write_lock();
        let parent_path = match input.parent_path {
            Some(ref p) => normalize_path(p)?,
            None => ROOT_GROUP_PATH.to_string(),
        };
        if !self.group_exists(&parent_path)? {
            return Err(AssetLibraryError::NotFound(format!(
                "parent group '{}' not found",
                parent_path
            )));
        }

        let group_path = child_path(&parent_path, &name);
        let now = now_rfc3339();
        let group = Group {
            group_path,
            name,
            parent_path,
            description: input.description,
            created_at: now.clone(),
            updated_at: now,
        };
        if !self.store.insert_group(&group)? {
            return Err(AssetLibraryError::Conflict(format!(
                "group '{}' already exists",
                group.group_path
            )));
        }

        info!(group_path = %group.group_path, "group created");
        self.emit(
            ObjectType::Group,
            &group.group_path,
            EventType::Create,
            serde_json::to_value(&group).ok(),
        );
        Ok(group)
    }

    /// Get a group by path. The implicit root is not a stored group.
    pub fn get_group(&self, path: &str) -> Result<Group, AssetLibraryError> {
        let path = normalize_path(path)?;
        self.store
            .get_group(&path)?
            .ok_or_else(|| AssetLibraryError::NotFound(format!("group '{}' not found", path)))
    }

    /// List groups ordered by path.
    pub fn list_groups(&self, params: &ListParams) -> Result<ListResult<Group>, AssetLibraryError> {
        let all = self.store.list_groups()?;
        Ok(self.page_limit(params).paginate(all))
    }

    /// Delete a group that nothing references any more.
    pub fn delete_group(&self, path: &str) -> Result<(), AssetLibraryError> {
        let path = normalize_path(path)?;
        if path == ROOT_GROUP_PATH {
            return Err(AssetLibraryError::Validation(
                "the root group cannot be deleted".into(),
            ));
        }
        let _writes = self.write_lock();
        let group = self.get_group(&path)?;

        if !self.store.list_child_groups(&path)?.is_empty() {
            return Err(AssetLibraryError::Conflict(format!(
                "group '{}' still has child groups",
                path
            )));
        }
        if !self.store.list_devices_in_group(&path)?.is_empty() {
            return Err(AssetLibraryError::Conflict(format!(
                "group '{}' still has member devices",
                path
            )));
        }
        let scoped: Vec<String> = self
            .store
            .list_policies(None)?
            .into_iter()
            .filter(|p| p.applies_to.contains(&path))
            .map(|p| p.policy_id)
            .collect();
        if !scoped.is_empty() {
            return Err(AssetLibraryError::Conflict(format!(
                "group '{}' is in the scope of policies: {}",
                path,
                scoped.join(", ")
            )));
        }

        self.store.delete_group(&path)?;

        info!(group_path = %path, "group deleted");
        self.emit(
            ObjectType::Group,
            &path,
            EventType::Delete,
            serde_json::to_value(&group).ok(),
        );
        Ok(())
    }
}

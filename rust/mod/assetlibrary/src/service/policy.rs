use cdf_core::{ListParams, ListResult, merge_patch, now_rfc3339};
use tracing::{debug, info};

use crate::model::{AttachedPolicy, AttachedPolicyRow, CreatePolicy, EventType, ObjectType, Policy, PolicyModel};
use crate::service::inheritance::filter_attached;
use crate::service::{AssetLibraryError, AssetLibraryService, normalize, normalize_path};

impl AssetLibraryService {
    /// Create a policy scoped to one or more existing groups.
    pub fn create_policy(&self, input: CreatePolicy) -> Result<Policy, AssetLibraryError> {
        let policy_id = normalize(&input.policy_id);
        if policy_id.is_empty() {
            return Err(AssetLibraryError::Validation("policyId is required".into()));
        }
        let policy_type = normalize(&input.policy_type);
        if policy_type.is_empty() {
            return Err(AssetLibraryError::Validation("type is required".into()));
        }
        if input.document.trim().is_empty() {
            return Err(AssetLibraryError::Validation("document is required".into()));
        }
        let _writes = self.write_lock();
        let applies_to = self.resolve_applies_to(&input.applies_to)?;

        let now = now_rfc3339();
        let policy = Policy {
            policy_id,
            policy_type,
            description: input.description,
            document: input.document,
            applies_to,
            created_at: now.clone(),
            updated_at: now,
        };
        if !self.store.insert_policy(&policy)? {
            return Err(AssetLibraryError::Conflict(format!(
                "policy '{}' already exists",
                policy.policy_id
            )));
        }

        info!(policy_id = %policy.policy_id, policy_type = %policy.policy_type, "policy created");
        self.emit(
            ObjectType::Policy,
            &policy.policy_id,
            EventType::Create,
            serde_json::to_value(&policy).ok(),
        );
        Ok(policy)
    }

    /// Get a policy by id.
    pub fn get_policy(&self, policy_id: &str) -> Result<Policy, AssetLibraryError> {
        let policy_id = normalize(policy_id);
        self.store
            .get_policy(&policy_id)?
            .ok_or_else(|| AssetLibraryError::NotFound(format!("policy '{}' not found", policy_id)))
    }

    /// Update a policy with JSON merge-patch. `policyId` and `createdAt` are immutable.
    pub fn update_policy(
        &self,
        policy_id: &str,
        patch: serde_json::Value,
    ) -> Result<Policy, AssetLibraryError> {
        if !patch.is_object() {
            return Err(AssetLibraryError::Validation(
                "policy patch must be a JSON object".into(),
            ));
        }

        let _writes = self.write_lock();
        let current = self.get_policy(policy_id)?;
        let now = now_rfc3339();

        let mut base = serde_json::to_value(&current)
            .map_err(|e| AssetLibraryError::Internal(e.to_string()))?;
        merge_patch(&mut base, &patch);
        base["policyId"] = serde_json::json!(current.policy_id);
        base["createdAt"] = serde_json::json!(current.created_at);
        base["updatedAt"] = serde_json::json!(now);

        let mut updated: Policy = serde_json::from_value(base)
            .map_err(|e| AssetLibraryError::Validation(e.to_string()))?;

        updated.policy_type = normalize(&updated.policy_type);
        if updated.policy_type.is_empty() {
            return Err(AssetLibraryError::Validation("type is required".into()));
        }
        if updated.document.trim().is_empty() {
            return Err(AssetLibraryError::Validation("document is required".into()));
        }
        updated.applies_to = self.resolve_applies_to(&updated.applies_to)?;

        self.store.put_policy(&updated)?;

        info!(policy_id = %updated.policy_id, "policy updated");
        self.emit(
            ObjectType::Policy,
            &updated.policy_id,
            EventType::Modify,
            serde_json::to_value(&updated).ok(),
        );
        Ok(updated)
    }

    /// Delete a policy by id.
    pub fn delete_policy(&self, policy_id: &str) -> Result<(), AssetLibraryError> {
        let _writes = self.write_lock();
        let policy = self.get_policy(policy_id)?;
        self.store.delete_policy(&policy.policy_id)?;

        info!(policy_id = %policy.policy_id, "policy deleted");
        self.emit(
            ObjectType::Policy,
            &policy.policy_id,
            EventType::Delete,
            serde_json::to_value(&policy).ok(),
        );
        Ok(())
    }

    /// List policies, optionally of one type, with pagination.
    pub fn list_policies(
        &self,
        policy_type: Option<&str>,
        params: &ListParams,
    ) -> Result<ListResult<Policy>, AssetLibraryError> {
        let policy_type = policy_type.map(normalize).filter(|t| !t.is_empty());
        let all = self.store.list_policies(policy_type.as_deref())?;
        Ok(self.page_limit(params).paginate(all))
    }

    /// Policies of `policy_type` a device inherits through its groups.
    ///
    /// `Ok(None)` means candidates may exist but none is fully in scope.
    pub fn list_inherited_by_device(
        &self,
        device_id: &str,
        policy_type: &str,
    ) -> Result<Option<Vec<PolicyModel>>, AssetLibraryError> {
        let device_id = normalize(device_id);
        let policy_type = normalize(policy_type);
        if device_id.is_empty() {
            return Err(AssetLibraryError::Validation("deviceId is required".into()));
        }
        if policy_type.is_empty() {
            return Err(AssetLibraryError::Validation("type is required".into()));
        }
        if self.store.get_device(&device_id)?.is_none() {
            return Err(AssetLibraryError::NotFound(format!(
                "device '{}' not found",
                device_id
            )));
        }

        let rows = self
            .store
            .list_device_attached_policies(&device_id, &policy_type)?;
        let inherited = match_rows(rows)?;
        debug!(
            %device_id,
            %policy_type,
            inherited = inherited.as_ref().map_or(0, Vec::len),
            "inherited policies by device"
        );
        Ok(inherited)
    }

    /// Policies (optionally of one type) inherited by a set of group paths.
    pub fn list_inherited_by_group(
        &self,
        group_paths: &[String],
        policy_type: Option<&str>,
    ) -> Result<Option<Vec<PolicyModel>>, AssetLibraryError> {
        let group_paths = group_paths
            .iter()
            .map(|p| normalize_path(p))
            .collect::<Result<Vec<_>, _>>()?;
        if group_paths.is_empty() {
            return Err(AssetLibraryError::Validation(
                "at least one group path is required".into(),
            ));
        }
        let policy_type = policy_type.map(normalize).filter(|t| !t.is_empty());

        let rows = self
            .store
            .list_group_attached_policies(&group_paths, policy_type.as_deref())?;
        let inherited = match_rows(rows)?;
        debug!(
            ?group_paths,
            inherited = inherited.as_ref().map_or(0, Vec::len),
            "inherited policies by group"
        );
        Ok(inherited)
    }

    /// Normalize an `appliesTo` list: non-empty, existing groups, no duplicates.
    fn resolve_applies_to(&self, raw: &[String]) -> Result<Vec<String>, AssetLibraryError> {
        if raw.is_empty() {
            return Err(AssetLibraryError::Validation(
                "appliesTo must name at least one group".into(),
            ));
        }

        let mut paths: Vec<String> = Vec::with_capacity(raw.len());
        for value in raw {
            let path = normalize_path(value)?;
            if !self.group_exists(&path)? {
                return Err(AssetLibraryError::Validation(format!(
                    "group '{}' does not exist",
                    path
                )));
            }
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

/// Validate every row before matching any of them.
fn match_rows(rows: Vec<AttachedPolicyRow>) -> Result<Option<Vec<PolicyModel>>, AssetLibraryError> {
    let attached = rows
        .into_iter()
        .map(AttachedPolicy::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    filter_attached(&attached)
}

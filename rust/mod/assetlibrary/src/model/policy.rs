use serde::{Deserialize, Serialize};

use crate::service::AssetLibraryError;

/// A stored policy vertex together with its `appliesTo` edges.
///
/// - **policy_type**: discriminator, e.g. "provisioningtemplate"
/// - **document**: opaque payload, never interpreted here
/// - **applies_to**: paths of the groups the policy declares it applies to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    /// Lower-cased policy id.
    pub policy_id: String,

    #[serde(rename = "type")]
    pub policy_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub document: String,

    /// Group paths this policy is scoped to.
    pub applies_to: Vec<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicy {
    pub policy_id: String,
    #[serde(rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub document: String,
    pub applies_to: Vec<String>,
}

/// Flat policy model returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyModel {
    pub policy_id: String,

    #[serde(rename = "type")]
    pub policy_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub document: String,

    pub applies_to: Vec<String>,
}

impl From<Policy> for PolicyModel {
    fn from(p: Policy) -> Self {
        Self {
            policy_id: p.policy_id,
            policy_type: p.policy_type,
            description: p.description,
            document: p.document,
            applies_to: p.applies_to,
        }
    }
}

/// Raw projection of one traversal hit, as the graph store emits it.
///
/// The vertex-id collections may be absent on malformed rows; convert into
/// [`AttachedPolicy`] before matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedPolicyRow {
    pub policy_id: String,

    #[serde(rename = "type")]
    pub policy_type: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub document: String,

    /// Vertex ids of the queried entity's own groups.
    #[serde(default)]
    pub groups: Option<Vec<String>>,

    /// Vertex ids of the groups the policy applies to.
    #[serde(default)]
    pub policy_groups: Option<Vec<String>>,
}

/// A candidate policy for inheritance matching.
///
/// `groups` is the candidate-coverage set (the entity's own group paths),
/// `policy_groups` the required-coverage set (the policy's declared scope).
#[derive(Debug, Clone, PartialEq)]
pub struct AttachedPolicy {
    pub policy_id: String,
    pub policy_type: String,
    pub description: Option<String>,
    pub document: String,
    pub groups: Vec<String>,
    pub policy_groups: Vec<String>,
}

impl TryFrom<AttachedPolicyRow> for AttachedPolicy {
    type Error = AssetLibraryError;

    fn try_from(row: AttachedPolicyRow) -> Result<Self, Self::Error> {
        let groups = row.groups.ok_or_else(|| {
            AssetLibraryError::Validation(format!(
                "attached policy '{}' has no groups",
                row.policy_id
            ))
        })?;
        let policy_groups = row.policy_groups.ok_or_else(|| {
            AssetLibraryError::Validation(format!(
                "attached policy '{}' has no policyGroups",
                row.policy_id
            ))
        })?;

        Ok(Self {
            policy_id: row.policy_id,
            policy_type: row.policy_type,
            description: row.description,
            document: row.document,
            groups,
            policy_groups,
        })
    }
}

use crate::model::{AttachedPolicy, PolicyModel, GROUP_LABEL, parse_vertex_id};
use crate::service::AssetLibraryError;

/// Flatten matched policies into [`PolicyModel`]s, preserving input order.
///
/// Each `policy_groups` vertex id becomes a bare group path in `applies_to`.
/// A scope vertex that is not a group is rejected.
pub fn to_model_from_policies(
    policies: &[&AttachedPolicy],
) -> Result<Vec<PolicyModel>, AssetLibraryError> {
    policies.iter().map(|p| to_model(p)).collect()
}

fn to_model(policy: &AttachedPolicy) -> Result<PolicyModel, AssetLibraryError> {
    let applies_to = policy
        .policy_groups
        .iter()
        .map(|id| match parse_vertex_id(id) {
            (Some(GROUP_LABEL), path) | (None, path) => Ok(path.to_string()),
            (Some(label), _) => Err(AssetLibraryError::Internal(format!(
                "policy '{}' applies to a {} vertex: {}",
                policy.policy_id, label, id
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PolicyModel {
        policy_id: policy.policy_id.clone(),
        policy_type: policy.policy_type.clone(),
        description: policy.description.clone(),
        document: policy.document.clone(),
        applies_to,
    })
}

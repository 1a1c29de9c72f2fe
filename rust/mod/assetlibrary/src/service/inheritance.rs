//! Policy inheritance matching.
//!
//! A policy is inherited by a device or group when every group in the
//! policy's declared scope (`policy_groups`) is covered by one of the
//! entity's own group paths (`groups`). Coverage is a literal string
//! prefix test, so `/a` covers `/a/b/c`, and also `/ab` covers `/abc/x`.
//! Each entity group can cover a single scope entry only.

use crate::model::{AttachedPolicy, PolicyModel};
use crate::service::assembler::to_model_from_policies;
use crate::service::AssetLibraryError;

/// Keep the attached policies whose scope is fully covered, flattened.
///
/// Returns `Ok(None)` when no policy matches, including for empty input.
/// Assembler errors are returned unchanged.
pub fn filter_attached(
    attached: &[AttachedPolicy],
) -> Result<Option<Vec<PolicyModel>>, AssetLibraryError> {
    let matched: Vec<&AttachedPolicy> = attached
        .iter()
        .filter(|p| covers_scope(&p.groups, &p.policy_groups))
        .collect();

    if matched.is_empty() {
        return Ok(None);
    }

    to_model_from_policies(&matched).map(Some)
}

/// Whether every entry of `policy_groups` is prefix-covered by a distinct
/// entry of `groups`.
pub fn covers_scope(groups: &[String], policy_groups: &[String]) -> bool {
    let mut candidates: Vec<&str> = groups.iter().map(String::as_str).collect();
    let mut required: Vec<&str> = policy_groups.iter().map(String::as_str).collect();
    candidates.sort_unstable();
    required.sort_unstable();

    for i in (0..required.len()).rev() {
        if let Some(j) = candidates.iter().rposition(|g| g.starts_with(required[i])) {
            // Consumed: this group cannot cover a second scope entry.
            candidates.remove(j);
            required.remove(i);
        }
    }

    required.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn attached(id: &str, groups: &[&str], policy_groups: &[&str]) -> AttachedPolicy {
        AttachedPolicy {
            policy_id: id.to_string(),
            policy_type: "provisioningtemplate".to_string(),
            description: Some(format!("{} description", id)),
            document: "{\"template\":true}".to_string(),
            groups: strings(groups),
            policy_groups: strings(policy_groups),
        }
    }

    #[test]
    fn test_single_policy_matches() {
        let input = vec![attached("p1", &["/l1/l2/l3", "/a/b/c"], &["/l1", "/a"])];

        let result = filter_attached(&input).unwrap().expect("policy should be inherited");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].policy_id, "p1");
        assert_eq!(result[0].policy_type, "provisioningtemplate");
        assert_eq!(result[0].document, "{\"template\":true}");
        assert_eq!(result[0].applies_to, vec!["/l1", "/a"]);
    }

    #[test]
    fn test_only_fully_covered_policy_survives() {
        let input = vec![
            attached("p1", &["/l1/l2/l3", "/a/b/c"], &["/l1", "/a"]),
            attached("p2", &["/l1/l2/l3", "/a/b/c"], &["/l1", "/nomatch"]),
        ];

        let result = filter_attached(&input).unwrap().unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].policy_id, "p1");
    }

    #[test]
    fn test_empty_input_is_none() {
        assert_eq!(filter_attached(&[]).unwrap(), None);
    }

    #[test]
    fn test_all_failing_is_none_not_empty() {
        let input = vec![
            attached("p1", &["/x/y"], &["/a"]),
            attached("p2", &[], &["/a"]),
        ];
        assert_eq!(filter_attached(&input).unwrap(), None);
    }

    #[test]
    fn test_empty_scope_always_matches() {
        let input = vec![attached("p1", &["/anything"], &[]), attached("p2", &[], &[])];

        let result = filter_attached(&input).unwrap().unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|p| p.applies_to.is_empty()));
    }

    #[test]
    fn test_group_covers_one_scope_entry_only() {
        // Two identical requirements, one covering group.
        assert!(!covers_scope(&strings(&["/a/b"]), &strings(&["/a", "/a"])));
        // Two covering groups satisfy both.
        assert!(covers_scope(&strings(&["/a/b", "/a/c"]), &strings(&["/a", "/a"])));
        // One group under both /a and /a/b still counts once.
        assert!(!covers_scope(&strings(&["/a/b/c"]), &strings(&["/a", "/a/b"])));
    }

    #[test]
    fn test_prefix_is_literal_not_segment_aware() {
        assert!(covers_scope(&strings(&["/abc/x"]), &strings(&["/ab"])));
        assert!(covers_scope(&strings(&["/a"]), &strings(&["/a"])));
        assert!(!covers_scope(&strings(&["/a"]), &strings(&["/a/b"])));
    }

    #[test]
    fn test_order_of_inputs_is_irrelevant() {
        let groups = strings(&["/a/b/c", "/l1/l2/l3"]);
        assert!(covers_scope(&groups, &strings(&["/l1", "/a"])));
        assert!(covers_scope(&groups, &strings(&["/a", "/l1"])));
    }

    #[test]
    fn test_output_order_follows_input() {
        let input = vec![
            attached("zeta", &["/a/b"], &["/a"]),
            attached("alpha", &["/a/b"], &["/a"]),
        ];
        let ids: Vec<String> = filter_attached(&input)
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|p| p.policy_id)
            .collect();
        assert_eq!(ids, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_vertex_ids_are_matched_and_stripped() {
        let input = vec![attached(
            "p1",
            &["group___/l1/l2/l3"],
            &["group___/l1"],
        )];
        let result = filter_attached(&input).unwrap().unwrap();
        assert_eq!(result[0].applies_to, vec!["/l1"]);
    }

    #[test]
    fn test_assembler_error_propagates() {
        let input = vec![attached("p1", &["device___d1"], &["device___d1"])];
        let err = filter_attached(&input).unwrap_err();
        assert!(matches!(err, AssetLibraryError::Internal(_)));
    }
}

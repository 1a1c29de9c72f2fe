//! Graph vertex ids.
//!
//! Traversal results name vertices as `{label}___{id}`, e.g. `group___/a/b`
//! or `device___sensor-01`. Ids handed back to API callers have the label
//! stripped.

const SEPARATOR: &str = "___";

/// Vertex label for groups.
pub const GROUP_LABEL: &str = "group";
/// Vertex label for devices.
pub const DEVICE_LABEL: &str = "device";
/// Vertex label for policies.
pub const POLICY_LABEL: &str = "policy";

const LABELS: [&str; 3] = [GROUP_LABEL, DEVICE_LABEL, POLICY_LABEL];

/// Build the graph-internal id of a vertex.
pub fn vertex_id(label: &str, id: &str) -> String {
    format!("{}{}{}", label, SEPARATOR, id)
}

/// Split a vertex id into its label and bare id.
///
/// Ids without a known label prefix are returned unchanged with no label.
pub fn parse_vertex_id(id: &str) -> (Option<&'static str>, &str) {
    for label in LABELS {
        if let Some(rest) = id.strip_prefix(label).and_then(|r| r.strip_prefix(SEPARATOR)) {
            return (Some(label), rest);
        }
    }
    (None, id)
}

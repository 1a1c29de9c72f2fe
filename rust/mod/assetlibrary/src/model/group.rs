use serde::{Deserialize, Serialize};

/// Path of the implicit root group. Every group hangs off it; it is never stored.
pub const ROOT_GROUP_PATH: &str = "/";

/// A hierarchical group in the asset graph.
///
/// Groups form a tree via `parent_path`. The path is the group's identity:
/// a child `b` of `/a` lives at `/a/b`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Full lower-cased path, e.g. `/site1/floor2`.
    pub group_path: String,

    /// Last path segment.
    pub name: String,

    /// Path of the parent group (`/` for top-level groups).
    pub parent_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a new group.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub name: String,
    /// Defaults to the root group.
    #[serde(default)]
    pub parent_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Join a parent path and a child name into the child's path.
pub fn child_path(parent_path: &str, name: &str) -> String {
    if parent_path == ROOT_GROUP_PATH {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent_path, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_path() {
        assert_eq!(child_path("/", "site1"), "/site1");
        assert_eq!(child_path("/site1", "floor2"), "/site1/floor2");
    }
}

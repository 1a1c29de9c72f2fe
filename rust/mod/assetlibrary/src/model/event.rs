use serde::{Deserialize, Serialize};

/// Kind of object a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Policy,
    Group,
    Device,
}

impl ObjectType {
    /// Plural form used in topic names.
    pub fn topic_segment(&self) -> &'static str {
        match self {
            ObjectType::Policy => "policies",
            ObjectType::Group => "groups",
            ObjectType::Device => "devices",
        }
    }
}

/// What happened to the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Create,
    Modify,
    Delete,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Create => "create",
            EventType::Modify => "modify",
            EventType::Delete => "delete",
        }
    }
}

/// Domain event published after a mutation.
///
/// Wire form: `{"objectId": "...", "type": "policy", "event": "create", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub object_id: String,

    #[serde(rename = "type")]
    pub object_type: ObjectType,

    pub event: EventType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl ChangeEvent {
    /// Topic the event is published to, below `prefix`.
    ///
    /// `cdf/assetlibrary/events` + policy `p1` created →
    /// `cdf/assetlibrary/events/policies/p1/create`. A group path keeps its
    /// inner slashes but loses the leading one.
    pub fn topic(&self, prefix: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            prefix.trim_end_matches('/'),
            self.object_type.topic_segment(),
            self.object_id.trim_start_matches('/'),
            self.event.as_str(),
        )
    }
}

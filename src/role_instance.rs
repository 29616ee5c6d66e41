//! Per-container lifecycle record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque cluster-manager-assigned identifier for a container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        ContainerId(s.to_string())
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        ContainerId(s)
    }
}

/// An opaque handle to an allocated container: node id, host, port. The
/// engine never interprets these beyond passing them to role history and the
/// published description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerHandle {
    pub id: ContainerId,
    pub node_id: String,
    pub host: String,
    pub http_port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleInstanceState {
    Requested,
    Submitted,
    Live,
    Destroyed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleInstance {
    pub container_id: ContainerId,
    pub container: ContainerHandle,
    pub role: String,
    pub role_id: i32,
    pub state: RoleInstanceState,
    pub create_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub diagnostics: Option<String>,
    pub released: bool,
    pub command: Option<String>,
    pub environment: Vec<(String, String)>,
}

impl RoleInstance {
    pub fn new(container: ContainerHandle, role: impl Into<String>, role_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            container_id: container.id.clone(),
            container,
            role: role.into(),
            role_id,
            state: RoleInstanceState::Requested,
            create_time: now,
            start_time: None,
            exit_code: None,
            diagnostics: None,
            released: false,
            command: None,
            environment: Vec::new(),
        }
    }
}

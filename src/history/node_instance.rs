use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placement memory entry for one `(node, role)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeInstance {
    pub hostname: String,
    pub role_id: i32,
    pub last_used_time: DateTime<Utc>,
    pub active_count: i32,
    /// Was once used by this role, not currently running it. Cleared to
    /// `false` while `active_count > 0`.
    pub available: bool,
}

impl NodeInstance {
    pub fn new(hostname: impl Into<String>, role_id: i32, now: DateTime<Utc>) -> Self {
        Self {
            hostname: hostname.into(),
            role_id,
            last_used_time: now,
            active_count: 0,
            available: false,
        }
    }
}

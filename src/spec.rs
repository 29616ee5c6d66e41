//! Cluster specification (user-authored desired state) and cluster
//! description (derived, published observed state).
//!
//! Deliberately collapsed into one authoritative `ClusterSpec` plus a
//! single derived `ClusterDescription` snapshot, rather than two
//! overlapping description objects that could drift out of sync.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::role::PlacementPolicy;
use crate::role_status::RoleStatusSnapshot;

/// Desired state for a single role, as authored by the user. `options` holds
/// opaque per-role settings (`role_priority`, `role_placement_policy`,
/// `yarn_memory`, `yarn_cores`, `jvm_heap`, and provider-specific keys) so
/// the spec format stays extensible without the engine knowing about every
/// provider's options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSpec {
    pub instances: i64,
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl RoleSpec {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    pub fn placement_policy(&self) -> PlacementPolicy {
        self.option("role_placement_policy")
            .and_then(|v| v.parse::<i32>().ok())
            .map(PlacementPolicy::from_code)
            .unwrap_or_default()
    }
}

/// User-authored desired state: role name -> spec.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,
    pub roles: HashMap<String, RoleSpec>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterState {
    Created,
    Live,
    Destroyed,
}

/// A single container as seen by status readers: node view plus identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerView {
    pub container_id: String,
    pub host: String,
    pub node_id: String,
    pub http_port: Option<u16>,
}

/// Global, cross-role statistics published alongside per-role counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterStatistics {
    pub completed: i64,
    pub failed: i64,
    pub live: i64,
    pub started: i64,
    pub start_failed: i64,
    pub surplus: i64,
    pub unknown_completed: i64,
}

/// Derived, published snapshot of cluster state: spec copy, per-role
/// counters, instance -> container maps, statistics, timestamps, state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterDescription {
    pub spec: ClusterSpec,
    pub state: ClusterState,
    pub create_time: Option<DateTime<Utc>>,
    pub role_statuses: Vec<RoleStatusSnapshot>,
    /// role name -> container ids currently live for that role.
    pub role_containers: HashMap<String, Vec<String>>,
    /// role name -> container id -> node view, for status readers.
    pub role_container_views: HashMap<String, HashMap<String, ContainerView>>,
    pub statistics: ClusterStatistics,
    pub restart_replay_count: usize,
}

impl ClusterDescription {
    pub fn new(spec: ClusterSpec) -> Self {
        Self {
            spec,
            state: ClusterState::Created,
            create_time: None,
            role_statuses: Vec::new(),
            role_containers: HashMap::new(),
            role_container_views: HashMap::new(),
            statistics: ClusterStatistics::default(),
            restart_replay_count: 0,
        }
    }

    /// `sum(actual) / sum(desired)` across roles, or 100 if total desired is
    /// zero (an empty cluster is trivially fully converged).
    pub fn progress_percent(&self) -> u32 {
        let total_desired: i64 = self.role_statuses.iter().map(|r| r.desired).sum();
        if total_desired == 0 {
            return 100;
        }
        let total_actual: i64 = self.role_statuses.iter().map(|r| r.actual).sum();
        ((total_actual.max(0) * 100) / total_desired) as u32
    }
}

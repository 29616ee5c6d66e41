//! Role definitions: the unit of flex.
//!
//! A role is a named class of container with an identical launch command and
//! resource shape. Role ids double as container-request priorities (see
//! `priority`), so they must be unique and fit the priority range.

use serde::{Deserialize, Serialize};

/// Placement policy hints consumed by role history when selecting nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// No placement preference; any node is acceptable.
    Default,
    /// Prefer to keep instances of this role spread across distinct nodes.
    AntiAffinity,
    /// Strongly prefer previously-used nodes for this role.
    StrictAffinity,
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        PlacementPolicy::Default
    }
}

impl PlacementPolicy {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => PlacementPolicy::AntiAffinity,
            2 => PlacementPolicy::StrictAffinity,
            _ => PlacementPolicy::Default,
        }
    }

    pub fn as_code(self) -> i32 {
        match self {
            PlacementPolicy::Default => 0,
            PlacementPolicy::AntiAffinity => 1,
            PlacementPolicy::StrictAffinity => 2,
        }
    }
}

/// Per-role resource shape. `memory_mb`/`cores` may be the literal sentinel
/// `"max"` in spec form, resolved against the cluster-reported container
/// maximum by `resource::derive_requirements`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    pub yarn_memory: String,
    pub yarn_cores: String,
    pub jvm_heap: Option<String>,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            yarn_memory: "512".to_string(),
            yarn_cores: "1".to_string(),
            jvm_heap: None,
        }
    }
}

/// A role known to the engine: the union of provider-declared roles and
/// dynamic roles that appear only in the cluster's own role list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub id: i32,
    pub placement_policy: PlacementPolicy,
    pub resource: ResourceSpec,
}

impl Role {
    pub fn new(name: impl Into<String>, id: i32) -> Self {
        Self {
            name: name.into(),
            id,
            placement_policy: PlacementPolicy::Default,
            resource: ResourceSpec::default(),
        }
    }
}

/// A role as offered by a provider plug-in (Flume, Tomcat, ...). Distinct
/// from `Role` because providers only know name/id/placement, not the
/// resource shape, which comes from the cluster spec.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRole {
    pub name: String,
    pub id: i32,
    pub placement_policy: PlacementPolicy,
}

/// Reserved role name for the Application Master's own self-instance.
/// Excluded from flex accounting.
pub const AM_SELF_ROLE_NAME: &str = "am-self";

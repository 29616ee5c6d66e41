//! Resource-Manager Operations: tagged values describing intended side
//! effects. The engine emits these; a thin driver applies them against the
//! real cluster-manager client. Kept as plain data so the engine never
//! performs I/O itself, and has no suspension points inside an entry point.

use serde::{Deserialize, Serialize};

use crate::resource::Resource;
use crate::role_instance::ContainerId;

/// A request for a new container, optionally hinting a preferred node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerRequestSpec {
    pub role_id: i32,
    pub priority: i32,
    pub resource: Resource,
    pub node_hint: Option<String>,
}

/// An operation the driver must apply against the cluster-manager client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Operation {
    ContainerRequest(ContainerRequestSpec),
    ContainerRelease(ContainerId),
}

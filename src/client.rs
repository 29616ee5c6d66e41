//! Thin client surface to the cluster resource manager and node manager.
//! Wire protocol, credentials, and launch-command construction are left to
//! a real cluster-manager integration; only the interfaces the engine's
//! driver depends on are named here, so the engine itself never talks to a
//! socket.

use crate::operations::{ContainerRequestSpec, Operation};
use crate::role_instance::{ContainerHandle, ContainerId};

/// A batch of containers granted by the resource manager since the last
/// poll.
#[derive(Debug, Clone, Default)]
pub struct AllocationBatch {
    pub containers: Vec<ContainerHandle>,
}

/// Terminal status of a container as reported by the resource manager.
#[derive(Debug, Clone)]
pub struct CompletionStatus {
    pub container_id: ContainerId,
    pub host: String,
    pub exit_code: i32,
    pub diagnostics: Option<String>,
}

pub trait ClusterManagerClient: Send + Sync {
    fn submit_request(&self, request: &ContainerRequestSpec);
    fn submit_release(&self, container_id: &ContainerId);
    fn poll_allocations(&self) -> AllocationBatch;
    fn poll_completions(&self) -> Vec<CompletionStatus>;
}

/// Applies a batch of engine-emitted operations against a client. This is
/// the only place I/O happens on behalf of `Operation` values; the engine
/// itself only ever returns them as data.
pub fn apply_operations(client: &dyn ClusterManagerClient, operations: &[Operation]) {
    for op in operations {
        match op {
            Operation::ContainerRequest(req) => client.submit_request(req),
            Operation::ContainerRelease(id) => client.submit_release(id),
        }
    }
}

pub trait NodeManagerCallbacks: Send + Sync {
    fn on_started(&self, container_id: &ContainerId);
    fn on_start_failed(&self, container_id: &ContainerId, cause: &str);
}

/// Test/dev double that records nothing and does nothing; lets the driver
/// binary and engine tests run without a real cluster manager.
#[derive(Default)]
pub struct NullClusterManagerClient;

impl ClusterManagerClient for NullClusterManagerClient {
    fn submit_request(&self, _request: &ContainerRequestSpec) {}
    fn submit_release(&self, _container_id: &ContainerId) {}
    fn poll_allocations(&self) -> AllocationBatch {
        AllocationBatch::default()
    }
    fn poll_completions(&self) -> Vec<CompletionStatus> {
        Vec::new()
    }
}

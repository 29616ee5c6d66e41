//! The mutable container maps the engine reconciles. Kept as one struct
//! behind one mutex (`AppState::containers`) so the invariants across these
//! maps (a container lives in exactly one of them at a time) can be checked
//! and maintained atomically per event.

use std::collections::{HashMap, HashSet};

use crate::role_instance::{ContainerHandle, ContainerId, RoleInstance};

#[derive(Debug, Default)]
pub struct Containers {
    /// Every container the engine currently considers allocated-and-not-yet-released.
    pub active: HashMap<ContainerId, RoleInstance>,
    /// Subset of `active`: submitted for start, not yet confirmed live.
    pub starting: HashSet<ContainerId>,
    /// Subset of `active`: released, awaiting the completion that will move
    /// them out of `active`.
    pub awaiting_release_ack: HashSet<ContainerId>,
    /// Containers allocated above desired count, released immediately;
    /// tracked until their completion arrives.
    pub surplus: HashSet<ContainerId>,
    pub completed: HashMap<ContainerId, RoleInstance>,
    pub failed: HashMap<ContainerId, RoleInstance>,
    /// Containers known to be LIVE, plus the AM's own self-instance.
    /// Invariant: `live_nodes.keys() ⊆ active.keys() ∪ {am_self}`.
    pub live_nodes: HashMap<ContainerId, ContainerHandle>,
}

/// Outcome of a completion notification, used by the driver to decide what
/// (if anything) to log or alert on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionKind {
    /// Matched an outstanding release request; not a failure.
    Expected,
    /// Matched a surplus container discarded at allocation time.
    Surplus,
    /// An unrequested termination of a live container.
    Crash,
    /// Did not match any known container.
    Unknown,
}

#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub kind: CompletionKind,
    pub instance: Option<RoleInstance>,
}

/// A container delivered by the resource manager's allocation callback,
/// still carrying the priority it was requested under so the engine can
/// decode which role it belongs to.
#[derive(Debug, Clone)]
pub struct AllocatedContainer {
    pub handle: ContainerHandle,
    pub priority: i32,
}

/// A container recovered across an AM restart, already running.
#[derive(Debug, Clone)]
pub struct RestartContainer {
    pub handle: ContainerHandle,
    pub role_name: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

//! Role History / placement memory.
//!
//! Remembers which nodes have run which roles, and answers two queries:
//! where should a new request for this role be hinted, and which running
//! instances should be torn down when a role has surplus. Implemented as a
//! plain in-memory table (`DashMap` keyed by role id, then hostname) with a
//! periodic on-disk snapshot rather than a graph of mutable cross-pointers,
//! so concurrent readers never observe a partially-linked structure.

pub mod node_instance;
pub mod persistence;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::clock::Clock;
use crate::error::Result;
use crate::operations::ContainerRequestSpec;
use crate::resource::Resource;
pub use node_instance::NodeInstance;
pub use persistence::{JsonFileHistoryStore, NullHistoryStore, RoleHistoryStore};

/// `role_id -> hostname -> NodeInstance`.
pub struct RoleHistory {
    table: DashMap<i32, DashMap<String, NodeInstance>>,
    store: Arc<dyn RoleHistoryStore>,
    clock: Arc<dyn Clock>,
}

impl RoleHistory {
    pub fn new(store: Arc<dyn RoleHistoryStore>, clock: Arc<dyn Clock>) -> Result<Self> {
        let history = Self {
            table: DashMap::new(),
            store,
            clock,
        };
        history.reload()?;
        Ok(history)
    }

    /// Reloads from the durable store, replacing the in-memory table with
    /// exactly what was persisted. Idempotent.
    pub fn reload(&self) -> Result<()> {
        let entries = self.store.load()?;
        self.table.clear();
        for entry in entries {
            self.table
                .entry(entry.role_id)
                .or_insert_with(DashMap::new)
                .insert(entry.hostname.clone(), entry);
        }
        Ok(())
    }

    fn persist(&self) {
        let mut flat = Vec::new();
        for role_entries in self.table.iter() {
            for node in role_entries.value().iter() {
                flat.push(node.value().clone());
            }
        }
        if let Err(e) = self.store.save(&flat) {
            tracing::warn!(error = %e, "failed to persist role history snapshot");
        }
    }

    /// Registers a role with empty history, if not already present.
    pub fn register_role(&self, role_id: i32) {
        self.table.entry(role_id).or_insert_with(DashMap::new);
    }

    /// Builds a container request for `role_id`, naming the most-recently-used
    /// available node as a hint if one exists (tie-break: hostname
    /// lexicographic ascending — an explicit, deterministic resolution of an
    /// open question in the distilled spec; see DESIGN.md). The caller is
    /// responsible for incrementing the role's `requested` counter.
    pub fn request_node(&self, role_id: i32, resource: Resource, priority: i32) -> ContainerRequestSpec {
        let node_hint = self.best_available_node(role_id);
        ContainerRequestSpec {
            role_id,
            priority,
            resource,
            node_hint,
        }
    }

    fn best_available_node(&self, role_id: i32) -> Option<String> {
        let nodes = self.table.get(&role_id)?;
        let mut best: Option<(DateTime<Utc>, String)> = None;
        for entry in nodes.iter() {
            let n = entry.value();
            if !n.available {
                continue;
            }
            match &best {
                None => best = Some((n.last_used_time, n.hostname.clone())),
                Some((best_time, best_host)) => {
                    if n.last_used_time > *best_time
                        || (n.last_used_time == *best_time && n.hostname < *best_host)
                    {
                        best = Some((n.last_used_time, n.hostname.clone()));
                    }
                }
            }
        }
        best.map(|(_, host)| host)
    }

    /// Chooses up to `n` hosts whose running instances of `role_id` should be
    /// torn down. Preference: nodes holding multiple instances first, then
    /// most-recently-assigned; ties broken by hostname ascending. Never
    /// returns a node with zero active instances.
    pub fn find_nodes_for_release(&self, role_id: i32, n: usize) -> Vec<NodeInstance> {
        let Some(nodes) = self.table.get(&role_id) else {
            return Vec::new();
        };
        let mut candidates: Vec<NodeInstance> = nodes
            .iter()
            .map(|e| e.value().clone())
            .filter(|n| n.active_count > 0)
            .collect();
        candidates.sort_by(|a, b| {
            b.active_count
                .cmp(&a.active_count)
                .then_with(|| b.last_used_time.cmp(&a.last_used_time))
                .then_with(|| a.hostname.cmp(&b.hostname))
        });
        candidates.truncate(n);
        candidates
    }

    /// A container is being started on `node` for `role_id`: mark the node
    /// active and no longer available. Called once per container, at start
    /// submission, not again at allocation — the two events would otherwise
    /// double-count the same placement.
    pub fn mark_assigned(&self, role_id: i32, hostname: &str) {
        let now = self.clock.now();
        {
            let nodes = self.table.entry(role_id).or_insert_with(DashMap::new);
            let mut node = nodes
                .entry(hostname.to_string())
                .or_insert_with(|| NodeInstance::new(hostname, role_id, now));
            node.active_count += 1;
            node.available = false;
            node.last_used_time = now;
        }
        self.persist();
    }

    /// NM start callback: no state change (node was already marked active at
    /// assignment time).
    pub fn mark_started(&self, _role_id: i32, _hostname: &str) {}

    /// Container release submitted: no state change; node remains active
    /// until completion arrives.
    pub fn mark_release_submitted(&self, _role_id: i32, _hostname: &str) {}

    /// Release completed: decrement active count; if it reaches zero, the
    /// node becomes available again for this role.
    pub fn mark_release_completed(&self, role_id: i32, hostname: &str) {
        if let Some(nodes) = self.table.get(&role_id) {
            if let Some(mut entry) = nodes.get_mut(hostname) {
                entry.active_count = (entry.active_count - 1).max(0);
                if entry.active_count == 0 {
                    entry.available = true;
                }
            }
        }
        self.persist();
    }

    /// Failed container: decrement active count. Short-lived failures
    /// blacklist the node for this role (`available = false`); long-lived
    /// failures free it up again (`available = true`).
    pub fn mark_failed(&self, role_id: i32, hostname: &str, short_lived: bool) {
        if let Some(nodes) = self.table.get(&role_id) {
            if let Some(mut entry) = nodes.get_mut(hostname) {
                entry.active_count = (entry.active_count - 1).max(0);
                entry.available = !short_lived;
            }
        }
        self.persist();
    }

    /// Surplus discard: no effect on placement memory.
    pub fn mark_surplus_discarded(&self, _role_id: i32, _hostname: &str) {}

    /// Reorders a batch of newly allocated containers so that those on
    /// preferred (available-turned-assigned) nodes sort first. The policy is
    /// stable: containers not on any remembered node keep their relative
    /// order, as do ties among remembered nodes.
    pub fn prepare_allocation_list<T>(
        &self,
        items: Vec<T>,
        host_of: impl Fn(&T) -> &str,
    ) -> Vec<T> {
        let mut scored: Vec<(bool, usize, T)> = items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                let preferred = self.was_preferred_host(host_of(&item));
                (preferred, idx, item)
            })
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        scored.into_iter().map(|(_, _, item)| item).collect()
    }

    fn was_preferred_host(&self, hostname: &str) -> bool {
        for role_nodes in self.table.iter() {
            if let Some(n) = role_nodes.value().get(hostname) {
                if n.active_count > 0 {
                    return true;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::history::persistence::NullHistoryStore;

    fn new_history() -> RoleHistory {
        RoleHistory::new(Arc::new(NullHistoryStore), Arc::new(SystemClock)).unwrap()
    }

    #[test]
    fn request_node_prefers_most_recently_used_available() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        h.mark_release_completed(1, "host-a");
        h.mark_assigned(1, "host-b");
        h.mark_release_completed(1, "host-b");

        let req = h.request_node(1, Resource { memory_mb: 512, cores: 1 }, 1);
        assert_eq!(req.node_hint.as_deref(), Some("host-b"));
    }

    #[test]
    fn request_node_tie_breaks_lexicographically() {
        let h = new_history();
        // Same instant for both -> tie-break on hostname.
        h.mark_assigned(1, "host-z");
        h.mark_release_completed(1, "host-z");
        h.mark_assigned(1, "host-a");
        h.mark_release_completed(1, "host-a");
        // Force identical timestamps by writing directly.
        if let Some(nodes) = h.table.get(&1) {
            let t = nodes.get("host-a").unwrap().last_used_time;
            nodes.get_mut("host-z").unwrap().last_used_time = t;
        }
        let req = h.request_node(1, Resource { memory_mb: 512, cores: 1 }, 1);
        assert_eq!(req.node_hint.as_deref(), Some("host-a"));
    }

    #[test]
    fn request_node_unlocated_when_no_available_node() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        let req = h.request_node(1, Resource { memory_mb: 512, cores: 1 }, 1);
        assert!(req.node_hint.is_none());
    }

    #[test]
    fn release_candidates_prefer_multi_instance_nodes() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        h.mark_assigned(1, "host-b");
        h.mark_assigned(1, "host-b");

        let victims = h.find_nodes_for_release(1, 1);
        assert_eq!(victims.len(), 1);
        assert_eq!(victims[0].hostname, "host-b");
    }

    #[test]
    fn release_candidates_never_include_empty_nodes() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        h.mark_release_completed(1, "host-a");
        let victims = h.find_nodes_for_release(1, 5);
        assert!(victims.is_empty());
    }

    #[test]
    fn short_lived_failure_blacklists_node() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        h.mark_failed(1, "host-a", true);
        let req = h.request_node(1, Resource { memory_mb: 512, cores: 1 }, 1);
        assert!(req.node_hint.is_none());
    }

    #[test]
    fn long_lived_failure_frees_node() {
        let h = new_history();
        h.mark_assigned(1, "host-a");
        h.mark_failed(1, "host-a", false);
        let req = h.request_node(1, Resource { memory_mb: 512, cores: 1 }, 1);
        assert_eq!(req.node_hint.as_deref(), Some("host-a"));
    }
}

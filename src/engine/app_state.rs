//! The reconciler and event sink. Owns every map, invariant, and state
//! transition for a running cluster. All mutating entry points are
//! CPU-bound and synchronous: no I/O, no network, no blocking on external
//! callbacks while the container-map mutex is held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::CompletionStatus;
use crate::config::AmConfig;
use crate::clock::Clock;
use crate::engine::state::{AllocatedContainer, CompletionKind, CompletionResult, Containers, RestartContainer};
use crate::error::{AmError, Result};
use crate::history::RoleHistory;
use crate::operations::{ContainerRequestSpec, Operation};
use crate::priority;
use crate::providers::RoleProvider;
use crate::resource::{self, ContainerMaximum, RecordFactory};
use crate::role::Role;
use crate::role_instance::{ContainerHandle, ContainerId, RoleInstance, RoleInstanceState};
use crate::role_status::RoleStatus;
use crate::spec::{ClusterDescription, ClusterSpec, ClusterState, ContainerView};

const ORD: Ordering = Ordering::SeqCst;

/// Diagnostics surfaced on a fatal teardown trigger.
#[derive(Debug, Clone)]
pub struct TeardownDiagnostics {
    pub role_name: String,
    pub failed: i64,
    pub started: i64,
    pub last_failure_message: Option<String>,
}

pub struct AppState {
    roles_by_id: HashMap<i32, Role>,
    roles_by_name: HashMap<String, i32>,
    role_status: HashMap<i32, Arc<RoleStatus>>,
    containers: Mutex<Containers>,
    description: Mutex<ClusterDescription>,
    history: RoleHistory,
    clock: Arc<dyn Clock>,
    record_factory: Arc<dyn RecordFactory>,
    container_max: ContainerMaximum,
    config: AmConfig,
    surplus_count: AtomicI64,
    unknown_completion_count: AtomicI64,
    am_self_container_id: Mutex<Option<ContainerId>>,
}

impl AppState {
    /// Build phase. Not concurrent-safe; call once, before serving events.
    #[allow(clippy::too_many_arguments)]
    pub fn build_instance(
        cluster_spec: ClusterSpec,
        config: AmConfig,
        provider: &dyn RoleProvider,
        history: RoleHistory,
        clock: Arc<dyn Clock>,
        record_factory: Arc<dyn RecordFactory>,
        container_max: ContainerMaximum,
        restart_containers: Vec<RestartContainer>,
    ) -> Result<Self> {
        let mut roles_by_id = HashMap::new();
        let mut roles_by_name = HashMap::new();

        for provider_role in provider.list_provider_roles() {
            let role_spec = cluster_spec.roles.get(&provider_role.name);
            let resource = resource_spec_from_options(role_spec);
            let role = Role {
                name: provider_role.name.clone(),
                id: provider_role.id,
                placement_policy: provider_role.placement_policy,
                resource,
            };
            insert_role(&mut roles_by_id, &mut roles_by_name, role)?;
        }

        // Dynamic roles: spec-only role names not offered by any provider.
        for (name, role_spec) in cluster_spec.roles.iter() {
            if roles_by_name.contains_key(name) {
                continue;
            }
            let role_id = role_spec
                .option("role_priority")
                .ok_or_else(|| {
                    AmError::Configuration(format!(
                        "dynamic role '{name}' is missing required option 'role_priority'"
                    ))
                })?
                .parse::<i32>()
                .map_err(|_| {
                    AmError::Configuration(format!(
                        "dynamic role '{name}' has an unparsable 'role_priority'"
                    ))
                })?;
            let role = Role {
                name: name.clone(),
                id: role_id,
                placement_policy: role_spec.placement_policy(),
                resource: resource_spec_from_options(Some(role_spec)),
            };
            insert_role(&mut roles_by_id, &mut roles_by_name, role)?;
        }

        priority::validate_role_ids(roles_by_id.keys())?;

        let mut role_status = HashMap::new();
        for role in roles_by_id.values() {
            let status = Arc::new(RoleStatus::new(role.id, role.name.clone()));
            if let Some(role_spec) = cluster_spec.roles.get(&role.name) {
                status.set_desired(role_spec.instances);
                if let Some(v) = role_spec.option("exclude_from_flexing") {
                    status.set_exclude_from_flexing(v.eq_ignore_ascii_case("true"));
                }
            }
            history.register_role(role.id);
            role_status.insert(role.id, status);
        }

        let now = clock.now();
        let mut description = ClusterDescription::new(cluster_spec);
        description.state = ClusterState::Live;
        description.create_time = Some(now);
        description.restart_replay_count = restart_containers.len();

        let mut containers = Containers::default();
        for restart in restart_containers {
            let role_id = *roles_by_name.get(&restart.role_name).ok_or_else(|| {
                AmError::Configuration(format!(
                    "restart replay references unknown role '{}'",
                    restart.role_name
                ))
            })?;
            let status = role_status.get(&role_id).expect("role registered above");

            let mut instance =
                RoleInstance::new(restart.handle.clone(), restart.role_name.clone(), role_id, now);
            instance.state = RoleInstanceState::Live;
            instance.start_time = Some(restart.start_time);

            status.inc_actual();
            status.inc_started();
            history.mark_assigned(role_id, &restart.handle.host);
            history.mark_started(role_id, &restart.handle.host);

            containers
                .live_nodes
                .insert(restart.handle.id.clone(), restart.handle.clone());
            containers.active.insert(instance.container_id.clone(), instance);
        }

        Ok(Self {
            roles_by_id,
            roles_by_name,
            role_status,
            containers: Mutex::new(containers),
            description: Mutex::new(description),
            history,
            clock,
            record_factory,
            container_max,
            config,
            surplus_count: AtomicI64::new(0),
            unknown_completion_count: AtomicI64::new(0),
            am_self_container_id: Mutex::new(None),
        })
    }

    /// Registers the AM's own self-instance: it joins the live-node map so
    /// status readers can see it, but never touches role accounting.
    pub fn build_app_master_node(
        &self,
        container_id: ContainerId,
        host: impl Into<String>,
        am_port: u16,
        http_addr: Option<String>,
    ) {
        let handle = ContainerHandle {
            id: container_id.clone(),
            node_id: container_id.to_string(),
            host: host.into(),
            http_port: http_addr.map(|_| am_port),
        };
        self.containers.lock().live_nodes.insert(container_id.clone(), handle);
        *self.am_self_container_id.lock() = Some(container_id);
    }

    fn role(&self, role_id: i32) -> Result<&Role> {
        self.roles_by_id
            .get(&role_id)
            .ok_or_else(|| AmError::InternalState(format!("unknown role id {role_id}")))
    }

    fn status(&self, role_id: i32) -> Result<&Arc<RoleStatus>> {
        self.role_status
            .get(&role_id)
            .ok_or_else(|| AmError::InternalState(format!("unknown role id {role_id}")))
    }

    // ---- event handlers -------------------------------------------------

    /// Reorders by role history, decodes each container's role from its
    /// priority, and classifies it as an assignment or a surplus release.
    /// Never blocks on external I/O.
    pub fn on_containers_allocated(
        &self,
        allocated: Vec<AllocatedContainer>,
    ) -> Result<(Vec<(ContainerHandle, Role)>, Vec<ContainerId>)> {
        let reordered = self
            .history
            .prepare_allocation_list(allocated, |c: &AllocatedContainer| c.handle.host.as_str());

        let now = self.clock.now();
        let mut assignments = Vec::new();
        let mut releases = Vec::new();

        let mut containers = self.containers.lock();
        for item in reordered {
            let role_id = priority::extract(item.priority)?;
            let role = self.role(role_id)?.clone();
            let status = self.status(role_id)?;

            status.dec_requested();
            status.inc_actual();

            if status.actual() > status.desired() {
                status.dec_actual();
                containers.surplus.insert(item.handle.id.clone());
                self.surplus_count.fetch_add(1, ORD);
                releases.push(item.handle.id.clone());
                continue;
            }

            let instance = RoleInstance::new(item.handle.clone(), role.name.clone(), role_id, now);
            containers.active.insert(instance.container_id.clone(), instance);
            assignments.push((item.handle, role));
        }

        Ok((assignments, releases))
    }

    /// The driver has submitted a start request for a previously-allocated
    /// container: promote it to SUBMITTED and tell role history the node is
    /// now in use for this role.
    pub fn container_start_submitted(&self, container_id: &ContainerId) -> Result<()> {
        let (role_id, host) = {
            let mut containers = self.containers.lock();
            let instance = containers.active.get_mut(container_id).ok_or_else(|| {
                AmError::InternalState(format!("container {container_id} is not active"))
            })?;
            if instance.state != RoleInstanceState::Requested {
                return Err(AmError::InternalState(format!(
                    "container {container_id} is not in the REQUESTED state"
                )));
            }
            instance.state = RoleInstanceState::Submitted;
            containers.starting.insert(container_id.clone());
            (instance.role_id, instance.container.host.clone())
        };
        self.history.mark_assigned(role_id, &host);
        Ok(())
    }

    /// Promotes a container from SUBMITTED to LIVE.
    pub fn on_node_manager_container_started(&self, container_id: &ContainerId) -> Result<RoleInstance> {
        let now = self.clock.now();
        let (role_id, host, instance) = {
            let mut containers = self.containers.lock();
            if !containers.starting.remove(container_id) {
                return Err(AmError::InternalState(format!(
                    "container {container_id} is not in the starting set"
                )));
            }
            let instance = containers.active.get_mut(container_id).ok_or_else(|| {
                AmError::InternalState(format!("container {container_id} is not active"))
            })?;
            instance.state = RoleInstanceState::Live;
            instance.start_time = Some(now);
            let role_id = instance.role_id;
            let host = instance.container.host.clone();
            let snapshot = instance.clone();
            containers
                .live_nodes
                .insert(container_id.clone(), snapshot.container.clone());
            (role_id, host, snapshot)
        };
        self.status(role_id)?.inc_started();
        self.history.mark_started(role_id, &host);
        Ok(instance)
    }

    /// A container crashed before it ever came up.
    pub fn on_node_manager_container_start_failed(
        &self,
        container_id: &ContainerId,
        cause: &str,
    ) -> Result<()> {
        let removed = {
            let mut containers = self.containers.lock();
            containers.starting.remove(container_id);
            containers.active.remove(container_id)
        };
        let Some(mut instance) = removed else {
            self.unknown_completion_count.fetch_add(1, ORD);
            tracing::warn!(%container_id, "start-failed callback for a container not in active");
            return Ok(());
        };

        instance.state = RoleInstanceState::Destroyed;
        instance.diagnostics = Some(cause.to_string());
        let role_id = instance.role_id;
        let host = instance.container.host.clone();

        let status = self.status(role_id)?;
        status.dec_actual();
        status.note_failed(format!("start failed on {host}: {cause}"));
        status.inc_start_failed();

        self.containers.lock().failed.insert(container_id.clone(), instance);
        self.history.mark_failed(role_id, &host, true);
        Ok(())
    }

    /// Records that the driver has asked the cluster manager to release
    /// this container.
    pub fn container_release_submitted(&self, container_id: &ContainerId) -> Result<()> {
        let (role_id, host) = {
            let mut containers = self.containers.lock();
            let instance = containers.active.get_mut(container_id).ok_or_else(|| {
                AmError::InternalState(format!("container {container_id} is not active"))
            })?;
            if instance.released {
                return Err(AmError::InternalState(format!(
                    "container {container_id} has already been released"
                )));
            }
            instance.released = true;
            let role_id = instance.role_id;
            let host = instance.container.host.clone();
            containers.awaiting_release_ack.insert(container_id.clone());
            (role_id, host)
        };
        self.status(role_id)?.inc_releasing();
        self.history.mark_release_submitted(role_id, &host);
        Ok(())
    }

    /// A container has terminated. Classifies the termination as expected
    /// (release ack), surplus, a crash, or unknown, and updates every map
    /// and counter that classification implies.
    pub fn on_completed_node(&self, status: CompletionStatus) -> Result<CompletionResult> {
        let now = self.clock.now();
        let container_id = status.container_id.clone();

        let mut containers = self.containers.lock();
        containers.live_nodes.remove(&container_id);
        containers.starting.remove(&container_id);

        if containers.awaiting_release_ack.remove(&container_id) {
            let mut instance = containers.active.remove(&container_id).ok_or_else(|| {
                AmError::InternalState(format!(
                    "container {container_id} was awaiting release but not active"
                ))
            })?;
            instance.state = RoleInstanceState::Destroyed;
            instance.exit_code = Some(status.exit_code);
            instance.diagnostics = status.diagnostics.clone();
            let role_id = instance.role_id;
            let host = instance.container.host.clone();
            containers.completed.insert(container_id, instance.clone());
            drop(containers);

            let role_status = self.status(role_id)?;
            role_status.dec_releasing();
            role_status.dec_actual();
            role_status.inc_completed();
            self.history.mark_release_completed(role_id, &host);

            return Ok(CompletionResult {
                kind: CompletionKind::Expected,
                instance: Some(instance),
            });
        }

        if containers.surplus.remove(&container_id) {
            drop(containers);
            return Ok(CompletionResult {
                kind: CompletionKind::Surplus,
                instance: None,
            });
        }

        if let Some(mut instance) = containers.active.remove(&container_id) {
            instance.state = RoleInstanceState::Destroyed;
            instance.exit_code = Some(status.exit_code);
            let role_id = instance.role_id;
            let host = instance.container.host.clone();
            let start_time = instance.start_time;

            let message = match &status.diagnostics {
                Some(d) => format!("container on {host} crashed: {d}"),
                None => format!("container on {host} crashed unexpectedly"),
            };
            instance.diagnostics = Some(message.clone());
            containers.failed.insert(container_id, instance.clone());
            drop(containers);

            let short_lived = match start_time {
                Some(t) => (now - t).num_milliseconds() < self.config.container_failure_short_life_millis,
                None => true,
            };

            let role_status = self.status(role_id)?;
            role_status.dec_actual();
            role_status.note_failed(message);
            if short_lived {
                role_status.inc_start_failed();
            }
            self.history.mark_failed(role_id, &host, short_lived);

            return Ok(CompletionResult {
                kind: CompletionKind::Crash,
                instance: Some(instance),
            });
        }

        drop(containers);
        self.unknown_completion_count.fetch_add(1, ORD);
        Ok(CompletionResult {
            kind: CompletionKind::Unknown,
            instance: None,
        })
    }

    // ---- reconciliation ---------------------------------------------------

    fn check_failure_threshold(&self, status: &RoleStatus) -> Result<()> {
        if status.failed() > self.config.container_failure_threshold {
            let snap = status.snapshot();
            return Err(AmError::TriggerTeardown {
                role: snap.role_name,
                failed: snap.failed,
                last_message: snap.last_failure_message.unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// The periodic reconciliation pass: for every non-excluded role,
    /// request or release containers to close the gap against desired
    /// state. Returns the operations a driver must apply. Aborts with a
    /// `TriggerTeardown` error the instant any role exceeds its failure
    /// threshold — fatal to the whole cluster, not just that role.
    pub fn review_request_and_release_nodes(&self) -> Result<Vec<Operation>> {
        let mut ops = Vec::new();

        for role in self.roles_by_id.values() {
            let status = self.status(role.id)?;
            if status.excluded_from_flexing() {
                continue;
            }
            self.check_failure_threshold(status)?;

            let delta = status.delta();
            if delta > 0 {
                for _ in 0..delta {
                    let resource = resource::derive_requirements(
                        &role.resource,
                        self.container_max,
                        self.record_factory.as_ref(),
                    )?;
                    if resource.memory_mb > self.container_max.memory_mb {
                        tracing::warn!(
                            role = %role.name,
                            requested_mb = resource.memory_mb,
                            max_mb = self.container_max.memory_mb,
                            "role requests more memory than the cluster maximum"
                        );
                    }
                    let priority = priority::encode(role.id, true)?;
                    let req: ContainerRequestSpec = self.history.request_node(role.id, resource, priority);
                    status.inc_requested();
                    ops.push(Operation::ContainerRequest(req));
                }
            } else if delta < 0 {
                let victims = self.history.find_nodes_for_release(role.id, (-delta) as usize);
                for victim in victims {
                    let candidate = {
                        let containers = self.containers.lock();
                        containers
                            .active
                            .values()
                            .find(|ri| {
                                ri.role_id == role.id
                                    && ri.container.host == victim.hostname
                                    && !ri.released
                            })
                            .map(|ri| ri.container_id.clone())
                    };
                    let container_id = candidate.ok_or_else(|| {
                        AmError::InternalState(format!(
                            "role history named '{}' as a release candidate for role '{}' but no matching active instance exists",
                            victim.hostname, role.name
                        ))
                    })?;
                    self.container_release_submitted(&container_id)?;
                    ops.push(Operation::ContainerRelease(container_id));
                }
            }
        }

        Ok(ops)
    }

    /// Releases every active, not-yet-released container. Used during
    /// shutdown.
    pub fn release_all_containers(&self) -> Result<Vec<Operation>> {
        let ids: Vec<ContainerId> = {
            let containers = self.containers.lock();
            containers
                .active
                .values()
                .filter(|ri| !ri.released)
                .map(|ri| ri.container_id.clone())
                .collect()
        };
        let mut ops = Vec::with_capacity(ids.len());
        for id in ids {
            self.container_release_submitted(&id)?;
            ops.push(Operation::ContainerRelease(id));
        }
        Ok(ops)
    }

    // ---- status -------------------------------------------------------

    /// Rebuilds the published description from current counters and maps.
    /// Called only by the external status publisher.
    pub fn refresh_cluster_status(&self) {
        let role_statuses: Vec<_> = self.role_status.values().map(|s| s.snapshot()).collect();

        let containers = self.containers.lock();
        let mut role_containers: HashMap<String, Vec<String>> = HashMap::new();
        let mut role_container_views: HashMap<String, HashMap<String, ContainerView>> = HashMap::new();

        for (container_id, handle) in containers.live_nodes.iter() {
            let role_name = containers
                .active
                .get(container_id)
                .map(|ri| ri.role.clone())
                .unwrap_or_else(|| "am-self".to_string());

            role_containers
                .entry(role_name.clone())
                .or_default()
                .push(container_id.to_string());
            role_container_views
                .entry(role_name)
                .or_default()
                .insert(
                    container_id.to_string(),
                    ContainerView {
                        container_id: container_id.to_string(),
                        host: handle.host.clone(),
                        node_id: handle.node_id.clone(),
                        http_port: handle.http_port,
                    },
                );
        }

        let live = containers.live_nodes.len() as i64;
        drop(containers);

        let completed: i64 = role_statuses.iter().map(|r| r.completed).sum();
        let failed: i64 = role_statuses.iter().map(|r| r.failed).sum();
        let started: i64 = role_statuses.iter().map(|r| r.started).sum();
        let start_failed: i64 = role_statuses.iter().map(|r| r.start_failed).sum();

        let mut description = self.description.lock();
        description.role_statuses = role_statuses;
        description.role_containers = role_containers;
        description.role_container_views = role_container_views;
        description.statistics.completed = completed;
        description.statistics.failed = failed;
        description.statistics.live = live;
        description.statistics.started = started;
        description.statistics.start_failed = start_failed;
        description.statistics.surplus = self.surplus_count.load(ORD);
        description.statistics.unknown_completed = self.unknown_completion_count.load(ORD);
    }

    /// A deep-copied, internally-consistent snapshot for readers.
    pub fn cluster_description(&self) -> ClusterDescription {
        self.description.lock().clone()
    }

    pub fn teardown_diagnostics(&self, role_id: i32) -> Result<TeardownDiagnostics> {
        let snap = self.status(role_id)?.snapshot();
        Ok(TeardownDiagnostics {
            role_name: snap.role_name,
            failed: snap.failed,
            started: snap.started,
            last_failure_message: snap.last_failure_message,
        })
    }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles_by_name.get(name).and_then(|id| self.roles_by_id.get(id))
    }

    /// Public snapshot of a single role's counters, for callers outside this
    /// module (status publishers, tests) that don't need the `RoleStatus`
    /// handle itself.
    pub fn role_status_snapshot(&self, role_id: i32) -> Result<crate::role_status::RoleStatusSnapshot> {
        Ok(self.status(role_id)?.snapshot())
    }

    pub fn set_desired(&self, role_id: i32, desired: i64) -> Result<()> {
        self.status(role_id)?.set_desired(desired);
        Ok(())
    }

    /// Excludes (or re-includes) a role from the review pass. An excluded
    /// role's `delta` is never computed and no requests or releases are
    /// ever emitted for it, per spec.md §3's `exclude_from_flexing` flag.
    pub fn set_exclude_from_flexing(&self, role_id: i32, excluded: bool) -> Result<()> {
        self.status(role_id)?.set_exclude_from_flexing(excluded);
        Ok(())
    }
}

fn insert_role(
    roles_by_id: &mut HashMap<i32, Role>,
    roles_by_name: &mut HashMap<String, i32>,
    role: Role,
) -> Result<()> {
    if roles_by_id.contains_key(&role.id) {
        return Err(AmError::Configuration(format!(
            "duplicate role id {} (role '{}')",
            role.id, role.name
        )));
    }
    roles_by_name.insert(role.name.clone(), role.id);
    roles_by_id.insert(role.id, role);
    Ok(())
}

fn resource_spec_from_options(role_spec: Option<&crate::spec::RoleSpec>) -> crate::role::ResourceSpec {
    let mut spec = crate::role::ResourceSpec::default();
    if let Some(rs) = role_spec {
        if let Some(v) = rs.option("yarn_memory") {
            spec.yarn_memory = v.to_string();
        }
        if let Some(v) = rs.option("yarn_cores") {
            spec.yarn_cores = v.to_string();
        }
        if let Some(v) = rs.option("jvm_heap") {
            spec.jvm_heap = Some(v.to_string());
        }
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::persistence::NullHistoryStore;
    use crate::resource::DefaultRecordFactory;
    use crate::role::{PlacementPolicy, ProviderRole};
    use crate::spec::RoleSpec;
    use std::collections::HashMap as Map;

    struct TwoRoleProvider;
    impl RoleProvider for TwoRoleProvider {
        fn list_provider_roles(&self) -> Vec<ProviderRole> {
            vec![
                ProviderRole {
                    name: "A".into(),
                    id: 1,
                    placement_policy: PlacementPolicy::Default,
                },
                ProviderRole {
                    name: "B".into(),
                    id: 2,
                    placement_policy: PlacementPolicy::Default,
                },
            ]
        }
    }

    fn build(desired_a: i64, desired_b: i64) -> AppState {
        let mut roles = Map::new();
        roles.insert(
            "A".to_string(),
            RoleSpec {
                instances: desired_a,
                options: Map::new(),
            },
        );
        roles.insert(
            "B".to_string(),
            RoleSpec {
                instances: desired_b,
                options: Map::new(),
            },
        );
        let spec = ClusterSpec {
            name: "test".into(),
            roles,
        };
        let history = RoleHistory::new(Arc::new(NullHistoryStore), Arc::new(crate::clock::SystemClock)).unwrap();
        AppState::build_instance(
            spec,
            AmConfig::default(),
            &TwoRoleProvider,
            history,
            Arc::new(crate::clock::SystemClock),
            Arc::new(DefaultRecordFactory),
            ContainerMaximum {
                memory_mb: 8192,
                cores: 8,
            },
            Vec::new(),
        )
        .unwrap()
    }

    fn handle(id: &str, host: &str) -> ContainerHandle {
        ContainerHandle {
            id: ContainerId::from(id),
            node_id: host.to_string(),
            host: host.to_string(),
            http_port: None,
        }
    }

    #[test]
    fn unknown_completion_is_counted_not_fatal() {
        let app = build(0, 0);
        let result = app
            .on_completed_node(CompletionStatus {
                container_id: ContainerId::from("ghost"),
                host: "host-x".into(),
                exit_code: 1,
                diagnostics: None,
            })
            .unwrap();
        assert_eq!(result.kind, CompletionKind::Unknown);
        app.refresh_cluster_status();
        assert_eq!(app.cluster_description().statistics.unknown_completed, 1);
    }

    #[test]
    fn double_release_is_internal_state_error() {
        let app = build(1, 0);
        app.on_containers_allocated(vec![AllocatedContainer {
            handle: handle("c1", "host-a"),
            priority: 1,
        }])
        .unwrap();
        let id = ContainerId::from("c1");
        app.container_release_submitted(&id).unwrap();
        assert!(app.container_release_submitted(&id).is_err());
    }

    #[test]
    fn progress_is_100_with_zero_desired_everywhere() {
        let app = build(0, 0);
        app.refresh_cluster_status();
        assert_eq!(app.cluster_description().progress_percent(), 100);
    }

    #[test]
    fn review_pass_errors_when_release_candidate_has_no_active_instance() {
        let app = build(0, 0);
        // Desync role status from the container map directly: history
        // believes "host-x" is running role A, but no such instance exists
        // in `containers.active`. This mirrors the spec's stated error
        // condition in review_request_and_release_nodes's release branch.
        app.status(1).unwrap().inc_actual();
        app.history.mark_assigned(1, "host-x");

        let result = app.review_request_and_release_nodes();
        assert!(matches!(result, Err(AmError::InternalState(_))));
    }

    #[test]
    fn excluded_role_is_skipped_by_review_pass() {
        let app = build(1, 0);
        app.set_exclude_from_flexing(1, true).unwrap();
        let ops = app.review_request_and_release_nodes().unwrap();
        assert!(ops.is_empty());
    }
}

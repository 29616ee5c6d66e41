//! Black-box reconciliation scenarios, exercised through `AppState`'s public
//! API only (no access to its internal maps).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use am_engine::client::CompletionStatus;
use am_engine::clock::{Clock, FixedClock, SystemClock};
use am_engine::config::AmConfig;
use am_engine::engine::{AllocatedContainer, CompletionKind, RestartContainer};
use am_engine::engine::AppState;
use am_engine::error::AmError;
use am_engine::history::{NullHistoryStore, RoleHistory};
use am_engine::operations::Operation;
use am_engine::providers::RoleProvider;
use am_engine::resource::{ContainerMaximum, DefaultRecordFactory};
use am_engine::role::{PlacementPolicy, ProviderRole};
use am_engine::role_instance::{ContainerHandle, ContainerId};
use am_engine::spec::{ClusterSpec, RoleSpec};

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

fn handle(id: &str, host: &str) -> ContainerHandle {
    ContainerHandle {
        id: ContainerId::from(id),
        node_id: host.to_string(),
        host: host.to_string(),
        http_port: None,
    }
}

fn single_role_spec(name: &str, instances: i64) -> ClusterSpec {
    let mut roles = HashMap::new();
    roles.insert(
        name.to_string(),
        RoleSpec {
            instances,
            options: HashMap::new(),
        },
    );
    ClusterSpec {
        name: "test".into(),
        roles,
    }
}

fn two_role_spec(desired_a: i64, desired_b: i64) -> ClusterSpec {
    let mut roles = HashMap::new();
    roles.insert(
        "A".to_string(),
        RoleSpec {
            instances: desired_a,
            options: HashMap::new(),
        },
    );
    roles.insert(
        "B".to_string(),
        RoleSpec {
            instances: desired_b,
            options: HashMap::new(),
        },
    );
    ClusterSpec {
        name: "test".into(),
        roles,
    }
}

fn build(desired_a: i64, desired_b: i64) -> AppState {
    let history = RoleHistory::new(Arc::new(NullHistoryStore), Arc::new(SystemClock)).unwrap();
    AppState::build_instance(
        two_role_spec(desired_a, desired_b),
        AmConfig::default(),
        &TwoRoleProvider,
        history,
        Arc::new(SystemClock),
        Arc::new(DefaultRecordFactory),
        ContainerMaximum {
            memory_mb: 8192,
            cores: 8,
        },
        Vec::new(),
    )
    .unwrap()
}

/// Scenario 1: a cluster with unmet desired state asks for exactly the
/// shortfall on its first review pass, then goes quiet once satisfied.
#[test]
fn steady_state_scale_up_requests_the_shortfall_then_stops() {
    let app = build(2, 1);
    let ops = app.review_request_and_release_nodes().unwrap();
    assert_eq!(ops.len(), 3);
    let second = app.review_request_and_release_nodes().unwrap();
    assert!(second.is_empty());
}

/// Scenario 2: an allocation batch larger than the outstanding request is
/// split into an assignment and an immediate release, and the surplus
/// counter reflects it right away.
#[test]
fn over_allocation_is_split_into_assignment_and_surplus_release() {
    let app = build(1, 0);
    app.review_request_and_release_nodes().unwrap();
    let allocated = vec![
        AllocatedContainer {
            handle: handle("c1", "host-a"),
            priority: 1,
        },
        AllocatedContainer {
            handle: handle("c2", "host-b"),
            priority: 1,
        },
    ];
    let (assignments, releases) = app.on_containers_allocated(allocated).unwrap();
    assert_eq!(assignments.len(), 1);
    assert_eq!(releases.len(), 1);
    assert_eq!(app.role_status_snapshot(1).unwrap().actual, 1);
    app.refresh_cluster_status();
    assert_eq!(app.cluster_description().statistics.surplus, 1);
}

/// Scenario 3: a container that crashes shortly after starting is recorded
/// as both a failure and a start failure, distinct from a long-lived crash.
#[test]
fn short_lived_crash_counts_as_failed_and_start_failed() {
    let clock = Arc::new(FixedClock::new(Utc::now()));
    let history = RoleHistory::new(Arc::new(NullHistoryStore), clock.clone() as Arc<dyn Clock>).unwrap();
    let app = AppState::build_instance(
        single_role_spec("A", 1),
        AmConfig {
            container_failure_threshold: 10,
            container_failure_short_life_millis: 60_000,
        },
        &TwoRoleProvider,
        history,
        clock.clone() as Arc<dyn Clock>,
        Arc::new(DefaultRecordFactory),
        ContainerMaximum {
            memory_mb: 8192,
            cores: 8,
        },
        Vec::new(),
    )
    .unwrap();

    app.on_containers_allocated(vec![AllocatedContainer {
        handle: handle("c1", "host-a"),
        priority: 1,
    }])
    .unwrap();
    app.container_start_submitted(&ContainerId::from("c1")).unwrap();
    app.on_node_manager_container_started(&ContainerId::from("c1"))
        .unwrap();

    clock.advance(5_000);

    let result = app
        .on_completed_node(CompletionStatus {
            container_id: ContainerId::from("c1"),
            host: "host-a".into(),
            exit_code: 1,
            diagnostics: Some("oom".into()),
        })
        .unwrap();
    assert_eq!(result.kind, CompletionKind::Crash);
    let status = app.role_status_snapshot(1).unwrap();
    assert_eq!(status.failed, 1);
    assert_eq!(status.start_failed, 1);
}

/// Scenario 4: shrinking desired state releases a running container, and its
/// completion is classified as expected, not a crash.
#[test]
fn scaling_down_releases_a_running_container_cleanly() {
    let app = build(2, 0);
    app.review_request_and_release_nodes().unwrap();
    let allocated = vec![
        AllocatedContainer {
            handle: handle("c1", "host-a"),
            priority: 1,
        },
        AllocatedContainer {
            handle: handle("c2", "host-b"),
            priority: 1,
        },
    ];
    app.on_containers_allocated(allocated).unwrap();
    app.container_start_submitted(&ContainerId::from("c1")).unwrap();
    app.container_start_submitted(&ContainerId::from("c2")).unwrap();
    app.on_node_manager_container_started(&ContainerId::from("c1"))
        .unwrap();
    app.on_node_manager_container_started(&ContainerId::from("c2"))
        .unwrap();

    app.set_desired(1, 1).unwrap();
    let ops = app.review_request_and_release_nodes().unwrap();
    let releases: Vec<_> = ops
        .iter()
        .filter(|o| matches!(o, Operation::ContainerRelease(_)))
        .collect();
    assert_eq!(releases.len(), 1);
    assert_eq!(app.role_status_snapshot(1).unwrap().releasing, 1);

    let released_id = match releases[0] {
        Operation::ContainerRelease(id) => id.clone(),
        _ => unreachable!(),
    };
    let result = app
        .on_completed_node(CompletionStatus {
            container_id: released_id,
            host: "host-a".into(),
            exit_code: 0,
            diagnostics: None,
        })
        .unwrap();
    assert_eq!(result.kind, CompletionKind::Expected);
    let status = app.role_status_snapshot(1).unwrap();
    assert_eq!(status.releasing, 0);
    assert_eq!(status.actual, 1);
    assert_eq!(status.completed, 1);
    assert_eq!(status.failed, 0);
}

/// Scenario 5: a role that crosses its failure threshold triggers teardown
/// on the next review pass, aborting before any further requests go out.
#[test]
fn crossing_the_failure_threshold_triggers_teardown() {
    let history = RoleHistory::new(Arc::new(NullHistoryStore), Arc::new(SystemClock)).unwrap();
    let app = AppState::build_instance(
        single_role_spec("A", 1),
        AmConfig {
            container_failure_threshold: 3,
            container_failure_short_life_millis: 60_000,
        },
        &TwoRoleProvider,
        history,
        Arc::new(SystemClock),
        Arc::new(DefaultRecordFactory),
        ContainerMaximum {
            memory_mb: 8192,
            cores: 8,
        },
        Vec::new(),
    )
    .unwrap();

    for i in 0..4 {
        let cid = ContainerId::from(format!("c{i}"));
        app.on_containers_allocated(vec![AllocatedContainer {
            handle: handle(&cid.0, "host-a"),
            priority: 1,
        }])
        .unwrap();
        app.container_start_submitted(&cid).unwrap();
        app.on_node_manager_container_started(&cid).unwrap();
        app.on_completed_node(CompletionStatus {
            container_id: cid,
            host: "host-a".into(),
            exit_code: 1,
            diagnostics: Some("boom".into()),
        })
        .unwrap();
    }

    assert_eq!(app.role_status_snapshot(1).unwrap().failed, 4);
    let result = app.review_request_and_release_nodes();
    assert!(matches!(result, Err(AmError::TriggerTeardown { .. })));
}

/// Scenario 6: an Application Master restart replays already-running
/// containers straight into live state without re-requesting them.
#[test]
fn am_restart_replays_running_containers_as_already_live() {
    let history = RoleHistory::new(Arc::new(NullHistoryStore), Arc::new(SystemClock)).unwrap();
    let now = Utc::now();
    let restarts = vec![
        RestartContainer {
            handle: handle("c1", "host-a"),
            role_name: "A".into(),
            start_time: now,
        },
        RestartContainer {
            handle: handle("c2", "host-b"),
            role_name: "B".into(),
            start_time: now,
        },
    ];
    let app = AppState::build_instance(
        two_role_spec(1, 1),
        AmConfig::default(),
        &TwoRoleProvider,
        history,
        Arc::new(SystemClock),
        Arc::new(DefaultRecordFactory),
        ContainerMaximum {
            memory_mb: 8192,
            cores: 8,
        },
        restarts,
    )
    .unwrap();

    assert_eq!(app.role_status_snapshot(1).unwrap().actual, 1);
    assert_eq!(app.role_status_snapshot(2).unwrap().actual, 1);
    app.refresh_cluster_status();
    assert_eq!(app.cluster_description().restart_replay_count, 2);
}

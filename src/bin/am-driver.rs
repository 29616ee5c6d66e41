//! Thin driver binary: wires `AppState` to a periodic review loop against a
//! null cluster-manager client. Demonstrates the responsibility split
//! between the driver (I/O and operation dispatch) and the engine (pure
//! reconciliation) — it is not a production submission client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use am_engine::client::{apply_operations, NullClusterManagerClient};
use am_engine::clock::SystemClock;
use am_engine::config::AmConfig;
use am_engine::engine::AppState;
use am_engine::history::{JsonFileHistoryStore, RoleHistory};
use am_engine::providers::EmptyProvider;
use am_engine::resource::{ContainerMaximum, DefaultRecordFactory};
use am_engine::spec::{ClusterSpec, RoleSpec};
use am_engine::status::{LoggingStatusPublisher, StatusPublisher};
use am_engine::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut roles = HashMap::new();
    roles.insert(
        "worker".to_string(),
        RoleSpec {
            instances: 2,
            options: HashMap::from([("role_priority".to_string(), "1".to_string())]),
        },
    );
    let spec = ClusterSpec {
        name: "demo-cluster".to_string(),
        roles,
    };

    let history_dir = std::env::temp_dir().join("am-driver-history");
    let history = RoleHistory::new(
        Arc::new(JsonFileHistoryStore::new(&history_dir)?),
        Arc::new(SystemClock),
    )?;

    let app = Arc::new(AppState::build_instance(
        spec,
        AmConfig::default(),
        &EmptyProvider,
        history,
        Arc::new(SystemClock),
        Arc::new(DefaultRecordFactory),
        ContainerMaximum {
            memory_mb: 4096,
            cores: 4,
        },
        Vec::new(),
    )?);

    let client = NullClusterManagerClient;
    let publisher = LoggingStatusPublisher;

    let mut ticks = tokio::time::interval(Duration::from_secs(5));
    for _ in 0..3 {
        ticks.tick().await;
        match app.review_request_and_release_nodes() {
            Ok(ops) => {
                tracing::info!(count = ops.len(), "review pass emitted operations");
                apply_operations(&client, &ops);
            }
            Err(e) => {
                tracing::error!(error = %e, "cluster teardown triggered");
                break;
            }
        }
        app.refresh_cluster_status();
        publisher.publish(&app.cluster_description());
    }

    let shutdown_ops = app.release_all_containers()?;
    tracing::info!(count = shutdown_ops.len(), "releasing all containers for shutdown");
    apply_operations(&client, &shutdown_ops);

    Ok(())
}

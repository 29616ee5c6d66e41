//! Status publisher interface. An HTTP status UI lives outside this crate;
//! the engine only needs somewhere to hand a snapshot to.

use crate::spec::ClusterDescription;

pub trait StatusPublisher: Send + Sync {
    fn publish(&self, description: &ClusterDescription);
}

/// Logs a one-line summary at info level. The only concrete publisher this
/// crate ships, since the web UI is explicitly out of scope.
#[derive(Default)]
pub struct LoggingStatusPublisher;

impl StatusPublisher for LoggingStatusPublisher {
    fn publish(&self, description: &ClusterDescription) {
        tracing::info!(
            state = ?description.state,
            progress = description.progress_percent(),
            completed = description.statistics.completed,
            failed = description.statistics.failed,
            live = description.statistics.live,
            "cluster status"
        );
    }
}

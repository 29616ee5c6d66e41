use thiserror::Error;

/// Crate-wide error type for the Application Master engine.
///
/// Variants map onto the error taxonomy of the engine's design: configuration
/// errors are fatal at build time, internal-state errors are fatal to the
/// offending call but not to the engine, and teardown triggers are fatal to
/// the whole application. Unknown-event and surplus outcomes are *not*
/// represented here — they are non-fatal and are tracked as counters on
/// `EngineState` instead.
#[derive(Error, Debug, Clone)]
pub enum AmError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal state error: {0}")]
    InternalState(String),

    #[error(
        "cluster teardown triggered: role '{role}' failed {failed} times (last: {last_message})"
    )]
    TriggerTeardown {
        role: String,
        failed: i64,
        last_message: String,
    },

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, AmError>;

impl From<std::io::Error> for AmError {
    fn from(e: std::io::Error) -> Self {
        AmError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AmError {
    fn from(e: serde_json::Error) -> Self {
        AmError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for AmError {
    fn from(e: serde_yaml::Error) -> Self {
        AmError::Serialization(e.to_string())
    }
}

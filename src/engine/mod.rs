//! The AppState engine: reconciler and event sink.

pub mod app_state;
pub mod state;

pub use app_state::{AppState, TeardownDiagnostics};
pub use state::{AllocatedContainer, CompletionKind, CompletionResult, Containers, RestartContainer};

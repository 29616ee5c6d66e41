//! Provider plug-in interface (e.g. Flume, Tomcat). Internals out of scope;
//! only the interface the engine consumes is named here.

use crate::role::ProviderRole;

pub trait RoleProvider: Send + Sync {
    /// Roles this provider offers, independent of what the user's spec asks
    /// for. Additional roles may still appear dynamically in the spec.
    fn list_provider_roles(&self) -> Vec<ProviderRole>;
}

/// A provider with no fixed roles of its own; every role in such a
/// deployment is dynamic (spec-only).
#[derive(Default)]
pub struct EmptyProvider;

impl RoleProvider for EmptyProvider {
    fn list_provider_roles(&self) -> Vec<ProviderRole> {
        Vec::new()
    }
}

//! Record Factory: abstracts cluster-manager record types for resource
//! requests, and derives a role's concrete resource requirement.

use serde::{Deserialize, Serialize};

use crate::role::ResourceSpec;

/// A concrete (memory, cores) resource requirement, resolved from a role's
/// `ResourceSpec` against the cluster-reported maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub memory_mb: i32,
    pub cores: i32,
}

/// The cluster-reported container maximum, substituted for the literal
/// string `"max"` in a role's resource spec.
#[derive(Debug, Clone, Copy)]
pub struct ContainerMaximum {
    pub memory_mb: i32,
    pub cores: i32,
}

/// Abstracts construction of cluster-manager-specific request/capability
/// records. The engine only ever goes through this trait so that swapping
/// cluster managers does not touch reconciliation logic.
pub trait RecordFactory: Send + Sync {
    fn make_resource(&self, memory_mb: i32, cores: i32) -> Resource {
        Resource { memory_mb, cores }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRecordFactory;

impl RecordFactory for DefaultRecordFactory {}

/// Interprets the literal `"max"` as the cluster-reported container maximum;
/// otherwise parses the field as a plain integer. A non-integer, non-`"max"`
/// value is a configuration error.
pub fn derive_requirements(
    spec: &ResourceSpec,
    max: ContainerMaximum,
    factory: &dyn RecordFactory,
) -> crate::error::Result<Resource> {
    let memory_mb = resolve_field(&spec.yarn_memory, max.memory_mb)?;
    let cores = resolve_field(&spec.yarn_cores, max.cores)?;
    Ok(factory.make_resource(memory_mb, cores))
}

fn resolve_field(raw: &str, max: i32) -> crate::error::Result<i32> {
    if raw.eq_ignore_ascii_case("max") {
        return Ok(max);
    }
    raw.parse::<i32>().map_err(|_| {
        crate::error::AmError::Configuration(format!("invalid resource value '{raw}'"))
    })
}

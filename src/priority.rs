//! Container priority codec.
//!
//! Packs a role id into the priority field of a container request so that an
//! allocated container carries its role back to the engine without a
//! round-trip lookup. The packing is the identity function on the role id:
//! role ids are validated unique and in `[1, i32::MAX]` at engine build
//! time (a configuration error otherwise), so the priority field itself is
//! already a collision-free key. The `unique` parameter is accepted for call
//! site symmetry with systems that pack a disambiguator alongside the role
//! id, but does not change the packed value here: a second packing scheme
//! would be redundant when the role id alone already disambiguates.

use crate::error::{AmError, Result};

/// Highest role id representable as a container-request priority.
pub const MAX_ROLE_ID: i32 = i32::MAX;

pub fn encode(role_id: i32, _unique: bool) -> Result<i32> {
    if role_id < 1 {
        return Err(AmError::Configuration(format!(
            "role id {role_id} out of range: must be >= 1"
        )));
    }
    Ok(role_id)
}

pub fn extract(priority: i32) -> Result<i32> {
    if priority < 1 {
        return Err(AmError::InternalState(format!(
            "priority {priority} does not decode to a valid role id"
        )));
    }
    Ok(priority)
}

/// Validates that a set of role ids contains no duplicates and all fit the
/// priority range, raising a configuration error at build time otherwise.
pub fn validate_role_ids<'a>(ids: impl Iterator<Item = &'a i32>) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for &id in ids {
        if id < 1 {
            return Err(AmError::Configuration(format!(
                "role id {id} out of range: must be >= 1"
            )));
        }
        if !seen.insert(id) {
            return Err(AmError::Configuration(format!(
                "duplicate role id {id}"
            )));
        }
    }
    Ok(())
}

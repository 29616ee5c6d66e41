//! Durable storage for role history.
//!
//! The contract is: idempotent reload, and storage bounded by distinct
//! `(node, role)` pairs. A single rewritten JSON snapshot satisfies both
//! without a WAL or segment format; the on-disk layout is an implementation
//! detail callers never need to parse themselves.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::Result;
use crate::history::node_instance::NodeInstance;

pub trait RoleHistoryStore: Send + Sync {
    fn load(&self) -> Result<Vec<NodeInstance>>;
    fn save(&self, entries: &[NodeInstance]) -> Result<()>;
}

/// Snapshot-file-backed store. Bounded by `distinct(node, role)` because the
/// whole file is exactly the current entry set, no history of history.
pub struct JsonFileHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileHistoryStore {
    pub fn new(history_dir: impl AsRef<Path>) -> Result<Self> {
        let dir = history_dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join("role-history.json"),
            write_lock: Mutex::new(()),
        })
    }
}

impl RoleHistoryStore for JsonFileHistoryStore {
    fn load(&self) -> Result<Vec<NodeInstance>> {
        let _guard = self.write_lock.lock();
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn save(&self, entries: &[NodeInstance]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let data = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// No-op store for engines that do not need persistence across restarts
/// (tests, or ephemeral deployments).
#[derive(Default)]
pub struct NullHistoryStore;

impl RoleHistoryStore for NullHistoryStore {
    fn load(&self) -> Result<Vec<NodeInstance>> {
        Ok(Vec::new())
    }

    fn save(&self, _entries: &[NodeInstance]) -> Result<()> {
        Ok(())
    }
}

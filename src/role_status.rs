//! Per-role accounting counters.
//!
//! Purely arithmetic: no knowledge of containers, history, or the cluster
//! manager. Counters are atomics so the review pass's threshold check can
//! read them without taking the engine mutex; `last_failure_message` is a
//! `String` and sits behind its own small lock since it cannot be atomic.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use parking_lot::Mutex;
use serde::Serialize;

const ORD: Ordering = Ordering::SeqCst;

#[derive(Debug)]
pub struct RoleStatus {
    pub role_id: i32,
    pub role_name: String,
    desired: AtomicI64,
    requested: AtomicI64,
    actual: AtomicI64,
    releasing: AtomicI64,
    started: AtomicI64,
    failed: AtomicI64,
    start_failed: AtomicI64,
    completed: AtomicI64,
    last_failure_message: Mutex<Option<String>>,
    exclude_from_flexing: AtomicBool,
}

/// Stable, plain-data view of a `RoleStatus` for publication.
#[derive(Debug, Clone, Serialize)]
pub struct RoleStatusSnapshot {
    pub role_id: i32,
    pub role_name: String,
    pub desired: i64,
    pub requested: i64,
    pub actual: i64,
    pub releasing: i64,
    pub started: i64,
    pub failed: i64,
    pub start_failed: i64,
    pub completed: i64,
    pub last_failure_message: Option<String>,
    pub delta: i64,
}

impl RoleStatus {
    pub fn new(role_id: i32, role_name: impl Into<String>) -> Self {
        Self {
            role_id,
            role_name: role_name.into(),
            desired: AtomicI64::new(0),
            requested: AtomicI64::new(0),
            actual: AtomicI64::new(0),
            releasing: AtomicI64::new(0),
            started: AtomicI64::new(0),
            failed: AtomicI64::new(0),
            start_failed: AtomicI64::new(0),
            completed: AtomicI64::new(0),
            last_failure_message: Mutex::new(None),
            exclude_from_flexing: AtomicBool::new(false),
        }
    }

    pub fn set_desired(&self, v: i64) {
        self.desired.store(v, ORD);
    }

    pub fn desired(&self) -> i64 {
        self.desired.load(ORD)
    }

    pub fn requested(&self) -> i64 {
        self.requested.load(ORD)
    }

    pub fn actual(&self) -> i64 {
        self.actual.load(ORD)
    }

    pub fn releasing(&self) -> i64 {
        self.releasing.load(ORD)
    }

    pub fn failed(&self) -> i64 {
        self.failed.load(ORD)
    }

    pub fn started(&self) -> i64 {
        self.started.load(ORD)
    }

    pub fn completed(&self) -> i64 {
        self.completed.load(ORD)
    }

    pub fn start_failed(&self) -> i64 {
        self.start_failed.load(ORD)
    }

    pub fn inc_requested(&self) {
        self.requested.fetch_add(1, ORD);
    }

    pub fn dec_requested(&self) {
        self.requested.fetch_sub(1, ORD);
    }

    pub fn inc_actual(&self) {
        self.actual.fetch_add(1, ORD);
    }

    pub fn dec_actual(&self) {
        self.actual.fetch_sub(1, ORD);
    }

    pub fn inc_releasing(&self) {
        self.releasing.fetch_add(1, ORD);
    }

    pub fn dec_releasing(&self) {
        self.releasing.fetch_sub(1, ORD);
    }

    pub fn inc_started(&self) {
        self.started.fetch_add(1, ORD);
    }

    pub fn inc_completed(&self) {
        self.completed.fetch_add(1, ORD);
    }

    pub fn inc_start_failed(&self) {
        self.start_failed.fetch_add(1, ORD);
    }

    /// Records a failure and its diagnostic message. Does not distinguish
    /// short- vs long-lived; callers increment `start_failed` separately.
    pub fn note_failed(&self, message: impl Into<String>) {
        self.failed.fetch_add(1, ORD);
        *self.last_failure_message.lock() = Some(message.into());
    }

    pub fn set_exclude_from_flexing(&self, v: bool) {
        self.exclude_from_flexing.store(v, ORD);
    }

    pub fn excluded_from_flexing(&self) -> bool {
        self.exclude_from_flexing.load(ORD)
    }

    /// `desired - (actual + requested - releasing)`: positive means request
    /// more, negative means release surplus, zero means steady state.
    pub fn delta(&self) -> i64 {
        self.desired() - (self.actual() + self.requested() - self.releasing())
    }

    pub fn snapshot(&self) -> RoleStatusSnapshot {
        RoleStatusSnapshot {
            role_id: self.role_id,
            role_name: self.role_name.clone(),
            desired: self.desired(),
            requested: self.requested(),
            actual: self.actual(),
            releasing: self.releasing(),
            started: self.started(),
            failed: self.failed(),
            start_failed: self.start_failed(),
            completed: self.completed(),
            last_failure_message: self.last_failure_message.lock().clone(),
            delta: self.delta(),
        }
    }
}

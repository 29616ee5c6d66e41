use chrono::{DateTime, Utc};

/// Injectable source of "now", so engine tests can control time without
/// sleeping. Production code uses `SystemClock`; tests use a fixed or
/// steppable fake.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only advances when told to. Not behind `#[cfg(test)]` so
/// that integration tests in `tests/`, which link this crate as an external
/// dependency, can use it too.
pub struct FixedClock(pub parking_lot::Mutex<DateTime<Utc>>);

impl FixedClock {
    pub fn new(t: DateTime<Utc>) -> Self {
        Self(parking_lot::Mutex::new(t))
    }

    pub fn advance(&self, millis: i64) {
        let mut guard = self.0.lock();
        *guard = *guard + chrono::Duration::milliseconds(millis);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock()
    }
}

//! Shared fixtures for unit tests.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use mockable::Clock;
use tempfile::TempDir;

use crate::storage::Database;

/// Open a fresh database in a temporary directory.
///
/// The directory is deleted when the returned guard drops.
pub fn create_test_database() -> (TempDir, Database) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let db = Database::open(dir.path().join("rental.db")).expect("failed to open test database");
    (dir, db)
}

/// A fixed instant rentals start from in tests.
pub fn fixture_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 24, 10, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        *self.0.lock().expect("clock mutex") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.0.lock().expect("clock mutex")
    }
}

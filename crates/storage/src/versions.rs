//! Versioned diagram storage with bounded retention.
//!
//! Every save writes an immutable [`VersionRecord`] under
//! `{namespace}-states-{applicationName}-{timestamp}` and then trims the
//! application's history to the newest `retention` records. Timestamps are
//! unix nanoseconds, zero-padded to 20 digits so that key order matches
//! time order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use statecase_core::StateDiagram;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::record::{SaveOutcome, TrimFailure, VersionRecord};
use crate::traits::Store;

pub const DEFAULT_NAMESPACE: &str = "statecase";
pub const DEFAULT_RETENTION: usize = 3;

/// Source of save timestamps.
pub trait Clock: Send + Sync {
    /// Current unix time in nanoseconds.
    fn now_nanos(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_nanos(&self) -> u64 {
        u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos()).unwrap_or(0)
    }
}

/// Retention-bounded history of diagram versions per application.
pub struct VersionStore<S> {
    store: S,
    namespace: String,
    retention: usize,
    clock: Box<dyn Clock>,
    last_timestamp: Mutex<u64>,
    app_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Store> VersionStore<S> {
    pub fn new(store: S) -> Self {
        VersionStore {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            retention: DEFAULT_RETENTION,
            clock: Box::new(SystemClock),
            last_timestamp: Mutex::new(0),
            app_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Number of versions kept per application. Values below 1 are raised
    /// to 1 so a save can never evict itself.
    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention.max(1);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Key prefix shared by every record of `application_name`.
    pub fn key_prefix(&self, application_name: &str) -> String {
        format!("{}-states-{}-", self.namespace, application_name)
    }

    pub fn record_key(&self, application_name: &str, timestamp: u64) -> String {
        format!("{}{:020}", self.key_prefix(application_name), timestamp)
    }

    // ── Writes ──────────────────────────────────────────────────────────

    /// Persist `diagram` as a new version, then trim old versions.
    ///
    /// Save and trim run under a per-application lock, both in process and
    /// through [`Store::lock_exclusive`] for backends shared between
    /// processes. A failed write is an error; failed evictions are logged
    /// and reported in the outcome but do not undo the save.
    pub fn save(&self, diagram: &StateDiagram) -> Result<SaveOutcome, StoreError> {
        let app = diagram.application_name.as_str();
        let app_lock = self.app_lock(app)?;
        let result = self.save_locked(diagram, &app_lock);
        self.release_app_lock(app, app_lock);
        result
    }

    fn save_locked(
        &self,
        diagram: &StateDiagram,
        app_lock: &Mutex<()>,
    ) -> Result<SaveOutcome, StoreError> {
        let app = diagram.application_name.as_str();
        let _guard = app_lock
            .lock()
            .map_err(|_| StoreError::Backend(format!("version lock for '{}' poisoned", app)))?;
        let _store_lock = self.store.lock_exclusive(&self.key_prefix(app))?;

        let newest_existing = self.timestamped_keys(app)?.first().map(|(ts, _)| *ts);
        let timestamp = self.next_timestamp(newest_existing)?;

        let record = VersionRecord::new(diagram.clone(), timestamp)?;
        let key = self.record_key(app, timestamp);
        let payload = serde_json::to_string(&record)?;
        self.store.set(&key, &payload)?;
        debug!(
            application = app,
            key = %key,
            hash = %record.content_hash,
            "saved diagram version"
        );

        let (evicted, trim_failures) = self.trim(app);

        Ok(SaveOutcome {
            key,
            timestamp,
            evicted,
            trim_failures,
        })
    }

    fn trim(&self, app: &str) -> (Vec<String>, Vec<TrimFailure>) {
        let mut evicted = Vec::new();
        let mut failures = Vec::new();

        let keys = match self.timestamped_keys(app) {
            Ok(keys) => keys,
            Err(e) => {
                warn!(application = app, error = %e, "retention trim skipped: listing failed");
                failures.push(TrimFailure {
                    key: self.key_prefix(app),
                    message: e.to_string(),
                });
                return (evicted, failures);
            }
        };

        for (_, key) in keys.into_iter().skip(self.retention) {
            match self.store.delete(&key) {
                Ok(()) => {
                    debug!(application = app, key = %key, "evicted diagram version");
                    evicted.push(key);
                }
                Err(e) => {
                    warn!(
                        application = app,
                        key = %key,
                        error = %e,
                        "failed to evict diagram version"
                    );
                    failures.push(TrimFailure {
                        key,
                        message: e.to_string(),
                    });
                }
            }
        }

        (evicted, failures)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// All readable records of `application_name`, newest first.
    ///
    /// Records that cannot be read or decoded, or that belong to another
    /// application, are skipped with a warning.
    pub fn load_records(&self, application_name: &str) -> Result<Vec<VersionRecord>, StoreError> {
        let mut records = Vec::new();

        for (_, key) in self.timestamped_keys(application_name)? {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                // Evicted between listing and reading.
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable diagram version");
                    continue;
                }
            };
            match serde_json::from_str::<VersionRecord>(&raw) {
                Ok(record) if record.application_name == application_name => records.push(record),
                Ok(record) => {
                    warn!(
                        key = %key,
                        found = %record.application_name,
                        "skipping diagram version stored under another application's key"
                    );
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping corrupted diagram version");
                }
            }
        }

        Ok(records)
    }

    /// All readable diagrams of `application_name`, newest first.
    pub fn load_history(&self, application_name: &str) -> Result<Vec<StateDiagram>, StoreError> {
        Ok(self
            .load_records(application_name)?
            .into_iter()
            .map(|r| r.diagram)
            .collect())
    }

    pub fn latest_record(
        &self,
        application_name: &str,
    ) -> Result<Option<VersionRecord>, StoreError> {
        Ok(self.load_records(application_name)?.into_iter().next())
    }

    /// The newest readable diagram of `application_name`, if any.
    pub fn get_latest(&self, application_name: &str) -> Result<Option<StateDiagram>, StoreError> {
        Ok(self.latest_record(application_name)?.map(|r| r.diagram))
    }

    // ── Helpers ─────────────────────────────────────────────────────────

    /// Keys of `app` with their parsed timestamps, newest first.
    ///
    /// A key only belongs to `app` if everything after the prefix is the
    /// timestamp, so `shop` never picks up keys of `shop-admin`.
    fn timestamped_keys(&self, app: &str) -> Result<Vec<(u64, String)>, StoreError> {
        let prefix = self.key_prefix(app);
        let mut keys: Vec<(u64, String)> = self
            .store
            .keys_with_prefix(&prefix)?
            .into_iter()
            .filter_map(|key| {
                let suffix = key.strip_prefix(&prefix)?;
                if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let ts = suffix.parse::<u64>().ok()?;
                Some((ts, key))
            })
            .collect();
        keys.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(keys)
    }

    /// A timestamp strictly after every one this store has issued and after
    /// `floor`, even when the clock has not advanced.
    fn next_timestamp(&self, floor: Option<u64>) -> Result<u64, StoreError> {
        let mut last = lock(&self.last_timestamp, "timestamp")?;
        let mut ts = self.clock.now_nanos();
        for bound in [Some(*last), floor].into_iter().flatten() {
            if ts <= bound {
                ts = bound.checked_add(1).ok_or_else(|| {
                    StoreError::Backend(format!("timestamp space exhausted after {}", bound))
                })?;
            }
        }
        *last = ts;
        Ok(ts)
    }

    fn app_lock(&self, app: &str) -> Result<Arc<Mutex<()>>, StoreError> {
        let mut locks = lock(&self.app_locks, "application lock table")?;
        Ok(locks.entry(app.to_string()).or_default().clone())
    }

    /// Drop the table entry once no other save holds or waits on it.
    fn release_app_lock(&self, app: &str, app_lock: Arc<Mutex<()>>) {
        let Ok(mut locks) = self.app_locks.lock() else {
            return;
        };
        // One reference in the table, one here.
        if Arc::strong_count(&app_lock) == 2 {
            locks.remove(app);
        }
    }
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend(format!("{} poisoned", what)))
}

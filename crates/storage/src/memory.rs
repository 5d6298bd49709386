use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::StoreError;
use crate::traits::Store;

/// In-memory [`Store`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `delete` fail. Used to exercise best-effort
    /// retention trimming.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "delete of '{}' rejected (fail_deletes set)",
                key
            )));
        }
        self.entries()?.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries()?
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[test]
    fn memory_store_conformance() {
        let report = run_conformance_suite(MemoryStore::new);
        assert!(report.failed == 0, "{report}");
        assert!(report.total > 0);
    }

    #[test]
    fn fail_deletes_leaves_entry_in_place() {
        let store = MemoryStore::new();
        store.set("k", "v").unwrap();
        store.set_fail_deletes(true);
        assert!(matches!(store.delete("k"), Err(StoreError::Backend(_))));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.set_fail_deletes(false);
        store.delete("k").unwrap();
        assert!(store.is_empty());
    }
}

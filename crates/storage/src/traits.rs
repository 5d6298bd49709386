use crate::error::StoreError;

/// A flat string key-value store.
///
/// The version store is written against this trait so it can run over an
/// in-memory map in tests, a directory on disk in the CLI, or any other
/// backend that can list keys by prefix.
///
/// ## Semantics
///
/// - `get` of an absent key is `Ok(None)`, not an error.
/// - `set` overwrites.
/// - `delete` of an absent key is `Ok(())`.
/// - `keys_with_prefix` returns keys in ascending lexicographic order.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; every method takes `&self` and
/// backends provide their own interior synchronization.
///
/// ## Locking
///
/// `lock_exclusive` blocks until the caller holds the named lock against
/// every other user of the same backend, including other processes. The
/// default returns no guard, which is only correct for backends that a
/// single process owns.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    fn lock_exclusive(&self, _name: &str) -> Result<Option<StoreLock>, StoreError> {
        Ok(None)
    }
}

/// A held backend lock. Released on drop.
pub struct StoreLock {
    _held: Box<dyn Send>,
}

impl StoreLock {
    pub fn new(held: impl Send + 'static) -> Self {
        StoreLock {
            _held: Box::new(held),
        }
    }
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoreLock")
    }
}

impl<S: Store + ?Sized> Store for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys_with_prefix(prefix)
    }

    fn lock_exclusive(&self, name: &str) -> Result<Option<StoreLock>, StoreError> {
        (**self).lock_exclusive(name)
    }
}

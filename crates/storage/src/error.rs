/// All errors that can be returned by a `Store` implementation or the
/// version store built on top of it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem-level failure reading, writing, or listing a key.
    #[error("i/o error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A diagram could not be serialized for storage.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A backend-specific failure (lock poisoned, injected fault, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn io(key: impl Into<String>, source: std::io::Error) -> Self {
        StoreError::Io {
            key: key.into(),
            source,
        }
    }
}

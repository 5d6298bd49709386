use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use statecase_core::StateDiagram;

use crate::error::StoreError;

/// One stored version of an application's diagram. Records are written
/// once and only ever removed by retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub application_name: String,
    /// Unix time in nanoseconds; unique per store instance.
    pub timestamp: u64,
    /// SHA-256 (hex) of the diagram's JSON encoding.
    pub content_hash: String,
    pub diagram: StateDiagram,
}

impl VersionRecord {
    pub fn new(diagram: StateDiagram, timestamp: u64) -> Result<Self, StoreError> {
        let content_hash = content_hash(&diagram)?;
        Ok(VersionRecord {
            application_name: diagram.application_name.clone(),
            timestamp,
            content_hash,
            diagram,
        })
    }
}

/// Hex SHA-256 of the diagram's JSON encoding. Insertion order of states is
/// part of the encoding, so reordering states changes the hash.
pub fn content_hash(diagram: &StateDiagram) -> Result<String, StoreError> {
    let bytes = serde_json::to_vec(diagram)?;
    let digest = Sha256::digest(&bytes);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

/// A retention eviction that the backend refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrimFailure {
    pub key: String,
    pub message: String,
}

/// What a `save` did: the record it wrote and what retention removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub key: String,
    pub timestamp: u64,
    pub evicted: Vec<String>,
    /// Evictions that failed. The save itself still stands.
    pub trim_failures: Vec<TrimFailure>,
}

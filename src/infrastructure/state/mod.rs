//! Key-value world state with staged, optimistically validated transactions

mod composite_key;
mod memory_store;
mod transaction;

pub use composite_key::{composite_key, partial_composite_key};
pub use memory_store::MemoryStore;
pub use transaction::StateTx;

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::shared::errors::StateError;

/// Version of a key that has never been written
pub const ABSENT_VERSION: u64 = 0;

/// Stored value together with the version that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub version: u64,
    pub value: Vec<u8>,
}

/// Backend holding the shared key-value state
///
/// `commit` must apply the whole write set or none of it, and must reject
/// the commit if any key in `read_set` is no longer at the recorded version.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StateError>;

    /// All entries whose key starts with `prefix`, ordered by key
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Versioned)>, StateError>;

    async fn commit(
        &self,
        read_set: &HashMap<String, u64>,
        write_set: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), StateError>;
}

//! Staged transaction over a [`StateStore`]

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{StateStore, ABSENT_VERSION};
use crate::shared::errors::{ExchangeError, StateError};

/// Unit of work against the shared state
///
/// Reads observe the transaction's own pending writes first and otherwise
/// record the store version they saw. Nothing reaches the store until
/// [`StateTx::commit`], which applies every write or none of them.
pub struct StateTx {
    store: Arc<dyn StateStore>,
    read_set: HashMap<String, u64>,
    write_set: BTreeMap<String, Vec<u8>>,
}

impl StateTx {
    pub fn begin(store: Arc<dyn StateStore>) -> Self {
        Self {
            store,
            read_set: HashMap::new(),
            write_set: BTreeMap::new(),
        }
    }

    pub async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        if let Some(pending) = self.write_set.get(key) {
            return Ok(Some(pending.clone()));
        }

        let stored = self.store.get(key).await?;
        let version = stored.as_ref().map_or(ABSENT_VERSION, |v| v.version);
        self.read_set.entry(key.to_string()).or_insert(version);
        Ok(stored.map(|v| v.value))
    }

    pub fn put(&mut self, key: String, value: Vec<u8>) {
        self.write_set.insert(key, value);
    }

    /// Entries under `prefix`, pending writes included
    ///
    /// Range reads are not part of conflict validation.
    pub async fn scan_prefix(&mut self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StateError> {
        let mut merged: BTreeMap<String, Vec<u8>> = self
            .store
            .scan_prefix(prefix)
            .await?
            .into_iter()
            .map(|(key, v)| (key, v.value))
            .collect();

        for (key, value) in self.write_set.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            merged.insert(key.clone(), value.clone());
        }

        Ok(merged.into_iter().collect())
    }

    pub async fn get_json<T: DeserializeOwned>(&mut self, key: &str) -> Result<Option<T>, ExchangeError> {
        match self.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| ExchangeError::Decode {
                    key: key.escape_debug().to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn put_json<T: Serialize>(&mut self, key: String, value: &T) -> Result<(), ExchangeError> {
        let bytes = serde_json::to_vec(value).map_err(|source| ExchangeError::Decode {
            key: key.escape_debug().to_string(),
            source,
        })?;
        self.put(key, bytes);
        Ok(())
    }

    /// Number of keys this transaction would write
    pub fn pending_writes(&self) -> usize {
        self.write_set.len()
    }

    pub async fn commit(self) -> Result<(), StateError> {
        if self.write_set.is_empty() {
            return Ok(());
        }
        self.store.commit(&self.read_set, self.write_set).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::state::MemoryStore;

    #[tokio::test]
    async fn test_reads_see_own_writes_before_commit() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let mut tx = StateTx::begin(store.clone());
        tx.put("k".to_string(), b"v".to_vec());

        assert_eq!(tx.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.get("k").await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        {
            let mut tx = StateTx::begin(store.clone());
            tx.put("k".to_string(), b"v".to_vec());
        }
        assert!(store.get("k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_interleaved_writer_causes_conflict() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());

        let mut first = StateTx::begin(store.clone());
        assert!(first.get("counter").await.unwrap().is_none());
        first.put("counter".to_string(), b"1".to_vec());

        let mut second = StateTx::begin(store.clone());
        second.get("counter").await.unwrap();
        second.put("counter".to_string(), b"9".to_vec());
        second.commit().await.unwrap();

        let err = first.commit().await.unwrap_err();
        assert!(matches!(err, StateError::Conflict(_)));
        assert_eq!(store.get("counter").await.unwrap().unwrap().value, b"9".to_vec());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_decode_error() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let mut tx = StateTx::begin(store.clone());
        tx.put("bad".to_string(), b"{not json".to_vec());

        let err = tx.get_json::<u64>("bad").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_scan_merges_pending_writes() {
        let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
        let mut seed = StateTx::begin(store.clone());
        seed.put("p/1".to_string(), b"a".to_vec());
        seed.commit().await.unwrap();

        let mut tx = StateTx::begin(store);
        tx.put("p/2".to_string(), b"b".to_vec());
        tx.put("p/1".to_string(), b"A".to_vec());

        let entries = tx.scan_prefix("p/").await.unwrap();
        assert_eq!(
            entries,
            vec![
                ("p/1".to_string(), b"A".to_vec()),
                ("p/2".to_string(), b"b".to_vec()),
            ]
        );
    }
}

//! In-process state store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{StateStore, Versioned, ABSENT_VERSION};
use crate::shared::errors::StateError;

/// Ordered in-memory map with per-key versions
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Versioned>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Versioned>, StateError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Versioned)>, StateError> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    async fn commit(
        &self,
        read_set: &HashMap<String, u64>,
        write_set: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), StateError> {
        let mut entries = self.entries.write().await;

        for (key, seen) in read_set {
            let current = entries.get(key).map_or(ABSENT_VERSION, |v| v.version);
            if current != *seen {
                debug!(key = %key.escape_debug(), seen, current, "read version changed");
                return Err(StateError::Conflict(key.escape_debug().to_string()));
            }
        }

        for (key, value) in write_set {
            let version = entries.get(&key).map_or(ABSENT_VERSION, |v| v.version) + 1;
            entries.insert(key, Versioned { version, value });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writes(pairs: &[(&str, &str)]) -> BTreeMap<String, Vec<u8>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect()
    }

    #[tokio::test]
    async fn test_commit_bumps_versions() {
        let store = MemoryStore::new();
        store.commit(&HashMap::new(), writes(&[("a", "1")])).await.unwrap();
        store.commit(&HashMap::new(), writes(&[("a", "2")])).await.unwrap();

        let value = store.get("a").await.unwrap().unwrap();
        assert_eq!(value.version, 2);
        assert_eq!(value.value, b"2".to_vec());
    }

    #[tokio::test]
    async fn test_stale_read_rejects_whole_write_set() {
        let store = MemoryStore::new();
        store.commit(&HashMap::new(), writes(&[("a", "1")])).await.unwrap();

        let stale: HashMap<String, u64> = [("a".to_string(), 0)].into_iter().collect();
        let err = store
            .commit(&stale, writes(&[("a", "x"), ("b", "y")]))
            .await
            .unwrap_err();

        assert!(matches!(err, StateError::Conflict(_)));
        assert!(store.get("b").await.unwrap().is_none());
        assert_eq!(store.get("a").await.unwrap().unwrap().value, b"1".to_vec());
    }

    #[tokio::test]
    async fn test_scan_prefix_is_ordered_and_bounded() {
        let store = MemoryStore::new();
        store
            .commit(
                &HashMap::new(),
                writes(&[("lp/2", "b"), ("lp/1", "a"), ("lq/1", "z"), ("l", "0")]),
            )
            .await
            .unwrap();

        let keys: Vec<String> = store
            .scan_prefix("lp/")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["lp/1".to_string(), "lp/2".to_string()]);
    }
}

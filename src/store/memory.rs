//! In-memory [`KvStore`] for local runs and tests.

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{KvStore, Record};

/// Records held in a shared ordered map.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        self.data.write().insert(key.to_string(), value.to_string());
        tracing::debug!("Upserted record with key: {}", key);
        Ok(())
    }

    async fn find_one(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        let data = self.data.read();
        Ok(data
            .iter()
            .map(|(key, value)| Record {
                key: key.clone(),
                value: value.clone(),
            })
            .collect())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

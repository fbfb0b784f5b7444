//! Backend abstraction for key-value records.
//!
//! The gateway only ever sees `Arc<dyn KvStore>`. Concrete backends:
//!
//! - [`SpannerStore`] persists records in a Cloud Spanner table
//! - [`MemoryStore`] keeps records in process memory
//! - [`InstrumentedStore`] wraps either one with spans and backend metrics

pub mod instrumented;
pub mod memory;
pub mod spanner;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{BackendConfig, Config};

pub use instrumented::InstrumentedStore;
pub use memory::MemoryStore;
pub use spanner::SpannerStore;

/// A single stored key-value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub value: String,
}

/// Persistent key-value backend.
///
/// Implementations must be safe to share across request tasks. Every call is
/// fallible and a failure carries the backend's own error text.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Insert the record, or replace the value of an existing one entirely.
    async fn upsert(&self, key: &str, value: &str) -> Result<()>;

    /// Exact-key lookup.
    ///
    /// `Ok(None)` means the key was never written; it is not an error.
    async fn find_one(&self, key: &str) -> Result<Option<String>>;

    /// Every stored record, in whatever order the backend yields them.
    async fn find_all(&self) -> Result<Vec<Record>>;

    /// Cheap round-trip proving the backend is reachable.
    async fn health_check(&self) -> Result<()>;
}

/// Construct the configured backend.
///
/// Fails if the backend cannot be reached; callers treat that as fatal.
pub async fn connect(config: &Config) -> Result<Arc<dyn KvStore>> {
    match &config.backend {
        BackendConfig::Spanner(spanner) => {
            let store = SpannerStore::from_config(spanner, &config.table).await?;
            store.health_check().await?;
            Ok(Arc::new(store))
        }
        BackendConfig::Memory => Ok(Arc::new(MemoryStore::new())),
    }
}

//! Observability decorator for [`KvStore`] implementations.
//!
//! Wraps any store so every backend call gets a `tracing` span and feeds the
//! backend series of [`Metrics`], without the wrapped store or the handlers
//! knowing about either.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::{KvStore, Record};
use crate::metrics::Metrics;

pub struct InstrumentedStore {
    inner: Arc<dyn KvStore>,
    metrics: Arc<Metrics>,
}

impl InstrumentedStore {
    pub fn new(inner: Arc<dyn KvStore>, metrics: Arc<Metrics>) -> Self {
        Self { inner, metrics }
    }

    async fn observe<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let span = tracing::debug_span!("backend", operation);
        let started = Instant::now();
        let result = call.instrument(span).await;
        self.metrics
            .record_backend(operation, started.elapsed(), result.is_err());
        if let Err(err) = &result {
            tracing::warn!(operation, "Backend call failed: {:#}", err);
        }
        result
    }
}

#[async_trait]
impl KvStore for InstrumentedStore {
    async fn upsert(&self, key: &str, value: &str) -> Result<()> {
        self.observe("upsert", self.inner.upsert(key, value)).await
    }

    async fn find_one(&self, key: &str) -> Result<Option<String>> {
        self.observe("find_one", self.inner.find_one(key)).await
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        self.observe("find_all", self.inner.find_all()).await
    }

    async fn health_check(&self) -> Result<()> {
        self.observe("health_check", self.inner.health_check()).await
    }
}

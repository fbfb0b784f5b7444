use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::store::{KvStore, Record};

/// Store whose every call fails as if the backend were unreachable
pub struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    async fn upsert(&self, _key: &str, _value: &str) -> Result<()> {
        bail!("connection refused")
    }

    async fn find_one(&self, _key: &str) -> Result<Option<String>> {
        bail!("connection refused")
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        bail!("connection refused")
    }

    async fn health_check(&self) -> Result<()> {
        bail!("connection refused")
    }
}

/// Store that only counts how often it was called
#[derive(Default)]
pub struct CountingStore {
    pub calls: Arc<AtomicUsize>,
}

impl CountingStore {
    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl KvStore for CountingStore {
    async fn upsert(&self, _key: &str, _value: &str) -> Result<()> {
        self.hit();
        Ok(())
    }

    async fn find_one(&self, _key: &str) -> Result<Option<String>> {
        self.hit();
        Ok(None)
    }

    async fn find_all(&self) -> Result<Vec<Record>> {
        self.hit();
        Ok(Vec::new())
    }

    async fn health_check(&self) -> Result<()> {
        self.hit();
        Ok(())
    }
}

/// Full router over `store`, wired exactly as the server wires it
pub fn test_app(store: Arc<dyn KvStore>) -> (axum::Router, Arc<crate::metrics::Metrics>) {
    let metrics = Arc::new(crate::metrics::Metrics::new());
    let state = crate::state::AppState {
        store: Arc::new(crate::store::InstrumentedStore::new(store, metrics.clone())),
        metrics: metrics.clone(),
    };
    (crate::app::router(state, &crate::config::CorsOrigins::Any), metrics)
}

pub fn json_request(method: &str, uri: &str, body: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

pub async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

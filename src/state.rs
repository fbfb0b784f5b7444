use crate::metrics::Metrics;
use crate::store::KvStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KvStore>,
    pub metrics: Arc<Metrics>,
}

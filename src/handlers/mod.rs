pub mod get;
pub mod health;
pub mod list;
pub mod metrics;
pub mod store;

pub use get::get_handler;
pub use health::health_handler;
pub use list::list_handler;
pub use metrics::metrics_handler;
pub use store::store_handler;

// Route path constants - single source of truth for all API paths

pub const HEALTH: &str = "/health";
pub const METRICS: &str = "/metrics";
pub const OPENAPI: &str = "/api-docs/openapi.json";
pub const STORE: &str = "/store";
pub const STORE_ITEM: &str = "/store/{key}";
pub const KV_LIST: &str = "/kv";
pub const KV_ITEM: &str = "/kv/{key}";

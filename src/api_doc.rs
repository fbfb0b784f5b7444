use axum::Json;
use utoipa::OpenApi;

use crate::error::{ErrorResponse, HealthResponse, UnhealthyResponse};
use crate::handlers;
use crate::models::{KvEntryResponse, StoreRequest, StoreResponse};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "kv-gateway API",
        version = "1.0.0",
        description = "A minimal string key-value store over HTTP"
    ),
    paths(
        handlers::health::health_handler,
        handlers::metrics::metrics_handler,
        handlers::store::store_handler,
        handlers::get::get_handler,
        handlers::list::list_handler
    ),
    components(
        schemas(
            StoreRequest,
            StoreResponse,
            KvEntryResponse,
            ErrorResponse,
            HealthResponse,
            UnhealthyResponse
        )
    ),
    tags(
        (name = "health", description = "Health check operations"),
        (name = "observability", description = "Metrics exposition"),
        (name = "kv", description = "Key-value store operations")
    )
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json handler
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_store_routes() {
        let doc = ApiDoc::openapi();

        assert!(doc.paths.paths.contains_key("/store"));
        assert!(doc.paths.paths.contains_key("/store/{key}"));
        assert!(doc.paths.paths.contains_key("/health"));
        assert!(doc.paths.paths.contains_key("/metrics"));
    }
}

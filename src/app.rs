use axum::{
    body::Body,
    http::Request,
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::api_doc::openapi_handler;
use crate::config::CorsOrigins;
use crate::handlers::{get_handler, health_handler, list_handler, metrics_handler, store_handler};
use crate::middleware::{cors_layer, track_metrics, MakeRequestUuid, REQUEST_ID_HEADER};
use crate::routes;
use crate::state::AppState;

/// Build the full router: API routes, per-route metrics, then request id,
/// tracing and CORS around everything.
pub fn router(state: AppState, cors_origins: &CorsOrigins) -> Router {
    let api = Router::new()
        .route(routes::STORE, get(list_handler).post(store_handler))
        .route(routes::STORE_ITEM, get(get_handler))
        .route(routes::KV_LIST, get(list_handler).post(store_handler))
        .route(routes::KV_ITEM, get(get_handler))
        .route(routes::HEALTH, get(health_handler))
        .route(routes::METRICS, get(metrics_handler))
        .route(routes::OPENAPI, get(openapi_handler))
        .route_layer(from_fn_with_state(state.clone(), track_metrics))
        .with_state(state);

    let request_id = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);
    api.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(PropagateRequestIdLayer::new(request_id))
            .layer(cors_layer(cors_origins)),
    )
}

use crate::metrics::CONTENT_TYPE;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::header, http::StatusCode, response::IntoResponse};

/// GET /metrics handler - Prometheus text exposition
#[utoipa::path(
    get,
    path = routes::METRICS,
    responses(
        (status = 200, description = "Metrics in Prometheus text format", body = String, content_type = "text/plain")
    ),
    tag = "observability"
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        state.metrics.render(),
    )
}

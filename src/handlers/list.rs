use crate::error::{ApiError, ErrorResponse};
use crate::models::KvEntryResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};

/// GET /store handler - List every stored record
///
/// Also mounted at GET /kv. Records come back in backend order and the
/// result is not paginated.
#[utoipa::path(
    get,
    path = routes::STORE,
    responses(
        (status = 200, description = "All key-value pairs", body = Vec<KvEntryResponse>),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "kv"
)]
pub async fn list_handler(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Vec<KvEntryResponse>>), ApiError> {
    let records = state.store.find_all().await?;

    let data: Vec<KvEntryResponse> = records.into_iter().map(KvEntryResponse::from).collect();

    tracing::info!("Listed {} entries", data.len());
    Ok((StatusCode::OK, Json(data)))
}

use crate::error::{ApiError, ErrorResponse};
use crate::models::{StoreRequest, StoreResponse};
use crate::routes;
use crate::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};

/// POST /store handler - Insert or replace a value
///
/// Also mounted at POST /kv.
#[utoipa::path(
    post,
    path = routes::STORE,
    request_body = StoreRequest,
    responses(
        (status = 201, description = "Value stored", body = StoreResponse),
        (status = 400, description = "Missing key or value, or malformed body", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "kv"
)]
pub async fn store_handler(
    State(state): State<AppState>,
    payload: Result<Json<StoreRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StoreResponse>), ApiError> {
    let Json(request) = payload?;
    let record = request.validate()?;

    state.store.upsert(&record.key, &record.value).await?;

    tracing::info!("Successfully stored value for key: {}", record.key);
    Ok((
        StatusCode::CREATED,
        Json(StoreResponse {
            key: record.key,
            message: "Value stored successfully".to_string(),
        }),
    ))
}

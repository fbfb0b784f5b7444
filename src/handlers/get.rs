use crate::error::{ApiError, ErrorResponse};
use crate::models::KvEntryResponse;
use crate::routes;
use crate::state::AppState;
use axum::{extract::Path, extract::State, http::StatusCode, Json};

/// GET /store/{key} handler - Retrieve a value
///
/// Also mounted at GET /kv/{key}.
#[utoipa::path(
    get,
    path = routes::STORE_ITEM,
    params(
        ("key" = String, Path, description = "Key of the record")
    ),
    responses(
        (status = 200, description = "Record found", body = KvEntryResponse),
        (status = 404, description = "Key not found", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "kv"
)]
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<KvEntryResponse>), ApiError> {
    match state.store.find_one(&key).await? {
        Some(value) => {
            tracing::info!("Successfully retrieved value for key: {}", key);
            Ok((StatusCode::OK, Json(KvEntryResponse { key, value })))
        }
        None => {
            tracing::info!("Value not found for key: {}", key);
            Err(ApiError::KeyNotFound(key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{body_json, empty_request, json_request, test_app, FailingStore};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_get_endpoint_success() {
        let (app, _) = test_app(Arc::new(MemoryStore::new()));

        let put_response = app
            .clone()
            .oneshot(json_request("POST", "/store", r#"{"key":"a","value":"1"}"#))
            .await
            .unwrap();
        assert_eq!(put_response.status(), StatusCode::CREATED);

        let get_response = app
            .oneshot(empty_request("GET", "/store/a"))
            .await
            .unwrap();

        assert_eq!(get_response.status(), StatusCode::OK);
        let entry: KvEntryResponse = body_json(get_response).await;
        assert_eq!(
            entry,
            KvEntryResponse {
                key: "a".to_string(),
                value: "1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_get_endpoint_returns_latest_value() {
        let (app, _) = test_app(Arc::new(MemoryStore::new()));

        for body in [r#"{"key":"k","value":"v1"}"#, r#"{"key":"k","value":"v2"}"#] {
            app.clone()
                .oneshot(json_request("POST", "/kv", body))
                .await
                .unwrap();
        }

        let response = app.oneshot(empty_request("GET", "/kv/k")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let entry: KvEntryResponse = body_json(response).await;
        assert_eq!(entry.value, "v2");
    }

    #[tokio::test]
    async fn test_get_endpoint_not_found() {
        let (app, _) = test_app(Arc::new(MemoryStore::new()));

        let response = app
            .oneshot(empty_request("GET", "/store/missing"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error: ErrorResponse = body_json(response).await;
        assert_eq!(error.error, "Key 'missing' not found");
    }

    #[tokio::test]
    async fn test_get_endpoint_decodes_path_key() {
        let store = MemoryStore::new();
        crate::store::KvStore::upsert(&store, "user 1", "alice").await.unwrap();
        let (app, _) = test_app(Arc::new(store));

        let response = app
            .oneshot(empty_request("GET", "/store/user%201"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let entry: KvEntryResponse = body_json(response).await;
        assert_eq!(entry.key, "user 1");
        assert_eq!(entry.value, "alice");
    }

    #[tokio::test]
    async fn test_get_endpoint_backend_failure_is_not_a_miss() {
        let (app, _) = test_app(Arc::new(FailingStore));

        let response = app
            .oneshot(empty_request("GET", "/store/a"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorResponse = body_json(response).await;
        assert!(error.error.starts_with("Database error"));
    }
}

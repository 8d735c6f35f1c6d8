use crate::pipeline::run_pipeline;
use crate::state::{AppState, ModelState};
use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::CorsLayer;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/status", get(status))
        .route("/detect", post(detect))
        // Full-resolution photos routinely exceed axum's 2 MiB default; the
        // media-type check is the only upload gate.
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let model = state.model.lock().await;
    Json(json!({ "model": model.as_str() }))
}

/// The only validation in the system: the upload is accepted iff its media
/// type is exactly `image/jpeg`.
fn is_jpeg(content_type: Option<&str>) -> bool {
    content_type == Some("image/jpeg")
}

async fn detect(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    if !is_jpeg(content_type) {
        tracing::warn!(?content_type, "Rejected upload: only image/jpeg is accepted");
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "error": "only image/jpeg uploads are accepted" })),
        )
            .into_response();
    }

    let mut model = state.model.lock().await;
    let ModelState::Ready(detector) = &mut *model else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "model is not ready", "model": model.as_str() })),
        )
            .into_response();
    };

    let result = tokio::task::block_in_place(|| {
        run_pipeline(detector, &state.renderer, state.input_size, &body)
    });

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Detection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

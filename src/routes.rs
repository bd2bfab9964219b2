use axum::{
    extract::{Json, Path as UrlPath, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::config::Config;
use crate::models::MergePayload;
use crate::pipeline::TranscodePipeline;
use crate::stream;

/// Immutable per-process state shared by all request tasks.
pub struct AppState {
    pub config: Config,
    pub pipeline: TranscodePipeline,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            pipeline: TranscodePipeline::new(&config),
            config,
        }
    }
}

pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/merge", post(merge))
        .route("/video/:slug", get(stream_video))
        .with_state(state)
}

/// Merge the caller's clips into one output file.
///
/// The `Authorization` token is opaque here; validating it is the gateway's
/// concern. The `userid` header selects the storage namespace.
async fn merge(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MergePayload>,
) -> Result<Json<serde_json::Value>, Response> {
    if headers.get(header::AUTHORIZATION).is_none() {
        return Err(client_error(StatusCode::UNAUTHORIZED, "Authorization header required"));
    }
    let owner = owner_id(&headers)?;

    let artifact = state
        .pipeline
        .run(owner, &payload)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok(Json(serde_json::json!({
        "output": artifact.map(|a| a.file_name),
    })))
}

/// Stream one chunk of a previously merged file.
async fn stream_video(
    State(state): State<Arc<AppState>>,
    UrlPath(slug): UrlPath<String>,
    headers: HeaderMap,
) -> Result<Response, Response> {
    let owner = owner_id(&headers)?;
    if !is_bare_file_name(&slug) {
        return Err(client_error(StatusCode::BAD_REQUEST, "invalid video name"));
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok());
    let path = state.config.storage_root.join(owner).join(&slug);

    stream::serve(&path, range)
        .await
        .map(IntoResponse::into_response)
        .map_err(IntoResponse::into_response)
}

/// Storage namespace from the `userid` header. Must be a single path
/// component so a caller cannot reach outside their own directory.
fn owner_id(headers: &HeaderMap) -> Result<&str, Response> {
    let owner = headers
        .get("userid")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    if owner.is_empty() || !is_bare_file_name(owner) {
        return Err(client_error(StatusCode::BAD_REQUEST, "userid header required"));
    }
    Ok(owner)
}

fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn client_error(status: StatusCode, message: &'static str) -> Response {
    (status, message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_names_only() {
        assert!(is_bare_file_name("output-17.mp4"));
        assert!(is_bare_file_name("user1"));
        assert!(!is_bare_file_name("../secrets"));
        assert!(!is_bare_file_name("a/b.mp4"));
        assert!(!is_bare_file_name("a\\b.mp4"));
        assert!(!is_bare_file_name(""));
    }
}

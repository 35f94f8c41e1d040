use crate::shell::Shell;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use std::sync::Arc;

const STYLESHEET: &str = include_str!("../static/app.css");

/// Renders whatever page the request target resolves to. Unknown paths get the
/// dashboard, matching the navigation fallback.
pub async fn page(State(state): State<Arc<AppState>>, method: Method, uri: Uri) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut shell = Shell::new();
    if let Some(effect) = shell.navigate(target) {
        let completion = state.run(effect).await;
        if let Err(err) = &completion.result {
            tracing::warn!(key = %completion.key, error = %err, "page rendered with fetch error");
        }
        shell.resolve(completion);
    }

    (shell.status(), Html(shell.render().into_string())).into_response()
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLESHEET,
    )
}

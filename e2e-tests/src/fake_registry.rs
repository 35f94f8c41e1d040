use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use common::domain::{PluginManifest, PluginSummary};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory stand-in for the registry backend's read endpoints.
pub struct FakeRegistry {
    manifests: Vec<PluginManifest>,
    requests: AtomicUsize,
}

#[derive(Deserialize)]
pub struct VersionParams {
    version: Option<String>,
}

impl FakeRegistry {
    pub fn new(manifests: Vec<PluginManifest>) -> Self {
        Self {
            manifests,
            requests: AtomicUsize::new(0),
        }
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Latest version per name, most recently updated first.
    pub fn summaries(&self) -> Vec<PluginSummary> {
        let mut latest: Vec<&PluginManifest> = Vec::new();
        for manifest in &self.manifests {
            match latest.iter_mut().find(|m| m.name == manifest.name) {
                Some(slot) if slot.updated_at < manifest.updated_at => *slot = manifest,
                Some(_) => {}
                None => latest.push(manifest),
            }
        }
        latest.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        latest.into_iter().map(PluginManifest::summary).collect()
    }

    pub fn find(&self, name: &str, version: Option<&str>) -> Option<&PluginManifest> {
        self.manifests
            .iter()
            .filter(|m| m.name == name)
            .filter(|m| version.map_or(true, |v| m.version == v))
            .max_by_key(|m| m.updated_at)
    }

    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/api/v1/plugins/", get(list_plugins))
            .route("/api/v1/plugins/:name", get(get_plugin))
            .with_state(self)
    }
}

async fn list_plugins(State(registry): State<Arc<FakeRegistry>>) -> Json<Vec<PluginSummary>> {
    registry.requests.fetch_add(1, Ordering::SeqCst);
    Json(registry.summaries())
}

async fn get_plugin(
    State(registry): State<Arc<FakeRegistry>>,
    Path(name): Path<String>,
    Query(params): Query<VersionParams>,
) -> Response {
    registry.requests.fetch_add(1, Ordering::SeqCst);
    match registry.find(&name, params.version.as_deref()) {
        Some(manifest) => Json(manifest.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": "Plugin not found" })),
        )
            .into_response(),
    }
}

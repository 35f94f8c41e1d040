use crate::fake_registry::FakeRegistry;
use anyhow::Result;
use axum::Router;
use common::domain::PluginManifest;
use common::settings::Settings;
use reqwest::Client;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// A fake registry and a dashboard wired to it, both on ephemeral ports.
pub struct TestEnv {
    pub registry_url: String,
    pub dashboard_url: String,
    pub registry: Arc<FakeRegistry>,
    pub client: Client,
}

impl TestEnv {
    pub async fn start(manifests: Vec<PluginManifest>) -> Result<Self> {
        let registry = Arc::new(FakeRegistry::new(manifests));
        let registry_addr = serve(registry.clone().router()).await?;
        let registry_url = format!("http://{}", registry_addr);

        let dashboard_url = start_dashboard(&registry_url).await?;

        Ok(Self {
            registry_url,
            dashboard_url,
            registry,
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    /// GETs a dashboard page, returning status and body.
    pub async fn page(&self, path: &str) -> Result<(u16, String)> {
        let response = self
            .client
            .get(format!("{}{}", self.dashboard_url, path))
            .send()
            .await?;
        let status = response.status().as_u16();
        Ok((status, response.text().await?))
    }
}

/// Starts a dashboard against `registry_url` and returns its base URL.
pub async fn start_dashboard(registry_url: &str) -> Result<String> {
    let mut settings = Settings::default();
    settings.api.base_url = registry_url.to_string();
    settings.api.timeout_ms = 2_000;

    let state = dashboard::state::build_state(settings)?;
    let addr = serve(dashboard::build_router(state)).await?;
    Ok(format!("http://{}", addr))
}

async fn serve(app: Router) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            eprintln!("test server on {} stopped: {}", addr, err);
        }
    });
    Ok(addr)
}

/// A manifest with sensible defaults, updated `age_days` days before 2024-06-01.
pub fn manifest(name: &str, version: &str, age_days: i64, tags: &[&str]) -> PluginManifest {
    let updated_at = chrono::DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .unwrap_or_default()
        - chrono::Duration::days(age_days);

    serde_json::from_value(serde_json::json!({
        "name": name,
        "version": version,
        "description": format!("{} annotation module", name),
        "authors": ["PGIP Team"],
        "entrypoint": format!("{}.main:run", name.replace('-', "_")),
        "created_at": updated_at,
        "updated_at": updated_at,
        "inputs": [{
            "name": "variants",
            "description": "Input VCF",
            "media_type": "application/vnd.pgip.vcf"
        }],
        "outputs": [{
            "name": "annotations",
            "description": "Annotated records",
            "media_type": "application/vnd.pgip.annotation+jsonl"
        }],
        "tags": tags,
        "provenance": {
            "container_image": format!("ghcr.io/pgip/{}:{}", name, version),
            "repository_url": format!("https://github.com/pgip/{}", name)
        }
    }))
    .expect("fixture manifest is valid")
}

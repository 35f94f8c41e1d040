use crate::domain::{PluginManifest, PluginSummary};
use crate::settings::ApiSettings;
use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_USER_AGENT: &str = "PGIP-Dashboard/0.1";
const PLUGINS_PATH: [&str; 3] = ["api", "v1", "plugins"];

/// Why a registry request produced no usable record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {0} ms")]
    Timeout(u64),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("plugin '{0}' not found")]
    NotFound(String),
    #[error("request failed with status code {0}")]
    Status(u16),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait PluginApi: Send + Sync {
    async fn list_plugins(&self) -> Result<Vec<PluginSummary>, ClientError>;

    async fn get_plugin(&self, name: &str) -> Result<PluginManifest, ClientError>;

    /// Like [`PluginApi::get_plugin`], pinned to one registered version.
    async fn get_plugin_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<PluginManifest, ClientError>;
}

pub struct HttpPluginClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpPluginClient {
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let base_url = Url::parse(settings.base_url.trim())?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("API base URL {} cannot carry a path", base_url);
        }

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::ACCEPT, "application/json".parse()?);

        let client = Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            base_url,
            timeout: settings.timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn plugins_url(&self, name: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(PLUGINS_PATH);
            // The collection endpoint is registered with a trailing slash.
            segments.push(name.unwrap_or(""));
        }
        url
    }

    fn transport_error(&self, err: reqwest::Error) -> ClientError {
        if err.is_timeout() {
            ClientError::Timeout(self.timeout.as_millis() as u64)
        } else {
            ClientError::Network(err.to_string())
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        plugin_name: Option<&str>,
    ) -> Result<T, ClientError> {
        tracing::debug!(%url, "requesting registry");

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            let err = self.transport_error(e);
            tracing::warn!(%url, error = %err, "registry request failed");
            err
        })?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND if plugin_name.is_some() => {
                let name = plugin_name.unwrap_or_default().to_string();
                tracing::debug!(%url, plugin = %name, "plugin not registered");
                return Err(ClientError::NotFound(name));
            }
            status => {
                tracing::warn!(%url, %status, "registry answered with an error status");
                return Err(ClientError::Status(status.as_u16()));
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        serde_json::from_slice(&body).map_err(|e| {
            tracing::warn!(%url, error = %e, "registry response did not match the expected shape");
            ClientError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl PluginApi for HttpPluginClient {
    async fn list_plugins(&self) -> Result<Vec<PluginSummary>, ClientError> {
        self.get_json(self.plugins_url(None), None).await
    }

    async fn get_plugin(&self, name: &str) -> Result<PluginManifest, ClientError> {
        self.get_json(self.plugins_url(Some(name)), Some(name))
            .await
    }

    async fn get_plugin_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<PluginManifest, ClientError> {
        let mut url = self.plugins_url(Some(name));
        url.query_pairs_mut().append_pair("version", version);
        self.get_json(url, Some(name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str, timeout_ms: u64) -> HttpPluginClient {
        HttpPluginClient::new(&ApiSettings {
            base_url: base_url.to_string(),
            timeout_ms,
        })
        .unwrap()
    }

    fn manifest_body(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "version": "2.0.0",
            "description": "Counts nodes",
            "authors": ["Ada"],
            "entrypoint": "gfa_stats:main",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-02T00:00:00Z",
            "inputs": [],
            "outputs": [],
            "tags": [],
            "provenance": {"container_image": "ghcr.io/pgip/gfa-stats:2.0.0"}
        })
    }

    #[test]
    fn new_rejects_unusable_base_urls() {
        let settings = ApiSettings {
            base_url: "mailto:registry@example.org".to_string(),
            timeout_ms: 8_000,
        };
        assert!(HttpPluginClient::new(&settings).is_err());

        let settings = ApiSettings {
            base_url: "not a url".to_string(),
            timeout_ms: 8_000,
        };
        assert!(HttpPluginClient::new(&settings).is_err());
    }

    #[test]
    fn plugins_url_keeps_base_path_and_encodes_names() {
        let client = test_client("http://registry.local/pgip/", 8_000);

        assert_eq!(
            client.plugins_url(None).as_str(),
            "http://registry.local/pgip/api/v1/plugins/"
        );
        assert_eq!(
            client.plugins_url(Some("a b/c")).as_str(),
            "http://registry.local/pgip/api/v1/plugins/a%20b%2Fc"
        );
    }

    #[tokio::test]
    async fn list_plugins_decodes_summaries_in_backend_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "zeta", "version": "1.0.0", "description": "z", "tags": ["b", "a"]},
                {"name": "alpha", "version": "0.2.0", "description": "a", "tags": [], "latest_run_at": "2024-05-01T10:00:00"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let plugins = test_client(&server.uri(), 8_000).list_plugins().await.unwrap();

        let names: Vec<_> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
        assert_eq!(plugins[0].tags, vec!["b", "a"]);
        assert!(plugins[1].latest_run_at.is_some());
    }

    #[tokio::test]
    async fn get_plugin_maps_404_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/ghost"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"detail": "Plugin not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri(), 8_000)
            .get_plugin("ghost")
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::NotFound("ghost".to_string()));
        assert_eq!(err.to_string(), "plugin 'ghost' not found");
    }

    #[tokio::test]
    async fn get_plugin_version_sends_version_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/gfa-stats"))
            .and(query_param("version", "2.0.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(manifest_body("gfa-stats")))
            .expect(1)
            .mount(&server)
            .await;

        let manifest = test_client(&server.uri(), 8_000)
            .get_plugin_version("gfa-stats", "2.0.0")
            .await
            .unwrap();

        assert_eq!(manifest.version, "2.0.0");
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .mount(&server)
            .await;

        let err = test_client(&server.uri(), 8_000)
            .list_plugins()
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[tokio::test]
    async fn server_error_is_reported_once_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri(), 8_000)
            .list_plugins()
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Status(500));
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/plugins/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let err = test_client(&server.uri(), 50)
            .list_plugins()
            .await
            .unwrap_err();

        assert_eq!(err, ClientError::Timeout(50));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let err = test_client("http://127.0.0.1:1", 8_000)
            .list_plugins()
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Network(_)));
        assert!(err.to_string().starts_with("network error"));
    }
}

use super::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the registry listing, as returned by `GET /api/v1/plugins/`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginSummary {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "timestamp::option::deserialize")]
    pub latest_run_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginInput {
    pub name: String,
    pub description: String,
    pub media_type: String,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginOutput {
    pub name: String,
    pub description: String,
    pub media_type: String,
}

/// Container image and source reference a plugin was built from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginProvenance {
    pub container_image: String,
    #[serde(default)]
    pub container_digest: Option<String>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Full manifest of a single plugin, as returned by `GET /api/v1/plugins/{name}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    pub description: String,
    pub authors: Vec<String>,
    pub entrypoint: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    pub inputs: Vec<PluginInput>,
    pub outputs: Vec<PluginOutput>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub provenance: PluginProvenance,
    #[serde(default)]
    pub resources: Option<BTreeMap<String, String>>,
}

impl PluginManifest {
    /// The listing row the registry derives from this manifest. The registry
    /// stamps `latest_run_at` with the manifest's `updated_at` on upsert.
    pub fn summary(&self) -> PluginSummary {
        PluginSummary {
            name: self.name.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
            tags: self.tags.clone(),
            latest_run_at: Some(self.updated_at),
        }
    }
}

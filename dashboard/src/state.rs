use crate::shell::{Completion, Effect};
use anyhow::Result;
use common::client::{HttpPluginClient, PluginApi};
use common::query::QueryStore;
use common::settings::Settings;
use std::sync::Arc;

/// Composition root shared by every request: settings and the one
/// request-result store all views fetch through.
pub struct AppState {
    pub settings: Settings,
    pub store: QueryStore,
}

impl AppState {
    pub fn new(settings: Settings, api: Arc<dyn PluginApi>) -> Self {
        let store = QueryStore::new(api, settings.cache.clone());
        Self { settings, store }
    }

    pub async fn run(&self, effect: Effect) -> Completion {
        let result = self.store.fetch(&effect.key).await;
        Completion {
            mount: effect.mount,
            key: effect.key,
            result,
        }
    }
}

pub fn build_state(settings: Settings) -> Result<Arc<AppState>> {
    let client = HttpPluginClient::new(&settings.api)?;
    tracing::info!(base_url = %client.base_url(), "registry client ready");
    Ok(Arc::new(AppState::new(settings, Arc::new(client))))
}

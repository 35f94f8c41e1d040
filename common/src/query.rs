//! Request-result store shared by every view.
//!
//! Results are keyed by [`QueryKey`]. A fetch is served from the store while
//! the cached result is younger than the key's freshness window, joins an
//! identical fetch that is still in flight, or otherwise issues exactly one
//! backend request. Only successes are stored.
//!
//! Requests run on their own task: a waiter that gives up (a visitor closing
//! the page) leaves the request running, and its result still lands in the
//! store for the next fetch.

use crate::client::{ClientError, PluginApi};
use crate::domain::{PluginManifest, PluginSummary};
use crate::settings::CacheSettings;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    PluginList,
    Plugin {
        name: String,
        version: Option<String>,
    },
}

impl QueryKey {
    pub fn plugin(name: impl Into<String>, version: Option<String>) -> Self {
        QueryKey::Plugin {
            name: name.into(),
            version,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            QueryKey::PluginList => "plugins",
            QueryKey::Plugin { .. } => "plugin",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::PluginList => write!(f, "plugins"),
            QueryKey::Plugin {
                name,
                version: None,
            } => write!(f, "plugin:{}", name),
            QueryKey::Plugin {
                name,
                version: Some(version),
            } => write!(f, "plugin:{}@{}", name, version),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    PluginList(Arc<Vec<PluginSummary>>),
    Plugin(Arc<PluginManifest>),
}

pub type QueryResult = Result<QueryData, ClientError>;

type InFlight = Shared<BoxFuture<'static, QueryResult>>;

struct CachedEntry {
    data: QueryData,
    fetched_at: Instant,
}

#[derive(Default)]
struct StoreState {
    cached: HashMap<QueryKey, CachedEntry>,
    in_flight: HashMap<QueryKey, InFlight>,
}

fn lock(state: &Mutex<StoreState>) -> MutexGuard<'_, StoreState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct QueryStore {
    api: Arc<dyn PluginApi>,
    freshness: CacheSettings,
    state: Arc<Mutex<StoreState>>,
}

impl QueryStore {
    pub fn new(api: Arc<dyn PluginApi>, freshness: CacheSettings) -> Self {
        Self {
            api,
            freshness,
            state: Arc::new(Mutex::new(StoreState::default())),
        }
    }

    /// How long a stored result for `key` may be served without refetching.
    pub fn stale_after(&self, key: &QueryKey) -> Duration {
        match key {
            QueryKey::PluginList => Duration::from_millis(self.freshness.plugin_list_stale_ms),
            QueryKey::Plugin { .. } => Duration::from_millis(self.freshness.plugin_detail_stale_ms),
        }
    }

    pub async fn fetch(&self, key: &QueryKey) -> QueryResult {
        let pending = {
            let mut state = lock(&self.state);

            if let Some(entry) = state.cached.get(key) {
                if entry.fetched_at.elapsed() < self.stale_after(key) {
                    tracing::debug!(
                        endpoint = key.endpoint(),
                        %key,
                        "serving fresh result from store"
                    );
                    return Ok(entry.data.clone());
                }
            }

            match state.in_flight.get(key) {
                Some(pending) => {
                    tracing::debug!(endpoint = key.endpoint(), %key, "joining in-flight request");
                    pending.clone()
                }
                None => {
                    tracing::debug!(endpoint = key.endpoint(), %key, "issuing request");
                    let pending = self.start(key.clone());
                    state.in_flight.insert(key.clone(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Drops the stored result for `key`; the next fetch goes to the backend.
    pub fn invalidate(&self, key: &QueryKey) {
        if lock(&self.state).cached.remove(key).is_some() {
            tracing::debug!(endpoint = key.endpoint(), %key, "invalidated stored result");
        }
    }

    pub fn is_in_flight(&self, key: &QueryKey) -> bool {
        lock(&self.state).in_flight.contains_key(key)
    }

    /// Runs the request on its own task so it completes, and stores its result,
    /// even when every waiter has gone away.
    fn start(&self, key: QueryKey) -> InFlight {
        let api = self.api.clone();
        let state = self.state.clone();

        let task = tokio::spawn(async move {
            let result = match &key {
                QueryKey::PluginList => api
                    .list_plugins()
                    .await
                    .map(|plugins| QueryData::PluginList(Arc::new(plugins))),
                QueryKey::Plugin {
                    name,
                    version: None,
                } => api
                    .get_plugin(name)
                    .await
                    .map(|manifest| QueryData::Plugin(Arc::new(manifest))),
                QueryKey::Plugin {
                    name,
                    version: Some(version),
                } => api
                    .get_plugin_version(name, version)
                    .await
                    .map(|manifest| QueryData::Plugin(Arc::new(manifest))),
            };

            let mut state = lock(&state);
            state.in_flight.remove(&key);
            match &result {
                Ok(data) => {
                    state.cached.insert(
                        key,
                        CachedEntry {
                            data: data.clone(),
                            fetched_at: Instant::now(),
                        },
                    );
                }
                Err(err) => tracing::debug!(
                    endpoint = key.endpoint(),
                    %key,
                    error = %err,
                    "request failed; nothing stored"
                ),
            }

            result
        });

        async move {
            task.await.unwrap_or_else(|err| {
                tracing::warn!(error = %err, "request task did not complete");
                Err(ClientError::Network(format!("request task failed: {}", err)))
            })
        }
        .boxed()
        .shared()
    }
}

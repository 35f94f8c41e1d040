pub mod home;
pub mod plugin_detail;
pub mod plugins;

use common::client::ClientError;
use common::query::QueryKey;
use std::fmt;

pub use home::HomeView;
pub use plugin_detail::PluginDetailView;
pub use plugins::PluginListView;

/// Lifecycle of one view's data: `Idle → Loading → Success | Error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(T),
    Error(ViewError),
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewError {
    /// The route named no plugin; nothing was requested.
    MissingName,
    Fetch(ClientError),
    /// The store answered `key` with data of another shape.
    UnexpectedData(QueryKey),
}

impl ViewError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewError::Fetch(err) if err.is_not_found())
    }
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::MissingName => write!(f, "Plugin name missing from URL."),
            ViewError::Fetch(err) => write!(f, "{}", err),
            ViewError::UnexpectedData(key) => write!(f, "unexpected response for {}", key),
        }
    }
}

impl From<ClientError> for ViewError {
    fn from(err: ClientError) -> Self {
        ViewError::Fetch(err)
    }
}

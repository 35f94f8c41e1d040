use super::{ViewError, ViewState};
use crate::html::Html;
use crate::routes::Route;
use common::domain::PluginSummary;
use common::query::{QueryData, QueryKey, QueryResult};
use std::sync::Arc;

/// The registry listing. Cards keep the backend's order, tags included.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginListView {
    state: ViewState<Arc<Vec<PluginSummary>>>,
}

impl Default for PluginListView {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginListView {
    pub fn new() -> Self {
        Self {
            state: ViewState::Idle,
        }
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::PluginList
    }

    pub fn state(&self) -> &ViewState<Arc<Vec<PluginSummary>>> {
        &self.state
    }

    pub fn mount(&mut self) -> Option<QueryKey> {
        self.state = ViewState::Loading;
        Some(self.key())
    }

    /// Settles a loading view. Results arriving in any other state are ignored.
    pub fn apply(&mut self, result: QueryResult) {
        if !self.state.is_loading() {
            return;
        }

        self.state = match result {
            Ok(QueryData::PluginList(plugins)) => ViewState::Success(plugins),
            Ok(_) => ViewState::Error(ViewError::UnexpectedData(self.key())),
            Err(err) => ViewState::Error(err.into()),
        };
    }

    pub fn render(&self) -> Html {
        let mut html = Html::raw("<section class=\"page\">");

        match &self.state {
            ViewState::Idle | ViewState::Loading => html.element("p", None, "Loading plugins…"),
            ViewState::Error(err) => html.element(
                "p",
                Some("error"),
                &format!("Failed to load plugins: {}", err),
            ),
            ViewState::Success(plugins) => {
                html.push("<header class=\"page-header\">");
                html.element("h2", None, "Plugin Registry");
                html.element(
                    "p",
                    None,
                    "Browse registered annotation modules. This data comes directly from the backend API.",
                );
                html.push("</header><div class=\"card-grid\">");

                for plugin in plugins.iter() {
                    render_card(&mut html, plugin);
                }
                if plugins.is_empty() {
                    html.push("<article class=\"card empty-state\">");
                    html.element("h3", None, "No plugins yet");
                    html.element(
                        "p",
                        None,
                        "Register a plugin using the backend API or CLI. Once added it will \
                         appear here with provenance metadata.",
                    );
                    html.push("</article>");
                }

                html.push("</div>");
            }
        }

        html.push("</section>");
        html
    }
}

fn render_card(html: &mut Html, plugin: &PluginSummary) {
    html.push("<article class=\"card plugin-card\"><header>");
    html.element("h3", None, &plugin.name);
    html.element("span", Some("version"), &format!("v{}", plugin.version));
    html.push("</header>");
    html.element("p", None, &plugin.description);
    html.list(Some("tag-list"), &plugin.tags);
    html.push("<footer>");
    html.link(
        &Route::plugin(plugin.name.as_str()).href(),
        Some("link-button"),
        "View Details",
    );
    html.push("</footer></article>");
}

//! One navigation session: the mounted view, its pending fetch, and the page
//! chrome around it.
//!
//! Fetching is an explicit effect. [`Shell::navigate`] mounts a view and hands
//! back the [`Effect`] it needs; whoever runs the effect reports back through
//! [`Shell::resolve`]. Every mount gets a fresh [`MountId`], so a completion
//! that belongs to a view which is no longer mounted is dropped.

use crate::html::{escape, Html};
use crate::routes::Route;
use crate::views::{HomeView, PluginDetailView, PluginListView, ViewState};
use axum::http::StatusCode;
use common::query::{QueryKey, QueryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MountId(u64);

impl MountId {
    fn next(self) -> Self {
        MountId(self.0 + 1)
    }
}

/// "On entering this mount, fetch `key`."
#[derive(Debug, Clone, PartialEq)]
pub struct Effect {
    pub mount: MountId,
    pub key: QueryKey,
}

/// The outcome of running an [`Effect`].
#[derive(Debug, Clone)]
pub struct Completion {
    pub mount: MountId,
    pub key: QueryKey,
    pub result: QueryResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    Home(HomeView),
    Plugins(PluginListView),
    PluginDetail(PluginDetailView),
}

impl Page {
    fn for_route(route: &Route) -> Page {
        match route {
            Route::Dashboard => Page::Home(HomeView),
            Route::Plugins => Page::Plugins(PluginListView::new()),
            Route::PluginDetail { name, version } => {
                Page::PluginDetail(PluginDetailView::new(name.clone(), version.clone()))
            }
        }
    }

    fn mount(&mut self) -> Option<QueryKey> {
        match self {
            Page::Home(_) => None,
            Page::Plugins(view) => view.mount(),
            Page::PluginDetail(view) => view.mount(),
        }
    }

    /// The key this page is waiting on, if it is loading.
    fn awaiting(&self) -> Option<QueryKey> {
        match self {
            Page::Home(_) => None,
            Page::Plugins(view) if view.state().is_loading() => Some(view.key()),
            Page::PluginDetail(view) if view.state().is_loading() => view.key(),
            _ => None,
        }
    }

    fn apply(&mut self, result: QueryResult) {
        match self {
            Page::Home(_) => {}
            Page::Plugins(view) => view.apply(result),
            Page::PluginDetail(view) => view.apply(result),
        }
    }

    fn title(&self) -> String {
        match self {
            Page::Home(_) => "Dashboard".to_string(),
            Page::Plugins(_) => "Plugins".to_string(),
            Page::PluginDetail(view) if view.name().trim().is_empty() => "Plugin".to_string(),
            Page::PluginDetail(view) => view.name().to_string(),
        }
    }

    fn render(&self) -> Html {
        match self {
            Page::Home(view) => view.render(),
            Page::Plugins(view) => view.render(),
            Page::PluginDetail(view) => view.render(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shell {
    mount: MountId,
    route: Route,
    page: Page,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Shell {
    pub fn new() -> Self {
        Self {
            mount: MountId::default(),
            route: Route::Dashboard,
            page: Page::Home(HomeView),
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Navigates to a request target such as `/plugins/vcf?version=1.0.0`.
    pub fn navigate(&mut self, target: &str) -> Option<Effect> {
        self.enter(Route::parse(target))
    }

    pub fn enter(&mut self, route: Route) -> Option<Effect> {
        self.mount = self.mount.next();
        self.page = Page::for_route(&route);
        self.route = route;

        let key = self.page.mount()?;
        tracing::debug!(mount = self.mount.0, %key, "view mounted; fetch requested");
        Some(Effect {
            mount: self.mount,
            key,
        })
    }

    /// Applies a completion to the mounted view. Returns `false` and leaves the
    /// view untouched when the completion belongs to an earlier mount or to a
    /// key the view is not waiting on.
    pub fn resolve(&mut self, completion: Completion) -> bool {
        if completion.mount != self.mount {
            tracing::debug!(
                mount = completion.mount.0,
                current = self.mount.0,
                key = %completion.key,
                "dropping completion for unmounted view"
            );
            return false;
        }

        if self.page.awaiting().as_ref() != Some(&completion.key) {
            tracing::debug!(key = %completion.key, "dropping completion the view is not waiting on");
            return false;
        }

        self.page.apply(completion.result);
        true
    }

    /// 404 only when a named plugin is unknown; every other failure is shown
    /// inline on a 200 page.
    pub fn status(&self) -> StatusCode {
        let not_found = match &self.page {
            Page::PluginDetail(view) => {
                matches!(view.state(), ViewState::Error(e) if e.is_not_found())
            }
            Page::Home(_) | Page::Plugins(_) => false,
        };

        if not_found {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        }
    }

    /// The complete document: sidebar navigation around the mounted view.
    pub fn render(&self) -> Html {
        let mut html = Html::raw("<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">");
        html.push("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
        html.push(&format!(
            "<title>{} · PGIP</title>",
            escape(&self.page.title())
        ));
        html.push("<link rel=\"stylesheet\" href=\"/static/app.css\"></head><body>");

        html.push("<div class=\"app-shell\"><aside class=\"sidebar\">");
        html.element("h1", Some("logo"), "PGIP");
        html.push("<nav>");
        let on_plugins = matches!(self.route, Route::Plugins | Route::PluginDetail { .. });
        nav_link(&mut html, &Route::Dashboard, "Dashboard", self.route == Route::Dashboard);
        nav_link(&mut html, &Route::Plugins, "Plugins", on_plugins);
        html.push("</nav></aside>");

        html.push("<main class=\"main-content\">");
        html.push_html(&self.page.render());
        html.push("</main></div></body></html>");
        html
    }
}

fn nav_link(html: &mut Html, route: &Route, text: &str, active: bool) {
    html.link(&route.href(), active.then_some("active"), text);
}

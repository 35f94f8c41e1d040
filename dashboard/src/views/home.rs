use crate::html::Html;
use crate::routes::Route;

/// Landing page. Static, so it never requests anything.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct HomeView;

impl HomeView {
    pub fn render(&self) -> Html {
        let mut html = Html::new();
        html.push("<section class=\"page\"><header>");
        html.element("h2", None, "Welcome to PGIP");
        html.element(
            "p",
            None,
            "Explore pangenome assets, annotation plugins, and provenance metrics as we \
             expand the platform. This dashboard will grow to include charts and run \
             status widgets.",
        );
        html.push("</header><div class=\"card-grid\">");

        html.push("<article class=\"card\">");
        html.element("h3", None, "Quick Links");
        html.push("<ul><li>");
        html.link(&Route::Plugins.href(), None, "View registered plugins");
        html.push("</li><li>Track workflow runs</li><li>Review provenance summaries</li></ul>");
        html.push("</article>");

        html.push("<article class=\"card\">");
        html.element("h3", None, "Next Up");
        html.element(
            "p",
            None,
            "Connect the dashboard to backend metrics and add real-time charts.",
        );
        html.push("</article>");

        html.push("</div></section>");
        html
    }
}

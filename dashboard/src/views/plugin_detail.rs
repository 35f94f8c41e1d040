use super::{ViewError, ViewState};
use crate::html::{escape, Html};
use crate::routes::Route;
use common::domain::{PluginManifest, PluginProvenance};
use common::query::{QueryData, QueryKey, QueryResult};
use std::sync::Arc;

/// Full manifest of one plugin, addressed by name (and optionally version).
#[derive(Debug, Clone, PartialEq)]
pub struct PluginDetailView {
    name: String,
    version: Option<String>,
    state: ViewState<Arc<PluginManifest>>,
}

impl PluginDetailView {
    pub fn new(name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            name: name.into(),
            version,
            state: ViewState::Idle,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> &ViewState<Arc<PluginManifest>> {
        &self.state
    }

    /// `None` when the route carried no usable name.
    pub fn key(&self) -> Option<QueryKey> {
        if self.name.trim().is_empty() {
            return None;
        }
        Some(QueryKey::plugin(self.name.clone(), self.version.clone()))
    }

    pub fn mount(&mut self) -> Option<QueryKey> {
        match self.key() {
            Some(key) => {
                self.state = ViewState::Loading;
                Some(key)
            }
            None => {
                self.state = ViewState::Error(ViewError::MissingName);
                None
            }
        }
    }

    pub fn apply(&mut self, result: QueryResult) {
        if !self.state.is_loading() {
            return;
        }

        self.state = match result {
            Ok(QueryData::Plugin(manifest)) => ViewState::Success(manifest),
            Ok(_) => match self.key() {
                Some(key) => ViewState::Error(ViewError::UnexpectedData(key)),
                None => ViewState::Error(ViewError::MissingName),
            },
            Err(err) => ViewState::Error(err.into()),
        };
    }

    pub fn render(&self) -> Html {
        let mut html = Html::raw("<section class=\"page\">");

        match &self.state {
            ViewState::Idle | ViewState::Loading => {
                html.element("p", None, "Loading plugin details…");
            }
            ViewState::Error(ViewError::MissingName) => {
                html.element("p", Some("error"), &ViewError::MissingName.to_string());
                back_link(&mut html, "Back to plugins");
            }
            ViewState::Error(err) => {
                html.element("p", Some("error"), &format!("Failed to load plugin: {}", err));
                back_link(&mut html, "Back to plugins");
            }
            ViewState::Success(manifest) => render_manifest(&mut html, manifest),
        }

        html.push("</section>");
        html
    }
}

fn back_link(html: &mut Html, text: &str) {
    html.link(&Route::Plugins.href(), Some("link-button"), text);
}

/// Display order only; the manifest keeps whatever order the backend sent.
fn sorted_tags(manifest: &PluginManifest) -> Vec<&str> {
    let mut tags: Vec<&str> = manifest.tags.iter().map(String::as_str).collect();
    tags.sort_unstable();
    tags
}

fn render_manifest(html: &mut Html, manifest: &PluginManifest) {
    html.push("<header class=\"page-header\"><div>");
    html.element("h2", None, &manifest.name);
    html.element("span", Some("version"), &format!("v{}", manifest.version));
    html.push("</div>");
    back_link(html, "Back to registry");
    html.push("</header>");

    html.push("<article class=\"detail-card\">");
    html.element("p", None, &manifest.description);
    html.list(Some("tag-list"), sorted_tags(manifest));

    html.push("<section>");
    html.element("h3", None, "Entrypoint");
    html.element("code", None, &manifest.entrypoint);
    html.push("</section>");

    html.push("<section>");
    html.element("h3", None, "Authors");
    html.list(None, &manifest.authors);
    html.push("</section>");

    html.push("<section class=\"grid\"><div>");
    html.element("h3", None, "Inputs");
    html.push("<ul>");
    for input in &manifest.inputs {
        html.push("<li>");
        html.element("strong", None, &input.name);
        html.push(&format!(" ({})", escape(&input.media_type)));
        if input.optional {
            html.element("span", Some("optional"), "optional");
        }
        html.element("p", None, &input.description);
        html.push("</li>");
    }
    html.push("</ul></div><div>");
    html.element("h3", None, "Outputs");
    html.push("<ul>");
    for output in &manifest.outputs {
        html.push("<li>");
        html.element("strong", None, &output.name);
        html.push(&format!(" ({})", escape(&output.media_type)));
        html.element("p", None, &output.description);
        html.push("</li>");
    }
    html.push("</ul></div></section>");

    render_provenance(html, &manifest.provenance);

    if let Some(resources) = manifest.resources.as_ref().filter(|r| !r.is_empty()) {
        html.push("<section>");
        html.element("h3", None, "Resources");
        html.push("<dl class=\"definition-list\">");
        for (key, value) in resources {
            definition(html, key, |html| html.push(&escape(value)));
        }
        html.push("</dl></section>");
    }

    html.push("</article>");
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn render_provenance(html: &mut Html, provenance: &PluginProvenance) {
    html.push("<section>");
    html.element("h3", None, "Provenance");
    html.push("<dl class=\"definition-list\">");

    definition(html, "Container Image", |html| {
        html.push(&escape(&provenance.container_image));
    });
    if let Some(digest) = present(&provenance.container_digest) {
        definition(html, "Digest", |html| html.push(&escape(digest)));
    }
    if let Some(url) = present(&provenance.repository_url) {
        definition(html, "Repository", |html| html.external_link(url, url));
    }
    if let Some(reference) = present(&provenance.reference) {
        definition(html, "Reference", |html| html.push(&escape(reference)));
    }

    html.push("</dl></section>");
}

fn definition(html: &mut Html, term: &str, body: impl FnOnce(&mut Html)) {
    html.push("<div>");
    html.element("dt", None, term);
    html.push("<dd>");
    body(html);
    html.push("</dd></div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::client::ClientError;
    use common::domain::{PluginInput, PluginOutput};
    use std::collections::BTreeMap;

    fn manifest() -> PluginManifest {
        let at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        PluginManifest {
            name: "vcf-annotator".to_string(),
            version: "1.2.0".to_string(),
            description: "Annotates variants".to_string(),
            authors: vec!["Grace".to_string(), "Ada".to_string()],
            entrypoint: "pgip_vcf.main:run".to_string(),
            created_at: at,
            updated_at: at,
            inputs: vec![PluginInput {
                name: "variants".to_string(),
                description: "Input VCF".to_string(),
                media_type: "application/vnd.pgip.vcf".to_string(),
                optional: false,
            }],
            outputs: vec![PluginOutput {
                name: "annotations".to_string(),
                description: "Annotated records".to_string(),
                media_type: "application/vnd.pgip.annotation+jsonl".to_string(),
            }],
            tags: vec!["zoo".to_string(), "alpha".to_string()],
            provenance: PluginProvenance {
                container_image: "ghcr.io/pgip/vcf-annotator:1.2.0".to_string(),
                container_digest: None,
                repository_url: None,
                reference: None,
            },
            resources: None,
        }
    }

    fn loaded(manifest: PluginManifest) -> PluginDetailView {
        let mut view = PluginDetailView::new(manifest.name.clone(), None);
        view.mount();
        view.apply(Ok(QueryData::Plugin(Arc::new(manifest))));
        view
    }

    #[test]
    fn empty_name_fails_immediately_without_a_request() {
        for name in ["", "   "] {
            let mut view = PluginDetailView::new(name, None);

            assert_eq!(view.mount(), None);
            assert_eq!(view.state(), &ViewState::Error(ViewError::MissingName));
            assert!(view
                .render()
                .as_str()
                .contains("<p class=\"error\">Plugin name missing from URL.</p>"));
        }
    }

    #[test]
    fn mount_requests_the_named_plugin() {
        let mut view = PluginDetailView::new("vcf", Some("1.0.0".to_string()));

        assert_eq!(
            view.mount(),
            Some(QueryKey::plugin("vcf", Some("1.0.0".to_string())))
        );
        assert!(view.render().as_str().contains("Loading plugin details…"));
    }

    #[test]
    fn tags_are_sorted_for_display_only() {
        let view = loaded(manifest());
        let html = view.render().into_string();

        assert!(html.contains("<ul class=\"tag-list\"><li>alpha</li><li>zoo</li></ul>"));
        match view.state() {
            ViewState::Success(m) => assert_eq!(m.tags, vec!["zoo", "alpha"]),
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn renders_header_entrypoint_authors_and_io() {
        let html = loaded(manifest()).render().into_string();

        assert!(html.contains("<h2>vcf-annotator</h2>"));
        assert!(html.contains("<span class=\"version\">v1.2.0</span>"));
        assert!(html.contains("<code>pgip_vcf.main:run</code>"));
        assert!(html.contains("<ul><li>Grace</li><li>Ada</li></ul>"));
        assert!(html.contains("<strong>variants</strong> (application/vnd.pgip.vcf)"));
        assert!(html.contains(
            "<strong>annotations</strong> (application/vnd.pgip.annotation+jsonl)<p>Annotated records</p>"
        ));
        assert!(html.contains("<a href=\"/plugins\" class=\"link-button\">Back to registry</a>"));
    }

    #[test]
    fn provenance_omits_absent_rows() {
        let html = loaded(manifest()).render().into_string();

        assert!(html.contains(
            "<dt>Container Image</dt><dd>ghcr.io/pgip/vcf-annotator:1.2.0</dd>"
        ));
        assert!(!html.contains("<dt>Digest</dt>"));
        assert!(!html.contains("<dt>Repository</dt>"));
        assert!(!html.contains("<dt>Reference</dt>"));
    }

    #[test]
    fn provenance_shows_present_rows_verbatim() {
        let mut m = manifest();
        m.provenance.container_digest = Some("sha256:abc123".to_string());
        m.provenance.repository_url = Some("https://github.com/pgip/vcf-annotator".to_string());
        m.provenance.reference = Some("v1.2.0".to_string());

        let html = loaded(m).render().into_string();

        assert!(html.contains("<dt>Digest</dt><dd>sha256:abc123</dd>"));
        assert!(html.contains(
            "<dt>Repository</dt><dd><a href=\"https://github.com/pgip/vcf-annotator\" target=\"_blank\" rel=\"noreferrer\">https://github.com/pgip/vcf-annotator</a></dd>"
        ));
        assert!(html.contains("<dt>Reference</dt><dd>v1.2.0</dd>"));
    }

    #[test]
    fn empty_strings_count_as_absent_provenance() {
        let mut m = manifest();
        m.provenance.container_digest = Some(String::new());

        let html = loaded(m).render().into_string();
        assert!(!html.contains("<dt>Digest</dt>"));
    }

    #[test]
    fn optional_inputs_and_resources_are_shown() {
        let mut m = manifest();
        m.inputs[0].optional = true;
        m.resources = Some(BTreeMap::from([
            ("memory".to_string(), "4Gi".to_string()),
            ("cpu".to_string(), "2".to_string()),
        ]));

        let html = loaded(m).render().into_string();

        assert!(html.contains("<span class=\"optional\">optional</span>"));
        let cpu = html.find("<dt>cpu</dt><dd>2</dd>").unwrap();
        let memory = html.find("<dt>memory</dt><dd>4Gi</dd>").unwrap();
        assert!(cpu < memory);
    }

    #[test]
    fn fetch_failure_offers_way_back() {
        let mut view = PluginDetailView::new("ghost", None);
        view.mount();
        view.apply(Err(ClientError::NotFound("ghost".to_string())));

        let html = view.render().into_string();
        assert!(html.contains("Failed to load plugin: plugin &#39;ghost&#39; not found"));
        assert!(html.contains("<a href=\"/plugins\" class=\"link-button\">Back to plugins</a>"));
        assert!(matches!(view.state(), ViewState::Error(e) if e.is_not_found()));
    }
}

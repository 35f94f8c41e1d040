use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a plugin name becomes one path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const QUERY_VALUE: &AsciiSet = &PATH_SEGMENT.add(b'&').add(b'=').add(b'+');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Plugins,
    PluginDetail {
        name: String,
        version: Option<String>,
    },
}

impl Route {
    /// Resolves a request target (`/path?query`). Unknown paths land on the
    /// dashboard.
    pub fn parse(target: &str) -> Route {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (target, None),
        };

        let trimmed = path.trim_start_matches('/').trim_end_matches('/');
        let mut segments = trimmed.split('/');

        match (segments.next(), segments.next(), segments.next()) {
            (Some(""), None, None) => Route::Dashboard,
            (Some("plugins"), None, None) => Route::Plugins,
            // A name that is not valid UTF-8 once decoded counts as missing.
            (Some("plugins"), Some(name), None) => Route::PluginDetail {
                name: decode(name).unwrap_or_default(),
                version: query.and_then(|q| query_param(q, "version")),
            },
            _ => Route::Dashboard,
        }
    }

    pub fn href(&self) -> String {
        match self {
            Route::Dashboard => "/".to_string(),
            Route::Plugins => "/plugins".to_string(),
            Route::PluginDetail { name, version } => {
                let mut href = format!("/plugins/{}", utf8_percent_encode(name, PATH_SEGMENT));
                if let Some(version) = version {
                    href.push_str("?version=");
                    href.push_str(&utf8_percent_encode(version, QUERY_VALUE).to_string());
                }
                href
            }
        }
    }

    pub fn plugin(name: impl Into<String>) -> Route {
        Route::PluginDetail {
            name: name.into(),
            version: None,
        }
    }
}

fn decode(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

fn query_param(query: &str, wanted: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == wanted)
        .and_then(|(_, value)| decode(&value.replace('+', " ")))
        .filter(|value| !value.trim().is_empty())
}

use std::fmt;

/// Markup that is safe to emit as-is. Text only gets in through [`escape`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Html(String);

impl Html {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(markup: impl Into<String>) -> Self {
        Self(markup.into())
    }

    pub fn push(&mut self, markup: &str) {
        self.0.push_str(markup);
    }

    pub fn push_html(&mut self, other: &Html) {
        self.0.push_str(&other.0);
    }

    /// `<tag class="..">text</tag>` with `text` escaped.
    pub fn element(&mut self, tag: &str, class: Option<&str>, text: &str) {
        match class {
            Some(class) => self.0.push_str(&format!(
                "<{tag} class=\"{}\">{}</{tag}>",
                escape(class),
                escape(text)
            )),
            None => self.0.push_str(&format!("<{tag}>{}</{tag}>", escape(text))),
        }
    }

    pub fn link(&mut self, href: &str, class: Option<&str>, text: &str) {
        let class = class
            .map(|c| format!(" class=\"{}\"", escape(c)))
            .unwrap_or_default();
        self.0.push_str(&format!(
            "<a href=\"{}\"{}>{}</a>",
            escape(href),
            class,
            escape(text)
        ));
    }

    pub fn external_link(&mut self, href: &str, text: &str) {
        self.0.push_str(&format!(
            "<a href=\"{}\" target=\"_blank\" rel=\"noreferrer\">{}</a>",
            escape(href),
            escape(text)
        ));
    }

    /// `<ul class="..">` of escaped items; nothing at all when `items` is empty.
    pub fn list<I, S>(&mut self, class: Option<&str>, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut body = String::new();
        for item in items {
            body.push_str(&format!("<li>{}</li>", escape(item.as_ref())));
        }
        if body.is_empty() {
            return;
        }
        match class {
            Some(class) => self
                .0
                .push_str(&format!("<ul class=\"{}\">{}</ul>", escape(class), body)),
            None => self.0.push_str(&format!("<ul>{}</ul>", body)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Html {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

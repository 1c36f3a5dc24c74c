//! Markdown mail templates with `{{key}}` placeholders.

use std::path::Path;

use pulldown_cmark::{Event, Options, Parser, html};

/// A Markdown body loaded from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailTemplate {
    text: String,
}

impl MailTemplate {
    /// Wrap template text.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a template file. With `strip_heading`, a first line starting
    /// with `#` is dropped so it does not repeat the subject.
    pub fn load(path: &Path, strip_heading: bool) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text, strip_heading))
    }

    /// Build from text, optionally dropping a leading Markdown heading line.
    #[must_use]
    pub fn from_text(text: &str, strip_heading: bool) -> Self {
        if strip_heading {
            if let Some(first) = text.lines().next() {
                if first.trim_start().starts_with('#') {
                    let rest = text.split_once('\n').map_or("", |(_, rest)| rest);
                    return Self::new(rest);
                }
            }
        }
        Self::new(text)
    }

    /// Raw template text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace every `{{key}}` with its value.
    #[must_use]
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        vars.iter().fold(self.text.clone(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{key}}}}}"), value)
        })
    }

    /// Render placeholders, then Markdown to HTML.
    #[must_use]
    pub fn render_html(&self, vars: &[(&str, &str)]) -> String {
        to_html(&self.render(vars))
    }
}

/// Markdown to HTML; single newlines become `<br />`.
#[must_use]
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::SoftBreak => Event::HardBreak,
            other => other,
        });

    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap a body in the house font and spacing.
#[must_use]
pub fn styled(body: &str) -> String {
    format!(
        "<div style=\"font-family: 'Apple SD Gothic Neo', 'Malgun Gothic', sans-serif; \
         font-size: 11pt; line-height: 1.6; color: #333;\">\n{body}\n</div>"
    )
}

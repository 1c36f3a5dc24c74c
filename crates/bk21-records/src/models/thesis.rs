//! Metadata scraped from RISS detail pages.

use serde::{Deserialize, Serialize};

/// Fields written back to the paper tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisDetails {
    /// RISS `control_no`, empty when the URL carries none.
    pub control_no: String,

    /// Abstract text.
    pub abstract_text: String,

    /// Keyword line with its label removed.
    pub keywords: String,
}

/// Full text capture of one detail page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThesisDump {
    /// Page title.
    pub title: String,

    /// Page URL.
    pub url: String,

    /// Abstract and additional info text.
    pub content: String,
}

impl ThesisDump {
    /// Plain-text file body.
    #[must_use]
    pub fn render(&self) -> String {
        format!("TITLE: {}\nURL: {}\n{}\n\n{}", self.title, self.url, "=".repeat(40), self.content)
    }
}

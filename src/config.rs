use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const GENERATION_MODEL: &str = "gpt-5";
pub const TRAINING_MODEL: &str = "gpt-4.1-nano-2025-04-14";
pub const OUTPUT_FILE: &str = "training_data.jsonl";
pub const TRAINING_EXAMPLES: usize = 50;
pub const POLL_INTERVAL_SECS: u64 = 30;
pub const FETCH_TIMEOUT_SECS: u64 = 30;
pub const FETCH_DELAY_MS: u64 = 1000;
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; AI-Training-Data-Scraper/1.0)";

/// A page to scrape, tagged with what kind of content it carries.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSource {
    pub url: String,
    pub content_type: ContentType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    General,
    About,
    Services,
    Contact,
    Faq,
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::General => "general",
            Self::About => "about",
            Self::Services => "services",
            Self::Contact => "contact",
            Self::Faq => "faq",
        })
    }
}

/// Built-in page list, used when no --sources file is given.
pub fn default_sources() -> Vec<PageSource> {
    vec![
        PageSource {
            url: "https://www.mtechzilla.com/".into(),
            content_type: ContentType::General,
        },
        PageSource {
            url: "https://www.mtechzilla.com/company/about-us".into(),
            content_type: ContentType::About,
        },
        PageSource {
            url: "https://www.mtechzilla.com/services".into(),
            content_type: ContentType::Services,
        },
    ]
}

/// Load page sources from a JSON file: `[{"url": ..., "content_type": ...}]`.
pub fn load_sources(path: &Path) -> Result<Vec<PageSource>> {
    let content = std::fs::read_to_string(path)?;
    let sources: Vec<PageSource> = serde_json::from_str(&content)?;
    if sources.is_empty() {
        return Err(Error::Configuration(format!(
            "sources file {} contains no pages",
            path.display()
        )));
    }
    Ok(sources)
}

pub fn api_key() -> Result<String> {
    std::env::var("OPENAI_API_KEY")
        .map_err(|_| Error::Configuration("OPENAI_API_KEY environment variable is required".into()))
}

/// API base, overridable for self-hosted gateways. Trailing slash stripped.
pub fn base_url() -> String {
    std::env::var("OPENAI_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_BASE_URL.into())
        .trim_end_matches('/')
        .to_string()
}

pub fn fine_tuned_model() -> Result<String> {
    std::env::var("FINE_TUNED_MODEL").map_err(|_| {
        Error::Configuration(
            "no fine-tuned model id: set FINE_TUNED_MODEL or pass --model".into(),
        )
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_sources_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"url": "https://example.com/", "content_type": "general"}},
                {{"url": "https://example.com/faq", "content_type": "faq"}}]"#
        )
        .unwrap();

        let sources = load_sources(file.path()).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].content_type, ContentType::General);
        assert_eq!(sources[1].content_type, ContentType::Faq);
    }

    #[test]
    fn load_sources_rejects_unknown_content_type() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"url": "https://example.com/", "content_type": "blog"}}]"#).unwrap();
        assert!(load_sources(file.path()).is_err());
    }

    #[test]
    fn load_sources_rejects_empty_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();
        assert!(matches!(
            load_sources(file.path()),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn content_type_display_is_lowercase() {
        assert_eq!(ContentType::About.to_string(), "about");
        assert_eq!(ContentType::Services.to_string(), "services");
    }
}

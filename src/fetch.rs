use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::config::{self, PageSource};
use crate::error::{Error, Result};
use crate::extract::{self, ExtractedContent};

/// Fetch outcome counts for the operator report.
pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

/// Downloads one page. Seam so the scrape loop is testable offline.
pub trait PageFetcher {
    async fn get(&self, url: &str) -> Result<String>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config::FETCH_TIMEOUT_SECS))
            .user_agent(config::USER_AGENT)
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<String> {
        let fetch_err = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_err(e.to_string()))?;
        response.text().await.map_err(|e| fetch_err(e.to_string()))
    }
}

/// Fetch and extract each source in order, pacing requests by `delay`.
/// A failed fetch skips that URL; only a fully empty result is fatal.
pub async fn scrape_sources<F: PageFetcher>(
    fetcher: &F,
    sources: &[PageSource],
    delay: Duration,
) -> Result<(Vec<ExtractedContent>, FetchStats)> {
    let pb = ProgressBar::new(sources.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=> "),
    );

    let mut contents = Vec::new();
    let mut errors = 0usize;

    for (i, source) in sources.iter().enumerate() {
        match fetcher.get(&source.url).await {
            Ok(html) => {
                let content = extract::extract(&html, source);
                if content.title.is_empty() {
                    info!("scraped {}", source.url);
                } else {
                    info!("scraped {}", content.title);
                }
                contents.push(content);
            }
            Err(e) => {
                warn!("{e}");
                errors += 1;
            }
        }
        pb.inc(1);
        if i + 1 < sources.len() {
            tokio::time::sleep(delay).await;
        }
    }
    pb.finish_and_clear();

    if contents.is_empty() {
        return Err(Error::NoContent);
    }

    let ok = contents.len();
    Ok((
        contents,
        FetchStats {
            total: sources.len(),
            ok,
            errors,
        },
    ))
}

// ── Tests ──

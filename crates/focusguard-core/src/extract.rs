//! Content sampling.
//!
//! A [`ContentSource`] names the current target (the "active tab") and turns
//! it into a plain-text digest. The digest is heading text (`h1`-`h3`)
//! followed by a newline and paragraph text, each group in document order.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{ExtractionError, Result};
use crate::storage::StateStore;

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-3]\b[^>]*>(.*?)</h[1-3]\s*>").expect("static heading regex")
});

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p\s*>").expect("static paragraph regex"));

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Something the monitor can sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// The current target, or `None` when nothing is open.
    async fn current_target(&self) -> Option<Target>;

    /// Produce the text digest for `target`.
    async fn extract(&self, target: &Target) -> Result<String, ExtractionError>;
}

/// Build the heading + paragraph digest of an HTML document.
///
/// Returns an empty string when the page has neither headings nor paragraphs.
pub fn extract_digest(html: &str) -> String {
    let headings = collect_text(&HEADING_RE, html);
    let paragraphs = collect_text(&PARAGRAPH_RE, html);
    if headings.is_empty() && paragraphs.is_empty() {
        return String::new();
    }
    format!("{headings}\n{paragraphs}")
}

fn collect_text(re: &Regex, html: &str) -> String {
    re.captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|inner| squash_whitespace(&nanohtml2text::html2text(inner.as_str())))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn squash_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

enum TargetOrigin {
    /// Read the active target from the state store on every tick.
    Store(Arc<dyn StateStore>),
    /// Always sample the same URL.
    Fixed(Target),
}

/// Fetches the target page over HTTP and digests it.
pub struct WebPageSource {
    client: Client,
    origin: TargetOrigin,
}

impl WebPageSource {
    /// Follow the active target recorded in `store`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_store(store: Arc<dyn StateStore>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            origin: TargetOrigin::Store(store),
        })
    }

    /// Always sample `url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn fixed(url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            origin: TargetOrigin::Fixed(Target { url: url.into() }),
        })
    }
}

fn build_client() -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()?)
}

#[async_trait]
impl ContentSource for WebPageSource {
    async fn current_target(&self) -> Option<Target> {
        match &self.origin {
            TargetOrigin::Fixed(target) => Some(target.clone()),
            TargetOrigin::Store(store) => match store.active_target() {
                Ok(url) => url.map(|url| Target { url }),
                Err(e) => {
                    warn!(error = %e, "failed to read active target");
                    None
                }
            },
        }
    }

    async fn extract(&self, target: &Target) -> Result<String, ExtractionError> {
        let fetch_failed = |message: String| ExtractionError::FetchFailed {
            url: target.url.clone(),
            message,
        };

        let resp = self
            .client
            .get(&target.url)
            .send()
            .await
            .map_err(|e| fetch_failed(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("HTTP {status}")));
        }
        let html = resp.text().await.map_err(|e| fetch_failed(e.to_string()))?;

        let digest = extract_digest(&html);
        if digest.trim().is_empty() {
            return Err(ExtractionError::EmptyContent);
        }
        debug!(url = %target.url, chars = digest.chars().count(), "extracted page digest");
        Ok(digest)
    }
}

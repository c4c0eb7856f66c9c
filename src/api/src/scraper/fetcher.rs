//! Rate-limited page fetching.
//!
//! [`Fetcher::fetch`] never fails: a navigation error or a render that
//! never shows its content signal yields a document whose status says so,
//! and extractors treat the (possibly empty) HTML as "no data".

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use super::rate_limiter::RateLimiter;

/// How a page render ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// The content signal appeared
    Ready,
    /// The wait elapsed; HTML is whatever had rendered by then
    TimedOut,
    /// Navigation or content retrieval failed; HTML is empty
    Failed,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Ready => "ready",
            RenderStatus::TimedOut => "timed-out",
            RenderStatus::Failed => "failed",
        }
    }
}

/// Page content after client-side rendering
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub url: String,
    pub html: String,
    pub status: RenderStatus,
}

impl RenderedDocument {
    pub fn empty(url: &str, status: RenderStatus) -> Self {
        Self {
            url: url.to_string(),
            html: String::new(),
            status,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}

/// Content signal to wait for: a JS expression evaluating to a boolean.
#[derive(Debug, Clone)]
pub struct ReadySignal {
    pub script: &'static str,
    pub timeout: Duration,
}

impl ReadySignal {
    pub fn new(script: &'static str, timeout: Duration) -> Self {
        Self { script, timeout }
    }
}

/// Something that can render a URL into HTML.
///
/// The headless browser is the production source; tests script one.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn render(&self, url: &str, ready: &ReadySignal) -> anyhow::Result<RenderedDocument>;
}

/// Page source paced by a [`RateLimiter`]
pub struct Fetcher<S> {
    source: S,
    limiter: RateLimiter,
}

impl<S: PageSource> Fetcher<S> {
    pub fn new(source: S, limiter: RateLimiter) -> Self {
        Self { source, limiter }
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Fetch a rendered page, waiting out the rate limit first.
    pub async fn fetch(&self, url: &str, ready: &ReadySignal) -> RenderedDocument {
        self.limiter.acquire().await;
        debug!("Fetching {}", url);

        match self.source.render(url, ready).await {
            Ok(doc) => {
                if doc.status == RenderStatus::TimedOut {
                    warn!(
                        "Content signal not seen within {:?} for {}; using partial page",
                        ready.timeout, url
                    );
                }
                doc
            }
            Err(e) => {
                warn!("Fetch failed for {}: {:#}", url, e);
                RenderedDocument::empty(url, RenderStatus::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FakeSource {
        pages: HashMap<String, anyhow::Result<RenderedDocument>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageSource for FakeSource {
        async fn render(&self, url: &str, _ready: &ReadySignal) -> anyhow::Result<RenderedDocument> {
            self.calls.lock().unwrap().push(url.to_string());
            match self.pages.get(url) {
                Some(Ok(doc)) => Ok(doc.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{}", e)),
                None => Err(anyhow::anyhow!("no such page")),
            }
        }
    }

    fn signal() -> ReadySignal {
        ReadySignal::new("true", Duration::from_secs(1))
    }

    fn fetcher(pages: Vec<(&str, anyhow::Result<RenderedDocument>)>) -> Fetcher<FakeSource> {
        let source = FakeSource {
            pages: pages.into_iter().map(|(u, d)| (u.to_string(), d)).collect(),
            calls: Mutex::new(Vec::new()),
        };
        Fetcher::new(source, RateLimiter::new(Duration::ZERO, Duration::ZERO))
    }

    #[tokio::test]
    async fn test_fetch_ready_page() {
        let doc = RenderedDocument {
            url: "a".to_string(),
            html: "<p>ok</p>".to_string(),
            status: RenderStatus::Ready,
        };
        let f = fetcher(vec![("a", Ok(doc))]);
        let got = f.fetch("a", &signal()).await;
        assert_eq!(got.status, RenderStatus::Ready);
        assert_eq!(got.html, "<p>ok</p>");
    }

    #[tokio::test]
    async fn test_fetch_error_becomes_empty_document() {
        let f = fetcher(vec![("a", Err(anyhow::anyhow!("net::ERR_TIMED_OUT")))]);
        let got = f.fetch("a", &signal()).await;
        assert_eq!(got.status, RenderStatus::Failed);
        assert!(got.is_empty());
        assert_eq!(got.url, "a");
    }

    #[tokio::test]
    async fn test_timed_out_keeps_partial_html() {
        let doc = RenderedDocument {
            url: "a".to_string(),
            html: "<div>loading</div>".to_string(),
            status: RenderStatus::TimedOut,
        };
        let f = fetcher(vec![("a", Ok(doc))]);
        let got = f.fetch("a", &signal()).await;
        assert_eq!(got.status, RenderStatus::TimedOut);
        assert!(!got.is_empty());
        assert_eq!(f.source().calls.lock().unwrap().len(), 1);
    }
}

//! Browser automation using chromiumoxide.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig as ChromeConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info};

use super::fetcher::{PageSource, ReadySignal, RenderStatus, RenderedDocument};
use crate::config::BrowserConfig;
use crate::retry::{retry, RetryPolicy};

/// How often the content signal is re-evaluated
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Headless Chrome used as the production [`PageSource`]
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
    navigation_timeout: Duration,
}

fn default_chrome_path() -> &'static str {
    if cfg!(target_os = "macos") {
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"
    } else if cfg!(target_os = "windows") {
        "C:\\Program Files\\Google\\Chrome\\Application\\chrome.exe"
    } else {
        "google-chrome"
    }
}

impl Browser {
    /// Launch Chrome, retrying a couple of times if it does not come up.
    pub async fn launch(config: &BrowserConfig, navigation_timeout: Duration) -> Result<Self> {
        let (browser, handle) =
            retry(&RetryPolicy::default(), "Browser launch", || Self::launch_once(config)).await?;
        info!("Browser ready");
        Ok(Self {
            browser,
            handle,
            navigation_timeout,
        })
    }

    async fn launch_once(
        config: &BrowserConfig,
    ) -> Result<(ChromeBrowser, tokio::task::JoinHandle<()>)> {
        let chrome_path = config
            .chrome_path
            .as_deref()
            .unwrap_or(default_chrome_path());

        let mut builder = ChromeConfig::builder()
            .chrome_executable(chrome_path)
            .no_sandbox()
            .disable_default_args()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", config.user_agent))
            .window_size(1920, 1080);
        if config.headless {
            builder = builder.arg("--headless=new");
        }
        let chrome_config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = ChromeBrowser::launch(chrome_config)
            .await
            .context("Failed to launch browser")?;

        // The handler drives the CDP connection and must keep running
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler event error: {}", e);
                }
            }
        });

        Ok((browser, handle))
    }

    /// Poll the content signal until it holds or the wait runs out.
    async fn wait_for_signal(page: &Page, ready: &ReadySignal) -> RenderStatus {
        let deadline = Instant::now() + ready.timeout;
        loop {
            if Self::signal_present(page, ready.script).await {
                return RenderStatus::Ready;
            }
            if Instant::now() >= deadline {
                return RenderStatus::TimedOut;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn signal_present(page: &Page, script: &str) -> bool {
        match page.evaluate(script).await {
            Ok(result) => result.into_value::<bool>().unwrap_or(false),
            Err(e) => {
                debug!("Content signal evaluation failed: {}", e);
                false
            }
        }
    }

    /// Close the browser
    pub async fn close(mut self) -> Result<()> {
        if let Err(e) = self.browser.close().await {
            debug!("Browser close error: {}", e);
        }
        self.handle.abort();
        Ok(())
    }
}

#[async_trait]
impl PageSource for Browser {
    async fn render(&self, url: &str, ready: &ReadySignal) -> Result<RenderedDocument> {
        // Open a blank tab first so it can be closed whatever navigation does
        let page = timeout(self.navigation_timeout, self.browser.new_page("about:blank"))
            .await
            .context("Timed out opening a tab")?
            .context("Failed to open tab")?;

        let rendered = match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {
                let status = Self::wait_for_signal(&page, ready).await;
                page.content()
                    .await
                    .context("Failed to get page content")
                    .map(|html| RenderedDocument {
                        url: url.to_string(),
                        html,
                        status,
                    })
            }
            Ok(Err(e)) => Err(anyhow::Error::new(e).context(format!("Failed to navigate to {}", url))),
            Err(_) => Err(anyhow::anyhow!(
                "Navigation timed out after {:?}",
                self.navigation_timeout
            )),
        };

        if let Err(e) = page.close().await {
            debug!("Failed to close tab for {}: {}", url, e);
        }
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a local Chrome: cargo test -- --ignored
    #[tokio::test]
    #[ignore]
    async fn test_render_closes_its_tab() {
        let browser = Browser::launch(&BrowserConfig::default(), Duration::from_secs(5))
            .await
            .unwrap();
        let before = browser.browser.pages().await.unwrap().len();
        let ready = ReadySignal::new("false", Duration::from_millis(300));

        let _ = browser.render("http://127.0.0.1:9/", &ready).await;
        let _ = browser.render("about:blank", &ready).await;

        assert_eq!(browser.browser.pages().await.unwrap().len(), before);
        browser.close().await.unwrap();
    }
}

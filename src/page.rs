use std::path::Path;
use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use tokio::time::{sleep, Instant};

use crate::config::Environment;
use crate::error::{CheckError, CheckResult};

/// Budget for best-effort visibility probes.
pub const VISIBILITY_PROBE_TIMEOUT: Duration = Duration::from_secs(1);
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// How long the network has to stay quiet before a page counts as settled.
const SETTLE_WINDOW: Duration = Duration::from_millis(500);

/// Wraps one browser page handle with a base URL and resilient,
/// explicitly-timed element lookups. Every mutating operation waits for
/// visibility first so failure points carry a selector and a timeout.
pub struct PageDriver {
    page: Page,
    base_url: String,
    default_timeout: Duration,
}

impl PageDriver {
    pub fn new(page: Page, base_url: impl Into<String>, default_timeout: Duration) -> Self {
        Self {
            page,
            base_url: base_url.into(),
            default_timeout,
        }
    }

    /// Driver rooted at the environment's full base URL.
    pub fn for_environment(page: Page, env: &Environment) -> CheckResult<Self> {
        let base_url = env.full_base_url()?;
        Ok(Self::new(page, base_url.as_str(), env.timeout()))
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Navigate to `base_url + path` and wait for the document to load and
    /// the network to settle. Times out with a `Navigation` error.
    pub async fn navigate(&self, path: &str) -> CheckResult<()> {
        let url = join_url(&self.base_url, path);
        let timeout_ms = self.default_timeout.as_millis() as u64;
        tracing::debug!("Navigating to {}", url);

        let load = async {
            self.page.goto(url.clone()).await?;
            self.page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };
        match tokio::time::timeout(self.default_timeout, load).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(CheckError::Navigation {
                    url,
                    timeout_ms,
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(CheckError::Navigation {
                    url,
                    timeout_ms,
                    reason: "load did not complete".to_string(),
                })
            }
        }

        if !self.settle(self.default_timeout).await {
            return Err(CheckError::Navigation {
                url,
                timeout_ms,
                reason: "network did not settle".to_string(),
            });
        }
        Ok(())
    }

    /// Best-effort wait for `document.readyState == "complete"` plus a quiet
    /// window in which no new resource entries appear. Returns whether the
    /// page settled within the budget; never errors.
    pub async fn settle(&self, budget: Duration) -> bool {
        let probe = "JSON.stringify({ready: document.readyState === 'complete', \
                     resources: performance.getEntriesByType('resource').length})";
        let deadline = Instant::now() + budget;
        let mut last_count: i64 = -1;
        let mut stable_since: Option<Instant> = None;

        while Instant::now() < deadline {
            let state = self
                .page
                .evaluate(probe)
                .await
                .ok()
                .and_then(|res| res.value().and_then(|v| v.as_str().map(str::to_string)))
                .and_then(|raw| serde_json::from_str::<serde_json::Value>(&raw).ok());
            if let Some(state) = state {
                let ready = state["ready"].as_bool().unwrap_or(false);
                let count = state["resources"].as_i64().unwrap_or(0);
                if ready && count == last_count {
                    match stable_since {
                        Some(since) if since.elapsed() >= SETTLE_WINDOW => return true,
                        Some(_) => {}
                        None => stable_since = Some(Instant::now()),
                    }
                } else {
                    stable_since = None;
                }
                last_count = count;
            }
            sleep(POLL_INTERVAL).await;
        }
        false
    }

    /// Wait until an element matching `selector` is visible, polling a JS
    /// probe, then return the element handle.
    pub async fn wait_for_element(&self, selector: &str) -> CheckResult<Element> {
        self.wait_for_element_within(selector, self.default_timeout)
            .await
    }

    pub async fn wait_for_element_within(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> CheckResult<Element> {
        let probe = visibility_probe(selector);
        let deadline = Instant::now() + timeout;
        loop {
            let visible = self
                .page
                .evaluate(probe.clone())
                .await
                .ok()
                .and_then(|res| res.value().and_then(serde_json::Value::as_bool))
                .unwrap_or(false);
            if visible {
                if let Ok(element) = self.page.find_element(selector).await {
                    return Ok(element);
                }
            }
            if Instant::now() >= deadline {
                return Err(CheckError::ElementNotFound {
                    selector: selector.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    pub async fn click(&self, selector: &str) -> CheckResult<()> {
        let element = self.wait_for_element(selector).await?;
        element
            .click()
            .await
            .map_err(|e| CheckError::Browser(format!("click on '{}' failed: {}", selector, e)))?;
        Ok(())
    }

    /// Clear the field matching `selector`, then type `value` into it.
    pub async fn fill(&self, selector: &str, value: &str) -> CheckResult<()> {
        let element = self.wait_for_element(selector).await?;
        element
            .click()
            .await
            .map_err(|e| CheckError::Browser(format!("focus on '{}' failed: {}", selector, e)))?;
        let quoted = js_string(selector);
        let clear = format!(
            "(() => {{ const el = document.querySelector({quoted}); if (el) el.value = ''; }})()"
        );
        self.page
            .evaluate(clear)
            .await
            .map_err(|e| CheckError::Browser(format!("clearing '{}' failed: {}", selector, e)))?;
        element.type_str(value).await.map_err(|e| {
            CheckError::Browser(format!("typing into '{}' failed: {}", selector, e))
        })?;
        Ok(())
    }

    /// Trimmed text content, empty string when the element has none.
    pub async fn get_text(&self, selector: &str) -> CheckResult<String> {
        let element = self.wait_for_element(selector).await?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| CheckError::Browser(format!("reading '{}' failed: {}", selector, e)))?;
        Ok(text.map(|t| t.trim().to_string()).unwrap_or_default())
    }

    /// Best-effort probe with a 1s budget. Never errors.
    pub async fn is_visible(&self, selector: &str) -> bool {
        self.is_visible_within(selector, VISIBILITY_PROBE_TIMEOUT).await
    }

    pub async fn is_visible_within(&self, selector: &str, timeout: Duration) -> bool {
        self.wait_for_element_within(selector, timeout).await.is_ok()
    }

    pub async fn current_url(&self) -> CheckResult<String> {
        let url = self
            .page
            .url()
            .await
            .map_err(|e| CheckError::Browser(format!("reading page URL failed: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    /// Evaluate a script and return its JSON value. Scripts that produce
    /// structured data should `JSON.stringify` and let the caller parse.
    pub async fn evaluate_json(&self, script: &str) -> CheckResult<serde_json::Value> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| CheckError::Browser(format!("script evaluation failed: {}", e)))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    /// Full-page PNG, written as a side-channel artifact.
    pub async fn save_screenshot(&self, path: &Path) -> CheckResult<()> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();
        self.page
            .save_screenshot(params, path)
            .await
            .map_err(|e| CheckError::Browser(format!("screenshot failed: {}", e)))?;
        tracing::info!("Saved screenshot to {}", path.display());
        Ok(())
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    // Absolute targets pass through untouched.
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, path)
    }
}

/// JSON string-escape a selector for embedding in a JS snippet.
fn js_string(selector: &str) -> String {
    serde_json::Value::String(selector.to_string()).to_string()
}

fn visibility_probe(selector: &str) -> String {
    let quoted = js_string(selector);
    format!(
        "(() => {{ const el = document.querySelector({quoted}); \
         if (!el) return false; \
         const rect = el.getBoundingClientRect(); \
         const style = window.getComputedStyle(el); \
         return rect.width > 0 && rect.height > 0 && \
                style.visibility !== 'hidden' && style.display !== 'none'; }})()"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("https://x.com/app", "/login"), "https://x.com/app/login");
        assert_eq!(join_url("https://x.com/app/", "login"), "https://x.com/app/login");
        assert_eq!(join_url("https://x.com/app/", "/login"), "https://x.com/app/login");
        assert_eq!(join_url("https://x.com/app", ""), "https://x.com/app");
        assert_eq!(join_url("https://x.com/app", "/"), "https://x.com/app");
    }

    #[test]
    fn join_url_passes_absolute_targets_through() {
        assert_eq!(
            join_url("https://x.com", "https://github.com/org/repo/pulls"),
            "https://github.com/org/repo/pulls"
        );
    }

    #[test]
    fn visibility_probe_escapes_quoted_selectors() {
        let probe = visibility_probe("button[type='submit'], input[type=\"submit\"]");
        assert!(probe.contains(r#"input[type=\"submit\"]"#));
        assert!(!probe.contains("querySelector(button"));
    }
}

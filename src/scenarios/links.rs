//! Scenario 2: collect every anchor on the home page and verify each target
//! answers with a non-error status. Status checks go straight over HTTP,
//! bypassing the renderer.

use std::collections::HashSet;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::browser::BrowserSession;
use crate::error::{CheckError, CheckResult};
use crate::page::PageDriver;
use crate::report::{ScenarioRecorder, ScenarioReport};
use crate::scenarios::ScenarioContext;

pub const NAME: &str = "link-status";

/// One anchor found on the page; lives only for this scenario run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    pub url: String,
    pub display_text: String,
    pub is_internal: bool,
}

const ANCHOR_SCAN_JS: &str = r#"(() => {
  const anchors = Array.from(document.querySelectorAll('a[href]'));
  const records = anchors.map(a => ({
    url: a.href,
    displayText: (a.textContent || '').trim(),
    isInternal: a.host === window.location.host,
  })).filter(r => r.url.startsWith('http'));
  return JSON.stringify(records);
})()"#;

pub async fn run(ctx: &ScenarioContext, session: &BrowserSession) -> CheckResult<ScenarioReport> {
    let mut rec = ScenarioRecorder::new(NAME);

    let page = session.new_page().await?;
    let driver = PageDriver::for_environment(page, &ctx.env)?;
    ctx.retry
        .run("home page navigation", || driver.navigate("/"))
        .await?;

    let records = scan_anchors(&driver).await?;
    if records.is_empty() {
        rec.fail("no anchors found on the home page");
        return Ok(rec.finish());
    }
    let (internal, external): (Vec<_>, Vec<_>) =
        records.iter().partition(|r| r.is_internal);
    rec.note(format!(
        "found {} links ({} internal, {} external)",
        records.len(),
        internal.len(),
        external.len()
    ));

    let mut seen = HashSet::new();
    for record in &records {
        if !seen.insert(record.url.as_str()) {
            continue;
        }
        let outcome = ctx
            .retry
            .run("link status check", || check_status(ctx, &record.url))
            .await;
        match outcome {
            Ok(status) if status.as_u16() < 400 => {
                tracing::debug!("{} -> {}", record.url, status);
            }
            Ok(status) => {
                rec.fail(format!(
                    "{} ('{}') returned {}",
                    record.url, record.display_text, status
                ));
            }
            Err(e) => {
                rec.fail(format!(
                    "{} ('{}') unreachable: {}",
                    record.url, record.display_text, e
                ));
            }
        }
    }

    Ok(rec.finish())
}

async fn scan_anchors(driver: &PageDriver) -> CheckResult<Vec<LinkRecord>> {
    let raw = driver.evaluate_json(ANCHOR_SCAN_JS).await?;
    let Some(json) = raw.as_str() else {
        return Ok(Vec::new());
    };
    serde_json::from_str(json)
        .map_err(|e| CheckError::Assertion(format!("anchor scan returned invalid JSON: {}", e)))
}

/// HEAD first; some servers reject it, so fall back to GET on 405.
async fn check_status(ctx: &ScenarioContext, url: &str) -> CheckResult<StatusCode> {
    let response = ctx.http.head(url).send().await?;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED {
        let response = ctx.http.get(url).send().await?;
        return Ok(response.status());
    }
    Ok(response.status())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_records_deserialize_from_scan_shape() {
        let json = r#"[
            {"url": "https://shop.example.com/about", "displayText": "About us", "isInternal": true},
            {"url": "https://github.com/example", "displayText": "", "isInternal": false}
        ]"#;
        let records: Vec<LinkRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_internal);
        assert_eq!(records[0].display_text, "About us");
        assert!(!records[1].is_internal);
    }
}

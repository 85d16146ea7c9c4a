//! Scenario 4: scrape the configured repository's open pull requests from
//! its hosting site and write them to CSV.

use crate::browser::BrowserSession;
use crate::error::{CheckError, CheckResult};
use crate::page::PageDriver;
use crate::report::{write_pull_request_csv, PullRequestRecord, ScenarioRecorder, ScenarioReport};
use crate::scenarios::ScenarioContext;

pub const NAME: &str = "pull-request-scrape";

/// Row markup variants seen across the hosting site's list redesigns.
const PR_ROW_SELECTOR: &str = ".js-issue-row, [data-testid='issue-row'], [data-testid='list-row']";

const PR_SCAN_JS: &str = r#"(() => {
  const rows = Array.from(document.querySelectorAll(
    '.js-issue-row, [data-testid="issue-row"], [data-testid="list-row"]'));
  const records = rows.map(row => {
    const link = row.querySelector(
      'a.js-navigation-open, a[data-hovercard-type="pull_request"], a[href*="/pull/"]');
    const author = row.querySelector(
      'a.author, [data-hovercard-type="user"], [data-testid="issue-author"]');
    const time = row.querySelector('relative-time, time');
    return {
      title: link ? link.textContent.trim() : '',
      author: author ? author.textContent.trim() : '',
      createdDate: time ? (time.getAttribute('datetime') || time.textContent.trim()) : '',
    };
  }).filter(r => r.title.length > 0);
  return JSON.stringify(records);
})()"#;

pub async fn run(ctx: &ScenarioContext, session: &BrowserSession) -> CheckResult<ScenarioReport> {
    let mut rec = ScenarioRecorder::new(NAME);

    let repo = ctx.github.example_repo.trim_end_matches('/').to_string();
    let page = session.new_page().await?;
    let driver = PageDriver::new(page, repo.clone(), ctx.env.timeout());

    ctx.retry
        .run("pull request list navigation", || driver.navigate("/pulls"))
        .await?;

    if let Err(e) = driver.wait_for_element(PR_ROW_SELECTOR).await {
        tracing::warn!("Pull request rows did not appear: {}", e);
    }

    let records = scan_pull_requests(&driver).await?;
    if records.is_empty() {
        rec.fail(format!("no pull requests scraped from {}/pulls", repo));
        return Ok(rec.finish());
    }

    let path = write_pull_request_csv(&ctx.output_dir, &records)?;
    rec.note(format!(
        "wrote {} pull request(s) to {}",
        records.len(),
        path.display()
    ));

    Ok(rec.finish())
}

async fn scan_pull_requests(driver: &PageDriver) -> CheckResult<Vec<PullRequestRecord>> {
    let raw = driver.evaluate_json(PR_SCAN_JS).await?;
    let Some(json) = raw.as_str() else {
        return Ok(Vec::new());
    };
    serde_json::from_str(json).map_err(|e| {
        CheckError::Assertion(format!("pull request scan returned invalid JSON: {}", e))
    })
}

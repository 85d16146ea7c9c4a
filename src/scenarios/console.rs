//! Scenario 1: walk the home and about pages and assert nothing landed in
//! the console as an error or an uncaught exception along the way.

use std::time::Duration;

use crate::browser::{BrowserSession, ConsoleCollector};
use crate::error::CheckResult;
use crate::page::PageDriver;
use crate::report::{ScenarioRecorder, ScenarioReport};
use crate::scenarios::ScenarioContext;
use crate::views::{AboutPage, HomePage, PageView};

pub const NAME: &str = "console-errors";

/// Extra time given to late-loading scripts after a page settles.
const GRACE_PERIOD: Duration = Duration::from_secs(2);

pub async fn run(ctx: &ScenarioContext, session: &BrowserSession) -> CheckResult<ScenarioReport> {
    let mut rec = ScenarioRecorder::new(NAME);

    let page = session.new_page().await?;
    // Attach before navigating so load-time errors are captured.
    let collector = ConsoleCollector::attach(&page).await?;
    let driver = PageDriver::for_environment(page, &ctx.env)?;

    let home = HomePage::new(&driver);
    ctx.retry
        .run("home page navigation", || home.open())
        .await?;
    if home.has_essential_elements().await {
        let heading = home.main_heading().await.unwrap_or_default();
        rec.note(format!("home page rendered ('{}')", heading));
    } else {
        rec.fail("home page is missing its heading, navigation, or main content");
    }

    // Walk to the about page and back; its scripts get to report too.
    let about = AboutPage::new(&driver);
    let reached_about = if home.has_about_link().await {
        home.go_to_about().await.is_ok()
    } else {
        // No about link rendered; go direct.
        about.open().await.is_ok()
    };
    if reached_about {
        driver.settle(GRACE_PERIOD).await;
        if about.has_essential_elements().await && about.has_navigation().await {
            let content_len = about.main_content().await.unwrap_or_default().len();
            rec.note(format!(
                "about page rendered ('{}', {} chars of content)",
                about.page_heading().await.unwrap_or_default(),
                content_len
            ));
        } else {
            rec.note("about page is missing expected structure");
        }
        if about.go_back_to_home().await.is_err() {
            rec.note("no home link on the about page");
        }
    } else {
        rec.note("about page unreachable, skipping that leg");
    }
    // Best effort; a page that keeps polling never settles and that is fine.
    driver.settle(GRACE_PERIOD).await;

    let errors = collector.errors().await;
    if errors.is_empty() {
        rec.note(format!(
            "no console errors ({} console messages total)",
            collector.all().await.len()
        ));
    } else {
        let shot = ctx.artifact_path("console_errors.png");
        if let Err(e) = driver.save_screenshot(&shot).await {
            tracing::warn!("Could not capture failure screenshot: {}", e);
        }
        for message in &errors {
            rec.fail(format!("console {}: {}", message.level, message.text));
        }
    }

    Ok(rec.finish())
}

//! Scenario 3: log in with the configured demo credentials and judge the
//! outcome with the multi-signal success policy.

use crate::browser::BrowserSession;
use crate::error::CheckResult;
use crate::page::PageDriver;
use crate::report::{ScenarioRecorder, ScenarioReport};
use crate::scenarios::ScenarioContext;
use crate::views::{HomePage, LoginPage, LoginSuccessPolicy, PageView};

pub const NAME: &str = "login-flow";

pub async fn run(ctx: &ScenarioContext, session: &BrowserSession) -> CheckResult<ScenarioReport> {
    let mut rec = ScenarioRecorder::new(NAME);
    let credentials = ctx.demo_credentials()?.clone();

    let page = session.new_page().await?;
    let driver = PageDriver::for_environment(page, &ctx.env)?;
    let home = HomePage::new(&driver);
    let login_page = LoginPage::new(&driver);

    // Enter the way a user would when the home page offers a login link;
    // go straight to the form otherwise.
    ctx.retry
        .run("home page navigation", || home.open())
        .await?;
    if home.has_login_link().await {
        home.go_to_login().await?;
    } else {
        ctx.retry
            .run("login page navigation", || login_page.open())
            .await?;
    }

    if !login_page.has_essential_elements().await {
        let shot = ctx.artifact_path("login_form_missing.png");
        if let Err(e) = driver.save_screenshot(&shot).await {
            tracing::warn!("Could not capture failure screenshot: {}", e);
        }
        rec.fail("login form is missing a username, password, or submit control");
        return Ok(rec.finish());
    }
    rec.note("login form rendered with all expected controls");

    login_page
        .login(&credentials.username, &credentials.password)
        .await?;

    let policy = LoginSuccessPolicy::default();
    if login_page.is_login_successful(&policy).await {
        rec.note(format!(
            "login as '{}' succeeded, landed on {}",
            credentials.username,
            driver.current_url().await.unwrap_or_default()
        ));
    } else {
        let message = login_page.error_message().await;
        let shot = ctx.artifact_path("login_failure.png");
        if let Err(e) = driver.save_screenshot(&shot).await {
            tracing::warn!("Could not capture failure screenshot: {}", e);
        }
        if message.is_empty() {
            rec.fail(format!(
                "login did not leave the login page within {:?}",
                policy.timeout
            ));
        } else {
            rec.fail(format!("login rejected: {}", message));
        }
    }

    Ok(rec.finish())
}

//! Page-specific vocabularies over the driver primitives. Views are
//! stateless beyond the borrowed driver; selector sets are CSS unions
//! covering the markup variants seen in the wild.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::{sleep, Instant};

use crate::error::CheckResult;
use crate::page::PageDriver;

/// Shared surface of every page view.
#[async_trait]
pub trait PageView {
    fn driver(&self) -> &PageDriver;
    /// AND over the elements without which the page is not itself.
    async fn has_essential_elements(&self) -> bool;
}

const NAV: &str = "nav, header nav, [role='navigation']";
const MAIN_CONTENT: &str = "main, #content, .main-content";

pub struct HomePage<'a> {
    driver: &'a PageDriver,
}

impl<'a> HomePage<'a> {
    const HEADING: &'static str = "h1, .hero h2, [data-testid='main-heading']";
    const LOGIN_LINK: &'static str = "a[href*='login'], [data-testid='login-link']";
    const ABOUT_LINK: &'static str = "a[href*='about'], [data-testid='about-link']";

    pub fn new(driver: &'a PageDriver) -> Self {
        Self { driver }
    }

    pub async fn open(&self) -> CheckResult<()> {
        self.driver.navigate("/").await
    }

    pub async fn main_heading(&self) -> CheckResult<String> {
        self.driver.get_text(Self::HEADING).await
    }

    pub async fn go_to_login(&self) -> CheckResult<()> {
        self.driver.click(Self::LOGIN_LINK).await
    }

    pub async fn go_to_about(&self) -> CheckResult<()> {
        self.driver.click(Self::ABOUT_LINK).await
    }

    /// Quick probes so callers can fall back to direct navigation instead
    /// of paying the full click timeout for a link that is not there.
    pub async fn has_login_link(&self) -> bool {
        self.driver.is_visible(Self::LOGIN_LINK).await
    }

    pub async fn has_about_link(&self) -> bool {
        self.driver.is_visible(Self::ABOUT_LINK).await
    }
}

#[async_trait]
impl PageView for HomePage<'_> {
    fn driver(&self) -> &PageDriver {
        self.driver
    }

    async fn has_essential_elements(&self) -> bool {
        self.driver.is_visible(Self::HEADING).await
            && self.driver.is_visible(NAV).await
            && self.driver.is_visible(MAIN_CONTENT).await
    }
}

/// How login success is judged: independent signals polled until at least
/// `threshold` fire, bounded by `timeout`. The heuristic is fuzzy by nature,
/// so both knobs are explicit rather than baked in.
#[derive(Debug, Clone)]
pub struct LoginSuccessPolicy {
    pub threshold: usize,
    pub timeout: Duration,
    pub login_url_pattern: Regex,
}

static DEFAULT_LOGIN_URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("login").expect("literal pattern compiles"));

impl Default for LoginSuccessPolicy {
    fn default() -> Self {
        Self {
            threshold: 2,
            timeout: Duration::from_secs(5),
            login_url_pattern: DEFAULT_LOGIN_URL_PATTERN.clone(),
        }
    }
}

pub struct LoginPage<'a> {
    driver: &'a PageDriver,
}

impl<'a> LoginPage<'a> {
    const USERNAME: &'static str =
        "input[name='username'], input#username, input[name='user'], input[type='email']";
    const PASSWORD: &'static str = "input[type='password'], input[name='password']";
    const SUBMIT: &'static str = "button[type='submit'], input[type='submit'], form button";
    const ERROR_BANNER: &'static str = ".error, .alert-danger, [role='alert'], .login-error";
    const ACCOUNT_MENU: &'static str =
        "a[href*='logout'], .account-menu, [data-testid='user-menu']";

    /// Budget for the per-signal probes inside the success poll; kept short
    /// so one poll round stays well under the policy timeout.
    const SIGNAL_PROBE: Duration = Duration::from_millis(250);

    pub fn new(driver: &'a PageDriver) -> Self {
        Self { driver }
    }

    pub async fn open(&self) -> CheckResult<()> {
        self.driver.navigate("/login").await
    }

    /// Fill the form and submit. Fields the page does not render are
    /// skipped rather than failed on.
    pub async fn login(&self, username: &str, password: &str) -> CheckResult<()> {
        if self.driver.is_visible(Self::USERNAME).await {
            self.driver.fill(Self::USERNAME, username).await?;
        } else {
            tracing::warn!("Login page has no username field, skipping");
        }
        if self.driver.is_visible(Self::PASSWORD).await {
            self.driver.fill(Self::PASSWORD, password).await?;
        } else {
            tracing::warn!("Login page has no password field, skipping");
        }
        if self.driver.is_visible(Self::SUBMIT).await {
            self.driver.click(Self::SUBMIT).await?;
        } else {
            tracing::warn!("Login page has no submit control, skipping");
        }
        Ok(())
    }

    pub async fn has_form_elements(&self) -> bool {
        self.driver.is_visible(Self::USERNAME).await
            && self.driver.is_visible(Self::PASSWORD).await
            && self.driver.is_visible(Self::SUBMIT).await
    }

    /// Poll the signal set until the policy threshold is met or the budget
    /// runs out. An error banner ends the poll early with `false`.
    ///
    /// Signals: the URL no longer matches the login pattern, the account
    /// affordance is visible, the password field is gone, the submit
    /// control is gone.
    pub async fn is_login_successful(&self, policy: &LoginSuccessPolicy) -> bool {
        let deadline = Instant::now() + policy.timeout;
        loop {
            if self
                .driver
                .is_visible_within(Self::ERROR_BANNER, Self::SIGNAL_PROBE)
                .await
            {
                return false;
            }

            let url = self.driver.current_url().await.unwrap_or_default();
            let left_login_page = !url.is_empty() && !policy.login_url_pattern.is_match(&url);

            let mut fired = usize::from(left_login_page);
            if self
                .driver
                .is_visible_within(Self::ACCOUNT_MENU, Self::SIGNAL_PROBE)
                .await
            {
                fired += 1;
            }
            if !self
                .driver
                .is_visible_within(Self::PASSWORD, Self::SIGNAL_PROBE)
                .await
            {
                fired += 1;
            }
            if !self
                .driver
                .is_visible_within(Self::SUBMIT, Self::SIGNAL_PROBE)
                .await
            {
                fired += 1;
            }

            // Whatever else fires, staying on the login page is not success.
            if left_login_page && fired >= policy.threshold {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(Duration::from_millis(200)).await;
        }
    }

    /// Text of the error banner, empty when none is shown.
    pub async fn error_message(&self) -> String {
        if self.driver.is_visible(Self::ERROR_BANNER).await {
            self.driver
                .get_text(Self::ERROR_BANNER)
                .await
                .unwrap_or_default()
        } else {
            String::new()
        }
    }
}

#[async_trait]
impl PageView for LoginPage<'_> {
    fn driver(&self) -> &PageDriver {
        self.driver
    }

    async fn has_essential_elements(&self) -> bool {
        self.has_form_elements().await
    }
}

pub struct AboutPage<'a> {
    driver: &'a PageDriver,
}

impl<'a> AboutPage<'a> {
    const HEADING: &'static str = "h1, h2, .page-title";
    const CONTENT: &'static str = "main, article, .about-content, #content";
    const HOME_LINK: &'static str = "a[href='/'], a[href*='home'], .navbar-brand";

    pub fn new(driver: &'a PageDriver) -> Self {
        Self { driver }
    }

    pub async fn open(&self) -> CheckResult<()> {
        self.driver.navigate("/about").await
    }

    pub async fn page_heading(&self) -> CheckResult<String> {
        self.driver.get_text(Self::HEADING).await
    }

    pub async fn main_content(&self) -> CheckResult<String> {
        self.driver.get_text(Self::CONTENT).await
    }

    pub async fn go_back_to_home(&self) -> CheckResult<()> {
        self.driver.click(Self::HOME_LINK).await
    }

    pub async fn has_navigation(&self) -> bool {
        self.driver.is_visible(NAV).await
    }
}

#[async_trait]
impl PageView for AboutPage<'_> {
    fn driver(&self) -> &PageDriver {
        self.driver
    }

    async fn has_essential_elements(&self) -> bool {
        self.driver.is_visible(Self::HEADING).await
            && self.driver.is_visible(Self::CONTENT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_values() {
        let policy = LoginSuccessPolicy::default();
        assert_eq!(policy.threshold, 2);
        assert_eq!(policy.timeout, Duration::from_secs(5));
        assert!(policy.login_url_pattern.is_match("https://x.com/shop/login"));
        assert!(!policy.login_url_pattern.is_match("https://x.com/shop/account"));
    }

    #[test]
    fn custom_policy_pattern() {
        let policy = LoginSuccessPolicy {
            threshold: 3,
            timeout: Duration::from_secs(2),
            login_url_pattern: Regex::new(r"/(login|signin)\b").unwrap(),
        };
        assert!(policy.login_url_pattern.is_match("https://x.com/signin?next=/"));
    }
}

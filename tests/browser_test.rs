use std::time::Duration;

use shopcheck::config::Environment;
use shopcheck::retry::{Backoff, RetryPolicy};

#[tokio::test]
async fn test_browser_config_builds() {
    // Launching the actual browser is left out of CI to avoid missing
    // Chromium installs and sandbox issues; the configuration path the
    // session uses is what gets verified here.
    let config = chromiumoxide::browser::BrowserConfig::builder().build();
    assert!(config.is_ok(), "headless browser config should build");
}

#[tokio::test]
async fn test_retry_policy_is_bounded() {
    let policy = RetryPolicy {
        max_attempts: 2,
        backoff: Backoff::Fixed(Duration::from_millis(1)),
    };
    let started = std::time::Instant::now();
    let result: shopcheck::error::CheckResult<()> = policy
        .run("unreachable host", || async {
            Err(shopcheck::error::CheckError::Navigation {
                url: "http://127.0.0.1:1".into(),
                timeout_ms: 1,
                reason: "refused".into(),
            })
        })
        .await;
    assert!(result.is_err());
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[test]
fn test_environment_base_url_for_driver() {
    let env = Environment {
        name: Some("Staging".into()),
        base_url: "https://staging.example.com/".into(),
        base_path: "shop".into(),
        timeout_ms: Some(5_000),
        retries: None,
    };
    let url = env.full_base_url().unwrap();
    assert_eq!(url.as_str(), "https://staging.example.com/shop");
    assert_eq!(env.timeout(), Duration::from_millis(5_000));
}

//! The four check scenarios. Each obtains its pages from the shared
//! browser session, drives the page views, and returns a report; scenarios
//! share nothing mutable with each other.

pub mod console;
pub mod links;
pub mod login;
pub mod pulls;

use std::path::PathBuf;

use crate::config::{AppConfig, Credentials, Environment, GithubConfig};
use crate::error::{CheckError, CheckResult};
use crate::retry::RetryPolicy;

/// Credential set the login scenario uses.
pub const DEMO_CREDENTIAL_SET: &str = "demo";

/// Read-only context handed to every scenario: the resolved environment,
/// shared HTTP client, retry policy, and where artifacts go.
pub struct ScenarioContext {
    pub env: Environment,
    pub credentials: Option<Credentials>,
    pub github: GithubConfig,
    pub http: reqwest::Client,
    pub retry: RetryPolicy,
    pub output_dir: PathBuf,
}

impl ScenarioContext {
    pub fn new(config: &AppConfig, env: &Environment, output_dir: PathBuf) -> CheckResult<Self> {
        std::fs::create_dir_all(&output_dir)?;
        let http = reqwest::Client::builder()
            .timeout(env.timeout())
            .user_agent(concat!("shopcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let retry = match env.retries {
            Some(attempts) => RetryPolicy::with_attempts(attempts),
            None => RetryPolicy::default(),
        };
        Ok(Self {
            env: env.clone(),
            credentials: config.credentials(DEMO_CREDENTIAL_SET).cloned(),
            github: config.github.clone(),
            http,
            retry,
            output_dir,
        })
    }

    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn demo_credentials(&self) -> CheckResult<&Credentials> {
        self.credentials.as_ref().ok_or_else(|| {
            CheckError::Configuration(format!(
                "no '{}' credential set configured",
                DEMO_CREDENTIAL_SET
            ))
        })
    }
}

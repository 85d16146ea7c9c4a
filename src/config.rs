use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{CheckError, CheckResult};

/// Environment picked when no override names a configured one.
pub const DEFAULT_ENV_NAME: &str = "production";
/// Dedicated override naming the target environment.
pub const TEST_ENV_VAR: &str = "TEST_ENV";
/// Generic runtime-mode variable, consulted after the dedicated one.
pub const APP_ENV_VAR: &str = "APP_ENV";

const CONFIG_FILE_NAME: &str = "shopcheck.json";
const CONFIG_PATH_VAR: &str = "SHOPCHECK_CONFIG";

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// One target deployment of the site under test. Immutable once loaded.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Display name; absence is tolerated with a warning.
    #[serde(default)]
    pub name: Option<String>,
    pub base_url: String,
    pub base_path: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub retries: Option<u32>,
}

impl Environment {
    /// `baseUrl` with the trailing slash stripped, joined to `basePath` with
    /// a leading slash enforced. Slash placement in the config does not
    /// change the result.
    pub fn full_base_url(&self) -> CheckResult<Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = self.base_path.trim_start_matches('/');
        let joined = if path.is_empty() {
            base.to_string()
        } else {
            format!("{}/{}", base, path)
        };
        Url::parse(&joined).map_err(|e| {
            CheckError::Configuration(format!("invalid full base URL '{}': {}", joined, e))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GithubConfig {
    pub example_repo: String,
}

/// Raw shape of the JSON document. `environments` stays a `serde_json::Map`
/// here so document order survives (the `preserve_order` feature backs it
/// with an ordered map); entries are converted one by one in `load`, which
/// also gives per-entry error context.
#[derive(Debug, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    environments: serde_json::Map<String, serde_json::Value>,
    github: GithubConfig,
    #[serde(default)]
    credentials: HashMap<String, Credentials>,
}

/// The parsed configuration document. Constructed once at process start and
/// handed by reference to every scenario; never mutated.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Environments in document order. First entry is the fallback target.
    pub environments: Vec<(String, Environment)>,
    pub github: GithubConfig,
    pub credentials: HashMap<String, Credentials>,
}

impl AppConfig {
    /// Load and validate the configuration document.
    ///
    /// Candidate locations, first hit wins: an explicit `--config` path,
    /// `shopcheck.json` in the working directory, the `SHOPCHECK_CONFIG`
    /// variable, then the user config and home directories.
    pub fn load(path_override: Option<&Path>) -> CheckResult<Self> {
        let path = Self::locate(path_override)?;
        let content = fs::read_to_string(&path).map_err(|e| {
            CheckError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        let doc: ConfigDocument = serde_json::from_str(&content).map_err(|e| {
            CheckError::Configuration(format!("malformed config at {}: {}", path.display(), e))
        })?;
        if doc.environments.is_empty() {
            return Err(CheckError::Configuration(format!(
                "no environments defined in {}",
                path.display()
            )));
        }

        let mut environments = Vec::with_capacity(doc.environments.len());
        for (key, value) in doc.environments {
            let env: Environment = serde_json::from_value(value)
                .map_err(|e| CheckError::Configuration(format!("environment '{}': {}", key, e)))?;
            validate_environment(&key, &env)?;
            environments.push((key, env));
        }

        tracing::info!("Loaded config from {}", path.display());
        Ok(Self {
            environments,
            github: doc.github,
            credentials: doc.credentials,
        })
    }

    fn locate(path_override: Option<&Path>) -> CheckResult<PathBuf> {
        if let Some(path) = path_override {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(CheckError::Configuration(format!(
                "configuration document not found at {}",
                path.display()
            )));
        }

        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Ok(from_env) = std::env::var(CONFIG_PATH_VAR) {
            candidates.push(PathBuf::from(from_env));
        }
        candidates.push(
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("shopcheck")
                .join(CONFIG_FILE_NAME),
        );
        candidates.push(
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".shopcheck")
                .join(CONFIG_FILE_NAME),
        );

        for path in candidates {
            if path.exists() {
                return Ok(path);
            }
        }
        Err(CheckError::Configuration(format!(
            "no configuration document found (looked for {} in the working \
             directory, ${}, and the user config directories)",
            CONFIG_FILE_NAME, CONFIG_PATH_VAR
        )))
    }

    pub fn get(&self, name: &str) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, env)| env)
    }

    pub fn credentials(&self, set: &str) -> Option<&Credentials> {
        self.credentials.get(set)
    }

    /// Resolve the target environment for this run, first match wins:
    /// CLI override, `TEST_ENV`, `APP_ENV`, the hard-coded default, then the
    /// first environment defined in the document (with a warning). A source
    /// naming an unconfigured environment falls through to the next one.
    pub fn resolve(&self, cli_override: Option<&str>) -> CheckResult<&Environment> {
        self.resolve_with(
            cli_override,
            std::env::var(TEST_ENV_VAR).ok().as_deref(),
            std::env::var(APP_ENV_VAR).ok().as_deref(),
        )
    }

    /// Resolution with explicit override sources; `resolve` feeds it the
    /// process environment. Split out so precedence is testable without
    /// mutating global state.
    pub fn resolve_with(
        &self,
        cli_override: Option<&str>,
        dedicated: Option<&str>,
        generic: Option<&str>,
    ) -> CheckResult<&Environment> {
        let sources = [
            (cli_override, "--env"),
            (dedicated, TEST_ENV_VAR),
            (generic, APP_ENV_VAR),
            (Some(DEFAULT_ENV_NAME), "default"),
        ];
        for (candidate, source) in sources {
            let Some(name) = candidate.map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };
            if let Some(env) = self.get(name) {
                tracing::info!("Resolved target environment '{}' (via {})", name, source);
                return Ok(env);
            }
        }

        let (name, env) = self.environments.first().ok_or_else(|| {
            CheckError::Configuration("configuration defines no environments".to_string())
        })?;
        tracing::warn!(
            "No override named a configured environment, falling back to first defined: '{}'",
            name
        );
        Ok(env)
    }
}

fn validate_environment(key: &str, env: &Environment) -> CheckResult<()> {
    if env.base_url.trim().is_empty() {
        return Err(CheckError::Configuration(format!(
            "environment '{}' has an empty baseUrl",
            key
        )));
    }
    Url::parse(&env.base_url).map_err(|e| {
        CheckError::Configuration(format!(
            "environment '{}' has an invalid baseUrl '{}': {}",
            key, env.base_url, e
        ))
    })?;
    if env.base_path.trim().is_empty() {
        return Err(CheckError::Configuration(format!(
            "environment '{}' has an empty basePath",
            key
        )));
    }
    if env.name.is_none() {
        tracing::warn!("Environment '{}' has no display name", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(base_url: &str, base_path: &str) -> Environment {
        Environment {
            name: Some("Test".into()),
            base_url: base_url.into(),
            base_path: base_path.into(),
            timeout_ms: None,
            retries: None,
        }
    }

    fn sample_config() -> AppConfig {
        let doc = r#"{
            "environments": {
                "local": {"name": "Local", "baseUrl": "http://localhost:3000", "basePath": "/"},
                "staging": {"name": "Staging", "baseUrl": "https://staging.example.com", "basePath": "/shop"},
                "production": {"name": "Production", "baseUrl": "https://example.com", "basePath": "/shop", "timeoutMs": 45000, "retries": 2}
            },
            "github": {"exampleRepo": "https://github.com/microsoft/playwright"},
            "credentials": {"demo": {"username": "demouser", "password": "fashion123"}}
        }"#;
        let parsed: ConfigDocument = serde_json::from_str(doc).unwrap();
        let environments = parsed
            .environments
            .into_iter()
            .map(|(k, v)| (k, serde_json::from_value(v).unwrap()))
            .collect();
        AppConfig {
            environments,
            github: parsed.github,
            credentials: parsed.credentials,
        }
    }

    #[test]
    fn full_base_url_slash_handling_is_idempotent() {
        let a = env("https://x.com/", "app").full_base_url().unwrap();
        let b = env("https://x.com", "/app").full_base_url().unwrap();
        let c = env("https://x.com/", "/app").full_base_url().unwrap();
        assert_eq!(a.as_str(), "https://x.com/app");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn full_base_url_rejects_garbage() {
        let err = env("not a url", "/app").full_base_url().unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn cli_override_wins_over_everything() {
        let config = sample_config();
        let resolved = config
            .resolve_with(Some("staging"), Some("local"), Some("production"))
            .unwrap();
        assert_eq!(resolved.name.as_deref(), Some("Staging"));
    }

    #[test]
    fn dedicated_var_wins_over_generic() {
        let config = sample_config();
        let resolved = config
            .resolve_with(None, Some("staging"), Some("local"))
            .unwrap();
        assert_eq!(resolved.name.as_deref(), Some("Staging"));
    }

    #[test]
    fn default_is_production() {
        let config = sample_config();
        let resolved = config.resolve_with(None, None, None).unwrap();
        assert_eq!(resolved.name.as_deref(), Some("Production"));
    }

    #[test]
    fn unknown_override_falls_through() {
        let config = sample_config();
        let resolved = config
            .resolve_with(Some("nonsense"), None, Some("staging"))
            .unwrap();
        assert_eq!(resolved.name.as_deref(), Some("Staging"));
    }

    #[test]
    fn falls_back_to_first_defined_environment() {
        let mut config = sample_config();
        // Drop "production" so the default misses too.
        config.environments.retain(|(key, _)| key != "production");
        let resolved = config.resolve_with(None, None, None).unwrap();
        assert_eq!(resolved.name.as_deref(), Some("Local"));
    }

    #[test]
    fn empty_environment_set_is_a_configuration_error() {
        let mut config = sample_config();
        config.environments.clear();
        let err = config.resolve_with(None, None, None).unwrap_err();
        assert!(matches!(err, CheckError::Configuration(_)));
    }

    #[test]
    fn validation_rejects_empty_base_path() {
        let err = validate_environment("x", &env("https://x.com", "")).unwrap_err();
        assert!(err.to_string().contains("basePath"));
    }

    #[test]
    fn timeout_defaults_when_absent() {
        assert_eq!(
            env("https://x.com", "/").timeout(),
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
    }
}

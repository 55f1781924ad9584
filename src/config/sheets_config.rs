use std::collections::HashMap;
use std::time::Duration;

use config::{Config, Environment};
use error_stack::{Result, ResultExt};
use thiserror::Error;

pub const DEFAULT_SERVICE_ACCOUNT_FILE: &str = "service-account.json";
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/drive";
pub const RETRY_ATTEMPTS: u32 = 5;
pub const RETRY_MIN_WAIT: u64 = 2;
pub const RETRY_MAX_WAIT: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to build configuration from environment")]
    Build,
    #[error("Failed to deserialize configuration")]
    Deserialize,
}

/// Settings needed to authenticate against Google and read spreadsheets.
///
/// Every field has a default, so an empty environment yields a usable configuration. Nothing is
/// validated here: a bad credentials path only shows up when the client authenticates.
#[derive(serde::Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GoogleSheetConfig {
    pub service_account_file: Box<str>,
    pub scopes: Vec<String>,
    pub retry_attempts: u32,
    /// Seconds.
    pub retry_min_wait: u64,
    /// Seconds.
    pub retry_max_wait: u64,
}

impl Default for GoogleSheetConfig {
    fn default() -> Self {
        Self {
            service_account_file: DEFAULT_SERVICE_ACCOUNT_FILE.into(),
            scopes: vec![DEFAULT_SCOPE.to_string()],
            retry_attempts: RETRY_ATTEMPTS,
            retry_min_wait: RETRY_MIN_WAIT,
            retry_max_wait: RETRY_MAX_WAIT,
        }
    }
}

impl GoogleSheetConfig {
    pub fn new(service_account_file: impl Into<Box<str>>) -> Self {
        Self {
            service_account_file: service_account_file.into(),
            ..Self::default()
        }
    }

    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = normalize_scopes(scopes.into_iter().map(Into::into));
        self
    }

    /// Reads `SERVICE_ACCOUNT_FILE`, `SCOPES`, `RETRY_ATTEMPTS`, `RETRY_MIN_WAIT` and
    /// `RETRY_MAX_WAIT` from the process environment.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::load(None)
    }

    /// Same as [`GoogleSheetConfig::from_env`], but reads from an already resolved snapshot
    /// instead of the process environment.
    pub fn from_env_snapshot(snapshot: HashMap<String, String>) -> Result<Self, ConfigLoadError> {
        Self::load(Some(snapshot))
    }

    fn load(snapshot: Option<HashMap<String, String>>) -> Result<Self, ConfigLoadError> {
        let defaults = Self::default();

        let config = Config::builder()
            .set_default(
                "service_account_file",
                defaults.service_account_file.to_string(),
            )
            .and_then(|builder| builder.set_default("scopes", defaults.scopes))
            .and_then(|builder| builder.set_default("retry_attempts", defaults.retry_attempts))
            .and_then(|builder| builder.set_default("retry_min_wait", defaults.retry_min_wait))
            .and_then(|builder| builder.set_default("retry_max_wait", defaults.retry_max_wait))
            .change_context(ConfigLoadError::Build)?
            .add_source(
                Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("scopes")
                    .source(snapshot),
            )
            .build()
            .change_context(ConfigLoadError::Build)?;

        let mut loaded: Self = config
            .try_deserialize()
            .change_context(ConfigLoadError::Deserialize)?;
        loaded.scopes = normalize_scopes(loaded.scopes);

        tracing::debug!(
            service_account_file = %loaded.service_account_file,
            scopes = ?loaded.scopes,
            "Loaded Google Sheets configuration"
        );

        Ok(loaded)
    }

    pub fn retry_min_wait(&self) -> Duration {
        Duration::from_secs(self.retry_min_wait)
    }

    pub fn retry_max_wait(&self) -> Duration {
        Duration::from_secs(self.retry_max_wait)
    }
}

fn normalize_scopes(scopes: impl IntoIterator<Item = String>) -> Vec<String> {
    let scopes = scopes
        .into_iter()
        .map(|scope| scope.trim().to_string())
        .filter(|scope| !scope.is_empty())
        .collect::<Vec<_>>();

    if scopes.is_empty() {
        vec![DEFAULT_SCOPE.to_string()]
    } else {
        scopes
    }
}

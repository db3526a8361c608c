use std::env;
use std::fmt;
use std::time::Duration;

use metal_provision::types::ProvisionRequest;

/// Used when `provisioning_timeout` is not set.
pub const DEFAULT_TIMEOUT_MINUTES: u64 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("input required and not supplied: {0}")]
    MissingInput(&'static str),

    #[error("invalid provisioning_timeout `{0}`: expected a positive whole number of minutes")]
    InvalidTimeout(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Everything one run needs, read once at startup.
#[derive(Clone)]
pub struct RunnerConfig {
    pub auth_token: String,
    pub project_id: String,
    pub request: ProvisionRequest,
    pub timeout: Duration,
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("auth_token", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("request", &self.request)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RunnerConfig {
    /// Read action inputs from the environment.
    ///
    /// Input `name` comes from `INPUT_NAME`, the way the Actions runner
    /// exports `with:` values:
    ///
    /// - `metal_auth_token`, `metal_project_id`, `metro`, `plan`, `os` (required)
    /// - `user_data` (optional)
    /// - `provisioning_timeout` (optional, minutes, default 20)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let input = |name: &str| {
            lookup(&format!("INPUT_{}", name.to_uppercase()))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &'static str| input(name).ok_or(ConfigError::MissingInput(name));

        let timeout = match input("provisioning_timeout") {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_MINUTES * 60),
        };

        Ok(Self {
            auth_token: required("metal_auth_token")?,
            project_id: required("metal_project_id")?,
            request: ProvisionRequest {
                metro: required("metro")?,
                plan: required("plan")?,
                operating_system: required("os")?,
                user_data: input("user_data"),
            },
            timeout,
        })
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.parse::<u64>() {
        Ok(minutes) if minutes > 0 => minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| ConfigError::InvalidTimeout(raw.to_string())),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

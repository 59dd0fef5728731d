//! TOML configuration: which packages to watch, fetch tuning, store table.
//!
//! Credentials never live here; they come from the process environment via the
//! CLI layer. The config file only declares what to collect.

use crate::sources::retry::RetryPolicy;
use camino::Utf8Path;
use core::time::Duration;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;

const LOG_TARGET: &str = "    config";

/// Top-level configuration, loaded once at process start and passed by
/// reference into the driver and store adapter.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Watched PyPI packages, grouped by publishing account.
    pub pypi: Vec<PypiWatch>,

    /// RubyGems accounts whose whole gem list is watched.
    pub rubygems: Vec<String>,

    /// crates.io team whose whole crate list is watched.
    pub crates: Option<CratesWatch>,

    /// GitHub repositories whose release assets are watched.
    pub github: Vec<RepoRef>,

    pub fetch: FetchConfig,

    pub store: StoreConfig,
}

/// One PyPI account and the packages it publishes.
///
/// PyPI has no supported listing API for an account's packages, so the watched
/// names are declared explicitly.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PypiWatch {
    pub owner: String,
    pub packages: Vec<String>,
}

/// A crates.io team (e.g. `github:asimov-modules:rust`) and the owner string
/// recorded in the snapshot identity for its crates.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CratesWatch {
    pub team: String,
    pub owner: String,
}

/// An `owner/repo` GitHub repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl TryFrom<String> for RepoRef {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => Ok(Self {
                owner: owner.to_owned(),
                repo: repo.to_owned(),
            }),
            _ => Err(format!("malformed repository reference '{value}', expected owner/repo")),
        }
    }
}

impl From<RepoRef> for String {
    fn from(value: RepoRef) -> Self {
        format!("{}/{}", value.owner, value.repo)
    }
}

/// Fetch tuning: pool width, per-request timeout, retry budget for the flaky
/// daily-stats endpoint.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct FetchConfig {
    pub max_in_flight: usize,
    pub request_timeout_secs: u64,
    pub daily_stats_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_step_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            request_timeout_secs: 10,
            daily_stats_retries: 3,
            retry_base_delay_ms: 1000,
            retry_step_ms: 500,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The retry policy for the daily-stats endpoint; other endpoints fetch
    /// at most once.
    #[must_use]
    pub const fn daily_stats_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.daily_stats_retries,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
            step: Duration::from_millis(self.retry_step_ms),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct StoreConfig {
    /// Name of the snapshot table behind the store endpoint.
    pub table: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table: "snapshots".to_owned(),
        }
    }
}

impl Config {
    /// Load and parse the config file at `path`.
    pub fn load(path: &Utf8Path) -> crate::Result<Self> {
        let content = fs::read_to_string(path).into_app_err_with(|| format!("unable to read config file '{path}'"))?;
        let config: Self = toml::from_str(&content).into_app_err_with(|| format!("unable to parse config file '{path}'"))?;

        if config.pypi.is_empty() && config.rubygems.is_empty() && config.crates.is_none() && config.github.is_empty() {
            log::warn!(target: LOG_TARGET, "config '{path}' declares nothing to watch");
        }

        Ok(config)
    }
}

//! Per-registry source adapters.
//!
//! Each adapter turns a registry's own counter shapes into [`RawCount`]s. None
//! of them reconcile anything; they only fetch and degrade gracefully. Callers
//! that need failure-to-zero semantics get them from the fetch orchestrator in
//! [`crate::collect`].

use core::time::Duration;
use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

pub mod crates_io;
pub mod github;
pub mod pypi;
pub mod retry;
pub mod rubygems;

pub(crate) const USER_AGENT: &str = concat!("pkgtally/", env!("CARGO_PKG_VERSION"));

/// Raw counters as reported by one registry for one package, pre-reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawCount {
    /// Cumulative figure as reported by the registry (trailing-window for pypi).
    pub downloads: u64,

    /// Registry-reported daily figure, when the registry exposes one.
    pub daily_downloads: Option<u64>,
}

impl RawCount {
    /// Sentinel used when a fetch fails: zero counts, unknown daily figure.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            downloads: 0,
            daily_downloads: None,
        }
    }
}

/// HTTP clients shared by all adapters for the duration of one run.
///
/// The GitHub client carries the access token as a sensitive default header
/// and is only constructed when a token was supplied.
#[derive(Debug, Clone)]
pub struct SourceClients {
    pub api: reqwest::Client,
    pub github: Option<reqwest::Client>,
}

impl SourceClients {
    /// Build the per-run clients. Every request issued through them carries the
    /// same per-request `timeout`; a hung fetch is bounded by it.
    pub fn new(timeout: Duration, github_token: Option<&str>) -> crate::Result<Self> {
        let api = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        let github = match github_token {
            Some(token) => Some(github_client(timeout, token)?),
            None => None,
        };

        Ok(Self { api, github })
    }
}

fn github_client(timeout: Duration, token: &str) -> crate::Result<reqwest::Client> {
    use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};

    let mut auth_val = HeaderValue::from_str(&format!("Bearer {token}"))?;
    auth_val.set_sensitive(true);

    let mut headers = HeaderMap::new();
    let _ = headers.insert(AUTHORIZATION, auth_val);
    let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .default_headers(headers)
        .build()?)
}

/// GET a JSON document, treating any non-2xx status as an error.
pub(crate) async fn get_json<T: DeserializeOwned>(client: &reqwest::Client, url: &str) -> crate::Result<T> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        ohno::bail!("GET {url} returned HTTP {status}");
    }

    Ok(response.json().await?)
}

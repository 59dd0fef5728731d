//! PyPI download counts via the pypistats.org API.
//!
//! pypistats only exposes trailing windows (`last_day`, `last_month`), not a
//! lifetime total; the reconciliation engine synthesizes the durable cumulative
//! figure from consecutive snapshots. The endpoint is known to be flaky, so
//! fetches go through the injected retry policy.

use super::{RawCount, get_json, retry::RetryPolicy};

const STATS_URL: &str = "https://pypistats.org/api/packages";

#[derive(Debug, serde::Deserialize)]
struct RecentResponse {
    data: RecentData,
}

#[derive(Debug, serde::Deserialize)]
struct RecentData {
    #[serde(default)]
    last_day: u64,
    #[serde(default)]
    last_month: u64,
}

/// Fetch the recent download figures for one package.
///
/// `downloads` carries the trailing-month figure and `daily_downloads` the
/// last-day figure, both exactly as reported.
pub async fn fetch_recent(client: &reqwest::Client, policy: RetryPolicy, package: &str) -> crate::Result<RawCount> {
    let url = format!("{STATS_URL}/{package}/recent");

    let response: RecentResponse = policy
        .run("pypistats recent", || {
            let client = client.clone();
            let url = url.clone();
            async move { get_json(&client, &url).await }
        })
        .await?;

    Ok(RawCount {
        downloads: response.data.last_month,
        daily_downloads: Some(response.data.last_day),
    })
}

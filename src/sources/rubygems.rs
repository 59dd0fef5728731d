//! RubyGems download counts via the rubygems.org API.
//!
//! One call per owner returns every gem with its lifetime cumulative download
//! count, so discovery and count fetch collapse into a single request.

use super::{RawCount, get_json};
use crate::model::{PackageId, Source};

const API_URL: &str = "https://rubygems.org/api/v1";

#[derive(Debug, serde::Deserialize)]
struct Gem {
    name: String,
    #[serde(default)]
    downloads: u64,
}

/// List every gem owned by `owner` together with its cumulative count.
pub async fn fetch_owner_gems(client: &reqwest::Client, owner: &str) -> crate::Result<Vec<(PackageId, RawCount)>> {
    let url = format!("{API_URL}/owners/{owner}/gems.json");
    let gems: Vec<Gem> = get_json(client, &url).await?;

    Ok(gems
        .into_iter()
        .map(|gem| {
            (
                PackageId::new(Source::Rubygems, owner, gem.name),
                RawCount {
                    downloads: gem.downloads,
                    daily_downloads: None,
                },
            )
        })
        .collect())
}

//! GitHub release-asset download counts.
//!
//! GitHub only exposes lifetime per-asset totals with no daily breakdown; the
//! sum across all releases of a repository becomes that repository's cumulative
//! counter, and the daily figure is left for the reconciliation engine to
//! derive.

use super::{RawCount, get_json};

const API_URL: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

#[derive(Debug, serde::Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, serde::Deserialize)]
struct Asset {
    #[serde(default)]
    download_count: u64,
}

/// Sum asset download counts across every release of `owner/repo`.
pub async fn fetch_release_downloads(client: &reqwest::Client, owner: &str, repo: &str) -> crate::Result<RawCount> {
    let mut total = 0u64;
    let mut page = 1u32;

    loop {
        let url = format!("{API_URL}/repos/{owner}/{repo}/releases?per_page={PAGE_SIZE}&page={page}");
        let releases: Vec<Release> = get_json(client, &url).await?;
        if releases.is_empty() {
            break;
        }

        total += sum_release_downloads(&releases);

        if releases.len() < PAGE_SIZE {
            break;
        }
        page += 1;
    }

    Ok(RawCount {
        downloads: total,
        daily_downloads: None,
    })
}

fn sum_release_downloads(releases: &[Release]) -> u64 {
    releases
        .iter()
        .flat_map(|release| release.assets.iter())
        .map(|asset| asset.download_count)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_listing_deserializes() {
        let json = r#"[
            {
                "tag_name": "v1.1.0",
                "assets": [
                    {"name": "tool-linux.tar.gz", "download_count": 120},
                    {"name": "tool-macos.tar.gz", "download_count": 80}
                ]
            },
            {"tag_name": "v1.0.0", "assets": []}
        ]"#;

        let releases: Vec<Release> = serde_json::from_str(json).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(sum_release_downloads(&releases), 200);
    }

    #[test]
    fn release_without_assets_field_counts_zero() {
        let json = r#"[{"tag_name": "v0.1.0"}]"#;

        let releases: Vec<Release> = serde_json::from_str(json).unwrap();
        assert_eq!(sum_release_downloads(&releases), 0);
    }

    #[test]
    fn sum_spans_multiple_releases() {
        let releases = vec![
            Release {
                assets: vec![Asset { download_count: 5 }, Asset { download_count: 10 }],
            },
            Release {
                assets: vec![Asset { download_count: 1 }],
            },
        ];

        assert_eq!(sum_release_downloads(&releases), 16);
    }
}

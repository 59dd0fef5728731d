//! crates.io team listings and per-crate download counts.
//!
//! Discovery is two-step: resolve the configured team login to its numeric id,
//! then page through the team's crates. Pagination stops on the first page that
//! contributes no unseen name, which guards against unstable pagination or a
//! repeated final page. Counts are then fetched per crate by the orchestrator.

use super::get_json;
use std::collections::HashSet;

const API_URL: &str = "https://crates.io/api/v1";
const PAGE_SIZE: usize = 50;

const LOG_TARGET: &str = "    crates";

#[derive(Debug, serde::Deserialize)]
struct TeamResponse {
    team: Team,
}

#[derive(Debug, serde::Deserialize)]
struct Team {
    id: u64,
}

#[derive(Debug, serde::Deserialize)]
struct CratesPage {
    crates: Vec<CrateSummary>,
}

#[derive(Debug, serde::Deserialize)]
struct CrateSummary {
    name: String,
}

#[derive(Debug, serde::Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateData,
}

#[derive(Debug, serde::Deserialize)]
struct CrateData {
    #[serde(default)]
    downloads: u64,
}

/// List the names of every crate owned by the team `login` (e.g.
/// `github:asimov-modules:rust`).
///
/// A page that fails to load ends the listing with a warning rather than
/// failing the run; whatever was discovered so far is returned.
pub async fn list_team_crates(client: &reqwest::Client, login: &str) -> crate::Result<Vec<String>> {
    let response: TeamResponse = get_json(client, &format!("{API_URL}/teams/{login}")).await?;
    let team_id = response.team.id;

    let mut seen = HashSet::new();
    let mut names = Vec::new();
    let mut page = 1u32;

    loop {
        let url = format!("{API_URL}/crates?team_id={team_id}&page={page}&per_page={PAGE_SIZE}");
        let batch: CratesPage = match get_json(client, &url).await {
            Ok(batch) => batch,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "stopping team '{login}' listing at page {page}: {e}");
                break;
            }
        };

        if absorb_page(&mut seen, batch.crates, &mut names) == 0 {
            break;
        }

        page += 1;
    }

    log::debug!(target: LOG_TARGET, "team '{login}' lists {} crates across {page} page(s)", names.len());
    Ok(names)
}

/// Fetch the lifetime cumulative download count for one crate.
pub async fn fetch_crate_downloads(client: &reqwest::Client, name: &str) -> crate::Result<u64> {
    let response: CrateResponse = get_json(client, &format!("{API_URL}/crates/{name}")).await?;
    Ok(response.krate.downloads)
}

/// Merge one listing page into the running result, returning how many names
/// were new in this run. A zero return terminates pagination.
fn absorb_page(seen: &mut HashSet<String>, page: Vec<CrateSummary>, names: &mut Vec<String>) -> usize {
    let mut added = 0;
    for summary in page {
        if seen.insert(summary.name.clone()) {
            names.push(summary.name);
            added += 1;
        }
    }
    added
}

//! The fetch orchestrator.
//!
//! Fans out one fetch per package over a bounded worker pool, isolates
//! failures by substituting a zero-valued counter, and joins the results back
//! into a single record list. Phases (one per registry) run sequentially
//! relative to each other; only the per-package fetches inside a phase run
//! concurrently. No task ever touches another task's record.

use crate::config::Config;
use crate::model::{PackageId, PackageRecord, Source};
use crate::sources::{RawCount, SourceClients, crates_io, github, pypi, rubygems};
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const LOG_TARGET: &str = "   collect";

/// Fan out `fetch` over every identity, at most `max_in_flight` executing at
/// once, FIFO by submission order.
///
/// A failed fetch is logged and recorded as [`RawCount::zero`]; it never
/// aborts the batch or affects any other identity's result. Results arrive in
/// completion order; callers needing a stable order sort after reconciliation.
pub async fn fetch_counts<F, Fut>(identities: Vec<PackageId>, max_in_flight: usize, fetch: F) -> Vec<(PackageId, RawCount)>
where
    F: Fn(&PackageId) -> Fut,
    Fut: Future<Output = crate::Result<RawCount>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_in_flight.max(1)));
    let mut tasks = JoinSet::new();

    for id in identities {
        let fut = fetch(&id);
        let semaphore = Arc::clone(&semaphore);
        let _abort = tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore is never closed");
            match fut.await {
                Ok(count) => (id, count),
                Err(e) => {
                    log::warn!(target: LOG_TARGET, "fetch failed for {id}, recording zero: {e}");
                    (id, RawCount::zero())
                }
            }
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => log::warn!(target: LOG_TARGET, "fetch task did not complete: {e}"),
        }
    }
    results
}

/// Stamp raw counts into pre-reconciliation records for `date`.
#[must_use]
pub fn into_records(counts: Vec<(PackageId, RawCount)>, date: NaiveDate) -> Vec<PackageRecord> {
    counts
        .into_iter()
        .map(|(id, count)| PackageRecord {
            id,
            downloads: count.downloads,
            daily_downloads: count.daily_downloads,
            collected_at: date,
        })
        .collect()
}

/// Run every configured collection phase and merge the raw records.
pub async fn collect_all(clients: &SourceClients, config: &Config, date: NaiveDate) -> Vec<PackageRecord> {
    let mut records = Vec::new();
    records.extend(collect_pypi(clients, config, date).await);
    records.extend(collect_rubygems(clients, config, date).await);
    records.extend(collect_crates(clients, config, date).await);
    records.extend(collect_github(clients, config, date).await);
    records
}

async fn collect_pypi(clients: &SourceClients, config: &Config, date: NaiveDate) -> Vec<PackageRecord> {
    let identities: Vec<PackageId> = config
        .pypi
        .iter()
        .flat_map(|watch| {
            watch
                .packages
                .iter()
                .map(|name| PackageId::new(Source::Pypi, &watch.owner, name))
        })
        .collect();
    if identities.is_empty() {
        return Vec::new();
    }

    let started = Instant::now();
    log::info!(target: LOG_TARGET, "fetching pypi daily stats for {} packages", identities.len());

    let policy = config.fetch.daily_stats_policy();
    let client = clients.api.clone();
    let counts = fetch_counts(identities, config.fetch.max_in_flight, move |id| {
        let client = client.clone();
        let name = id.name.clone();
        async move { pypi::fetch_recent(&client, policy, &name).await }
    })
    .await;

    log::info!(target: LOG_TARGET, "pypi phase complete in {:.2}s", started.elapsed().as_secs_f64());
    into_records(counts, date)
}

async fn collect_rubygems(clients: &SourceClients, config: &Config, date: NaiveDate) -> Vec<PackageRecord> {
    if config.rubygems.is_empty() {
        return Vec::new();
    }

    let started = Instant::now();
    let mut counts = Vec::new();
    for owner in &config.rubygems {
        match rubygems::fetch_owner_gems(&clients.api, owner).await {
            Ok(gems) => counts.extend(gems),
            // One unreachable account must not abort the remaining ones.
            Err(e) => log::warn!(target: LOG_TARGET, "skipping rubygems owner '{owner}': {e}"),
        }
    }

    log::info!(
        target: LOG_TARGET,
        "rubygems phase found {} gems in {:.2}s",
        counts.len(),
        started.elapsed().as_secs_f64(),
    );
    into_records(counts, date)
}

async fn collect_crates(clients: &SourceClients, config: &Config, date: NaiveDate) -> Vec<PackageRecord> {
    let Some(watch) = &config.crates else {
        return Vec::new();
    };

    let started = Instant::now();
    let names = match crates_io::list_team_crates(&clients.api, &watch.team).await {
        Ok(names) => names,
        Err(e) => {
            log::warn!(target: LOG_TARGET, "skipping crates team '{}': {e}", watch.team);
            return Vec::new();
        }
    };

    let identities: Vec<PackageId> = names
        .into_iter()
        .map(|name| PackageId::new(Source::Crates, &watch.owner, name))
        .collect();
    log::info!(target: LOG_TARGET, "fetching crates.io counts for {} crates", identities.len());

    let client = clients.api.clone();
    let counts = fetch_counts(identities, config.fetch.max_in_flight, move |id| {
        let client = client.clone();
        let name = id.name.clone();
        async move {
            let downloads = crates_io::fetch_crate_downloads(&client, &name).await?;
            Ok(RawCount {
                downloads,
                daily_downloads: None,
            })
        }
    })
    .await;

    log::info!(target: LOG_TARGET, "crates phase complete in {:.2}s", started.elapsed().as_secs_f64());
    into_records(counts, date)
}

async fn collect_github(clients: &SourceClients, config: &Config, date: NaiveDate) -> Vec<PackageRecord> {
    if config.github.is_empty() {
        return Vec::new();
    }
    let Some(client) = clients.github.clone() else {
        log::warn!(target: LOG_TARGET, "github repos configured but no token available, skipping the phase");
        return Vec::new();
    };

    let identities: Vec<PackageId> = config
        .github
        .iter()
        .map(|repo| PackageId::new(Source::Github, &repo.owner, &repo.repo))
        .collect();

    let started = Instant::now();
    log::info!(target: LOG_TARGET, "fetching release downloads for {} repositories", identities.len());

    let counts = fetch_counts(identities, config.fetch.max_in_flight, move |id| {
        let client = client.clone();
        let owner = id.owner.clone();
        let repo = id.name.clone();
        async move { github::fetch_release_downloads(&client, &owner, &repo).await }
    })
    .await;

    log::info!(target: LOG_TARGET, "github phase complete in {:.2}s", started.elapsed().as_secs_f64());
    into_records(counts, date)
}

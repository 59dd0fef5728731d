use super::common::{Common, CommonArgs};
use camino::Utf8PathBuf;
use chrono::{Days, Local, NaiveDate};
use clap::Parser;
use ohno::IntoAppError;
use pkgtally::Result;
use pkgtally::collect::collect_all;
use pkgtally::reconcile::{reconcile, sort_records};
use pkgtally::reports::generate_csv;
use pkgtally::store::SnapshotStore;
use std::time::Instant;

const LOG_TARGET: &str = "       run";

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Also write the reconciled snapshot as CSV to this path
    #[arg(long, value_name = "PATH")]
    pub csv: Option<Utf8PathBuf>,

    /// Collection date (format: YYYY-MM-DD) [default: today]
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Run one collection cycle: fetch raw counts from every configured
/// registry, reconcile them against the previous day's snapshot, and
/// upsert the result. Re-running for the same date overwrites that
/// date's rows rather than duplicating them.
pub async fn run_collection(args: &RunArgs) -> Result<()> {
    let start = Instant::now();
    let common = Common::new(&args.common)?;

    let today = args.date.unwrap_or_else(|| Local::now().date_naive());
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| ohno::app_err!("no previous day exists for {today}"))?;

    let previous = common.store.get_snapshot(yesterday).await?;
    log::info!(target: LOG_TARGET, "loaded {} prior records for {yesterday}", previous.len());

    let raw = collect_all(&common.clients, &common.config, today).await;
    let mut records = reconcile(raw, &previous);
    sort_records(&mut records);

    common.store.upsert(today, &records).await?;

    if let Some(path) = &args.csv {
        let file = std::fs::File::create(path).into_app_err_with(|| format!("unable to create {path}"))?;
        generate_csv(&records, file)?;
        log::info!(target: LOG_TARGET, "wrote {} rows to {path}", records.len());
    }

    log::info!(
        target: LOG_TARGET,
        "collected {} records for {today} in {:.1}s",
        records.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}

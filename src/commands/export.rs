use super::common::{Common, CommonArgs};
use camino::Utf8PathBuf;
use chrono::NaiveDate;
use clap::Parser;
use ohno::IntoAppError;
use pkgtally::Result;
use pkgtally::reconcile::sort_records;
use pkgtally::reports::generate_csv;

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Snapshot date to export (format: YYYY-MM-DD)
    #[arg(value_name = "DATE")]
    pub date: NaiveDate,

    /// Output file [default: stdout]
    #[arg(long, short = 'o', value_name = "PATH")]
    pub out: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Export one stored snapshot as CSV, sorted by source, owner, and name.
pub async fn export_snapshot(args: &ExportArgs) -> Result<()> {
    let common = Common::new(&args.common)?;

    let rows = common.store.fetch_rows(args.date).await?;
    let mut records: Vec<_> = rows.into_iter().map(pkgtally::store::SnapshotRow::into_record).collect();
    sort_records(&mut records);

    match &args.out {
        Some(path) => {
            let file = std::fs::File::create(path).into_app_err_with(|| format!("unable to create {path}"))?;
            generate_csv(&records, file)
        }
        None => generate_csv(&records, std::io::stdout().lock()),
    }
}

//! Flat-file snapshot artifact.
//!
//! One row per record with header `source,owner,name,downloads,daily_downloads`.
//! Callers sort first; the writer preserves the order it is given so sorted
//! input produces a diff-stable file.

use crate::model::PackageRecord;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    source: String,
    owner: &'a str,
    name: &'a str,
    downloads: u64,
    daily_downloads: Option<u64>,
}

/// Write the record set as a delimited artifact to `writer`.
pub fn generate_csv<W: std::io::Write>(records: &[PackageRecord], writer: W) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        csv_writer.serialize(CsvRow {
            source: record.id.source.to_string(),
            owner: &record.id.owner,
            name: &record.id.name,
            downloads: record.downloads,
            daily_downloads: record.daily_downloads,
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

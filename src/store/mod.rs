//! Snapshot persistence: the store interface and its row shape.

use crate::model::{PackageId, PackageRecord, SnapshotMap, Source};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod postgrest;

const LOG_TARGET: &str = "     store";

/// One stored row, keyed by `(source, owner, name, collected_at)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub source: Source,
    pub owner: String,
    pub name: String,
    pub downloads: u64,
    pub daily_downloads: Option<u64>,
    pub collected_at: NaiveDate,
}

impl SnapshotRow {
    #[must_use]
    pub fn from_record(record: &PackageRecord) -> Self {
        Self {
            source: record.id.source,
            owner: record.id.owner.clone(),
            name: record.id.name.clone(),
            downloads: record.downloads,
            daily_downloads: record.daily_downloads,
            collected_at: record.collected_at,
        }
    }

    #[must_use]
    pub fn into_record(self) -> PackageRecord {
        PackageRecord {
            id: PackageId::new(self.source, self.owner, self.name),
            downloads: self.downloads,
            daily_downloads: self.daily_downloads,
            collected_at: self.collected_at,
        }
    }
}

/// Build the identity-to-downloads mapping the reconciliation engine joins
/// against. Duplicate identities should not occur given the store's conflict
/// key; if one slips through, the last row wins.
#[must_use]
pub fn rows_to_map(rows: Vec<SnapshotRow>) -> SnapshotMap {
    let mut map = SnapshotMap::with_capacity(rows.len());
    for row in rows {
        let id = PackageId::new(row.source, row.owner, row.name);
        if let Some(previous) = map.insert(id, row.downloads) {
            log::debug!(target: LOG_TARGET, "duplicate stored row, replacing downloads={previous}");
        }
    }
    map
}

/// Durable storage for daily snapshots.
///
/// Implementations must make `upsert` idempotent on
/// `(source, owner, name, collected_at)` and must report an absent snapshot
/// date as an empty mapping, not an error.
#[expect(async_fn_in_trait, reason = "store futures are awaited on the calling task; no Send bound is needed")]
pub trait SnapshotStore {
    /// Cumulative downloads per identity stored for `date`.
    async fn get_snapshot(&self, date: NaiveDate) -> crate::Result<SnapshotMap>;

    /// Idempotently write one row per record for `date`.
    async fn upsert(&self, date: NaiveDate, records: &[PackageRecord]) -> crate::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> PackageRecord {
        PackageRecord {
            id: PackageId::new(Source::Crates, "acme", "widget"),
            downloads: 500,
            daily_downloads: Some(20),
            collected_at: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn row_round_trips_through_record() {
        let original = record();
        let row = SnapshotRow::from_record(&original);
        assert_eq!(row.into_record(), original);
    }

    #[test]
    fn row_serializes_with_wire_field_names() {
        let row = SnapshotRow::from_record(&record());
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["source"], "crates");
        assert_eq!(json["owner"], "acme");
        assert_eq!(json["name"], "widget");
        assert_eq!(json["downloads"], 500);
        assert_eq!(json["daily_downloads"], 20);
        assert_eq!(json["collected_at"], "2025-06-01");
    }

    #[test]
    fn null_daily_downloads_deserializes() {
        let json = r#"{
            "source": "github",
            "owner": "acme",
            "name": "widget",
            "downloads": 9,
            "daily_downloads": null,
            "collected_at": "2025-06-01"
        }"#;

        let row: SnapshotRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.daily_downloads, None);
        assert_eq!(row.source, Source::Github);
    }

    #[test]
    fn rows_build_the_snapshot_map() {
        let rows = vec![
            SnapshotRow::from_record(&record()),
            SnapshotRow {
                name: "other".to_owned(),
                ..SnapshotRow::from_record(&record())
            },
        ];

        let map = rows_to_map(rows);

        assert_eq!(map.len(), 2);
        assert_eq!(map[&PackageId::new(Source::Crates, "acme", "widget")], 500);
    }

    #[test]
    fn empty_rows_yield_empty_map() {
        assert!(rows_to_map(Vec::new()).is_empty());
    }

    /// In-memory stand-in used to exercise the full read-reconcile-write cycle.
    #[derive(Default)]
    struct MemoryStore {
        days: std::sync::Mutex<std::collections::HashMap<NaiveDate, std::collections::HashMap<PackageId, SnapshotRow>>>,
    }

    impl SnapshotStore for MemoryStore {
        async fn get_snapshot(&self, date: NaiveDate) -> crate::Result<SnapshotMap> {
            let days = self.days.lock().unwrap();
            let rows = days.get(&date).map(|day| day.values().cloned().collect()).unwrap_or_default();
            Ok(rows_to_map(rows))
        }

        async fn upsert(&self, date: NaiveDate, records: &[PackageRecord]) -> crate::Result<()> {
            let mut days = self.days.lock().unwrap();
            let day = days.entry(date).or_default();
            for record in records {
                let _ = day.insert(record.id.clone(), SnapshotRow::from_record(record));
            }
            Ok(())
        }
    }

    fn raw(source: Source, name: &str, downloads: u64, daily: Option<u64>, date: NaiveDate) -> PackageRecord {
        PackageRecord {
            id: PackageId::new(source, "acme", name),
            downloads,
            daily_downloads: daily,
            collected_at: date,
        }
    }

    #[tokio::test]
    async fn two_day_cycle_derives_deltas() {
        use crate::reconcile::{reconcile, sort_records};

        let store = MemoryStore::default();
        let day1 = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let day2 = day1.succ_opt().unwrap();

        let previous = store.get_snapshot(day1.pred_opt().unwrap()).await.unwrap();
        assert!(previous.is_empty());

        let mut first = reconcile(
            vec![
                raw(Source::Crates, "widget", 480, None, day1),
                raw(Source::Pypi, "widget", 9000, Some(10), day1),
            ],
            &previous,
        );
        sort_records(&mut first);
        store.upsert(day1, &first).await.unwrap();

        let previous = store.get_snapshot(day1).await.unwrap();
        let second = reconcile(
            vec![
                raw(Source::Crates, "widget", 500, None, day2),
                raw(Source::Pypi, "widget", 9100, Some(25), day2),
            ],
            &previous,
        );
        store.upsert(day2, &second).await.unwrap();

        let crates_row = &second[0];
        assert_eq!(crates_row.id.source, Source::Crates);
        assert_eq!(crates_row.downloads, 500);
        assert_eq!(crates_row.daily_downloads, Some(20));

        let pypi_row = &second[1];
        assert_eq!(pypi_row.downloads, 9025);
        assert_eq!(pypi_row.daily_downloads, Some(25));
    }

    #[tokio::test]
    async fn rerunning_a_day_overwrites_rather_than_duplicates() {
        let store = MemoryStore::default();
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let records = vec![record()];

        store.upsert(date, &records).await.unwrap();
        store.upsert(date, &records).await.unwrap();

        let map = store.get_snapshot(date).await.unwrap();
        assert_eq!(map.len(), 1);
    }
}

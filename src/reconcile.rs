//! The reconciliation engine.
//!
//! Takes the raw merged counts for one collection day plus yesterday's stored
//! snapshot and finalizes the `downloads` / `daily_downloads` fields of every
//! record. Pure and total: no I/O, never fails, any malformed counter has
//! already been coerced to zero by the fetch layer.

use crate::model::{PackageRecord, SnapshotMap};
use std::collections::HashSet;

const LOG_TARGET: &str = " reconcile";

/// Reconcile today's raw records against yesterday's snapshot.
///
/// Per-source semantics:
///
/// - Sources with a reliable registry-side cumulative counter (crates,
///   rubygems, github): the reported total is trusted as `downloads`, and
///   `daily_downloads` is derived by differencing against yesterday's stored
///   value, clamped at zero so registry blips or transient zero reads never
///   produce a negative delta. With no prior observation the delta is reported
///   as zero, a known limitation of first observations.
/// - PyPI: pypistats' trailing-window totals reset independently and cannot be
///   trusted long-horizon, so `downloads` is synthesized as yesterday's stored
///   total plus today's registry-reported daily figure. On first observation
///   the registry-reported figures stand unchanged as the initial baseline.
///
/// Duplicate identities within the input are dropped after the first
/// occurrence. Output order follows input order; presentation sorting is the
/// caller's concern (see [`sort_records`]).
#[must_use]
pub fn reconcile(records: Vec<PackageRecord>, previous: &SnapshotMap) -> Vec<PackageRecord> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut reconciled = Vec::with_capacity(records.len());

    for mut record in records {
        if !seen.insert(record.id.clone()) {
            log::warn!(target: LOG_TARGET, "duplicate identity {} in this run, keeping the first occurrence", record.id);
            continue;
        }

        let prev = previous.get(&record.id).copied();

        if record.id.source.reports_cumulative() {
            record.daily_downloads = Some(prev.map_or(0, |p| record.downloads.saturating_sub(p)));
        } else if let Some(prev) = prev {
            record.downloads = prev + record.daily_downloads.unwrap_or(0);
        }

        reconciled.push(record);
    }

    reconciled
}

/// Sort records into the deterministic presentation order: ascending by
/// `(source, owner, name)`.
pub fn sort_records(records: &mut [PackageRecord]) {
    records.sort_unstable_by(|a, b| a.id.cmp(&b.id));
}

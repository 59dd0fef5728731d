//! Core record types shared by the collectors, the reconciliation engine, and the store.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The registry a package was published to.
///
/// Variants are declared in alphabetical order so the derived `Ord` matches the
/// lexical order of the lowercase names used on the wire and in CSV output.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Source {
    /// crates.io, reports a lifetime cumulative download counter.
    Crates,

    /// GitHub Releases, reports lifetime per-asset download counters.
    Github,

    /// PyPI via pypistats.org, reports a daily figure plus a trailing-window total.
    Pypi,

    /// RubyGems, reports a lifetime cumulative download counter.
    Rubygems,
}

impl Source {
    /// Whether the registry's own counter is a monotonic lifetime total.
    ///
    /// PyPI is the odd one out: pypistats only exposes `last_day` / `last_month`
    /// trailing windows, so a durable cumulative figure has to be synthesized
    /// from consecutive snapshots instead of trusted from the registry.
    #[must_use]
    pub const fn reports_cumulative(self) -> bool {
        !matches!(self, Self::Pypi)
    }
}

/// Identity of a package: the `(source, owner, name)` triple that names it
/// uniquely within a run and across days. This is the join key between today's
/// raw counts and yesterday's stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
    pub source: Source,
    pub owner: String,
    pub name: String,
}

impl PackageId {
    pub fn new(source: Source, owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            source,
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl core::fmt::Display for PackageId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.source, self.owner, self.name)
    }
}

/// One output row: an identity plus the counters for one collection date.
///
/// `downloads` is the cumulative-to-date figure; `daily_downloads` is the count
/// attributable to the most recent day, or `None` when no registry reported one
/// and the engine could not derive one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    pub id: PackageId,
    pub downloads: u64,
    pub daily_downloads: Option<u64>,
    pub collected_at: NaiveDate,
}

/// Yesterday's stored cumulative downloads, keyed by identity.
///
/// An absent entry means "no prior observation" and disables delta computation
/// for that identity; it is never treated as an implicit zero.
pub type SnapshotMap = HashMap<PackageId, u64>;

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn source_display_is_lowercase() {
        assert_eq!(Source::Pypi.to_string(), "pypi");
        assert_eq!(Source::Rubygems.to_string(), "rubygems");
        assert_eq!(Source::Crates.to_string(), "crates");
        assert_eq!(Source::Github.to_string(), "github");
    }

    #[test]
    fn source_round_trips_through_str() {
        for source in Source::iter() {
            let parsed = Source::from_str(&source.to_string()).unwrap();
            assert_eq!(parsed, source);
        }
    }

    #[test]
    fn source_rejects_unknown_names() {
        assert!(Source::from_str("npm").is_err());
        assert!(Source::from_str("").is_err());
    }

    #[test]
    fn source_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&Source::Crates).unwrap(), "\"crates\"");
        let source: Source = serde_json::from_str("\"rubygems\"").unwrap();
        assert_eq!(source, Source::Rubygems);
    }

    #[test]
    fn source_order_matches_lexical_order() {
        let declared: Vec<String> = Source::iter().map(|s| s.to_string()).collect();
        let mut sorted = declared.clone();
        sorted.sort_unstable();
        assert_eq!(declared, sorted);
    }

    #[test]
    fn package_id_orders_by_source_owner_name() {
        let a = PackageId::new(Source::Crates, "acme", "zlib-helper");
        let b = PackageId::new(Source::Crates, "zenith", "aardvark");
        let c = PackageId::new(Source::Pypi, "acme", "aardvark");

        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn package_id_display() {
        let id = PackageId::new(Source::Github, "acme", "widget");
        assert_eq!(id.to_string(), "github/acme/widget");
    }

    #[test]
    fn only_pypi_lacks_a_cumulative_counter() {
        assert!(!Source::Pypi.reports_cumulative());
        assert!(Source::Crates.reports_cumulative());
        assert!(Source::Rubygems.reports_cumulative());
        assert!(Source::Github.reports_cumulative());
    }
}

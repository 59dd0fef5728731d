//! PostgREST-backed snapshot store (Supabase-style).
//!
//! Reads and writes the snapshot table through the REST surface the hosted
//! Postgres exposes: single-date reads via an `eq.` filter, idempotent bulk
//! writes via `on_conflict` plus `Prefer: resolution=merge-duplicates`.

use super::{LOG_TARGET, SnapshotRow, SnapshotStore, rows_to_map};
use crate::model::{PackageRecord, SnapshotMap};
use chrono::NaiveDate;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

/// Conflict key of the snapshot table.
const CONFLICT_KEY: &str = "source,owner,name,collected_at";

#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: reqwest::Client,
    base: Url,
    table: String,
}

impl PostgrestStore {
    /// Build a store client for `base_url`, authenticating every request with
    /// the service `key`.
    pub fn new(base_url: &str, key: &str, table: impl Into<String>, timeout: Duration) -> crate::Result<Self> {
        let base = Url::parse(base_url).into_app_err("invalid store URL")?;

        let mut auth_val = HeaderValue::from_str(&format!("Bearer {key}"))?;
        auth_val.set_sensitive(true);
        let mut key_val = HeaderValue::from_str(key)?;
        key_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);
        let _ = headers.insert("apikey", key_val);

        let client = reqwest::Client::builder()
            .user_agent(crate::sources::USER_AGENT)
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            table: table.into(),
        })
    }

    fn table_url(&self) -> crate::Result<Url> {
        self.base
            .join(&format!("rest/v1/{}", self.table))
            .into_app_err("unable to build snapshot table URL")
    }

    /// Read the full rows stored for one date. Row order is whatever the
    /// server returns; callers sort for presentation.
    pub async fn fetch_rows(&self, date: NaiveDate) -> crate::Result<Vec<SnapshotRow>> {
        let mut url = self.table_url()?;
        let _ = url
            .query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("collected_at", &format!("eq.{date}"));

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("snapshot read for {date} failed: HTTP {status}");
        }

        let rows: Vec<SnapshotRow> = response.json().await?;
        log::debug!(target: LOG_TARGET, "read {} stored row(s) for {date}", rows.len());
        Ok(rows)
    }
}

impl SnapshotStore for PostgrestStore {
    async fn get_snapshot(&self, date: NaiveDate) -> crate::Result<SnapshotMap> {
        // PostgREST returns an empty array for an absent date, which maps to
        // the "no prior observation" empty snapshot.
        Ok(rows_to_map(self.fetch_rows(date).await?))
    }

    async fn upsert(&self, date: NaiveDate, records: &[PackageRecord]) -> crate::Result<()> {
        if records.is_empty() {
            log::debug!(target: LOG_TARGET, "nothing to upsert for {date}");
            return Ok(());
        }

        let rows: Vec<SnapshotRow> = records
            .iter()
            .map(|record| {
                let mut row = SnapshotRow::from_record(record);
                row.collected_at = date;
                row
            })
            .collect();

        let mut url = self.table_url()?;
        let _ = url.query_pairs_mut().append_pair("on_conflict", CONFLICT_KEY);

        let response = self
            .client
            .post(url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::error!(target: LOG_TARGET, "snapshot upsert for {date} failed: HTTP {status}: {body}");
            bail!("snapshot upsert for {date} failed: HTTP {status}");
        }

        log::info!(target: LOG_TARGET, "stored {} row(s) for {date}", rows.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> PostgrestStore {
        PostgrestStore::new("https://example.supabase.co", "service-key", "snapshots", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_malformed_base_url() {
        let result = PostgrestStore::new("not a url", "key", "snapshots", Duration::from_secs(5));
        assert!(result.is_err());
    }

    #[test]
    fn table_url_targets_the_rest_surface() {
        let url = store().table_url().unwrap();
        assert_eq!(url.as_str(), "https://example.supabase.co/rest/v1/snapshots");
    }

    #[test]
    fn conflict_key_matches_the_identity_tuple() {
        assert_eq!(CONFLICT_KEY, "source,owner,name,collected_at");
    }
}

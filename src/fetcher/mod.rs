//! Fetcher for time-bucketed adverse-event counts.
//!
//! One outbound request per subject against the openFDA FAERS count-by-day
//! endpoint. The payload's `time` values arrive either compact (`YYYYMMDD`)
//! or hyphenated (`YYYY-MM-DD`) and are normalized to `NaiveDate` here;
//! counts are coerced to non-negative integers. The fetcher never touches
//! the cache; that is the refresh service's job.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::FetcherConfig;
use crate::types::DailyCount;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream returned status {status} for subject {subject}")]
    UpstreamStatus { subject: String, status: u16 },

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    #[serde(default)]
    results: Vec<CountEntry>,
}

#[derive(Debug, Deserialize)]
struct CountEntry {
    time: Option<String>,
    count: Option<Value>,
}

/// Source of daily event counts, abstracted so the refresh orchestration can
/// be exercised against a scripted upstream.
#[async_trait]
pub trait CountSource: Send + Sync {
    async fn fetch_daily_counts(&self, subject: &str) -> Result<Vec<DailyCount>, FetchError>;
}

/// Client for the external adverse-event data source.
#[derive(Clone)]
pub struct FaersClient {
    http: reqwest::Client,
    base_url: String,
    fetch_window_days: u32,
}

impl FaersClient {
    pub fn new(config: &FetcherConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: config.base_url.clone(),
            fetch_window_days: config.fetch_window_days,
        }
    }

    /// Fetch daily event counts for one subject over the recent window.
    /// The returned order is whatever the upstream sent; callers sort on
    /// output if they need to.
    pub async fn fetch_daily_counts(&self, subject: &str) -> Result<Vec<DailyCount>, FetchError> {
        let search = format!("patient.drug.medicinalproduct:\"{}\"", subject.trim().to_uppercase());
        let limit = self.fetch_window_days.to_string();

        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("search", search.as_str()),
                ("count", "receivedate"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus {
                subject: subject.to_string(),
                status: status.as_u16(),
            });
        }

        let payload: CountResponse = response.json().await?;
        Ok(normalize_entries(subject, payload.results))
    }
}

#[async_trait]
impl CountSource for FaersClient {
    async fn fetch_daily_counts(&self, subject: &str) -> Result<Vec<DailyCount>, FetchError> {
        FaersClient::fetch_daily_counts(self, subject).await
    }
}

fn normalize_entries(subject: &str, entries: Vec<CountEntry>) -> Vec<DailyCount> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(raw_time) = entry.time.as_deref() else {
            warn!("skipping bucket with missing time for subject {}", subject);
            continue;
        };
        match normalize_bucket_date(raw_time) {
            Some(date) => out.push(DailyCount {
                date,
                count: coerce_count(entry.count.as_ref()),
            }),
            None => warn!("skipping unparseable bucket time {:?} for subject {}", raw_time, subject),
        }
    }
    out
}

/// Accepts compact `YYYYMMDD` or hyphenated `YYYY-MM-DD`.
pub fn normalize_bucket_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// Missing, non-numeric, or negative counts become 0.
pub fn coerce_count(raw: Option<&Value>) -> i64 {
    match raw {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0).max(0),
        Some(Value::String(s)) => s.trim().parse::<i64>().unwrap_or(0).max(0),
        _ => 0,
    }
}

//! Batch refresh orchestration: fetch -> normalize -> upsert -> preview,
//! one subject at a time.
//!
//! Subjects are processed sequentially within one activation. A failure for
//! one subject (upstream or storage) is recorded in that subject's outcome
//! and never aborts the rest of the batch; re-running a refresh is
//! idempotent per subject because the cache writer upserts by key.

use serde::Serialize;
use tracing::{info, warn};

use crate::database::repository::TrendStore;
use crate::fetcher::CountSource;
use crate::types::DailyCount;

/// Per-subject result of one refresh activation.
#[derive(Debug, Serialize)]
pub struct RefreshOutcome {
    pub subject: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub preview: Vec<DailyCount>,
}

impl RefreshOutcome {
    fn failed(subject: String, error: String) -> Self {
        Self {
            subject,
            ok: false,
            updated_count: None,
            error: Some(error),
            preview: Vec::new(),
        }
    }
}

pub struct RefreshService<S, T> {
    fetcher: S,
    trends: T,
    preview_limit: i64,
}

impl<S: CountSource, T: TrendStore> RefreshService<S, T> {
    pub fn new(fetcher: S, trends: T, preview_limit: i64) -> Self {
        Self { fetcher, trends, preview_limit }
    }

    /// Refresh every subject in order, collecting one outcome per subject.
    pub async fn refresh_all(&self, subjects: &[String]) -> Vec<RefreshOutcome> {
        let mut outcomes = Vec::with_capacity(subjects.len());
        for subject in subjects {
            outcomes.push(self.refresh_one(subject).await);
        }
        outcomes
    }

    async fn refresh_one(&self, subject: &str) -> RefreshOutcome {
        // Normalize once so success and failure outcomes carry the same key.
        let subject = subject.trim().to_uppercase();

        let buckets = match self.fetcher.fetch_daily_counts(&subject).await {
            Ok(buckets) => buckets,
            Err(e) => {
                warn!("refresh fetch failed for {}: {}", subject, e);
                return RefreshOutcome::failed(subject, format!("fetch failed: {}", e));
            }
        };

        // One transaction per subject: all buckets commit or none do.
        let updated = match self.trends.upsert_batch(&subject, &buckets).await {
            Ok(n) => n,
            Err(e) => {
                warn!("refresh upsert failed for {}: {}", subject, e);
                return RefreshOutcome::failed(subject, format!("store failed: {}", e));
            }
        };

        info!("refreshed {}: {} buckets", subject, updated);

        // Preview is best-effort; a read failure after a committed write
        // should not flip the outcome to failed.
        let preview = match self.trends.recent(&subject, self.preview_limit).await {
            Ok(rows) => rows
                .into_iter()
                .map(|b| DailyCount { date: b.bucket_date, count: b.count as i64 })
                .collect(),
            Err(e) => {
                warn!("refresh preview read failed for {}: {}", subject, e);
                Vec::new()
            }
        };

        RefreshOutcome {
            subject,
            ok: true,
            updated_count: Some(updated),
            error: None,
            preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::database::manager::DatabaseError;
    use crate::database::models::TrendBucket;
    use crate::fetcher::FetchError;

    /// Upstream stand-in: listed subjects fail with a 500, everyone else
    /// gets the scripted buckets.
    struct ScriptedSource {
        failing: Vec<String>,
        buckets: Vec<DailyCount>,
    }

    #[async_trait]
    impl CountSource for ScriptedSource {
        async fn fetch_daily_counts(&self, subject: &str) -> Result<Vec<DailyCount>, FetchError> {
            if self.failing.iter().any(|s| s == subject) {
                return Err(FetchError::UpstreamStatus {
                    subject: subject.to_string(),
                    status: 500,
                });
            }
            Ok(self.buckets.clone())
        }
    }

    /// In-memory cache keyed like the real table: (subject, date) -> count.
    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<(String, NaiveDate), i64>>,
    }

    #[async_trait]
    impl TrendStore for MemoryStore {
        async fn upsert_batch(
            &self,
            subject: &str,
            buckets: &[DailyCount],
        ) -> Result<u64, DatabaseError> {
            let mut rows = self.rows.lock().unwrap();
            for bucket in buckets {
                rows.insert((subject.to_string(), bucket.date), bucket.count);
            }
            Ok(buckets.len() as u64)
        }

        async fn recent(&self, subject: &str, limit: i64) -> Result<Vec<TrendBucket>, DatabaseError> {
            let rows = self.rows.lock().unwrap();
            let mut matched: Vec<(NaiveDate, i64)> = rows
                .iter()
                .filter(|((s, _), _)| s == subject)
                .map(|((_, date), count)| (*date, *count))
                .collect();
            matched.sort_by(|a, b| b.0.cmp(&a.0));
            matched.truncate(limit as usize);
            Ok(matched
                .into_iter()
                .map(|(date, count)| TrendBucket {
                    subject: subject.to_string(),
                    bucket_date: date,
                    count: count as i32,
                    updated_at: Utc::now(),
                })
                .collect())
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn one_failing_subject_does_not_abort_the_batch() {
        let bucket = DailyCount { date: date("2025-01-15"), count: 7 };
        let source = ScriptedSource {
            failing: vec!["ZOLPIDEM".to_string()],
            buckets: vec![bucket],
        };
        let service = RefreshService::new(source, MemoryStore::default(), 5);

        let subjects = vec!["ZOLPIDEM".to_string(), "PHENELZINE".to_string()];
        let outcomes = service.refresh_all(&subjects).await;

        assert_eq!(outcomes.len(), 2);

        assert!(!outcomes[0].ok);
        assert_eq!(outcomes[0].subject, "ZOLPIDEM");
        assert!(outcomes[0].updated_count.is_none());
        assert!(outcomes[0].error.as_deref().unwrap_or("").contains("fetch failed"));
        assert!(outcomes[0].preview.is_empty());

        assert!(outcomes[1].ok);
        assert_eq!(outcomes[1].subject, "PHENELZINE");
        assert_eq!(outcomes[1].updated_count, Some(1));
        // The successful subject's bucket really persisted
        assert_eq!(outcomes[1].preview, vec![bucket]);
    }

    #[tokio::test]
    async fn outcomes_key_subjects_uppercased_even_on_failure() {
        let source = ScriptedSource {
            failing: vec!["ZOLPIDEM".to_string()],
            buckets: vec![],
        };
        let service = RefreshService::new(source, MemoryStore::default(), 5);

        let outcomes = service.refresh_all(&[" zolpidem ".to_string()]).await;
        assert_eq!(outcomes[0].subject, "ZOLPIDEM");
        assert!(!outcomes[0].ok);
    }

    #[tokio::test]
    async fn storage_failure_marks_subject_failed() {
        struct FailingStore;

        #[async_trait]
        impl TrendStore for FailingStore {
            async fn upsert_batch(&self, _: &str, _: &[DailyCount]) -> Result<u64, DatabaseError> {
                Err(DatabaseError::QueryError("connection reset".to_string()))
            }
            async fn recent(&self, _: &str, _: i64) -> Result<Vec<TrendBucket>, DatabaseError> {
                Ok(Vec::new())
            }
        }

        let source = ScriptedSource { failing: vec![], buckets: vec![] };
        let service = RefreshService::new(source, FailingStore, 5);

        let outcomes = service.refresh_all(&["PHENELZINE".to_string()]).await;
        assert!(!outcomes[0].ok);
        assert!(outcomes[0].error.as_deref().unwrap_or("").contains("store failed"));
    }
}

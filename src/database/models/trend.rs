use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One cached observation: the adverse-event count for one subject on one
/// calendar day. (subject, bucket_date) is the primary key; a later write
/// for the same key replaces the count.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TrendBucket {
    pub subject: String,
    pub bucket_date: NaiveDate,
    pub count: i32,
    pub updated_at: DateTime<Utc>,
}

use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::api::params::{clamp_limit, parse_date, parse_subjects, resolve_range};
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::repository::TrendRepository;
use crate::error::ApiError;
use crate::types::DailyCount;

#[derive(Debug, Deserialize)]
pub struct TrendsQuery {
    /// Comma-separated subject list, e.g. subjects=PHENELZINE,ACETAZOLAMIDE
    pub subjects: Option<String>,
    /// Inclusive range bounds, YYYY-MM-DD. End defaults to today.
    pub start: Option<String>,
    pub end: Option<String>,
    /// Fallback window used to compute start when not given.
    pub window_days: Option<i64>,
}

/// GET /api/trends - cached series for one or more subjects over a date range.
/// Never touches the external data source; reads the cache only.
pub async fn query(Query(query): Query<TrendsQuery>) -> Result<Json<Value>, ApiError> {
    let subjects = parse_subjects(query.subjects.as_deref().unwrap_or(""));
    if subjects.is_empty() {
        return Err(ApiError::bad_request("at least one non-empty subject is required"));
    }

    let start = query.start.as_deref().map(parse_date).transpose().map_err(ApiError::bad_request)?;
    let end = query.end.as_deref().map(parse_date).transpose().map_err(ApiError::bad_request)?;
    let window_days = query.window_days.unwrap_or(config().api.default_window_days).max(0);

    let today = chrono::Utc::now().date_naive();
    let (start, end) = resolve_range(start, end, window_days, today).map_err(ApiError::bad_request)?;

    let pool = DatabaseManager::pool().await?;
    let rows = TrendRepository::new(pool).query_range(&subjects, start, end).await?;

    // Group rows per subject; rows arrive ordered by subject then date, so
    // each subject's points stay date-ascending.
    let mut grouped: HashMap<String, Vec<DailyCount>> = HashMap::new();
    for row in rows {
        grouped.entry(row.subject).or_default().push(DailyCount {
            date: row.bucket_date,
            count: row.count as i64,
        });
    }

    // One series per requested subject in request order; missing subjects
    // yield an empty points list, not an omitted entry.
    let series: Vec<Value> = subjects
        .iter()
        .map(|subject| {
            json!({
                "subject": subject,
                "points": grouped.remove(subject).unwrap_or_default(),
            })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "start": start,
            "end": end,
            "series": series,
        }
    })))
}

#[derive(Debug, Deserialize)]
pub struct BucketInput {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
pub struct TrendsUpsertRequest {
    pub subject: String,
    /// Optional explicit buckets to upsert before reading back.
    #[serde(default)]
    pub buckets: Vec<BucketInput>,
    /// How many recent buckets to return (default 12).
    pub limit: Option<i64>,
}

/// POST /api/trends - optionally upsert explicit buckets for a subject, then
/// return its most recent cached buckets, newest first.
pub async fn upsert_and_read(
    Json(body): Json<TrendsUpsertRequest>,
) -> Result<Json<Value>, ApiError> {
    let subject = body.subject.trim().to_uppercase();
    if subject.is_empty() {
        return Err(ApiError::bad_request("subject is required"));
    }

    // Validate every bucket before any I/O.
    let mut buckets = Vec::with_capacity(body.buckets.len());
    for input in &body.buckets {
        let date = parse_date(&input.date).map_err(ApiError::bad_request)?;
        // Mirror the storage clamp: counts live in an INTEGER column.
        buckets.push(DailyCount { date, count: input.count.clamp(0, i32::MAX as i64) });
    }

    let api = &config().api;
    let limit = clamp_limit(body.limit, api.recent_limit_default, 1, api.recent_limit_max);

    let pool = DatabaseManager::pool().await?;
    let repo = TrendRepository::new(pool);

    let updated = if buckets.is_empty() {
        0
    } else {
        repo.upsert_batch(&subject, &buckets).await?
    };

    let points: Vec<DailyCount> = repo
        .recent(&subject, limit)
        .await?
        .into_iter()
        .map(|b| DailyCount { date: b.bucket_date, count: b.count as i64 })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": {
            "subject": subject,
            "updated_count": updated,
            "points": points,
        }
    })))
}

use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::params::{clamp_limit, parse_subjects};
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::repository::ContraindicationRepository;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct InteractionsQuery {
    /// Comma-separated subject list; a record matches when either side of
    /// the pairing is in the set.
    pub subjects: Option<String>,
    /// Include minor-severity entries (default true).
    pub include_minor: Option<bool>,
    /// Result cap, clamped to [1, 5000].
    pub limit: Option<i64>,
}

/// GET /api/interactions - symmetric interaction lookup across subjects.
/// (A, B) and (B, A) are treated as the same fact and de-duplicated.
pub async fn lookup(Query(query): Query<InteractionsQuery>) -> Result<Json<Value>, ApiError> {
    let subjects = parse_subjects(query.subjects.as_deref().unwrap_or(""));
    if subjects.is_empty() {
        return Err(ApiError::bad_request("at least one non-empty subject is required"));
    }

    let api = &config().api;
    let cap = clamp_limit(query.limit, api.interaction_cap_default, 1, api.interaction_cap_max);
    let include_minor = query.include_minor.unwrap_or(true);

    let pool = DatabaseManager::pool().await?;
    let records = ContraindicationRepository::new(pool)
        .lookup(&subjects, include_minor, cap)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "count": records.len(),
            "interactions": records,
        }
    })))
}

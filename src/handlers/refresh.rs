use axum::{http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::repository::TrendRepository;
use crate::error::ApiError;
use crate::fetcher::FaersClient;
use crate::services::refresh_service::RefreshService;

pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

#[derive(Debug, Deserialize, Default)]
pub struct RefreshRequest {
    /// Optional override of the configured subject list.
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Reject unless the shared-secret header matches the configured value.
/// No work happens before this check.
fn authorize(headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = config()
        .refresh
        .cron_secret
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("refresh secret is not configured"))?;

    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided != expected {
        return Err(ApiError::unauthorized("missing or invalid cron secret"));
    }
    Ok(())
}

/// POST /api/refresh - fetch, normalize and cache adverse-event counts for
/// every tracked subject. One subject's failure never aborts the batch; the
/// response carries a per-subject breakdown.
pub async fn trigger(
    headers: HeaderMap,
    body: Option<Json<RefreshRequest>>,
) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;

    let config = config();
    let subjects: Vec<String> = {
        let overridden: Vec<String> = body
            .map(|Json(b)| b.subjects)
            .unwrap_or_default()
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
        if overridden.is_empty() {
            config.refresh.subjects.clone()
        } else {
            overridden
        }
    };

    if subjects.is_empty() {
        return Err(ApiError::bad_request("no subjects to refresh"));
    }

    let pool = DatabaseManager::pool().await?;
    let service = RefreshService::new(
        FaersClient::new(&config.fetcher),
        TrendRepository::new(pool),
        config.refresh.preview_limit,
    );

    let outcomes = service.refresh_all(&subjects).await;
    let all_ok = outcomes.iter().all(|o| o.ok);

    Ok(Json(json!({
        "success": all_ok,
        "data": {
            "results": outcomes,
        }
    })))
}

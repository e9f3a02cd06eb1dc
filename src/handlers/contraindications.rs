use axum::{extract::Query, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::params::clamp_limit;
use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::repository::{ContraindicationRepository, ContraindicationSearch};
use crate::error::ApiError;
use crate::types::Severity;

#[derive(Debug, Deserialize)]
pub struct ContraindicationsQuery {
    pub subject: Option<String>,
    /// Optional severity filter: major / moderate / minor.
    pub severity: Option<String>,
    /// Free-text search over interacting factor and note.
    pub q: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// GET /api/contraindications - paginated contraindication search for one
/// subject drug.
pub async fn search(Query(query): Query<ContraindicationsQuery>) -> Result<Json<Value>, ApiError> {
    let subject = query.subject.as_deref().unwrap_or("").trim().to_uppercase();
    if subject.is_empty() {
        return Err(ApiError::bad_request("subject is required"));
    }

    let severity = match query.severity.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            Severity::parse(raw)
                .ok_or_else(|| ApiError::bad_request(format!("invalid severity: {:?}", raw)))?,
        ),
    };

    let api = &config().api;
    let page = query.page.unwrap_or(1).max(1);
    let page_size = clamp_limit(query.page_size, api.default_page_size, 1, api.max_page_size);

    let params = ContraindicationSearch {
        subject,
        severity,
        text: query.q.filter(|q| !q.trim().is_empty()),
        page,
        page_size,
    };

    let pool = DatabaseManager::pool().await?;
    let (records, total) = ContraindicationRepository::new(pool).search(&params).await?;

    let pages = if total == 0 { 0 } else { (total + page_size - 1) / page_size };

    Ok(Json(json!({
        "success": true,
        "data": {
            "records": records,
            "total": total,
            "page": page,
            "page_size": page_size,
            "pages": pages,
        }
    })))
}

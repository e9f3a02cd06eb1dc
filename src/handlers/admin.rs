use axum::{http::HeaderMap, response::Json};
use serde_json::{json, Value};

use crate::config::config;
use crate::database::manager::DatabaseManager;
use crate::database::migrate as db_migrate;
use crate::error::ApiError;
use crate::services::seed_service::SeedService;

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

fn authorize(headers: &HeaderMap) -> Result<(), ApiError> {
    let expected = config()
        .admin
        .token
        .as_deref()
        .ok_or_else(|| ApiError::service_unavailable("admin token is not configured"))?;

    let provided = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if provided != expected {
        return Err(ApiError::unauthorized("missing or invalid admin token"));
    }
    Ok(())
}

/// POST /api/admin/migrate - create cache tables/indexes if absent.
pub async fn migrate(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;

    let pool = DatabaseManager::pool().await?;
    db_migrate::run(&pool).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "migrated": true }
    })))
}

/// POST /api/admin/seed - insert demonstration rows (idempotent).
pub async fn seed(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    authorize(&headers)?;

    let pool = DatabaseManager::pool().await?;
    let summary = SeedService::new(pool).seed().await?;

    Ok(Json(json!({
        "success": true,
        "data": summary
    })))
}

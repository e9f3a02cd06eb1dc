use axum::{
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Cached reads (never touch the external data source)
        .route(
            "/api/trends",
            get(handlers::trends::query).post(handlers::trends::upsert_and_read),
        )
        .route("/api/interactions", get(handlers::interactions::lookup))
        .route("/api/contraindications", get(handlers::contraindications::search))
        // Cron-secret guarded refresh trigger
        .route("/api/refresh", post(handlers::refresh::trigger))
        // Token-guarded admin
        .route("/api/admin/migrate", post(handlers::admin::migrate))
        .route("/api/admin/seed", post(handlers::admin::seed))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is terminated.
pub async fn run(port: u16) -> anyhow::Result<()> {
    let app = app();

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("SummitCare trends API listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Port from SUMMIT_API_PORT or PORT, falling back to 3000.
pub fn port_from_env() -> u16 {
    std::env::var("SUMMIT_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "SummitCare Trends API",
            "version": version,
            "description": "Adverse-event refresh-and-cache service with contraindication lookup",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "trends": "GET /api/trends?subjects=A,B[&start=..&end=..&window_days=..]",
                "trends_upsert": "POST /api/trends {subject, buckets?, limit?}",
                "interactions": "GET /api/interactions?subjects=A,B[&include_minor=..&limit=..]",
                "contraindications": "GET /api/contraindications?subject=A[&severity=..&q=..&page=..&page_size=..]",
                "refresh": "POST /api/refresh (requires x-cron-secret)",
                "admin": "POST /api/admin/{migrate,seed} (requires x-admin-token)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

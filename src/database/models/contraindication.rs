use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A known interaction/warning between a subject drug and another substance
/// or condition. Severity is stored as text ("major" / "moderate" / "minor");
/// ordering lives in `crate::types::Severity`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contraindication {
    pub id: Uuid,
    pub drug: String,
    pub interacting_factor: String,
    pub severity: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

/// Create the cache tables and indexes if they do not exist. Safe to run on
/// every startup and from the admin endpoint; every statement is idempotent.
pub async fn run(pool: &PgPool) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trend_cache (
            subject     TEXT        NOT NULL,
            bucket_date DATE        NOT NULL,
            count       INTEGER     NOT NULL DEFAULT 0,
            updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (subject, bucket_date)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contraindications (
            id                 UUID        PRIMARY KEY DEFAULT gen_random_uuid(),
            drug               TEXT        NOT NULL,
            interacting_factor TEXT        NOT NULL,
            severity           TEXT        NOT NULL,
            note               TEXT,
            created_at         TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at         TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contraindications_drug ON contraindications (drug)")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contraindications_drug_severity ON contraindications (drug, severity)",
    )
    .execute(pool)
    .await?;

    info!("Migration complete: trend_cache and contraindications ready");
    Ok(())
}

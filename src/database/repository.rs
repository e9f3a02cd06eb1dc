use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::HashSet;

use crate::database::manager::DatabaseError;
use crate::database::models::{Contraindication, TrendBucket};
use crate::types::{DailyCount, Severity};

/// Cache writer and reader for adverse-event trend buckets.
///
/// Writes go through a statement-level upsert keyed on (subject, bucket_date)
/// so repeated refreshes are idempotent and concurrent refreshes of the same
/// subject cannot race a read-then-write.
#[derive(Clone)]
pub struct TrendRepository {
    pool: PgPool,
}

const UPSERT_BUCKET_SQL: &str = r#"
    INSERT INTO trend_cache (subject, bucket_date, count, updated_at)
    VALUES ($1, $2, $3, now())
    ON CONFLICT (subject, bucket_date)
    DO UPDATE SET count = EXCLUDED.count, updated_at = now()
"#;

/// Counts are stored as INTEGER; clamp into [0, i32::MAX] so negative or
/// oversized inputs cannot wrap at the bind.
pub fn clamp_count(raw: i64) -> i32 {
    i32::try_from(raw.max(0)).unwrap_or(i32::MAX)
}

/// Write/read seam for the trend cache, so the refresh orchestration can be
/// exercised without a live database.
#[async_trait]
pub trait TrendStore: Send + Sync {
    async fn upsert_batch(&self, subject: &str, buckets: &[DailyCount]) -> Result<u64, DatabaseError>;
    async fn recent(&self, subject: &str, limit: i64) -> Result<Vec<TrendBucket>, DatabaseError>;
}

#[async_trait]
impl TrendStore for TrendRepository {
    async fn upsert_batch(&self, subject: &str, buckets: &[DailyCount]) -> Result<u64, DatabaseError> {
        TrendRepository::upsert_batch(self, subject, buckets).await
    }

    async fn recent(&self, subject: &str, limit: i64) -> Result<Vec<TrendBucket>, DatabaseError> {
        TrendRepository::recent(self, subject, limit).await
    }
}

impl TrendRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert every bucket for one subject inside a single transaction.
    /// Either all buckets commit or none do; buckets are applied in the
    /// order received. Returns the number of buckets written.
    pub async fn upsert_batch(
        &self,
        subject: &str,
        buckets: &[DailyCount],
    ) -> Result<u64, DatabaseError> {
        let subject = subject.trim().to_uppercase();
        if subject.is_empty() {
            return Err(DatabaseError::QueryError("empty subject".to_string()));
        }

        let mut tx = self.pool.begin().await?;
        for bucket in buckets {
            sqlx::query(UPSERT_BUCKET_SQL)
                .bind(&subject)
                .bind(bucket.date)
                .bind(clamp_count(bucket.count))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(buckets.len() as u64)
    }

    /// All cached buckets for the given subjects within [start, end],
    /// ordered by subject then date ascending.
    pub async fn query_range(
        &self,
        subjects: &[String],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<TrendBucket>, DatabaseError> {
        let rows = sqlx::query_as::<_, TrendBucket>(
            r#"
            SELECT subject, bucket_date, count, updated_at
            FROM trend_cache
            WHERE subject = ANY($1) AND bucket_date BETWEEN $2 AND $3
            ORDER BY subject ASC, bucket_date ASC
            "#,
        )
        .bind(subjects)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Most recent `limit` buckets for one subject, newest first.
    pub async fn recent(&self, subject: &str, limit: i64) -> Result<Vec<TrendBucket>, DatabaseError> {
        let subject = subject.trim().to_uppercase();
        let rows = sqlx::query_as::<_, TrendBucket>(
            r#"
            SELECT subject, bucket_date, count, updated_at
            FROM trend_cache
            WHERE subject = $1
            ORDER BY bucket_date DESC
            LIMIT $2
            "#,
        )
        .bind(&subject)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

/// Parameters for the paginated contraindication search.
#[derive(Debug, Clone)]
pub struct ContraindicationSearch {
    pub subject: String,
    pub severity: Option<Severity>,
    pub text: Option<String>,
    pub page: i64,
    pub page_size: i64,
}

/// Read-mostly reference store of drug interaction records.
#[derive(Clone)]
pub struct ContraindicationRepository {
    pool: PgPool,
}

impl ContraindicationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a record unless the (drug, factor, severity) triple already
    /// exists. There is no DB-level uniqueness on this table, so seeding
    /// relies on this check for idempotency. Returns true if inserted.
    pub async fn insert_if_absent(
        &self,
        drug: &str,
        interacting_factor: &str,
        severity: Severity,
        note: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let drug = drug.trim().to_uppercase();
        let factor = interacting_factor.trim().to_uppercase();

        let existing: Option<(uuid::Uuid,)> = sqlx::query_as(
            "SELECT id FROM contraindications WHERE drug = $1 AND interacting_factor = $2 AND severity = $3",
        )
        .bind(&drug)
        .bind(&factor)
        .bind(severity.as_str())
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO contraindications (id, drug, interacting_factor, severity, note)
            VALUES (gen_random_uuid(), $1, $2, $3, $4)
            "#,
        )
        .bind(&drug)
        .bind(&factor)
        .bind(severity.as_str())
        .bind(note)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    /// Paginated search scoped to one subject drug, ordered by severity rank
    /// then factor. Returns the page of records and the total match count.
    pub async fn search(
        &self,
        params: &ContraindicationSearch,
    ) -> Result<(Vec<Contraindication>, i64), DatabaseError> {
        let subject = params.subject.trim().to_uppercase();
        let severity = params.severity.map(|s| s.as_str().to_string());
        let pattern = params.text.as_ref().map(|t| format!("%{}%", t.trim()));
        let offset = (params.page - 1).max(0) * params.page_size;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM contraindications
            WHERE drug = $1
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::text IS NULL OR interacting_factor ILIKE $3 OR note ILIKE $3)
            "#,
        )
        .bind(&subject)
        .bind(&severity)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, Contraindication>(
            r#"
            SELECT id, drug, interacting_factor, severity, note, created_at, updated_at
            FROM contraindications
            WHERE drug = $1
              AND ($2::text IS NULL OR severity = $2)
              AND ($3::text IS NULL OR interacting_factor ILIKE $3 OR note ILIKE $3)
            ORDER BY CASE severity WHEN 'major' THEN 0 WHEN 'moderate' THEN 1 ELSE 2 END,
                     interacting_factor ASC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(&subject)
        .bind(&severity)
        .bind(&pattern)
        .bind(params.page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Interaction lookup across one or more subjects. A record matches when
    /// either side of the pairing is in the subject set. Symmetric duplicates
    /// are collapsed by DISTINCT ON over the ordered pair before the cap is
    /// applied, so a capped response still holds `cap` unique pairs when that
    /// many exist; the oldest row wins for each pair.
    pub async fn lookup(
        &self,
        subjects: &[String],
        include_minor: bool,
        cap: i64,
    ) -> Result<Vec<Contraindication>, DatabaseError> {
        let rows = sqlx::query_as::<_, Contraindication>(
            r#"
            SELECT id, drug, interacting_factor, severity, note, created_at, updated_at
            FROM (
                SELECT DISTINCT ON (
                    LEAST(drug, interacting_factor),
                    GREATEST(drug, interacting_factor),
                    severity
                ) *
                FROM contraindications
                WHERE (drug = ANY($1) OR interacting_factor = ANY($1))
                  AND ($2 OR severity IN ('major', 'moderate'))
                ORDER BY LEAST(drug, interacting_factor),
                         GREATEST(drug, interacting_factor),
                         severity, created_at ASC
            ) t
            ORDER BY CASE severity WHEN 'major' THEN 0 WHEN 'moderate' THEN 1 ELSE 2 END,
                     drug ASC, interacting_factor ASC
            LIMIT $3
            "#,
        )
        .bind(subjects)
        .bind(include_minor)
        .bind(cap)
        .fetch_all(&self.pool)
        .await?;

        Ok(dedup_symmetric(rows))
    }
}

/// Collapse symmetric pairs: (A, B, severity) and (B, A, severity) describe
/// the same fact. The de-dup key orders the two identifiers lexicographically;
/// the first occurrence wins.
pub fn dedup_symmetric(records: Vec<Contraindication>) -> Vec<Contraindication> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut out = Vec::with_capacity(records.len());

    for record in records {
        let (lo, hi) = if record.drug <= record.interacting_factor {
            (record.drug.clone(), record.interacting_factor.clone())
        } else {
            (record.interacting_factor.clone(), record.drug.clone())
        };
        if seen.insert((lo, hi, record.severity.clone())) {
            out.push(record);
        }
    }

    out
}

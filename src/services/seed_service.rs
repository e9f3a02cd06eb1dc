//! Demonstration data for development and demos. Idempotent: contraindication
//! rows are existence-checked before insert, trend buckets go through the
//! keyed upsert.

use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::repository::{ContraindicationRepository, TrendRepository};
use crate::types::{DailyCount, Severity};

#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub contraindications_inserted: u64,
    pub trend_buckets_written: u64,
}

const DEMO_CONTRAINDICATIONS: &[(&str, &str, Severity, &str)] = &[
    (
        "PHENELZINE",
        "TYRAMINE",
        Severity::Major,
        "MAOI + tyramine-rich foods can trigger hypertensive crisis",
    ),
    (
        "PHENELZINE",
        "PSEUDOEPHEDRINE",
        Severity::Major,
        "Sympathomimetic decongestants with MAOIs raise blood pressure sharply",
    ),
    (
        "ACETAZOLAMIDE",
        "ASPIRIN",
        Severity::Major,
        "High-dose salicylates with acetazolamide risk metabolic acidosis at altitude",
    ),
    (
        "ACETAZOLAMIDE",
        "TOPIRAMATE",
        Severity::Moderate,
        "Both are carbonic anhydrase inhibitors; additive kidney stone risk",
    ),
    (
        "NIFEDIPINE",
        "SILDENAFIL",
        Severity::Major,
        "Combined vasodilation can cause severe hypotension",
    ),
    (
        "DEXAMETHASONE",
        "IBUPROFEN",
        Severity::Moderate,
        "Corticosteroid plus NSAID increases GI bleeding risk",
    ),
    (
        "IBUPROFEN",
        "CAFFEINE",
        Severity::Minor,
        "May mildly increase NSAID absorption",
    ),
];

pub struct SeedService {
    trends: TrendRepository,
    contraindications: ContraindicationRepository,
}

impl SeedService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            trends: TrendRepository::new(pool.clone()),
            contraindications: ContraindicationRepository::new(pool),
        }
    }

    pub async fn seed(&self) -> Result<SeedSummary, DatabaseError> {
        let mut inserted = 0u64;
        for (drug, factor, severity, note) in DEMO_CONTRAINDICATIONS {
            if self
                .contraindications
                .insert_if_absent(drug, factor, *severity, Some(note))
                .await?
            {
                inserted += 1;
            }
        }

        // A couple of recent buckets for the default subject so the trends
        // endpoints have something to show before the first real refresh.
        let today = Utc::now().date_naive();
        let buckets = vec![
            DailyCount { date: today - chrono::Duration::days(1), count: 9 },
            DailyCount { date: today, count: 12 },
        ];
        let written = self.trends.upsert_batch("PHENELZINE", &buckets).await?;

        info!("seed complete: {} contraindications inserted, {} buckets written", inserted, written);

        Ok(SeedSummary {
            contraindications_inserted: inserted,
            trend_buckets_written: written,
        })
    }
}

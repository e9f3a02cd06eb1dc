//! Query-parameter parsing and clamping shared by the read handlers.

use chrono::NaiveDate;

use crate::fetcher::normalize_bucket_date;

/// Split a comma-separated subject list, trim and uppercase each entry, drop
/// empties, and de-duplicate while preserving request order.
pub fn parse_subjects(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split(',') {
        let subject = part.trim().to_uppercase();
        if subject.is_empty() || out.contains(&subject) {
            continue;
        }
        out.push(subject);
    }
    out
}

/// Clamp a caller-supplied limit into [min, max], falling back to `default`
/// when absent.
pub fn clamp_limit(requested: Option<i64>, default: i64, min: i64, max: i64) -> i64 {
    requested.unwrap_or(default).clamp(min, max)
}

/// Parse an inclusive date range from optional explicit bounds. The end
/// defaults to `today`; the start defaults to `end - window_days`.
pub fn resolve_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    window_days: i64,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), String> {
    let end = end.unwrap_or(today);
    let start = start.unwrap_or_else(|| end - chrono::Duration::days(window_days));
    if start > end {
        return Err(format!("start date {} is after end date {}", start, end));
    }
    Ok((start, end))
}

/// Lenient date parsing for query strings: same formats the fetcher accepts.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    normalize_bucket_date(raw).ok_or_else(|| format!("invalid date: {:?} (expected YYYY-MM-DD)", raw))
}

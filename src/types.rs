/// Shared types used across the codebase

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ordinal classification of an interaction's clinical seriousness.
/// Ordering is major > moderate > minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Major,
    Moderate,
    Minor,
}

impl Severity {
    /// Lower rank sorts first (major = 0).
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Major => 0,
            Severity::Moderate => 1,
            Severity::Minor => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Major => "major",
            Severity::Moderate => "moderate",
            Severity::Minor => "minor",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Some(Severity::Major),
            "moderate" => Some(Severity::Moderate),
            "minor" => Some(Severity::Minor),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized (date, count) observation produced by the fetcher and
/// consumed by the cache writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_rank_orders_major_first() {
        assert!(Severity::Major.rank() < Severity::Moderate.rank());
        assert!(Severity::Moderate.rank() < Severity::Minor.rank());
    }

    #[test]
    fn severity_parse_is_case_insensitive() {
        assert_eq!(Severity::parse("MAJOR"), Some(Severity::Major));
        assert_eq!(Severity::parse(" moderate "), Some(Severity::Moderate));
        assert_eq!(Severity::parse("critical"), None);
    }
}

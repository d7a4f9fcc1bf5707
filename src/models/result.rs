// src/models/result.rs

//! Normalized race results and the cached per-athlete profile.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AthleteId, Distance, Gender};

/// A single normalized race result.
///
/// Produced by a platform parser; part of a most-recent-first sequence owned
/// by a [`CachedProfile`]. Finish time is whole seconds and always positive;
/// the date is never in the future (rows violating either are dropped at
/// parse time).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    /// Event name as shown on the results page
    pub event: String,

    /// Canonical distance
    pub distance: Distance,

    /// Race date
    pub date: NaiveDate,

    /// Finish time in whole seconds
    pub seconds: u32,

    /// Age on race day, when the platform reports it
    #[serde(default)]
    pub age_on_day: Option<u32>,

    /// Gender, when the platform reports it
    #[serde(default)]
    pub gender: Option<Gender>,

    /// Finishing position, when listed
    #[serde(default)]
    pub position: Option<u32>,

    /// Field size, when listed
    #[serde(default)]
    pub field_size: Option<u32>,

    /// Age grade percentage as printed on the page, if any
    #[serde(default)]
    pub listed_age_grade: Option<f64>,

    /// Whether the page flagged this run as a personal best
    #[serde(default)]
    pub personal_best: bool,
}

impl RaceResult {
    /// Finish time rendered back to `M:SS` / `H:MM:SS`.
    pub fn time_string(&self) -> String {
        crate::convert::seconds_to_time_string(i64::from(self.seconds))
            .unwrap_or_else(|_| "0:00".to_string())
    }
}

/// Freshness of a cached profile relative to its last fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    /// Last fetch succeeded and the record is current
    Fresh,
    /// Record outlived its TTL and the refresh attempt failed
    Stale,
    /// Terminal failure with no usable data
    Failed,
}

/// The cached record for one athlete identifier.
///
/// Replaced wholesale by a successful fetch cycle; a failed refresh keeps the
/// prior result sequence untouched and only updates the bookkeeping fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedProfile {
    /// The identifier this record belongs to
    pub athlete: AthleteId,

    /// Athlete display name, when the page carried one
    pub name: Option<String>,

    /// Club affiliation, when the platform lists one
    #[serde(default)]
    pub club: Option<String>,

    /// Result sequence, most recent first
    pub results: Vec<RaceResult>,

    /// When the stored result sequence was last successfully fetched
    pub fetched_at: DateTime<Utc>,

    /// When a refresh was last attempted, successful or not
    pub last_attempt_at: DateTime<Utc>,

    /// Freshness marker
    pub status: FetchStatus,

    /// Rows the parser dropped for unparsable required fields
    pub dropped_rows: usize,
}

impl CachedProfile {
    /// Build a fresh profile from a completed fetch cycle.
    pub fn fresh(
        athlete: AthleteId,
        name: Option<String>,
        results: Vec<RaceResult>,
        dropped_rows: usize,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            athlete,
            name,
            club: None,
            results,
            fetched_at: now,
            last_attempt_at: now,
            status: FetchStatus::Fresh,
            dropped_rows,
        }
    }

    /// Age of the stored data relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }

    /// Whether the stored data is still within its TTL.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: chrono::Duration) -> bool {
        self.status == FetchStatus::Fresh && self.age(now) < ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use chrono::Duration;

    fn sample_profile(fetched_hours_ago: i64) -> CachedProfile {
        let now = Utc::now();
        CachedProfile {
            athlete: AthleteId::new(Platform::Parkrun, "123456".to_string()),
            name: Some("Test Runner".to_string()),
            club: None,
            results: Vec::new(),
            fetched_at: now - Duration::hours(fetched_hours_ago),
            last_attempt_at: now - Duration::hours(fetched_hours_ago),
            status: FetchStatus::Fresh,
            dropped_rows: 0,
        }
    }

    #[test]
    fn test_is_fresh_within_ttl() {
        let profile = sample_profile(2);
        assert!(profile.is_fresh(Utc::now(), Duration::hours(6)));
    }

    #[test]
    fn test_is_fresh_past_ttl() {
        let profile = sample_profile(7);
        assert!(!profile.is_fresh(Utc::now(), Duration::hours(6)));
    }

    #[test]
    fn test_stale_never_fresh() {
        let mut profile = sample_profile(1);
        profile.status = FetchStatus::Stale;
        assert!(!profile.is_fresh(Utc::now(), Duration::hours(6)));
    }

    #[test]
    fn test_profile_serde_round_trip() {
        let profile = sample_profile(0);
        let json = serde_json::to_string(&profile).unwrap();
        let loaded: CachedProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.athlete.cache_key(), "parkrun:123456");
        assert_eq!(loaded.status, FetchStatus::Fresh);
    }
}

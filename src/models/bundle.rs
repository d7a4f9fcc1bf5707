// src/models/bundle.rs

//! Derived comparison output. Never persisted; recomputed on every read.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Trend classification over a chronological sequence of same-distance times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
    /// Fewer than three comparable results; not an error
    InsufficientData,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Declining => "declining",
            Trend::InsufficientData => "insufficient data",
        };
        f.write_str(s)
    }
}

/// Performance band for an age-grade percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeCategory {
    WorldClass,
    National,
    Regional,
    Club,
    Recreational,
    Beginner,
}

impl GradeCategory {
    pub fn description(&self) -> &'static str {
        match self {
            GradeCategory::WorldClass => "World Class",
            GradeCategory::National => "National Class",
            GradeCategory::Regional => "Regional Class",
            GradeCategory::Club => "Club Runner",
            GradeCategory::Recreational => "Recreational",
            GradeCategory::Beginner => "Beginner",
        }
    }
}

/// Basic aggregate statistics over a result sequence, with a typical
/// (outlier-excluded) mean alongside the raw one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub best_seconds: u32,
    pub worst_seconds: u32,
    pub mean_seconds: u32,
    pub median_seconds: u32,
    /// Mean over results not flagged as outliers
    pub typical_mean_seconds: u32,
    pub outlier_count: usize,
}

/// The full comparison output for one cached profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonBundle {
    /// Percentile rank (0-100) of the typical time against the reference
    /// distribution; `None` when the profile has no comparable results
    pub percentile: Option<f64>,

    /// Age-graded percentage; `None` means "ungraded" (missing age/gender or
    /// no table entry), never a hard failure
    pub age_grade: Option<f64>,

    /// Band for `age_grade`, when graded
    pub grade_category: Option<GradeCategory>,

    /// Trend over the primary distance
    pub trend: Trend,

    /// Outlier flag per result, aligned with the profile's result order
    pub outliers: Vec<bool>,

    /// Aggregate statistics; `None` for an empty profile
    pub stats: Option<SummaryStats>,
}

impl ComparisonBundle {
    /// Bundle for a profile with no results at all.
    pub fn empty() -> Self {
        Self {
            percentile: None,
            age_grade: None,
            grade_category: None,
            trend: Trend::InsufficientData,
            outliers: Vec::new(),
            stats: None,
        }
    }
}

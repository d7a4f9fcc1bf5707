// src/models/athlete.rs

//! Athlete identity and the small closed vocabularies shared across the
//! pipeline: platforms, genders and canonical race distances.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest identifier value accepted on any platform.
pub const ID_SANITY_CEILING: u64 = 99_999_999_999;

/// Results platform an athlete identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Parkrun,
    PowerOf10,
    Athlinks,
}

impl Platform {
    /// Maximum number of digits an identifier may have on this platform.
    pub fn digit_cap(&self) -> usize {
        match self {
            Platform::Parkrun | Platform::PowerOf10 => 10,
            Platform::Athlinks => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Parkrun => "parkrun",
            Platform::PowerOf10 => "powerof10",
            Platform::Athlinks => "athlinks",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated athlete identifier: a platform tag plus a digits-only string.
///
/// Constructed only through [`crate::convert::validate_identifier`], so any
/// value of this type already satisfies the per-platform digit cap and the
/// global sanity ceiling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AthleteId {
    platform: Platform,
    id: String,
}

impl AthleteId {
    pub(crate) fn new(platform: Platform, id: String) -> Self {
        Self { platform, id }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Stable key for storage and per-identifier locking.
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.platform.as_str(), self.id)
    }
}

impl fmt::Display for AthleteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.platform, self.id)
    }
}

/// Athlete gender as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse the strings the platforms actually emit. Case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "men" => Some(Gender::Male),
            "female" | "f" | "w" | "women" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical race distance. Free-text distances from upstream pages are
/// normalized into one of these before a result is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distance {
    FiveK,
    TenK,
    TenMiles,
    HalfMarathon,
    Marathon,
}

impl Distance {
    pub fn label(&self) -> &'static str {
        match self {
            Distance::FiveK => "5K",
            Distance::TenK => "10K",
            Distance::TenMiles => "10M",
            Distance::HalfMarathon => "Half Marathon",
            Distance::Marathon => "Marathon",
        }
    }

    /// Map a Power of 10 event code to a canonical distance.
    pub fn from_event_code(code: &str) -> Option<Self> {
        match code.trim() {
            "5K" | "5000" | "parkrun" => Some(Distance::FiveK),
            "10K" | "10000" => Some(Distance::TenK),
            "10M" => Some(Distance::TenMiles),
            "HM" => Some(Distance::HalfMarathon),
            "Mar" => Some(Distance::Marathon),
            _ => None,
        }
    }

    /// Categorize a measured distance in kilometers, tolerating the course
    /// measurement slop seen in Athlinks listings.
    pub fn from_km(km: f64) -> Option<Self> {
        match km {
            k if (4.8..=5.2).contains(&k) => Some(Distance::FiveK),
            k if (9.5..=10.5).contains(&k) => Some(Distance::TenK),
            k if (15.5..=16.5).contains(&k) => Some(Distance::TenMiles),
            k if (20.5..=21.5).contains(&k) => Some(Distance::HalfMarathon),
            k if (41.5..=42.5).contains(&k) => Some(Distance::Marathon),
            _ => None,
        }
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// src/models/mod.rs

//! Core data structures for the result pipeline.

mod athlete;
mod bundle;
mod result;

pub use athlete::{AthleteId, Distance, Gender, ID_SANITY_CEILING, Platform};
pub use bundle::{ComparisonBundle, GradeCategory, SummaryStats, Trend};
pub use result::{CachedProfile, FetchStatus, RaceResult};

// src/platforms/mod.rs

//! Platform-specific result page parsers.
//!
//! Each platform implements [`PlatformParser`]: build the profile URL for an
//! identifier, then turn the fetched page into a most-recent-first result
//! sequence. Row-level problems drop the row and bump a counter; only a page
//! whose overall structure is missing produces [`AppError::Parse`].

mod athlinks;
mod parkrun;
mod powerof10;

pub use athlinks::AthlinksParser;
pub use parkrun::ParkrunParser;
pub use powerof10::PowerOf10Parser;

use scraper::Selector;

use crate::error::{AppError, Result};
use crate::models::{AthleteId, Gender, Platform, RaceResult};

/// Everything a parser could extract from one profile page.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Athlete display name, when the page carried one
    pub athlete_name: Option<String>,

    /// Club affiliation, when listed
    pub club: Option<String>,

    /// Profile-level gender, when listed
    pub gender: Option<Gender>,

    /// Profile-level age group string (e.g. `V50`, `SEN`), when listed
    pub age_group: Option<String>,

    /// Results, most recent first. Empty is a valid outcome.
    pub results: Vec<RaceResult>,

    /// Rows skipped because a required field would not parse
    pub dropped_rows: usize,
}

/// A results platform the pipeline can pull from.
pub trait PlatformParser: Send + Sync {
    fn platform(&self) -> Platform;

    /// Public profile URL for an athlete on this platform.
    fn profile_url(&self, athlete: &AthleteId) -> String;

    /// Whether the page needs client-side scripts run before it carries any
    /// results. Honored only when fetching through the rendering proxy.
    fn needs_js_render(&self) -> bool {
        false
    }

    /// Parse a fetched profile page.
    ///
    /// Fails only when the page's expected structure is absent; individual
    /// bad rows are dropped and counted in the outcome.
    fn parse(&self, html: &str, athlete: &AthleteId) -> Result<ParseOutcome>;
}

/// The parser for a platform tag.
pub fn parser_for(platform: Platform) -> Box<dyn PlatformParser> {
    match platform {
        Platform::Parkrun => Box::new(ParkrunParser),
        Platform::PowerOf10 => Box::new(PowerOf10Parser),
        Platform::Athlinks => Box::new(AthlinksParser),
    }
}

pub(crate) fn parse_selector(platform: Platform, s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::parse(platform, format!("bad selector '{s}': {e:?}")))
}

/// Sort results most recent first, keeping page order for equal dates.
pub(crate) fn sort_most_recent_first(results: &mut [RaceResult]) {
    results.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_for_dispatch() {
        assert_eq!(parser_for(Platform::Parkrun).platform(), Platform::Parkrun);
        assert_eq!(
            parser_for(Platform::PowerOf10).platform(),
            Platform::PowerOf10
        );
        assert_eq!(parser_for(Platform::Athlinks).platform(), Platform::Athlinks);
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(parse_selector(Platform::Parkrun, "[[nope").is_err());
    }
}

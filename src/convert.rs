// src/convert.rs

//! Canonical conversion of time, date and identifier strings.
//!
//! Every other component goes through this module to turn the heterogeneous
//! strings found on results pages into canonical numeric forms.

use chrono::NaiveDate;

use crate::error::{AppError, Result};
use crate::models::{AthleteId, ID_SANITY_CEILING, Platform};

/// Parse `M:SS` / `MM:SS` / `H:MM:SS` into whole seconds.
///
/// Leading/trailing whitespace and a single trailing letter (chip-time
/// marker, e.g. `25:30c`) are tolerated. Fractional seconds are truncated.
/// Errors on empty input, non-numeric segments, out-of-range minutes or
/// seconds (>= 60), or the wrong number of segments.
pub fn parse_time_to_seconds(text: &str) -> Result<u32> {
    let mut trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "--" {
        return Err(AppError::format(text, "empty time string"));
    }

    // Chip-time marker: a single trailing ASCII letter.
    if trimmed
        .chars()
        .last()
        .is_some_and(|c| c.is_ascii_alphabetic())
    {
        trimmed = &trimmed[..trimmed.len() - 1];
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [m, s] => (0, parse_segment(text, m)?, parse_seconds_segment(text, s)?),
        [h, m, s] => (
            parse_segment(text, h)?,
            parse_segment(text, m)?,
            parse_seconds_segment(text, s)?,
        ),
        _ => {
            return Err(AppError::format(
                text,
                format!("expected 2 or 3 colon-separated segments, got {}", parts.len()),
            ));
        }
    };

    if minutes >= 60 {
        return Err(AppError::format(text, "minutes out of range"));
    }
    if seconds >= 60 {
        return Err(AppError::format(text, "seconds out of range"));
    }

    Ok(hours * 3600 + minutes * 60 + seconds)
}

fn parse_segment(original: &str, segment: &str) -> Result<u32> {
    segment
        .trim()
        .parse::<u32>()
        .map_err(|_| AppError::format(original, format!("non-numeric segment '{segment}'")))
}

/// Seconds segment may carry a fractional part, which is truncated.
fn parse_seconds_segment(original: &str, segment: &str) -> Result<u32> {
    let whole = segment.trim().split('.').next().unwrap_or("");
    parse_segment(original, whole)
}

/// Format whole seconds as `H:MM:SS` when >= one hour, else `M:SS`.
///
/// Errors on negative input.
pub fn seconds_to_time_string(seconds: i64) -> Result<String> {
    if seconds < 0 {
        return Err(AppError::validation(format!(
            "cannot format negative duration: {seconds}"
        )));
    }

    if seconds >= 3600 {
        let hours = seconds / 3600;
        let minutes = (seconds % 3600) / 60;
        let secs = seconds % 60;
        Ok(format!("{hours}:{minutes:02}:{secs:02}"))
    } else {
        let minutes = seconds / 60;
        let secs = seconds % 60;
        Ok(format!("{minutes}:{secs:02}"))
    }
}

/// Validate user-supplied identifier text for a platform.
///
/// Rejects with [`AppError::Validation`]: empty input, non-digit characters,
/// more digits than the platform cap, the value zero, or a value above the
/// global sanity ceiling.
pub fn validate_identifier(text: &str, platform: Platform) -> Result<AthleteId> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("athlete id is empty"));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation(format!(
            "athlete id '{trimmed}' contains non-digit characters"
        )));
    }
    let cap = platform.digit_cap();
    if trimmed.len() > cap {
        return Err(AppError::validation(format!(
            "athlete id '{trimmed}' exceeds {cap} digits for {platform}"
        )));
    }
    let value: u64 = trimmed.parse().map_err(|_| {
        AppError::validation(format!("athlete id '{trimmed}' is not a valid number"))
    })?;
    if value == 0 {
        return Err(AppError::validation("athlete id must be positive"));
    }
    if value > ID_SANITY_CEILING {
        return Err(AppError::validation(format!(
            "athlete id {value} exceeds the sanity ceiling"
        )));
    }

    Ok(AthleteId::new(platform, trimmed.to_string()))
}

/// Date formats the supported platforms actually emit.
const DATE_FORMATS: [&str; 5] = [
    "%d/%m/%Y", // parkrun: 14/09/2024
    "%d %b %y", // Power of 10: 14 Sep 24
    "%d %b %Y", // Power of 10, long year
    "%b %d, %Y", // Athlinks: Sep 14, 2024
    "%Y-%m-%d", // embedded JSON
];

/// Parse a race date in any of the platform formats.
pub fn parse_result_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::format(text, "empty date string"));
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(date);
        }
    }
    Err(AppError::format(text, "unrecognized date format"))
}

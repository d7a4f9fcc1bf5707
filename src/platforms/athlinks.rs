// src/platforms/athlinks.rs

//! Athlinks athlete profile parser.
//!
//! Athlinks is a single-page app, so the markup is unstable. Two passes:
//! first a set of CSS selector candidates over the rendered DOM, then a
//! fallback that digs race arrays out of the state JSON embedded in the
//! page. Distances arrive as free text ("Half Marathon", "10 km", "6.2
//! Miles") and are normalized to kilometers before categorization.

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html};
use serde_json::Value;

use super::{ParseOutcome, PlatformParser, parse_selector, sort_most_recent_first};
use crate::convert::{parse_result_date, parse_time_to_seconds};
use crate::error::{AppError, Result};
use crate::models::{AthleteId, Distance, Platform, RaceResult};

const NAME_SELECTORS: &str = "h1.athlete-name, .athlete-name, .profile-name, h1";
const RACE_SELECTORS: [&str; 5] = [
    ".race-result",
    ".result-row",
    ".race-item",
    "tr.result",
    ".event-result",
];

pub struct AthlinksParser;

impl PlatformParser for AthlinksParser {
    fn platform(&self) -> Platform {
        Platform::Athlinks
    }

    fn profile_url(&self, athlete: &AthleteId) -> String {
        format!("https://www.athlinks.com/athletes/{}", athlete.as_str())
    }

    // Single-page app: without rendering only the embedded-state JSON
    // fallback has anything to offer.
    fn needs_js_render(&self) -> bool {
        true
    }

    fn parse(&self, html: &str, athlete: &AthleteId) -> Result<ParseOutcome> {
        let lowered = html.to_ascii_lowercase();
        if lowered.contains("athlete not found") || lowered.contains("page not found") {
            return Err(AppError::parse(
                self.platform(),
                format!("athlete {} not found", athlete.as_str()),
            ));
        }

        let document = Html::parse_document(html);
        let mut outcome = ParseOutcome {
            athlete_name: athlete_name(&document)?,
            ..ParseOutcome::default()
        };

        let race_elements = find_race_elements(&document)?;
        if race_elements.is_empty() {
            // SPA markup absent; fall back to the embedded state JSON.
            parse_embedded_json(html, &mut outcome);
        } else {
            let today = Utc::now().date_naive();
            for elem in race_elements {
                parse_race_element(&elem, today, &mut outcome)?;
            }
        }

        sort_most_recent_first(&mut outcome.results);
        Ok(outcome)
    }
}

fn athlete_name(document: &Html) -> Result<Option<String>> {
    let sel = parse_selector(Platform::Athlinks, NAME_SELECTORS)?;
    for elem in document.select(&sel) {
        let text: String = elem.text().collect::<String>().trim().to_string();
        if !text.is_empty() {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

fn find_race_elements(document: &Html) -> Result<Vec<ElementRef<'_>>> {
    for candidate in RACE_SELECTORS {
        let sel = parse_selector(Platform::Athlinks, candidate)?;
        let elements: Vec<ElementRef> = document.select(&sel).collect();
        if !elements.is_empty() {
            return Ok(elements);
        }
    }
    Ok(Vec::new())
}

fn parse_race_element(
    elem: &ElementRef,
    today: chrono::NaiveDate,
    outcome: &mut ParseOutcome,
) -> Result<()> {
    let event = select_text(elem, ".event-name, .race-name, .event-title, a")?;
    let date_text = select_text(elem, ".date, .race-date, .event-date, time")?;
    let time_text = select_text(elem, ".time, .finish-time, .result-time")?;
    let distance_text = select_text(elem, ".distance, .race-distance")?;

    let distance = distance_text
        .as_deref()
        .and_then(parse_distance_km)
        .and_then(Distance::from_km);

    let parsed = (
        date_text.as_deref().map(parse_result_date),
        time_text.as_deref().map(parse_time_to_seconds),
        distance,
    );
    let (Some(Ok(date)), Some(Ok(seconds)), Some(distance)) = parsed else {
        outcome.dropped_rows += 1;
        log::debug!(
            "Dropping athlinks row: date={date_text:?} time={time_text:?} distance={distance_text:?}"
        );
        return Ok(());
    };
    if seconds == 0 || date > today {
        outcome.dropped_rows += 1;
        return Ok(());
    }

    outcome.results.push(RaceResult {
        event: event.unwrap_or_else(|| distance.label().to_string()),
        distance,
        date,
        seconds,
        age_on_day: None,
        gender: None,
        position: None,
        field_size: None,
        listed_age_grade: None,
        personal_best: false,
    });
    Ok(())
}

fn select_text(elem: &ElementRef, selectors: &str) -> Result<Option<String>> {
    let sel = parse_selector(Platform::Athlinks, selectors)?;
    Ok(elem.select(&sel).next().map(|e| {
        e.text().collect::<String>().trim().to_string()
    }))
}

/// Pull race arrays out of the SPA's embedded state JSON.
fn parse_embedded_json(html: &str, outcome: &mut ParseOutcome) {
    let patterns = [
        r"(?s)window\.__INITIAL_STATE__\s*=\s*(\{.*?\});",
        r"(?s)window\.__PRELOADED_STATE__\s*=\s*(\{.*?\});",
        r#"(?s)"races":\s*(\[.*?\])"#,
    ];

    for pattern in patterns {
        let Some(captured) = Regex::new(pattern)
            .ok()
            .and_then(|re| re.captures(html))
            .and_then(|c| c.get(1))
        else {
            continue;
        };
        let Ok(data) = serde_json::from_str::<Value>(captured.as_str()) else {
            continue;
        };
        if process_json_data(&data, outcome) {
            return;
        }
    }
}

/// Returns true when the JSON yielded any race entries to process.
fn process_json_data(data: &Value, outcome: &mut ParseOutcome) -> bool {
    if outcome.athlete_name.is_none() {
        outcome.athlete_name = data
            .get("name")
            .or_else(|| data.get("displayName"))
            .and_then(Value::as_str)
            .map(str::to_string);
    }

    let races = if data.is_array() {
        Some(data)
    } else {
        data.get("races")
            .or_else(|| data.get("results"))
            .or_else(|| data.get("entries"))
    };
    let Some(races) = races.and_then(Value::as_array) else {
        return false;
    };

    let today = Utc::now().date_naive();
    for race in races {
        let event = string_field(race, &["eventName", "name", "raceName"]);
        let date_text = string_field(race, &["date", "eventDate"]);
        let time_text = string_field(race, &["time", "finishTime"]);

        let distance_km = race
            .get("distanceKm")
            .and_then(Value::as_f64)
            .or_else(|| {
                string_field(race, &["distance"])
                    .as_deref()
                    .and_then(parse_distance_km)
            });
        let distance = distance_km.and_then(Distance::from_km);

        let parsed = (
            date_text.as_deref().map(parse_result_date),
            time_text.as_deref().map(parse_time_to_seconds),
            distance,
        );
        let (Some(Ok(date)), Some(Ok(seconds)), Some(distance)) = parsed else {
            outcome.dropped_rows += 1;
            continue;
        };
        if seconds == 0 || date > today {
            outcome.dropped_rows += 1;
            continue;
        }

        outcome.results.push(RaceResult {
            event: event.unwrap_or_else(|| distance.label().to_string()),
            distance,
            date,
            seconds,
            age_on_day: None,
            gender: None,
            position: race
                .get("place")
                .or_else(|| race.get("overallPlace"))
                .and_then(Value::as_u64)
                .map(|p| p as u32),
            field_size: None,
            listed_age_grade: None,
            personal_best: false,
        });
    }
    true
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(k))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Parse a free-text race distance into kilometers.
fn parse_distance_km(text: &str) -> Option<f64> {
    let lowered = text.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if lowered.contains("half marathon") || lowered == "half" {
        return Some(21.0975);
    }
    if lowered.contains("marathon") {
        return Some(42.195);
    }

    let km_re = Regex::new(r"(\d+(?:\.\d+)?)\s*k(?:m)?").ok()?;
    if let Some(c) = km_re.captures(&lowered) {
        return c.get(1)?.as_str().parse().ok();
    }
    let mile_re = Regex::new(r"(\d+(?:\.\d+)?)\s*mi(?:le)?s?").ok()?;
    if let Some(c) = mile_re.captures(&lowered) {
        let miles: f64 = c.get(1)?.as_str().parse().ok()?;
        return Some(miles * 1.60934);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::validate_identifier;
    use chrono::NaiveDate;

    fn athlete() -> AthleteId {
        validate_identifier("319145186", Platform::Athlinks).unwrap()
    }

    fn dom_page() -> String {
        r#"<html><body>
        <h1 class="athlete-name">Alex Miles</h1>
        <div class="race-result">
          <span class="event-name">City Half</span>
          <span class="race-date">Sep 14, 2024</span>
          <span class="finish-time">1:45:30</span>
          <span class="race-distance">Half Marathon</span>
        </div>
        <div class="race-result">
          <span class="event-name">Riverside 10K</span>
          <span class="race-date">Mar 3, 2024</span>
          <span class="finish-time">52:10</span>
          <span class="race-distance">10 km</span>
        </div>
        <div class="race-result">
          <span class="event-name">Trail 12K</span>
          <span class="race-date">Jan 7, 2024</span>
          <span class="finish-time">1:05:00</span>
          <span class="race-distance">12 km</span>
        </div>
        <div class="race-result">
          <span class="event-name">Mystery Run</span>
          <span class="finish-time">40:00</span>
        </div>
        </body></html>"#
            .to_string()
    }

    #[test]
    fn test_parses_dom_results() {
        let outcome = AthlinksParser.parse(&dom_page(), &athlete()).unwrap();
        assert_eq!(outcome.athlete_name.as_deref(), Some("Alex Miles"));
        // 12K has no canonical category; the dateless row lacks a required
        // field. Both drop.
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.dropped_rows, 2);

        assert_eq!(outcome.results[0].event, "City Half");
        assert_eq!(outcome.results[0].distance, Distance::HalfMarathon);
        assert_eq!(outcome.results[0].seconds, 6330);
        assert_eq!(
            outcome.results[0].date,
            NaiveDate::from_ymd_opt(2024, 9, 14).unwrap()
        );
        assert_eq!(outcome.results[1].distance, Distance::TenK);
    }

    #[test]
    fn test_json_fallback() {
        let html = r#"<html><script>
        window.__INITIAL_STATE__ = {"name":"Alex Miles","races":[
          {"eventName":"Spring Marathon","date":"2024-04-21","distance":"Marathon","time":"3:30:00","place":250},
          {"eventName":"Bad Row","date":"2024-05-01","distance":"Marathon","time":"n/a"}
        ]};
        </script></html>"#;
        let outcome = AthlinksParser.parse(html, &athlete()).unwrap();
        assert_eq!(outcome.athlete_name.as_deref(), Some("Alex Miles"));
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.dropped_rows, 1);
        assert_eq!(outcome.results[0].distance, Distance::Marathon);
        assert_eq!(outcome.results[0].seconds, 12600);
        assert_eq!(outcome.results[0].position, Some(250));
    }

    #[test]
    fn test_not_found_is_parse_error() {
        let err = AthlinksParser
            .parse("<html>Athlete not found</html>", &athlete())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Parse { platform: Platform::Athlinks, .. }
        ));
    }

    #[test]
    fn test_blank_page_yields_zero_results() {
        let outcome = AthlinksParser.parse("<html></html>", &athlete()).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.dropped_rows, 0);
    }

    #[test]
    fn test_distance_text_parsing() {
        assert_eq!(parse_distance_km("Half Marathon"), Some(21.0975));
        assert_eq!(parse_distance_km("Marathon"), Some(42.195));
        assert_eq!(parse_distance_km("10 km"), Some(10.0));
        assert_eq!(parse_distance_km("5K"), Some(5.0));
        let ten_miles = parse_distance_km("10 Miles").unwrap();
        assert!((ten_miles - 16.0934).abs() < 1e-9);
        assert_eq!(parse_distance_km("fun run"), None);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(
            AthlinksParser.profile_url(&athlete()),
            "https://www.athlinks.com/athletes/319145186"
        );
    }
}

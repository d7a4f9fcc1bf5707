// src/platforms/powerof10.rs

//! Power of 10 athlete profile parser.
//!
//! The profile page mixes several tables; road performances are recognized
//! by an event code in the first cell (`5K`, `10K`, `10M`, `HM`, `Mar`) and
//! a date in the last cell. Profile metadata (gender, age group) sits in a
//! run of `Key:Value` text rather than structured markup, so it is pulled
//! out with regexes over the page text.

use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::{ParseOutcome, PlatformParser, parse_selector, sort_most_recent_first};
use crate::convert::{parse_result_date, parse_time_to_seconds};
use crate::error::{AppError, Result};
use crate::models::{AthleteId, Distance, Gender, Platform, RaceResult};

pub struct PowerOf10Parser;

impl PlatformParser for PowerOf10Parser {
    fn platform(&self) -> Platform {
        Platform::PowerOf10
    }

    fn profile_url(&self, athlete: &AthleteId) -> String {
        format!(
            "https://www.thepowerof10.info/athletes/profile.aspx?athleteid={}",
            athlete.as_str()
        )
    }

    fn parse(&self, html: &str, athlete: &AthleteId) -> Result<ParseOutcome> {
        let document = Html::parse_document(html);

        let table_sel = parse_selector(self.platform(), "table")?;
        if document.select(&table_sel).next().is_none() {
            return Err(AppError::parse(
                self.platform(),
                format!(
                    "no tables found for athlete {}; page structure may have changed",
                    athlete.as_str()
                ),
            ));
        }

        let page_text: String = document.root_element().text().collect();
        let gender = extract_field(&page_text, r"Gender:\s*(Male|Female)")
            .and_then(|g| Gender::parse(&g));

        let age_group = extract_field(&page_text, r"Age Group:\s*(V\d+|SEN|U\d+)");
        let age_estimate = age_group.as_deref().and_then(age_from_group);

        let club = extract_field(
            &page_text,
            r"(?s)Club:\s*(.+?)\s*(?:Gender:|County:|Age Group:|Lead Coach:|$)",
        )
        .filter(|c| !c.is_empty());

        let mut outcome = ParseOutcome {
            athlete_name: athlete_name(&document)?,
            club,
            gender,
            age_group,
            ..ParseOutcome::default()
        };

        let row_sel = parse_selector(self.platform(), "tr")?;
        let cell_sel = parse_selector(self.platform(), "td")?;
        let today = Utc::now().date_naive();

        for row in document.select(&row_sel) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            // Performance rows are wide: event, perf, placing columns, venue, date.
            if cells.len() < 5 {
                continue;
            }

            let Some(distance) = Distance::from_event_code(&cell_text(&cells[0])) else {
                continue;
            };

            let time_text = cell_text(&cells[1]);
            let date_text = cell_text(&cells[cells.len() - 1]);

            let (date, seconds) = match (
                parse_result_date(&date_text),
                parse_time_to_seconds(&time_text),
            ) {
                (Ok(date), Ok(seconds)) if seconds > 0 && date <= today => (date, seconds),
                _ => {
                    outcome.dropped_rows += 1;
                    log::debug!(
                        "Dropping Power of 10 row: event='{}' time='{time_text}' date='{date_text}'",
                        cell_text(&cells[0])
                    );
                    continue;
                }
            };

            let venue = cell_text(&cells[cells.len() - 2]);
            let event = if venue.is_empty() {
                distance.label().to_string()
            } else {
                venue
            };

            outcome.results.push(RaceResult {
                event,
                distance,
                date,
                seconds,
                age_on_day: age_estimate,
                gender,
                position: None,
                field_size: None,
                listed_age_grade: None,
                personal_best: false,
            });
        }

        sort_most_recent_first(&mut outcome.results);
        Ok(outcome)
    }
}

fn athlete_name(document: &Html) -> Result<Option<String>> {
    let h2_sel = parse_selector(Platform::PowerOf10, "h2")?;
    Ok(document.select(&h2_sel).next().map(|h2| {
        let raw: String = h2.text().collect();
        raw.trim().to_string()
    }))
}

/// Approximate current age from a Power of 10 age group. Veteran groups
/// (`V50`) carry the bracket's lower bound; seniors are treated as
/// open-class.
fn age_from_group(group: &str) -> Option<u32> {
    if group == "SEN" {
        return Some(30);
    }
    group
        .strip_prefix('V')
        .or_else(|| group.strip_prefix('U'))
        .and_then(|n| n.parse().ok())
}

fn extract_field(page_text: &str, pattern: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(page_text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::validate_identifier;
    use chrono::NaiveDate;

    fn sample_page() -> String {
        r#"<html><body>
        <h2>Sam Striders</h2>
        <div>Club:Highgate Harriers Gender:Male Age Group:V50 County:Surrey</div>
        <table>
          <tr><td>5K</td><td>16:45</td></tr>
        </table>
        <table>
          <tr><th>Event</th><th>Perf</th><th>Pos</th><th>Venue</th><th>Date</th></tr>
          <tr><td>5K</td><td>17:02</td><td>12</td><td>Armagh</td><td>21 Feb 24</td></tr>
          <tr><td>10K</td><td>35:10</td><td>8</td><td>Dorking</td><td>2 Jun 24</td></tr>
          <tr><td>HM</td><td>1:19:45</td><td>40</td><td>Big Half</td><td>1 Sep 24</td></tr>
          <tr><td>Mar</td><td>DNF</td><td></td><td>London</td><td>21 Apr 24</td></tr>
          <tr><td>800</td><td>2:10</td><td>3</td><td>Track</td><td>5 May 24</td></tr>
        </table>
        </body></html>"#
            .to_string()
    }

    fn athlete() -> AthleteId {
        validate_identifier("434569", Platform::PowerOf10).unwrap()
    }

    #[test]
    fn test_parses_road_performances() {
        let outcome = PowerOf10Parser.parse(&sample_page(), &athlete()).unwrap();
        assert_eq!(outcome.athlete_name.as_deref(), Some("Sam Striders"));
        assert_eq!(outcome.gender, Some(Gender::Male));
        assert_eq!(outcome.age_group.as_deref(), Some("V50"));
        assert_eq!(outcome.club.as_deref(), Some("Highgate Harriers"));

        // 5K, 10K and HM parsed; DNF marathon dropped; 800m ignored; the
        // narrow PB table row skipped without counting.
        assert_eq!(outcome.results.len(), 3);
        assert_eq!(outcome.dropped_rows, 1);

        assert_eq!(outcome.results[0].distance, Distance::HalfMarathon);
        assert_eq!(outcome.results[0].seconds, 4785);
        assert_eq!(
            outcome.results[0].date,
            NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()
        );
        assert_eq!(outcome.results[0].event, "Big Half");
        assert_eq!(outcome.results[0].gender, Some(Gender::Male));
        assert_eq!(outcome.results[0].age_on_day, Some(50));
        assert_eq!(outcome.results[2].distance, Distance::FiveK);
    }

    #[test]
    fn test_no_tables_is_parse_error() {
        let err = PowerOf10Parser
            .parse("<html><h2>Sam</h2></html>", &athlete())
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Parse { platform: Platform::PowerOf10, .. }
        ));
    }

    #[test]
    fn test_female_profile() {
        let html = r#"<table><tr><th>x</th></tr></table>
            <div>Gender:Female Age Group:SEN</div>"#;
        let outcome = PowerOf10Parser.parse(html, &athlete()).unwrap();
        assert_eq!(outcome.gender, Some(Gender::Female));
        assert_eq!(outcome.age_group.as_deref(), Some("SEN"));
        assert!(outcome.results.is_empty());
    }

    #[test]
    fn test_age_from_group() {
        assert_eq!(age_from_group("V50"), Some(50));
        assert_eq!(age_from_group("V35"), Some(35));
        assert_eq!(age_from_group("SEN"), Some(30));
        assert_eq!(age_from_group("U23"), Some(23));
        assert_eq!(age_from_group("junk"), None);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(
            PowerOf10Parser.profile_url(&athlete()),
            "https://www.thepowerof10.info/athletes/profile.aspx?athleteid=434569"
        );
    }
}

// src/platforms/parkrun.rs

//! Parkrun athlete history parser.
//!
//! Reads the "all results" profile page. The page carries several tables
//! with `id="results"`; the one we want has `Event` and `Time` headers.

use chrono::Utc;
use scraper::{ElementRef, Html};

use super::{ParseOutcome, PlatformParser, parse_selector, sort_most_recent_first};
use crate::convert::{parse_result_date, parse_time_to_seconds};
use crate::error::{AppError, Result};
use crate::models::{AthleteId, Distance, Platform, RaceResult};

pub struct ParkrunParser;

impl PlatformParser for ParkrunParser {
    fn platform(&self) -> Platform {
        Platform::Parkrun
    }

    fn profile_url(&self, athlete: &AthleteId) -> String {
        format!(
            "https://www.parkrun.org.uk/parkrunner/{}/all/",
            athlete.as_str()
        )
    }

    fn parse(&self, html: &str, athlete: &AthleteId) -> Result<ParseOutcome> {
        let document = Html::parse_document(html);

        let mut outcome = ParseOutcome {
            athlete_name: athlete_name(&document)?,
            ..ParseOutcome::default()
        };

        let table = results_table(&document)?.ok_or_else(|| {
            AppError::parse(
                self.platform(),
                format!(
                    "results table not found for athlete {}; page structure may have changed",
                    athlete.as_str()
                ),
            )
        })?;

        let row_sel = parse_selector(self.platform(), "tr")?;
        let cell_sel = parse_selector(self.platform(), "td")?;
        let today = Utc::now().date_naive();

        for row in table.select(&row_sel) {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            if cells.len() < 5 {
                // Header or spacer row.
                continue;
            }

            let event = cell_text(&cells[0]);
            let date_text = cell_text(&cells[1]);
            let time_text = cell_text(&cells[4]);

            let (date, seconds) = match (
                parse_result_date(&date_text),
                parse_time_to_seconds(&time_text),
            ) {
                (Ok(date), Ok(seconds)) if seconds > 0 && date <= today => (date, seconds),
                _ => {
                    outcome.dropped_rows += 1;
                    log::debug!(
                        "Dropping parkrun row: date='{date_text}' time='{time_text}'"
                    );
                    continue;
                }
            };

            let row_text: String = row.text().collect();
            outcome.results.push(RaceResult {
                event,
                distance: Distance::FiveK,
                date,
                seconds,
                age_on_day: None,
                gender: None,
                position: cell_text(&cells[3]).parse().ok(),
                field_size: None,
                listed_age_grade: cells
                    .get(5)
                    .and_then(|c| cell_text(c).trim_end_matches('%').parse().ok()),
                personal_best: row_text.contains("PB"),
            });
        }

        sort_most_recent_first(&mut outcome.results);
        Ok(outcome)
    }
}

fn athlete_name(document: &Html) -> Result<Option<String>> {
    let h2_sel = parse_selector(Platform::Parkrun, "h2")?;
    let Some(h2) = document.select(&h2_sel).next() else {
        return Ok(None);
    };
    let raw: String = h2.text().collect();
    let name = raw
        .split("- All Results")
        .next()
        .unwrap_or(&raw)
        .trim()
        .trim_end_matches('-')
        .trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

/// Pick the `id="results"` table whose header row carries `Event` and
/// `Time`, falling back to the sortable table.
fn results_table(document: &Html) -> Result<Option<ElementRef<'_>>> {
    let table_sel = parse_selector(Platform::Parkrun, "table#results")?;
    let row_sel = parse_selector(Platform::Parkrun, "tr")?;

    for table in document.select(&table_sel) {
        if let Some(header) = table.select(&row_sel).next() {
            let text: String = header.text().collect();
            if text.contains("Event") && text.contains("Time") {
                return Ok(Some(table));
            }
        }
    }

    let fallback_sel = parse_selector(Platform::Parkrun, "table.sortable")?;
    Ok(document.select(&fallback_sel).next())
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::validate_identifier;

    fn sample_page() -> String {
        r#"<html><body>
        <h2>Jane Runner - All Results</h2>
        <table id="results">
          <tr><th>Total</th><th>Count</th></tr>
          <tr><td>412</td></tr>
        </table>
        <table id="results">
          <tr><th>Event</th><th>Run Date</th><th>Run Number</th><th>Pos</th><th>Time</th><th>Age Grade</th></tr>
          <tr><td>Bushy Park</td><td>07/09/2024</td><td>410</td><td>55</td><td>25:30</td><td>61.2%</td></tr>
          <tr><td>Bushy Park</td><td>14/09/2024</td><td>411</td><td>42</td><td>24:55</td><td>62.7%</td><td>New PB!</td></tr>
          <tr><td>Bushy Park</td><td>21/09/2024</td><td>412</td><td>60</td><td>--</td><td></td></tr>
          <tr><td>Bushy Park</td><td>someday</td><td>413</td><td>61</td><td>26:00</td><td></td></tr>
        </table>
        </body></html>"#
            .to_string()
    }

    fn athlete() -> AthleteId {
        validate_identifier("123456", Platform::Parkrun).unwrap()
    }

    #[test]
    fn test_parses_rows_most_recent_first() {
        let outcome = ParkrunParser.parse(&sample_page(), &athlete()).unwrap();
        assert_eq!(outcome.athlete_name.as_deref(), Some("Jane Runner"));
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.dropped_rows, 2);

        // 14/09 comes before 07/09.
        assert_eq!(outcome.results[0].seconds, 1495);
        assert_eq!(outcome.results[1].seconds, 1530);
        assert_eq!(outcome.results[0].distance, Distance::FiveK);
        assert_eq!(outcome.results[0].position, Some(42));
        assert_eq!(outcome.results[0].listed_age_grade, Some(62.7));
        assert!(outcome.results[0].personal_best);
        assert!(!outcome.results[1].personal_best);
    }

    #[test]
    fn test_missing_table_is_parse_error() {
        let err = ParkrunParser
            .parse("<html><h2>Jane</h2><p>nothing here</p></html>", &athlete())
            .unwrap_err();
        assert!(matches!(err, AppError::Parse { platform: Platform::Parkrun, .. }));
    }

    #[test]
    fn test_empty_table_yields_zero_results() {
        let html = r#"<table id="results">
            <tr><th>Event</th><th>Run Date</th><th>Run Number</th><th>Pos</th><th>Time</th></tr>
        </table>"#;
        let outcome = ParkrunParser.parse(html, &athlete()).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.dropped_rows, 0);
    }

    #[test]
    fn test_future_dated_row_dropped() {
        let html = r#"<table id="results">
            <tr><th>Event</th><th>Run Date</th><th>Run Number</th><th>Pos</th><th>Time</th></tr>
            <tr><td>Bushy Park</td><td>01/01/2099</td><td>1</td><td>5</td><td>25:00</td></tr>
        </table>"#;
        let outcome = ParkrunParser.parse(html, &athlete()).unwrap();
        assert!(outcome.results.is_empty());
        assert_eq!(outcome.dropped_rows, 1);
    }

    #[test]
    fn test_profile_url() {
        assert_eq!(
            ParkrunParser.profile_url(&athlete()),
            "https://www.parkrun.org.uk/parkrunner/123456/all/"
        );
    }
}

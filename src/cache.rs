// src/cache.rs

//! Cache orchestration: decide between serving a stored profile and
//! running the fetch-parse cycle, then derive the comparison bundle.
//!
//! Per identifier the stored record moves between absent, fresh and stale.
//! A fresh record younger than the TTL is served without any network
//! activity. An expired record triggers a refresh; if the refresh fails and
//! a previous successful record exists, that record is served marked stale
//! with a warning instead of surfacing an error. Forced refreshes are
//! rate-limited by a cooldown, bypassed only when no record exists yet.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use crate::compare::{self, ReferenceDistribution};
use crate::config::CacheConfig;
use crate::error::{AppError, Result};
use crate::fetch::Fetcher;
use crate::grading;
use crate::models::{
    AthleteId, CachedProfile, ComparisonBundle, Distance, FetchStatus, RaceResult,
};
use crate::platforms::{PlatformParser, parser_for};
use crate::storage::ProfileStore;

/// What `analyze` hands back to the caller.
#[derive(Debug)]
pub struct Analysis {
    pub profile: CachedProfile,
    pub bundle: ComparisonBundle,
    /// Present when stale data is being served after a failed refresh
    pub warning: Option<String>,
    pub served_stale: bool,
}

/// Drives the fetch/cache/analyze pipeline for athlete identifiers.
pub struct CacheOrchestrator {
    store: Arc<dyn ProfileStore>,
    fetcher: Fetcher,
    ttl: Duration,
    cooldown: Duration,
    /// Overrides the per-distance population curve when set.
    reference: Option<ReferenceDistribution>,
    // Single-flight per cache key: concurrent requests for one identifier
    // serialize on its entry here.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CacheOrchestrator {
    pub fn new(store: Arc<dyn ProfileStore>, fetcher: Fetcher, config: &CacheConfig) -> Self {
        Self {
            store,
            fetcher,
            ttl: Duration::hours(config.ttl_hours as i64),
            cooldown: Duration::hours(config.cooldown_hours as i64),
            reference: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the per-distance percentile curves with a fixed one.
    pub fn with_reference(mut self, reference: ReferenceDistribution) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Serve an analysis for an identifier, fetching as the cache state
    /// requires.
    pub async fn analyze(&self, athlete: &AthleteId, force_refresh: bool) -> Result<Analysis> {
        let parser = parser_for(athlete.platform());
        self.analyze_with_parser(athlete, parser.as_ref(), force_refresh)
            .await
    }

    /// As [`analyze`](Self::analyze), with an explicit parser. The
    /// orchestrator only relies on the parser's URL and parse capabilities.
    pub async fn analyze_with_parser(
        &self,
        athlete: &AthleteId,
        parser: &dyn PlatformParser,
        force_refresh: bool,
    ) -> Result<Analysis> {
        let _guard = self.lock_identifier(athlete).await;

        let now = Utc::now();
        let existing = self.store.get(athlete).await?;

        if force_refresh {
            // Cooldown applies only when some record exists; a first-ever
            // request has nothing to protect.
            if let Some(profile) = &existing {
                let since_attempt = now - profile.last_attempt_at;
                if since_attempt < self.cooldown {
                    let remaining = self.cooldown - since_attempt;
                    return Err(AppError::Cooldown {
                        remaining_mins: remaining.num_minutes().max(1),
                    });
                }
            }
        } else if let Some(profile) = &existing {
            if profile.is_fresh(now, self.ttl) {
                log::debug!("Serving fresh cache for {athlete}");
                return Ok(self.build_analysis(profile.clone(), None, false));
            }
        }

        match self.refresh(athlete, parser).await {
            Ok(profile) => {
                self.store.put(&profile).await?;
                Ok(self.build_analysis(profile, None, false))
            }
            Err(e) if e.is_fetch_or_parse() => match existing {
                Some(mut profile) => {
                    log::warn!("Refresh failed for {athlete}, serving stale data: {e}");
                    profile.status = FetchStatus::Stale;
                    profile.last_attempt_at = now;
                    self.store.put(&profile).await?;

                    let warning = format!(
                        "Could not refresh results ({e}); showing data fetched {}",
                        profile.fetched_at.format("%Y-%m-%d %H:%M UTC")
                    );
                    Ok(self.build_analysis(profile, Some(warning), true))
                }
                None => {
                    log::error!("Fetch failed for {athlete} with no cached fallback: {e}");
                    Err(e)
                }
            },
            Err(e) => Err(e),
        }
    }

    /// Run one fetch-parse cycle and build the replacement profile.
    async fn refresh(
        &self,
        athlete: &AthleteId,
        parser: &dyn PlatformParser,
    ) -> Result<CachedProfile> {
        let url = parser.profile_url(athlete);
        log::info!("Fetching {} profile for {}", athlete.platform(), athlete.as_str());

        let html = if parser.needs_js_render() {
            self.fetcher.fetch_text_rendered(&url).await?
        } else {
            self.fetcher.fetch_text(&url).await?
        };
        let outcome = parser.parse(&html, athlete)?;

        if outcome.dropped_rows > 0 {
            log::warn!(
                "Dropped {} unparsable rows for {athlete}",
                outcome.dropped_rows
            );
        }

        let mut profile = CachedProfile::fresh(
            athlete.clone(),
            outcome.athlete_name,
            outcome.results,
            outcome.dropped_rows,
            Utc::now(),
        );
        profile.club = outcome.club;
        Ok(profile)
    }

    fn build_analysis(
        &self,
        profile: CachedProfile,
        warning: Option<String>,
        served_stale: bool,
    ) -> Analysis {
        let bundle = compute_bundle(&profile, self.reference.as_ref());
        Analysis {
            profile,
            bundle,
            warning,
            served_stale,
        }
    }

    async fn lock_identifier(&self, athlete: &AthleteId) -> tokio::sync::OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Entries with no holder or waiter (only the map's own Arc)
            // are finished; drop them so the map tracks in-flight
            // identifiers rather than every identifier ever seen.
            locks.retain(|_, l| Arc::strong_count(l) > 1);
            Arc::clone(locks.entry(athlete.cache_key()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Derive the comparison bundle for a profile. Recomputed on every read,
/// never stored. The percentile reads from the primary distance's
/// population curve unless an override is supplied.
pub fn compute_bundle(
    profile: &CachedProfile,
    reference: Option<&ReferenceDistribution>,
) -> ComparisonBundle {
    if profile.results.is_empty() {
        return ComparisonBundle::empty();
    }

    let primary = primary_distance(&profile.results);
    let primary_results: Vec<&RaceResult> = profile
        .results
        .iter()
        .filter(|r| r.distance == primary)
        .collect();
    let primary_seconds: Vec<u32> = primary_results.iter().map(|r| r.seconds).collect();

    // Results are most recent first; trend wants oldest first.
    let chronological: Vec<u32> = primary_seconds.iter().rev().copied().collect();
    let trend = compare::trend(&chronological);

    let outliers = per_result_outliers(&profile.results);
    let stats = compare::summary_stats(&primary_seconds);

    let percentile = stats.as_ref().map(|s| match reference {
        Some(curve) => curve.percentile(s.typical_mean_seconds),
        None => {
            ReferenceDistribution::for_distance(primary).percentile(s.typical_mean_seconds)
        }
    });

    let age_grade = derive_age_grade(&primary_results, primary);
    let grade_category = age_grade.map(grading::grade_category);

    ComparisonBundle {
        percentile,
        age_grade,
        grade_category,
        trend,
        outliers,
        stats,
    }
}

/// The distance with the most results; ties go to the distance of the most
/// recent result.
fn primary_distance(results: &[RaceResult]) -> Distance {
    let mut counts: HashMap<Distance, usize> = HashMap::new();
    for r in results {
        *counts.entry(r.distance).or_default() += 1;
    }
    let best_count = counts.values().copied().max().unwrap_or(0);
    results
        .iter()
        .map(|r| r.distance)
        .find(|d| counts.get(d) == Some(&best_count))
        .unwrap_or(Distance::FiveK)
}

/// Outlier flags aligned with the profile's result order. Each result is
/// judged against the other results of its own distance.
fn per_result_outliers(results: &[RaceResult]) -> Vec<bool> {
    let mut flags = vec![false; results.len()];
    let distances: std::collections::HashSet<Distance> =
        results.iter().map(|r| r.distance).collect();

    for distance in distances {
        let indices: Vec<usize> = results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.distance == distance)
            .map(|(i, _)| i)
            .collect();
        let seconds: Vec<u32> = indices.iter().map(|&i| results[i].seconds).collect();
        for (idx, flagged) in indices.iter().zip(compare::detect_outliers(&seconds)) {
            flags[*idx] = flagged;
        }
    }
    flags
}

/// Age grade for the bundle: prefer the percentages printed on the page,
/// otherwise compute one for the fastest result of the primary distance.
/// Missing age, gender or table entry leaves the bundle ungraded.
fn derive_age_grade(primary_results: &[&RaceResult], primary: Distance) -> Option<f64> {
    let listed: Vec<f64> = primary_results
        .iter()
        .filter_map(|r| r.listed_age_grade)
        .collect();
    if !listed.is_empty() {
        let mean = listed.iter().sum::<f64>() / listed.len() as f64;
        return Some((mean * 10.0).round() / 10.0);
    }

    let fastest = primary_results.iter().min_by_key(|r| r.seconds)?;
    let age = fastest.age_on_day?;
    match grading::age_grade(primary, fastest.gender, age, fastest.seconds) {
        Ok(pct) => Some(pct),
        Err(e) => {
            log::debug!("Leaving profile ungraded: {e}");
            None
        }
    }
}

// src/compare.rs

//! Percentile, trend and outlier analysis over result sequences.
//!
//! Everything here is pure arithmetic over slices of finish times. The
//! reference distribution is a piecewise-linear curve over published UK
//! parkrun thresholds; callers may substitute their own curve.

use crate::models::{Distance, SummaryStats, Trend};

/// Multiple of the median absolute deviation beyond which a result is
/// flagged as an outlier.
const OUTLIER_MAD_MULTIPLE: f64 = 3.0;

/// Trend slope threshold as a fraction of the median time, per race.
const TREND_SLOPE_FRACTION: f64 = 0.005;

/// A percentile curve: (seconds, percentile) samples sorted by ascending
/// time, with percentile strictly decreasing.
#[derive(Debug, Clone)]
pub struct ReferenceDistribution {
    thresholds: Vec<(u32, f64)>,
}

impl ReferenceDistribution {
    /// Build a distribution from (seconds, percentile) samples.
    ///
    /// Samples are sorted by time; percentile values are expected to
    /// decrease as time increases.
    pub fn new(mut thresholds: Vec<(u32, f64)>) -> Self {
        thresholds.sort_by_key(|&(secs, _)| secs);
        Self { thresholds }
    }

    /// UK parkrun 5K distribution, estimated from large-sample event data.
    pub fn uk_parkrun_5k() -> Self {
        Self::new(vec![
            (900, 99.9),  // 15:00
            (1020, 99.0), // 17:00
            (1080, 98.0), // 18:00
            (1140, 95.0), // 19:00
            (1200, 90.0), // 20:00
            (1260, 85.0), // 21:00
            (1320, 80.0), // 22:00
            (1380, 75.0), // 23:00
            (1440, 70.0), // 24:00
            (1500, 65.0), // 25:00
            (1560, 60.0), // 26:00
            (1620, 55.0), // 27:00
            (1680, 52.0), // 28:00
            (1740, 50.0), // 29:00
            (1800, 47.0), // 30:00
            (1920, 42.0), // 32:00
            (2100, 35.0), // 35:00
            (2280, 28.0), // 38:00
            (2400, 23.0), // 40:00
            (2700, 15.0), // 45:00
            (3000, 10.0), // 50:00
            (3300, 6.0),  // 55:00
            (3600, 3.0),  // 60:00
        ])
    }

    /// The population curve for a canonical distance. The 5K uses the UK
    /// parkrun curve; the rest come from the same large-sample estimates.
    pub fn for_distance(distance: Distance) -> Self {
        match distance {
            Distance::FiveK => Self::uk_parkrun_5k(),
            Distance::TenK => Self::new(vec![
                (1920, 99.9),
                (2160, 99.0),
                (2280, 98.0),
                (2400, 95.0),
                (2520, 90.0),
                (2700, 85.0),
                (2880, 80.0),
                (3000, 75.0),
                (3120, 70.0),
                (3240, 65.0),
                (3360, 60.0),
                (3480, 55.0),
                (3600, 50.0),
                (3720, 47.0),
                (3900, 42.0),
                (4200, 35.0),
                (4500, 28.0),
                (4800, 23.0),
                (5400, 15.0),
                (6000, 10.0),
                (6600, 6.0),
                (7200, 3.0),
            ]),
            Distance::TenMiles => Self::new(vec![
                (3300, 99.9),
                (3660, 99.0),
                (3900, 98.0),
                (4140, 95.0),
                (4380, 90.0),
                (4680, 85.0),
                (4980, 80.0),
                (5220, 75.0),
                (5460, 70.0),
                (5700, 65.0),
                (5940, 60.0),
                (6180, 55.0),
                (6420, 50.0),
                (6660, 47.0),
                (6960, 42.0),
                (7500, 35.0),
                (8100, 28.0),
                (8640, 23.0),
                (9600, 15.0),
                (10800, 10.0),
                (12000, 6.0),
                (13500, 3.0),
            ]),
            Distance::HalfMarathon => Self::new(vec![
                (4200, 99.9),
                (4680, 99.0),
                (4920, 98.0),
                (5220, 95.0),
                (5520, 90.0),
                (5880, 85.0),
                (6240, 80.0),
                (6540, 75.0),
                (6840, 70.0),
                (7140, 65.0),
                (7440, 60.0),
                (7740, 55.0),
                (8040, 50.0),
                (8400, 47.0),
                (8820, 42.0),
                (9600, 35.0),
                (10200, 28.0),
                (10800, 23.0),
                (12000, 15.0),
                (13200, 10.0),
                (14400, 6.0),
                (16200, 3.0),
            ]),
            Distance::Marathon => Self::new(vec![
                (8400, 99.9),
                (9300, 99.0),
                (9900, 98.0),
                (10500, 95.0),
                (11100, 90.0),
                (11820, 85.0),
                (12540, 80.0),
                (13200, 75.0),
                (13860, 70.0),
                (14400, 65.0),
                (14940, 60.0),
                (15480, 55.0),
                (16020, 50.0),
                (16680, 47.0),
                (17400, 42.0),
                (18600, 35.0),
                (19800, 28.0),
                (21000, 23.0),
                (23400, 15.0),
                (25200, 10.0),
                (27000, 6.0),
                (30600, 3.0),
            ]),
        }
    }

    /// Percentile of the reference population slower than `seconds`, 0-100.
    ///
    /// Times between two samples interpolate linearly; times faster than the
    /// fastest sample take its percentile, times slower than the slowest
    /// sample bottom out at 1.0.
    pub fn percentile(&self, seconds: u32) -> f64 {
        let Some(&(first_secs, first_pct)) = self.thresholds.first() else {
            return 0.0;
        };
        if seconds <= first_secs {
            return first_pct;
        }

        for pair in self.thresholds.windows(2) {
            let (lo_secs, lo_pct) = pair[0];
            let (hi_secs, hi_pct) = pair[1];
            if seconds <= hi_secs {
                let span = f64::from(hi_secs - lo_secs);
                if span == 0.0 {
                    return hi_pct;
                }
                let frac = f64::from(seconds - lo_secs) / span;
                return lo_pct + (hi_pct - lo_pct) * frac;
            }
        }

        1.0
    }
}

/// Classify the direction of a chronologically ordered (oldest-first)
/// sequence of same-distance times.
///
/// Uses the least-squares slope of time over race index. The slope must
/// exceed half a percent of the median time per race to count as movement;
/// fewer than three results is [`Trend::InsufficientData`].
pub fn trend(chronological_seconds: &[u32]) -> Trend {
    if chronological_seconds.len() < 3 {
        return Trend::InsufficientData;
    }

    let n = chronological_seconds.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y =
        chronological_seconds.iter().map(|&s| f64::from(s)).sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &secs) in chronological_seconds.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (f64::from(secs) - mean_y);
        den += dx * dx;
    }
    // den > 0 whenever n >= 2.
    let slope = num / den;

    let threshold = median(chronological_seconds) * TREND_SLOPE_FRACTION;
    if slope < -threshold {
        Trend::Improving
    } else if slope > threshold {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Flag results deviating from the median by more than three times the
/// median absolute deviation. A zero MAD (half or more of the values
/// identical) flags nothing. The input is never reordered or mutated.
pub fn detect_outliers(seconds: &[u32]) -> Vec<bool> {
    if seconds.len() < 3 {
        return vec![false; seconds.len()];
    }

    let med = median(seconds);
    let deviations: Vec<f64> =
        seconds.iter().map(|&s| (f64::from(s) - med).abs()).collect();
    let mad = median_f64(&deviations);
    if mad == 0.0 {
        return vec![false; seconds.len()];
    }

    deviations
        .iter()
        .map(|&d| d > OUTLIER_MAD_MULTIPLE * mad)
        .collect()
}

/// Aggregate statistics over a result sequence, with a typical mean that
/// excludes flagged outliers. Returns `None` for an empty slice.
pub fn summary_stats(seconds: &[u32]) -> Option<SummaryStats> {
    if seconds.is_empty() {
        return None;
    }

    let outliers = detect_outliers(seconds);
    let outlier_count = outliers.iter().filter(|&&o| o).count();

    let best = seconds.iter().copied().min()?;
    let worst = seconds.iter().copied().max()?;
    let mean =
        seconds.iter().map(|&s| f64::from(s)).sum::<f64>() / seconds.len() as f64;

    let typical: Vec<u32> = seconds
        .iter()
        .zip(&outliers)
        .filter(|&(_, &flagged)| !flagged)
        .map(|(&s, _)| s)
        .collect();
    let typical_mean = if typical.is_empty() {
        mean
    } else {
        typical.iter().map(|&s| f64::from(s)).sum::<f64>() / typical.len() as f64
    };

    Some(SummaryStats {
        best_seconds: best,
        worst_seconds: worst,
        mean_seconds: mean.round() as u32,
        median_seconds: median(seconds).round() as u32,
        typical_mean_seconds: typical_mean.round() as u32,
        outlier_count,
    })
}

fn median(values: &[u32]) -> f64 {
    let mut sorted: Vec<u32> = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        f64::from(sorted[n / 2])
    } else {
        (f64::from(sorted[n / 2 - 1]) + f64::from(sorted[n / 2])) / 2.0
    }
}

fn median_f64(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- percentile ---

    #[test]
    fn test_percentile_at_thresholds() {
        let dist = ReferenceDistribution::uk_parkrun_5k();
        assert_eq!(dist.percentile(1200), 90.0); // 20:00
        assert_eq!(dist.percentile(1740), 50.0); // 29:00
        assert_eq!(dist.percentile(3600), 3.0); // 60:00
    }

    #[test]
    fn test_percentile_interpolates_between_samples() {
        let dist = ReferenceDistribution::uk_parkrun_5k();
        // 20:30 is halfway between 20:00 (90) and 21:00 (85).
        assert!((dist.percentile(1230) - 87.5).abs() < 1e-9);
        // 33:30 is halfway between 32:00 (42) and 35:00 (35).
        assert!((dist.percentile(2010) - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_percentile_edges() {
        let dist = ReferenceDistribution::uk_parkrun_5k();
        // Faster than the fastest sample.
        assert_eq!(dist.percentile(800), 99.9);
        // Slower than the slowest sample.
        assert_eq!(dist.percentile(4000), 1.0);
    }

    #[test]
    fn test_per_distance_curves() {
        // Each distance reads from its own thresholds.
        let ten_k = ReferenceDistribution::for_distance(Distance::TenK);
        assert_eq!(ten_k.percentile(2520), 90.0); // 42:00
        assert_eq!(ten_k.percentile(3600), 50.0); // 60:00

        let half = ReferenceDistribution::for_distance(Distance::HalfMarathon);
        assert_eq!(half.percentile(8040), 50.0); // 2:14:00

        let marathon = ReferenceDistribution::for_distance(Distance::Marathon);
        assert_eq!(marathon.percentile(16020), 50.0); // 4:27:00
        // 3:30:00 sits between the 80th and 75th samples.
        let pct = marathon.percentile(12600);
        assert!(pct < 80.0 && pct > 75.0);

        let ten_miles = ReferenceDistribution::for_distance(Distance::TenMiles);
        assert_eq!(ten_miles.percentile(6420), 50.0); // 1:47:00
    }

    #[test]
    fn test_percentile_monotonic_in_time() {
        let dist = ReferenceDistribution::uk_parkrun_5k();
        let mut prev = f64::INFINITY;
        for secs in (600..4200).step_by(10) {
            let pct = dist.percentile(secs);
            assert!(
                pct <= prev,
                "percentile rose from {prev} to {pct} at {secs}s"
            );
            prev = pct;
        }
    }

    // --- trend ---

    #[test]
    fn test_trend_insufficient_data() {
        assert_eq!(trend(&[]), Trend::InsufficientData);
        assert_eq!(trend(&[1200]), Trend::InsufficientData);
        assert_eq!(trend(&[1200, 1190]), Trend::InsufficientData);
    }

    #[test]
    fn test_trend_improving() {
        // Steady 10s-per-race drop well beyond the threshold.
        assert_eq!(trend(&[1200, 1190, 1180]), Trend::Improving);
        assert_eq!(trend(&[1500, 1470, 1450, 1420, 1400]), Trend::Improving);
    }

    #[test]
    fn test_trend_declining() {
        assert_eq!(trend(&[1180, 1190, 1200]), Trend::Declining);
    }

    #[test]
    fn test_trend_stable() {
        assert_eq!(trend(&[1200, 1200, 1200]), Trend::Stable);
        // Jitter of a second or two against a 20-minute median.
        assert_eq!(trend(&[1200, 1202, 1199, 1201]), Trend::Stable);
    }

    // --- outliers ---

    #[test]
    fn test_outliers_flag_extreme_value() {
        // One walked race amid steady 20-minute efforts.
        let times = [1200, 1210, 1195, 1205, 2400, 1198];
        let flags = detect_outliers(&times);
        assert_eq!(
            flags,
            vec![false, false, false, false, true, false]
        );
    }

    #[test]
    fn test_outliers_zero_mad_flags_nothing() {
        let flags = detect_outliers(&[1200, 1200, 1200, 9999]);
        assert_eq!(flags, vec![false; 4]);
    }

    #[test]
    fn test_outliers_short_sequence_flags_nothing() {
        assert_eq!(detect_outliers(&[1200, 9999]), vec![false, false]);
    }

    #[test]
    fn test_outliers_do_not_mutate_input() {
        let times = [2400, 1200, 1210];
        let _ = detect_outliers(&times);
        assert_eq!(times, [2400, 1200, 1210]);
    }

    // --- summary stats ---

    #[test]
    fn test_summary_stats_basic() {
        let stats = summary_stats(&[1200, 1210, 1195, 1205, 1198]).unwrap();
        assert_eq!(stats.best_seconds, 1195);
        assert_eq!(stats.worst_seconds, 1210);
        assert_eq!(stats.median_seconds, 1200);
        assert_eq!(stats.mean_seconds, 1202);
        assert_eq!(stats.outlier_count, 0);
        assert_eq!(stats.mean_seconds, stats.typical_mean_seconds);
    }

    #[test]
    fn test_summary_stats_typical_mean_excludes_outliers() {
        let stats = summary_stats(&[1200, 1210, 1195, 1205, 2400, 1198]).unwrap();
        assert_eq!(stats.outlier_count, 1);
        assert!(stats.typical_mean_seconds < stats.mean_seconds);
        assert_eq!(stats.typical_mean_seconds, 1202);
    }

    #[test]
    fn test_summary_stats_empty() {
        assert!(summary_stats(&[]).is_none());
    }
}

//! Kept/cut statistics and the trim decision.

use reel_models::Interval;
use tracing::{debug, warn};

use super::config::SilenceConfig;

/// Statistics about the spans that survive trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct KeepStats {
    /// Total kept duration in seconds.
    pub kept_secs: f64,
    /// Total cut duration in seconds.
    pub cut_secs: f64,
    /// Ratio of kept content (0.0 to 1.0).
    pub kept_ratio: f64,
    /// Number of kept intervals.
    pub interval_count: usize,
}

impl KeepStats {
    pub fn compute(intervals: &[Interval], total_duration: f64) -> Self {
        let kept_secs = Interval::total_duration(intervals).min(total_duration.max(0.0));
        let cut_secs = (total_duration - kept_secs).max(0.0);
        let kept_ratio = if total_duration > 0.0 {
            kept_secs / total_duration
        } else {
            1.0
        };
        Self {
            kept_secs,
            cut_secs,
            kept_ratio,
            interval_count: intervals.len(),
        }
    }
}

/// Whether trimming to `intervals` is worthwhile.
///
/// Returns `false` when nothing would be cut, when the cut is below
/// `min_cut_ratio`, or when less than `min_keep_ratio` would remain.
pub fn should_trim(intervals: &[Interval], total_duration: f64, config: &SilenceConfig) -> bool {
    if intervals.is_empty() {
        debug!("No speech detected, skipping trim");
        return false;
    }

    let stats = KeepStats::compute(intervals, total_duration);

    if stats.cut_secs <= 0.0 {
        debug!("No silence detected, skipping trim");
        return false;
    }

    if stats.kept_ratio < config.min_keep_ratio {
        warn!(
            kept_ratio = format!("{:.1}%", stats.kept_ratio * 100.0),
            min_keep_ratio = format!("{:.1}%", config.min_keep_ratio * 100.0),
            "Not enough non-silent content, skipping trim"
        );
        return false;
    }

    let cut_ratio = 1.0 - stats.kept_ratio;
    if cut_ratio < config.min_cut_ratio {
        debug!(
            cut_ratio = format!("{:.1}%", cut_ratio * 100.0),
            "Cut amount too small, skipping trim"
        );
        return false;
    }

    debug!(
        kept_ratio = format!("{:.1}%", stats.kept_ratio * 100.0),
        intervals = stats.interval_count,
        "Trim will be applied"
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(s: f64, e: f64) -> Interval {
        Interval::new(s, e).unwrap()
    }

    #[test]
    fn test_stats() {
        let stats = KeepStats::compute(&[iv(0.0, 1.0), iv(2.0, 3.0)], 3.0);
        assert!((stats.kept_secs - 2.0).abs() < 1e-9);
        assert!((stats.cut_secs - 1.0).abs() < 1e-9);
        assert!((stats.kept_ratio - 0.667).abs() < 0.01);
        assert_eq!(stats.interval_count, 2);
    }

    #[test]
    fn test_no_cuts() {
        assert!(!should_trim(&[iv(0.0, 10.0)], 10.0, &SilenceConfig::default()));
    }

    #[test]
    fn test_with_cuts() {
        assert!(should_trim(&[iv(0.0, 5.0)], 10.0, &SilenceConfig::default()));
    }

    #[test]
    fn test_too_little_kept() {
        assert!(!should_trim(&[iv(0.0, 0.5)], 10.0, &SilenceConfig::default()));
    }

    #[test]
    fn test_cut_too_small() {
        assert!(!should_trim(&[iv(0.5, 10.0)], 10.0, &SilenceConfig::default()));
    }

    #[test]
    fn test_empty() {
        assert!(!should_trim(&[], 10.0, &SilenceConfig::default()));
    }
}

//! Time intervals in seconds.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

/// Interval construction error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntervalError {
    #[error("Interval bounds must be finite (start: {start}, end: {end})")]
    NotFinite { start: f64, end: f64 },

    #[error("Interval start cannot be negative: {0}")]
    NegativeStart(f64),

    #[error("Interval start ({start:.3}s) must be before end ({end:.3}s)")]
    Empty { start: f64, end: f64 },
}

/// A half-open time range `[start, end)` in seconds.
///
/// `start < end` holds for every value of this type, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, JsonSchema)]
pub struct Interval {
    start: f64,
    end: f64,
}

impl Interval {
    /// Create a validated interval.
    pub fn new(start: f64, end: f64) -> Result<Self, IntervalError> {
        if !start.is_finite() || !end.is_finite() {
            return Err(IntervalError::NotFinite { start, end });
        }
        if start < 0.0 {
            return Err(IntervalError::NegativeStart(start));
        }
        if start >= end {
            return Err(IntervalError::Empty { start, end });
        }
        Ok(Self { start, end })
    }

    /// Start time in seconds.
    #[inline]
    pub fn start(&self) -> f64 {
        self.start
    }

    /// End time in seconds.
    #[inline]
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Duration in seconds (always positive).
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `t` falls inside `[start, end)`.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Clamp to `[0, max_end]`, returning `None` if nothing is left.
    pub fn clamp_to(&self, max_end: f64) -> Option<Self> {
        Self::new(self.start.max(0.0), self.end.min(max_end)).ok()
    }

    /// Sum of durations of a sequence of intervals.
    pub fn total_duration(intervals: &[Interval]) -> f64 {
        intervals.iter().map(Interval::duration).sum()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s)", self.start, self.end)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            start: f64,
            end: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        Interval::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}

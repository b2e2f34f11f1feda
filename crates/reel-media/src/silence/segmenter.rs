//! State machine turning per-window silence flags into non-silent spans.
//!
//! ```text
//!            loud window                     silence >= min_silence
//!   ┌──────┐ ─────────────► ┌────────┐ ─► ┌───────────┐ ──────────────► close span,
//!   │ Idle │                │ InSpan │    │ InSilence │                 back to Idle
//!   └──────┘ ◄───────────── └────────┘ ◄─ └───────────┘
//!                                 loud window (short pause kept)
//! ```

use reel_models::Interval;

enum State {
    /// No span open.
    Idle,
    /// Inside a non-silent span.
    InSpan { start: f64 },
    /// Inside a span, in a silence run that has not yet qualified.
    InSilence { start: f64, silence_start: f64 },
}

/// Converts a stream of silence-flagged windows into non-silent intervals.
pub struct SilenceSegmenter {
    min_silence_secs: f64,
    state: State,
    intervals: Vec<Interval>,
}

impl SilenceSegmenter {
    pub fn new(min_silence_secs: f64) -> Self {
        Self {
            min_silence_secs,
            state: State::Idle,
            intervals: Vec::new(),
        }
    }

    /// Feed one window covering `[start, end)` seconds.
    pub fn ingest_window(&mut self, start: f64, end: f64, silent: bool) {
        self.state = match (std::mem::replace(&mut self.state, State::Idle), silent) {
            (State::Idle, false) => State::InSpan { start },
            (State::Idle, true) => State::Idle,
            (State::InSpan { start: span }, false) => State::InSpan { start: span },
            (State::InSpan { start: span }, true) => self.silence_step(span, start, end),
            (State::InSilence { start: span, .. }, false) => State::InSpan { start: span },
            (
                State::InSilence {
                    start: span,
                    silence_start,
                },
                true,
            ) => self.silence_step(span, silence_start, end),
        };
    }

    fn silence_step(&mut self, span: f64, silence_start: f64, window_end: f64) -> State {
        if window_end - silence_start >= self.min_silence_secs {
            self.close(span, silence_start);
            State::Idle
        } else {
            State::InSilence {
                start: span,
                silence_start,
            }
        }
    }

    fn close(&mut self, start: f64, end: f64) {
        if let Ok(interval) = Interval::new(start, end) {
            self.intervals.push(interval);
        }
    }

    /// Close any open span at `total_duration` and return all spans.
    pub fn finalize(mut self, total_duration: f64) -> Vec<Interval> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => {}
            State::InSpan { start } => self.close(start, total_duration),
            State::InSilence {
                start,
                silence_start,
            } => {
                if total_duration - silence_start >= self.min_silence_secs {
                    self.close(start, silence_start);
                } else {
                    self.close(start, total_duration);
                }
            }
        }
        self.intervals
    }
}

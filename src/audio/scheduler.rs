//! Gapless playback scheduling
//!
//! Chunks arrive over the network at unpredictable times, but they must
//! play back-to-back. The scheduler keeps a monotonic cursor: each
//! segment starts where the previous one ends, clamped forward to a small
//! safety lead so a late arrival is never scheduled in the past. The
//! clamp accepts a small amount of drift on very long streams rather than
//! dropping or time-stretching audio.

/// Safety lead in seconds between "now" and the earliest allowed segment
/// start, absorbing processing delay between arrival and scheduling.
pub const MIN_LEAD: f64 = 0.12;

/// Schedule cursor for back-to-back audio segments
///
/// Times are seconds on whatever clock the caller supplies (the audio
/// output clock in practice); the scheduler only requires that it be
/// monotonic.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    /// Earliest time the next segment may start; `None` until the first
    /// segment of a stream is scheduled.
    next_time: Option<f64>,
}

impl PlaybackScheduler {
    /// Create a scheduler with no pending schedule
    #[must_use]
    pub const fn new() -> Self {
        Self { next_time: None }
    }

    /// Forget the current schedule
    ///
    /// Called when a new stream begins so its first chunk starts at
    /// `now + MIN_LEAD` instead of after the tail of a finished stream.
    pub const fn reset(&mut self) {
        self.next_time = None;
    }

    /// Assign a start time to a segment of `duration` seconds
    ///
    /// Returns `max(now + MIN_LEAD, cursor)` and advances the cursor by
    /// exactly `duration`, so consecutive calls produce adjacent segments
    /// as long as chunks arrive before their scheduled start.
    pub fn schedule(&mut self, now: f64, duration: f64) -> f64 {
        let min_start = now + MIN_LEAD;
        let start = match self.next_time {
            Some(t) if t >= min_start => t,
            _ => min_start,
        };
        self.next_time = Some(start + duration);
        start
    }

    /// The pending cursor, if any segment has been scheduled
    #[must_use]
    pub const fn next_time(&self) -> Option<f64> {
        self.next_time
    }
}

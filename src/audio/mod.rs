//! Audio processing module
//!
//! PCM framing, playback scheduling, and local output. Network delivery
//! of the framed chunks lives in `stream`.

pub mod pcm;
pub mod playback;
pub mod scheduler;

pub use pcm::{AudioSettings, SampleBuffer};
pub use playback::{LocalPlayback, ScheduledSink};
pub use scheduler::{MIN_LEAD, PlaybackScheduler};

//! Receiver-side stream reconstruction
//!
//! Consumes header/words/chunk messages in arrival order and turns each
//! binary chunk into a playable segment with an exact start time, so the
//! output is gapless regardless of network jitter. The browser player
//! (`static/player.html`) implements the same state machine over
//! WebAudio; this native version backs local playback and the tests.

use crate::audio::scheduler::PlaybackScheduler;
use crate::stream::protocol::StreamMessage;

/// Audio parameters of the active stream, taken from its header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

/// A normalized audio segment with an assigned start time
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Samples normalized to [-1, 1]
    pub samples: Vec<f32>,
    pub channels: u16,
    pub sample_rate: u32,
    /// Start time in seconds on the sink's clock
    pub start: f64,
}

/// Destination for scheduled segments
///
/// Scheduling calls are fire-and-forget; the receiver only requires the
/// sink's clock to be monotonic.
pub trait SegmentSink {
    /// Current time in seconds on the sink's clock
    fn now(&self) -> f64;

    /// Enqueue a segment for playback at `segment.start`
    fn play(&mut self, segment: Segment);

    /// Apply a gain to all current and already-scheduled audio,
    /// immediately
    fn set_gain(&mut self, gain: f32);
}

/// Stream receiver state machine
pub struct StreamReceiver<S> {
    sink: S,
    info: Option<StreamInfo>,
    scheduler: PlaybackScheduler,
    transcript: Vec<String>,
}

impl<S: SegmentSink> StreamReceiver<S> {
    /// Create a receiver with no active stream
    pub const fn new(sink: S) -> Self {
        Self {
            sink,
            info: None,
            scheduler: PlaybackScheduler::new(),
            transcript: Vec::new(),
        }
    }

    /// Process a text frame
    ///
    /// A header (re)starts the stream: the schedule is forgotten so the
    /// first chunk lands at `now + MIN_LEAD`, and output is unmuted in
    /// case a previous stream was stopped.
    pub fn on_message(&mut self, msg: StreamMessage) {
        match msg {
            StreamMessage::Header {
                sample_rate,
                channels,
                ..
            } => {
                self.info = Some(StreamInfo {
                    sample_rate,
                    channels,
                });
                self.scheduler.reset();
                self.sink.set_gain(1.0);
            }
            StreamMessage::Words { words } => {
                self.transcript = words;
            }
        }
    }

    /// Process one binary chunk
    ///
    /// Bytes are interpreted as signed 16-bit little-endian samples and
    /// normalized to [-1, 1]. A chunk arriving before any header is
    /// discarded.
    pub fn on_chunk(&mut self, bytes: &[u8]) {
        let Some(info) = self.info else {
            tracing::trace!(len = bytes.len(), "chunk before header, discarding");
            return;
        };

        let samples: Vec<f32> = bytes
            .chunks_exact(2)
            .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32768.0)
            .collect();
        if samples.is_empty() {
            return;
        }

        let frames = samples.len() / info.channels as usize;
        #[allow(clippy::cast_precision_loss)]
        let duration = frames as f64 / f64::from(info.sample_rate);

        let start = self.scheduler.schedule(self.sink.now(), duration);
        self.sink.play(Segment {
            samples,
            channels: info.channels,
            sample_rate: info.sample_rate,
            start,
        });
    }

    /// User-initiated stop: mute everything already scheduled, then end
    /// the stream
    ///
    /// Scheduled segments can extend seconds into the future, so the
    /// gain cut takes effect ahead of any teardown.
    pub fn stop(&mut self) {
        self.sink.set_gain(0.0);
        self.info = None;
        self.scheduler.reset();
    }

    /// The words of the active (or last) stream
    #[must_use]
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// Parameters of the active stream, if a header has been seen
    #[must_use]
    pub const fn info(&self) -> Option<StreamInfo> {
        self.info
    }

    /// Access the sink
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Access the sink mutably (for draining in local playback)
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}

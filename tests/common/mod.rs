//! Shared test utilities
//!
//! Mock result providers and a recording segment sink, so stream tests
//! run without a camera, network, or audio hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};

use lector_gateway::audio::SampleBuffer;
use lector_gateway::stream::{Frame, Segment, SegmentSink};
use lector_gateway::{Result, ResultProvider, SpeechResult};

/// Provider returning a fixed buffer and word list on every fetch
pub struct FixedProvider {
    samples: Vec<i16>,
    words: Vec<String>,
    pub fetches: AtomicUsize,
}

#[allow(dead_code)]
impl FixedProvider {
    pub fn new(samples: Vec<i16>, words: &[&str]) -> Self {
        Self {
            samples,
            words: words.iter().map(ToString::to_string).collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultProvider for FixedProvider {
    async fn fetch(&self) -> Result<Option<SpeechResult>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(Some(SpeechResult {
            samples: SampleBuffer::I16(self.samples.clone()),
            words: self.words.clone(),
        }))
    }
}

/// Provider that always reports "no result" (e.g. OCR found no text)
pub struct EmptyProvider;

#[async_trait]
impl ResultProvider for EmptyProvider {
    async fn fetch(&self) -> Result<Option<SpeechResult>> {
        Ok(None)
    }
}

/// Provider whose fetch blocks until the gate is released
pub struct GatedProvider {
    inner: FixedProvider,
    gate: Arc<Notify>,
}

#[allow(dead_code)]
impl GatedProvider {
    pub fn new(samples: Vec<i16>, words: &[&str]) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        (
            Self {
                inner: FixedProvider::new(samples, words),
                gate: Arc::clone(&gate),
            },
            gate,
        )
    }
}

#[async_trait]
impl ResultProvider for GatedProvider {
    async fn fetch(&self) -> Result<Option<SpeechResult>> {
        self.gate.notified().await;
        self.inner.fetch().await
    }
}

/// Read every frame remaining on the channel
///
/// The callers drop all sender handles first, so the loop terminates
/// when the buffered frames run out.
#[allow(dead_code)]
pub async fn drain_frames(mut rx: mpsc::Receiver<Frame>) -> Vec<Frame> {
    let mut frames = Vec::new();
    while let Some(frame) = rx.recv().await {
        frames.push(frame);
    }
    frames
}

/// Deterministic non-constant sample data
#[allow(dead_code, clippy::cast_possible_truncation)]
pub fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 4096) as i16).collect()
}

/// Segment sink recording every call, on a manually advanced clock
#[allow(dead_code)]
#[derive(Default)]
pub struct TestSink {
    pub clock: f64,
    pub segments: Vec<Segment>,
    pub gain: f32,
}

impl SegmentSink for TestSink {
    fn now(&self) -> f64 {
        self.clock
    }

    fn play(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }
}

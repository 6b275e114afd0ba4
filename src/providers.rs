//! Result providers for the stream session
//!
//! A provider produces the (PCM buffer, word list) pair a stream plays.
//! Button 1 runs the full capture → recognize → synthesize pipeline;
//! button 2 re-synthesizes the recent-words memory. Upstream failures
//! (camera offline, OCR/TTS errors) recover as "no result" so the
//! dispatcher stays ready for the next command; an unsupported sample
//! format is fatal to the attempt and propagates.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::audio::{AudioSettings, SampleBuffer};
use crate::camera::CameraClient;
use crate::memory::RecentWords;
use crate::ocr::OcrClient;
use crate::tts::TtsClient;
use crate::{Error, Result};

/// Audio plus the transcript to display alongside it
#[derive(Debug, Clone)]
pub struct SpeechResult {
    pub samples: SampleBuffer,
    pub words: Vec<String>,
}

/// Source of speech results, bound to a client button
#[async_trait]
pub trait ResultProvider: Send + Sync {
    /// Produce the next result, or `None` when there is nothing to say
    ///
    /// # Errors
    ///
    /// Returns error only for failures fatal to the stream attempt;
    /// recoverable upstream failures are reported as `Ok(None)`.
    async fn fetch(&self) -> Result<Option<SpeechResult>>;
}

/// Map a synthesis failure to the provider contract
///
/// Format problems abort the attempt; network/API failures degrade to
/// "no result".
fn synthesized(result: Result<SampleBuffer>, words: Vec<String>) -> Result<Option<SpeechResult>> {
    match result {
        Ok(samples) => Ok(Some(SpeechResult { samples, words })),
        Err(e @ Error::UnsupportedFormat(_)) => Err(e),
        Err(e) => {
            tracing::warn!(error = %e, "synthesis failed, skipping stream");
            Ok(None)
        }
    }
}

/// Full read-aloud pipeline: camera capture, OCR, TTS
pub struct ReadAloudProvider {
    camera: Arc<CameraClient>,
    ocr: Arc<OcrClient>,
    tts: Arc<TtsClient>,
    memory: Arc<Mutex<RecentWords>>,
    audio: AudioSettings,
    flash: bool,
}

impl ReadAloudProvider {
    /// Create a provider over the given collaborator clients
    #[must_use]
    pub const fn new(
        camera: Arc<CameraClient>,
        ocr: Arc<OcrClient>,
        tts: Arc<TtsClient>,
        memory: Arc<Mutex<RecentWords>>,
        audio: AudioSettings,
    ) -> Self {
        Self {
            camera,
            ocr,
            tts,
            memory,
            audio,
            flash: true,
        }
    }

    /// Enable or disable the capture flash
    #[must_use]
    pub const fn with_flash(mut self, flash: bool) -> Self {
        self.flash = flash;
        self
    }
}

#[async_trait]
impl ResultProvider for ReadAloudProvider {
    async fn fetch(&self) -> Result<Option<SpeechResult>> {
        let image = match self.camera.capture_data_url(self.flash).await {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(error = %e, "camera capture failed");
                return Ok(None);
            }
        };

        let text = match self.ocr.recognize(&image).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::info!("no recognizable text in image");
                return Ok(None);
            }
            Err(e) => {
                tracing::warn!(error = %e, "text recognition failed");
                return Ok(None);
            }
        };

        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let result = synthesized(self.tts.synthesize(&text, &self.audio).await, words)?;

        // Remember only what will actually be spoken.
        if let Some(result) = &result {
            self.memory.lock().await.extend(result.words.iter().cloned());
        }

        Ok(result)
    }
}

/// Repeat pipeline: re-synthesize the recent-words memory
pub struct RepeatProvider {
    tts: Arc<TtsClient>,
    memory: Arc<Mutex<RecentWords>>,
    audio: AudioSettings,
}

impl RepeatProvider {
    /// Create a provider reading from the shared memory ring
    #[must_use]
    pub const fn new(
        tts: Arc<TtsClient>,
        memory: Arc<Mutex<RecentWords>>,
        audio: AudioSettings,
    ) -> Self {
        Self { tts, memory, audio }
    }
}

#[async_trait]
impl ResultProvider for RepeatProvider {
    async fn fetch(&self) -> Result<Option<SpeechResult>> {
        let words = self.memory.lock().await.snapshot();
        if words.is_empty() {
            tracing::info!("nothing remembered yet, nothing to repeat");
            return Ok(None);
        }

        let text = words.join(" ");
        synthesized(self.tts.synthesize(&text, &self.audio).await, words)
    }
}

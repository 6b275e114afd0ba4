//! Text-to-speech client
//!
//! Calls the Google Cloud Text-to-Speech REST API requesting LINEAR16
//! output at the process audio sample rate, then unpacks the base64 WAV
//! payload into a sample buffer ready for framing.

use std::time::Instant;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::audio::{AudioSettings, SampleBuffer};
use crate::{Error, Result};

const DEFAULT_LANGUAGE_CODE: &str = "en-US";
const DEFAULT_VOICE: &str = "en-US-Standard-F";
const DEFAULT_SPEED: f64 = 1.0;

/// Synthesizes speech from text
pub struct TtsClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    language_code: String,
    voice: String,
    speed: f64,
}

/// Synthesis request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeRequest<'a> {
    input: TextInput<'a>,
    voice: VoiceSelection<'a>,
    audio_config: AudioConfigParams<'a>,
}

/// Text to synthesize
#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

/// Voice selection
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelection<'a> {
    language_code: &'a str,
    name: &'a str,
}

/// Output audio parameters
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfigParams<'a> {
    audio_encoding: &'a str,
    speaking_rate: f64,
    sample_rate_hertz: u32,
}

/// Synthesis response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeResponse {
    audio_content: String,
}

impl TtsClient {
    /// Create a new TTS client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_url: String, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("TTS API key required".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            language_code: DEFAULT_LANGUAGE_CODE.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            speed: DEFAULT_SPEED,
        })
    }

    /// Create with a specific voice
    #[must_use]
    pub fn with_voice(mut self, language_code: String, voice: String) -> Self {
        self.language_code = language_code;
        self.voice = voice;
        self
    }

    /// Create with a speaking-rate multiplier
    #[must_use]
    pub const fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Synthesize text to a PCM sample buffer
    ///
    /// The request asks for LINEAR16 at `audio.sample_rate_hz`, so the
    /// returned buffer can be framed and streamed without resampling.
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the payload is not the
    /// WAV format the API promises
    pub async fn synthesize(&self, text: &str, audio: &AudioSettings) -> Result<SampleBuffer> {
        let start = Instant::now();

        let request = SynthesizeRequest {
            input: TextInput { text },
            voice: VoiceSelection {
                language_code: &self.language_code,
                name: &self.voice,
            },
            audio_config: AudioConfigParams {
                audio_encoding: "LINEAR16",
                speaking_rate: self.speed,
                sample_rate_hertz: audio.sample_rate_hz,
            },
        };

        let response = self
            .client
            .post(format!("{}?key={}", self.api_url, self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("API error {status}: {body}")));
        }

        let result: SynthesizeResponse = response.json().await?;
        let wav_bytes = decode_audio_content(&result.audio_content)?;

        let (samples, sample_rate) = SampleBuffer::from_wav(&wav_bytes)?;
        if sample_rate != audio.sample_rate_hz {
            tracing::warn!(
                requested = audio.sample_rate_hz,
                received = sample_rate,
                "TTS returned a different sample rate than requested"
            );
        }

        tracing::debug!(
            samples = samples.len(),
            elapsed_ms = start.elapsed().as_millis(),
            "speech synthesized"
        );
        Ok(samples)
    }
}

/// Decode the base64 `audioContent` payload
///
/// The API documents standard base64, but some proxies re-encode with
/// the URL-safe alphabet; both are accepted.
fn decode_audio_content(content: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(content.as_bytes())
        .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(content.as_bytes()))
        .map_err(|e| Error::Tts(format!("invalid audio payload: {e}")))
}

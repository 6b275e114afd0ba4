//! Configuration management for the Lector gateway
//!
//! Every setting layers env var > TOML file > default. The loaded
//! [`Config`] is an explicitly constructed context handed to whoever
//! needs it; there is no ambient global state.

pub mod file;

use crate::audio::AudioSettings;
use crate::Result;

/// Default TTS synthesis endpoint (Google Cloud Text-to-Speech)
const DEFAULT_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Default camera base URL (ESP32 soft-AP address)
const DEFAULT_CAMERA_URL: &str = "http://192.168.4.1";

/// Lector gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Process-wide audio framing parameters
    pub audio: AudioSettings,

    /// Camera module base URL
    pub camera_url: String,

    /// TTS synthesis endpoint
    pub tts_url: String,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// OCR configuration
    pub ocr: OcrConfig,

    /// TTS voice configuration
    pub tts: TtsConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenRouter` API key (vision OCR)
    /// See: <https://openrouter.ai/keys>
    pub openrouter: Option<String>,

    /// Google Cloud API key (TTS)
    pub google: Option<String>,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// OCR configuration
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Vision model identifier
    pub model: String,
}

/// TTS voice configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// BCP-47 language code
    pub language_code: String,

    /// Voice name
    pub voice: String,

    /// Speaking-rate multiplier
    pub speed: f64,
}

impl Config {
    /// Load configuration from environment and the optional TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the resulting audio settings are invalid
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            openrouter: std::env::var("OPENROUTER_API_KEY")
                .ok()
                .or(fc.keys.openrouter),
            google: std::env::var("GOOGLE_TTS_API_KEY").ok().or(fc.keys.google),
        };

        let camera_url = std::env::var("LECTOR_CAMERA_URL")
            .ok()
            .or(fc.base_urls.camera)
            .unwrap_or_else(|| DEFAULT_CAMERA_URL.to_string());

        let tts_url = std::env::var("LECTOR_TTS_URL")
            .ok()
            .or(fc.base_urls.tts)
            .unwrap_or_else(|| DEFAULT_TTS_URL.to_string());

        let server = ServerConfig {
            port: std::env::var("LECTOR_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(8000),
        };

        let defaults = AudioSettings::default();
        let audio = AudioSettings {
            sample_rate_hz: std::env::var("LECTOR_SAMPLE_RATE_HZ")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.audio.sample_rate_hz)
                .unwrap_or(defaults.sample_rate_hz),
            channels: std::env::var("LECTOR_CHANNELS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.audio.channels)
                .unwrap_or(defaults.channels),
            chunk_ms: std::env::var("LECTOR_CHUNK_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.audio.chunk_ms)
                .unwrap_or(defaults.chunk_ms),
        };
        audio.validate()?;

        let ocr = OcrConfig {
            model: std::env::var("LECTOR_OCR_MODEL")
                .ok()
                .or(fc.ocr.model)
                .unwrap_or_else(|| "openai/gpt-4.1-mini".to_string()),
        };

        let tts = TtsConfig {
            language_code: std::env::var("LECTOR_TTS_LANGUAGE")
                .ok()
                .or(fc.tts.language_code)
                .unwrap_or_else(|| "en-US".to_string()),
            voice: std::env::var("LECTOR_TTS_VOICE")
                .ok()
                .or(fc.tts.voice)
                .unwrap_or_else(|| "en-US-Standard-F".to_string()),
            speed: std::env::var("LECTOR_TTS_SPEED")
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.tts.speed)
                .unwrap_or(1.0),
        };

        Ok(Self {
            audio,
            camera_url,
            tts_url,
            api_keys,
            server,
            ocr,
            tts,
        })
    }
}

//! TOML configuration file loading
//!
//! Supports `~/.config/lector/config.toml` as a persistent config
//! source. All fields are optional — the file is a partial overlay on
//! top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct LectorConfigFile {
    /// Base URLs of external collaborators
    #[serde(default)]
    pub base_urls: BaseUrlsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub keys: KeysFileConfig,

    /// Audio framing parameters
    #[serde(default)]
    pub audio: AudioFileConfig,

    /// Server/runtime configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// OCR configuration
    #[serde(default)]
    pub ocr: OcrFileConfig,

    /// TTS voice configuration
    #[serde(default)]
    pub tts: TtsFileConfig,
}

/// Base URLs of the camera module and the TTS API
#[derive(Debug, Default, Deserialize)]
pub struct BaseUrlsFileConfig {
    /// Camera module base URL (e.g. `http://192.168.4.1`)
    pub camera: Option<String>,

    /// TTS synthesis endpoint
    pub tts: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct KeysFileConfig {
    pub openrouter: Option<String>,
    pub google: Option<String>,
}

/// Audio framing parameters
#[derive(Debug, Default, Deserialize)]
pub struct AudioFileConfig {
    /// Sample rate in Hz
    pub sample_rate_hz: Option<u32>,

    /// Channel count
    pub channels: Option<u16>,

    /// Chunk duration in milliseconds
    pub chunk_ms: Option<u32>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// HTTP server port
    pub port: Option<u16>,
}

/// OCR configuration
#[derive(Debug, Default, Deserialize)]
pub struct OcrFileConfig {
    /// Vision model identifier (e.g. "openai/gpt-4.1-mini")
    pub model: Option<String>,
}

/// TTS voice configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// BCP-47 language code (e.g. "en-US")
    pub language_code: Option<String>,

    /// Voice name (e.g. "en-US-Standard-F")
    pub voice: Option<String>,

    /// Speaking-rate multiplier
    pub speed: Option<f64>,
}

/// Load the TOML config file
///
/// `LECTOR_CONFIG` overrides the path; otherwise the standard location
/// is used. Returns `LectorConfigFile::default()` if the file doesn't
/// exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> LectorConfigFile {
    let path = std::env::var("LECTOR_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(config_file_path);

    let Some(path) = path else {
        return LectorConfigFile::default();
    };

    if !path.exists() {
        return LectorConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                LectorConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            LectorConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/lector/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("lector").join("config.toml"))
}

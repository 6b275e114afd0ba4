//! Error types for the Lector gateway

use thiserror::Error;

/// Result type alias for Lector operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Lector gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Camera capture error
    #[error("camera error: {0}")]
    Camera(String),

    /// Vision OCR error
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Audio device or playback error
    #[error("audio error: {0}")]
    Audio(String),

    /// PCM sample encoding not supported for LINEAR16 streaming
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Stream channel closed by the remote peer
    #[error("channel closed: {0}")]
    Channel(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// WAV parsing error
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
}

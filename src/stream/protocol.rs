//! Websocket stream protocol messages
//!
//! One duplex connection carries text control/metadata frames (JSON with
//! a `type` tag) and raw binary LINEAR16 chunk frames. Outbound text
//! frames are [`StreamMessage`]; inbound commands are [`WsCommand`].
//! Unknown inbound tags fail to parse and are ignored by the dispatcher.

use serde::{Deserialize, Serialize};

use crate::audio::AudioSettings;

/// Wire value of the `format` header field
pub const FORMAT_LINEAR16: &str = "LINEAR16";

/// Outbound text frame sent ahead of (or between) binary chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Audio format announcement; always the first frame of a stream.
    /// A receiver discards binary chunks until it has seen one.
    Header {
        format: String,
        sample_rate: u32,
        channels: u16,
        chunk_ms: u32,
    },
    /// Transcript for display; not authoritative for playback timing
    Words { words: Vec<String> },
}

impl StreamMessage {
    /// Build the header frame for the given audio settings
    #[must_use]
    pub fn header(audio: &AudioSettings) -> Self {
        Self::Header {
            format: FORMAT_LINEAR16.to_string(),
            sample_rate: audio.sample_rate_hz,
            channels: audio.channels,
            chunk_ms: audio.chunk_ms,
        }
    }
}

/// Inbound control command from the client
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsCommand {
    /// Read aloud: capture an image, recognize text, speak it
    Button1,
    /// Repeat the recent words from memory
    Button2,
    /// Abort the in-flight stream and close the connection
    Stop,
}

/// One frame on the duplex channel, transport-agnostic
///
/// The session writes these into an mpsc queue; the connection handler
/// forwards them onto the socket (or a test collects them directly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// JSON-encoded [`StreamMessage`]
    Text(String),
    /// One LINEAR16 chunk
    Binary(Vec<u8>),
    /// Server-initiated close after a stop command
    Close,
}

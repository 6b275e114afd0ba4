//! Lector Gateway - camera-to-speech read-aloud gateway
//!
//! This library provides the core functionality for the Lector gateway:
//! - Camera capture, vision OCR, and TTS clients
//! - LINEAR16 framing and gapless playback scheduling
//! - The websocket streaming protocol and command dispatch
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Collaborators                     │
//! │   Camera (HTTP)  │  Vision OCR  │  Cloud TTS        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Lector Gateway                       │
//! │   Providers  │  Framer  │  Session  │  Dispatcher   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                   Receivers                          │
//! │   Browser player (WebAudio)  │  Local output (cpal) │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod audio;
pub mod camera;
pub mod config;
pub mod error;
pub mod memory;
pub mod ocr;
pub mod providers;
pub mod stream;
pub mod tts;

pub use audio::{AudioSettings, SampleBuffer};
pub use camera::CameraClient;
pub use config::Config;
pub use error::{Error, Result};
pub use memory::RecentWords;
pub use ocr::OcrClient;
pub use providers::{ReadAloudProvider, RepeatProvider, ResultProvider, SpeechResult};
pub use stream::{StreamReceiver, StreamSession};
pub use tts::TtsClient;

//! PCM sample buffers and fixed-duration framing
//!
//! The websocket stream carries raw LINEAR16 audio: little-endian signed
//! 16-bit samples, interleaved by channel, sliced into fixed-duration
//! chunks. Framing is a pure function of the buffer and the chunk size;
//! it has no dependency on the transport.

use std::io::Cursor;
use std::time::Duration;

use crate::{Error, Result};

/// Process-wide audio framing parameters
///
/// Shared by the sender (chunk sizing) and the receiver (sample
/// interpretation); announced to clients in the stream header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSettings {
    /// Sample rate in Hz
    pub sample_rate_hz: u32,

    /// Interleaved channel count (mono in practice)
    pub channels: u16,

    /// Duration of one streamed chunk in milliseconds
    pub chunk_ms: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            sample_rate_hz: 16_000,
            channels: 1,
            chunk_ms: 100,
        }
    }
}

impl AudioSettings {
    /// Samples per chunk (integer floor)
    #[must_use]
    pub const fn chunk_samples(&self) -> u32 {
        self.sample_rate_hz * self.chunk_ms / 1000
    }

    /// Bytes per chunk (16-bit samples)
    #[must_use]
    pub const fn chunk_bytes(&self) -> usize {
        self.chunk_samples() as usize * self.channels as usize * 2
    }

    /// Duration of one full chunk
    #[must_use]
    pub const fn chunk_duration(&self) -> Duration {
        Duration::from_millis(self.chunk_ms as u64)
    }

    /// Validate the derived chunk size
    ///
    /// # Errors
    ///
    /// Returns error if the settings produce an empty chunk, which would
    /// make framing impossible.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_bytes() == 0 {
            return Err(Error::Config(format!(
                "audio settings produce zero-byte chunks \
                 (sample_rate_hz={}, channels={}, chunk_ms={})",
                self.sample_rate_hz, self.channels, self.chunk_ms
            )));
        }
        Ok(())
    }

    /// Slice a LINEAR16 byte buffer into an ordered chunk sequence
    ///
    /// Every chunk is `chunk_bytes()` long except possibly the final one,
    /// which holds the remainder. An empty buffer yields no chunks.
    #[must_use]
    pub fn frame<'a>(&self, pcm: &'a [u8]) -> std::slice::Chunks<'a, u8> {
        pcm.chunks(self.chunk_bytes())
    }
}

/// A complete PCM sample buffer in one of the supported encodings
///
/// Produced by a result provider (TTS output), immutable once produced,
/// and consumed exactly once when converted to wire bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SampleBuffer {
    /// 8-bit unsigned samples; already byte-order neutral
    U8(Vec<u8>),
    /// 16-bit signed samples in native representation
    I16(Vec<i16>),
}

impl SampleBuffer {
    /// Parse a WAV byte buffer into a sample buffer
    ///
    /// Returns the samples together with the sample rate declared in the
    /// container. Only 16-bit signed integer WAV is accepted — the format
    /// the TTS API produces for LINEAR16 output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedFormat`] for any other sample encoding
    /// and [`Error::Wav`] if the container itself is malformed.
    pub fn from_wav(bytes: &[u8]) -> Result<(Self, u32)> {
        let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
        let spec = reader.spec();

        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(Error::UnsupportedFormat(format!(
                "{:?} {}-bit",
                spec.sample_format, spec.bits_per_sample
            )));
        }

        let samples = reader
            .samples::<i16>()
            .collect::<std::result::Result<Vec<i16>, _>>()?;

        Ok((Self::I16(samples), spec.sample_rate))
    }

    /// Number of samples in the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::U8(bytes) => bytes.len(),
            Self::I16(samples) => samples.len(),
        }
    }

    /// Whether the buffer holds no samples
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to the LINEAR16 wire representation
    ///
    /// 16-bit samples are emitted little-endian regardless of host byte
    /// order; 8-bit samples pass through untouched.
    #[must_use]
    pub fn into_linear16_bytes(self) -> Vec<u8> {
        match self {
            Self::U8(bytes) => bytes,
            Self::I16(samples) => samples
                .into_iter()
                .flat_map(i16::to_le_bytes)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(sample_rate_hz: u32, chunk_ms: u32) -> AudioSettings {
        AudioSettings {
            sample_rate_hz,
            channels: 1,
            chunk_ms,
        }
    }

    #[test]
    fn chunk_math_at_16k_100ms() {
        let audio = settings(16_000, 100);
        assert_eq!(audio.chunk_samples(), 1600);
        assert_eq!(audio.chunk_bytes(), 3200);
    }

    #[test]
    fn frames_exact_multiple_without_remainder() {
        // 48000 bytes (1.5 s at 16 kHz) / 100 ms -> exactly 15 full chunks
        let audio = settings(16_000, 100);
        let pcm = SampleBuffer::I16(vec![0i16; 24_000]).into_linear16_bytes();
        assert_eq!(pcm.len(), 48_000);

        let chunks: Vec<&[u8]> = audio.frame(&pcm).collect();
        assert_eq!(chunks.len(), 15);
        assert!(chunks.iter().all(|c| c.len() == 3200));
    }

    #[test]
    fn frames_short_buffer_as_single_chunk() {
        let audio = settings(16_000, 100);
        let pcm = vec![0u8; 1000];

        let chunks: Vec<&[u8]> = audio.frame(&pcm).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 1000);
    }

    #[test]
    fn frames_concatenate_back_to_original() {
        let audio = settings(16_000, 100);
        let pcm: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();

        let rejoined: Vec<u8> = audio.frame(&pcm).flatten().copied().collect();
        assert_eq!(rejoined, pcm);

        // remainder chunk carries len % chunk_bytes
        let last = audio.frame(&pcm).last().unwrap();
        assert_eq!(last.len(), pcm.len() % audio.chunk_bytes());
    }

    #[test]
    fn framing_is_deterministic() {
        let audio = settings(8_000, 50);
        let pcm: Vec<u8> = (0..5_000u32).map(|i| (i % 17) as u8).collect();

        let first: Vec<Vec<u8>> = audio.frame(&pcm).map(<[u8]>::to_vec).collect();
        let second: Vec<Vec<u8>> = audio.frame(&pcm).map(<[u8]>::to_vec).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_buffer_yields_no_chunks() {
        let audio = settings(16_000, 100);
        assert_eq!(audio.frame(&[]).count(), 0);
    }

    #[test]
    fn i16_samples_encode_little_endian() {
        let bytes = SampleBuffer::I16(vec![0x0102, -2]).into_linear16_bytes();
        assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn u8_samples_pass_through() {
        let bytes = SampleBuffer::U8(vec![1, 2, 3]).into_linear16_bytes();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn zero_chunk_settings_rejected() {
        let audio = settings(16_000, 0);
        assert!(audio.validate().is_err());
        assert!(settings(16_000, 100).validate().is_ok());
    }

    #[test]
    fn wav_roundtrip_preserves_samples() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in [0i16, 1000, -1000, i16::MAX, i16::MIN] {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }

        let (buffer, rate) = SampleBuffer::from_wav(cursor.get_ref()).unwrap();
        assert_eq!(rate, 24_000);
        assert_eq!(
            buffer,
            SampleBuffer::I16(vec![0, 1000, -1000, i16::MAX, i16::MIN])
        );
    }

    #[test]
    fn float_wav_is_unsupported() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 24_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            writer.write_sample(0.5f32).unwrap();
            writer.finalize().unwrap();
        }

        let err = SampleBuffer::from_wav(cursor.get_ref()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }
}

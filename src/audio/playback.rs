//! Local audio playback
//!
//! Plays scheduler-timed segments on the default output device. The
//! sink clock is the output stream's own frame counter, so segment
//! start times line up exactly with what the device renders. Used by
//! the one-shot `read` CLI mode, which routes audio through the same
//! framing and receiver scheduling as the websocket stream.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::audio::AudioSettings;
use crate::stream::{Segment, SegmentSink};
use crate::{Error, Result};

/// A segment queued for playback, positioned in output frames
struct Queued {
    start_frame: u64,
    /// Mono samples (interleaved input is downmixed on enqueue)
    samples: Vec<f32>,
}

/// State shared between the receiver-facing handle and the audio
/// callback
struct SinkShared {
    queue: Vec<Queued>,
    /// Output frames rendered so far
    cursor: u64,
    gain: f32,
}

/// Segment sink backed by the local output device clock
#[derive(Clone)]
pub struct ScheduledSink {
    inner: Arc<Mutex<SinkShared>>,
    sample_rate: u32,
}

impl ScheduledSink {
    /// Create an empty sink rendering at `sample_rate`
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkShared {
                queue: Vec::new(),
                cursor: 0,
                gain: 1.0,
            })),
            sample_rate,
        }
    }

    /// Whether every queued segment has finished rendering
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.inner.lock().is_ok_and(|s| s.queue.is_empty())
    }

    /// Render the next output frame and advance the clock
    fn render_frame(shared: &mut SinkShared) -> f32 {
        let cursor = shared.cursor;
        let mut value = 0.0f32;

        shared.queue.retain(|seg| {
            if cursor < seg.start_frame {
                return true;
            }
            #[allow(clippy::cast_possible_truncation)]
            let offset = (cursor - seg.start_frame) as usize;
            match seg.samples.get(offset) {
                Some(sample) => {
                    value += sample;
                    true
                }
                None => false,
            }
        });

        shared.cursor += 1;
        value * shared.gain
    }
}

impl SegmentSink for ScheduledSink {
    fn now(&self) -> f64 {
        self.inner.lock().map_or(0.0, |s| {
            #[allow(clippy::cast_precision_loss)]
            let frames = s.cursor as f64;
            frames / f64::from(self.sample_rate)
        })
    }

    fn play(&mut self, segment: Segment) {
        // Downmix interleaved frames to mono; the output callback fans
        // the value back out to every device channel.
        let channels = usize::from(segment.channels.max(1));
        #[allow(clippy::cast_precision_loss)]
        let samples: Vec<f32> = segment
            .samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect();

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let start_frame = (segment.start * f64::from(self.sample_rate)).round() as u64;

        if let Ok(mut shared) = self.inner.lock() {
            shared.queue.push(Queued {
                start_frame,
                samples,
            });
        }
    }

    fn set_gain(&mut self, gain: f32) {
        if let Ok(mut shared) = self.inner.lock() {
            shared.gain = gain;
        }
    }
}

/// Plays scheduled segments to the default output device
pub struct LocalPlayback {
    #[allow(dead_code)]
    device: Device,
    config: StreamConfig,
}

impl LocalPlayback {
    /// Open the default output device at the configured sample rate
    ///
    /// # Errors
    ///
    /// Returns error if no suitable output device or config exists
    pub fn new(audio: &AudioSettings) -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let rate = SampleRate(audio.sample_rate_hz);
        let supported_config = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| c.channels() == 1 && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate)
            .or_else(|| {
                // Fallback: try stereo
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2 && c.min_sample_rate() <= rate && c.max_sample_rate() >= rate
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported_config.with_sample_rate(rate).config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = audio.sample_rate_hz,
            channels = config.channels,
            "local playback initialized"
        );

        Ok(Self { device, config })
    }

    /// Render the sink's queue until it drains or `limit` elapses
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn run(&self, sink: &ScheduledSink, limit: Duration) -> Result<()> {
        let channels = self.config.channels as usize;
        let shared = Arc::clone(&sink.inner);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut state) = shared.lock() else {
                        data.fill(0.0);
                        return;
                    };
                    for frame in data.chunks_mut(channels) {
                        let sample = ScheduledSink::render_frame(&mut state);
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let start = std::time::Instant::now();
        while !sink.is_idle() {
            if start.elapsed() > limit {
                tracing::warn!("playback timed out before queue drained");
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device flush the final buffer
        std::thread::sleep(Duration::from_millis(100));
        drop(stream);

        tracing::debug!("playback complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::scheduler::MIN_LEAD;

    #[test]
    fn renders_scheduled_segment_at_its_start_frame() {
        let mut sink = ScheduledSink::new(1000);
        sink.play(Segment {
            samples: vec![0.5, 0.5],
            channels: 1,
            sample_rate: 1000,
            start: 0.01,
        });

        let mut rendered = Vec::new();
        {
            let mut shared = sink.inner.lock().unwrap();
            for _ in 0..13 {
                rendered.push(ScheduledSink::render_frame(&mut shared));
            }
        }

        // frames 0..10 are silence, 10 and 11 carry the segment
        assert!(rendered[..10].iter().all(|s| s.abs() < f32::EPSILON));
        assert!((rendered[10] - 0.5).abs() < f32::EPSILON);
        assert!((rendered[11] - 0.5).abs() < f32::EPSILON);
        assert!(rendered[12].abs() < f32::EPSILON);
        assert!(sink.is_idle());
    }

    #[test]
    fn gain_zero_mutes_scheduled_audio() {
        let mut sink = ScheduledSink::new(1000);
        sink.play(Segment {
            samples: vec![1.0; 4],
            channels: 1,
            sample_rate: 1000,
            start: 0.0,
        });
        sink.set_gain(0.0);

        let mut shared = sink.inner.lock().unwrap();
        for _ in 0..4 {
            assert!(ScheduledSink::render_frame(&mut shared).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn clock_advances_with_rendered_frames() {
        let sink = ScheduledSink::new(2000);
        {
            let mut shared = sink.inner.lock().unwrap();
            for _ in 0..1000 {
                ScheduledSink::render_frame(&mut shared);
            }
        }
        assert!((sink.now() - 0.5).abs() < 1e-9);
        assert!(sink.now() < MIN_LEAD + 0.5);
    }

    #[test]
    fn stereo_segments_downmix_to_mono() {
        let mut sink = ScheduledSink::new(1000);
        sink.play(Segment {
            samples: vec![1.0, 0.0, 0.5, 0.5],
            channels: 2,
            sample_rate: 1000,
            start: 0.0,
        });

        let mut shared = sink.inner.lock().unwrap();
        assert!((ScheduledSink::render_frame(&mut shared) - 0.5).abs() < f32::EPSILON);
        assert!((ScheduledSink::render_frame(&mut shared) - 0.5).abs() < f32::EPSILON);
    }
}

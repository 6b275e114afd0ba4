//! Per-connection stream session
//!
//! Drives one "play this audio with these words" operation over the
//! duplex channel: header frame, words frame, then the framed PCM chunks
//! in order. Emission runs on its own task and is cooperatively
//! cancellable — the flag is checked before every chunk send, so a
//! superseding command stops the old stream within one chunk's latency.
//! At most one stream is in flight per session; starting a new one first
//! cancels and awaits the previous task so the channel never interleaves
//! chunks from two streams.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::audio::AudioSettings;
use crate::providers::ResultProvider;
use crate::stream::protocol::{Frame, StreamMessage};

/// Cooperative cancellation flag shared with an in-flight stream task
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Request cancellation; the stream task observes the flag at its
    /// next suspension point and stops sending further chunks.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Sender-side state machine for one websocket connection
pub struct StreamSession {
    tx: mpsc::Sender<Frame>,
    audio: AudioSettings,
    current: Option<(CancelFlag, JoinHandle<()>)>,
}

impl StreamSession {
    /// Create an idle session writing frames into `tx`
    #[must_use]
    pub const fn new(tx: mpsc::Sender<Frame>, audio: AudioSettings) -> Self {
        Self {
            tx,
            audio,
            current: None,
        }
    }

    /// Start streaming the provider's result, superseding any stream
    /// already in flight
    ///
    /// The previous stream (if any) is cancelled and awaited before the
    /// new task is spawned, so its chunks can never appear after the new
    /// stream's header.
    pub async fn begin(&mut self, provider: Arc<dyn ResultProvider>) {
        self.interrupt().await;

        let cancel = CancelFlag::default();
        let handle = tokio::spawn(run_stream(
            self.tx.clone(),
            self.audio,
            provider,
            cancel.clone(),
        ));
        self.current = Some((cancel, handle));
    }

    /// Cancel the in-flight stream, if any, and wait for its task to
    /// finish
    ///
    /// A session that is not streaming is unaffected. Chunks already
    /// handed to the channel are not retracted.
    pub async fn interrupt(&mut self) {
        if let Some((cancel, handle)) = self.current.take() {
            cancel.cancel();
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "stream task panicked");
                }
            }
        }
    }

    /// Wait for the in-flight stream to complete naturally, without
    /// cancelling it
    pub async fn finish(&mut self) {
        if let Some((_, handle)) = self.current.take() {
            if let Err(e) = handle.await {
                if e.is_panic() {
                    tracing::error!(error = %e, "stream task panicked");
                }
            }
        }
    }

    /// Whether a stream task is currently running
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(_, handle)| !handle.is_finished())
    }
}

/// Fetch the provider result and emit header, words, and chunks
///
/// A send failure means the remote disconnected; the remaining sends are
/// abandoned silently and the connection handler observes the closure on
/// its side of the socket.
async fn run_stream(
    tx: mpsc::Sender<Frame>,
    audio: AudioSettings,
    provider: Arc<dyn ResultProvider>,
    cancel: CancelFlag,
) {
    let result = match provider.fetch().await {
        Ok(Some(result)) => result,
        Ok(None) => {
            tracing::debug!("provider produced no result, nothing to stream");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "result provider failed");
            return;
        }
    };

    // A superseding command may have arrived during the fetch.
    if cancel.is_cancelled() {
        return;
    }

    let Ok(header) = serde_json::to_string(&StreamMessage::header(&audio)) else {
        return;
    };
    if tx.send(Frame::Text(header)).await.is_err() {
        return;
    }

    let words = StreamMessage::Words {
        words: result.words,
    };
    let Ok(words) = serde_json::to_string(&words) else {
        return;
    };
    if tx.send(Frame::Text(words)).await.is_err() {
        return;
    }

    let pcm = result.samples.into_linear16_bytes();
    let mut sent = 0usize;
    for chunk in audio.frame(&pcm) {
        if cancel.is_cancelled() {
            tracing::debug!(sent, "stream cancelled mid-emission");
            return;
        }
        if tx.send(Frame::Binary(chunk.to_vec())).await.is_err() {
            tracing::debug!(sent, "channel closed mid-stream, abandoning");
            return;
        }
        sent += 1;
    }

    tracing::debug!(sent, bytes = pcm.len(), "stream complete");
}

//! Stream session integration tests
//!
//! Exercises the sender side end to end over an in-memory frame channel:
//! emission order, cancellation, supersession, and disconnect handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use lector_gateway::StreamSession;
use lector_gateway::audio::{AudioSettings, MIN_LEAD, SampleBuffer};
use lector_gateway::stream::{Frame, StreamMessage, StreamReceiver};

mod common;
use common::{EmptyProvider, FixedProvider, GatedProvider, TestSink, drain_frames, ramp};

fn settings() -> AudioSettings {
    AudioSettings {
        sample_rate_hz: 16_000,
        channels: 1,
        chunk_ms: 100,
    }
}

fn parse_text(frame: &Frame) -> StreamMessage {
    match frame {
        Frame::Text(text) => serde_json::from_str(text).expect("valid stream message"),
        other => panic!("expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn stream_emits_header_words_then_ordered_chunks() {
    let audio = settings();
    let (tx, rx) = mpsc::channel(256);
    let mut session = StreamSession::new(tx.clone(), audio);

    // 48000 bytes at 16 kHz / 100 ms -> exactly 15 chunks of 3200 bytes
    let samples = ramp(24_000);
    session
        .begin(Arc::new(FixedProvider::new(samples.clone(), &["hello", "from", "ocr"])))
        .await;
    session.finish().await;
    drop(session);
    drop(tx);

    let frames = drain_frames(rx).await;
    assert_eq!(frames.len(), 17);

    match parse_text(&frames[0]) {
        StreamMessage::Header {
            format,
            sample_rate,
            channels,
            chunk_ms,
        } => {
            assert_eq!(format, "LINEAR16");
            assert_eq!(sample_rate, 16_000);
            assert_eq!(channels, 1);
            assert_eq!(chunk_ms, 100);
        }
        other => panic!("expected header first, got {other:?}"),
    }

    match parse_text(&frames[1]) {
        StreamMessage::Words { words } => assert_eq!(words, ["hello", "from", "ocr"]),
        other => panic!("expected words second, got {other:?}"),
    }

    let mut rejoined = Vec::new();
    for frame in &frames[2..] {
        match frame {
            Frame::Binary(chunk) => {
                assert_eq!(chunk.len(), 3200);
                rejoined.extend_from_slice(chunk);
            }
            other => panic!("expected binary chunk, got {other:?}"),
        }
    }
    assert_eq!(rejoined, SampleBuffer::I16(samples).into_linear16_bytes());
}

#[tokio::test]
async fn empty_buffer_streams_header_and_words_only() {
    let (tx, rx) = mpsc::channel(16);
    let mut session = StreamSession::new(tx.clone(), settings());

    session
        .begin(Arc::new(FixedProvider::new(Vec::new(), &["quiet"])))
        .await;
    session.finish().await;
    drop(session);
    drop(tx);

    let frames = drain_frames(rx).await;
    assert_eq!(frames.len(), 2);
    assert!(matches!(parse_text(&frames[0]), StreamMessage::Header { .. }));
    assert!(matches!(parse_text(&frames[1]), StreamMessage::Words { .. }));
}

#[tokio::test]
async fn provider_without_result_sends_no_frames() {
    let (tx, rx) = mpsc::channel(16);
    let mut session = StreamSession::new(tx.clone(), settings());

    session.begin(Arc::new(EmptyProvider)).await;
    session.finish().await;
    assert!(!session.is_streaming());

    // the session stays usable for the next command
    session
        .begin(Arc::new(FixedProvider::new(ramp(1600), &["next"])))
        .await;
    session.finish().await;
    drop(session);
    drop(tx);

    let frames = drain_frames(rx).await;
    assert_eq!(frames.len(), 3); // header + words + one chunk, nothing before
}

#[tokio::test]
async fn superseding_command_preempts_in_flight_stream() {
    let audio = settings();
    let (tx, rx) = mpsc::channel(256);
    let mut session = StreamSession::new(tx.clone(), audio);

    // First stream: provider still fetching when the second command lands
    let (gated, gate) = GatedProvider::new(vec![0x1111; 4800], &["old"]);
    session.begin(Arc::new(gated)).await;

    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();
    });

    session
        .begin(Arc::new(FixedProvider::new(vec![0x2222; 1600], &["new"])))
        .await;
    release.await.unwrap();
    session.finish().await;
    drop(session);
    drop(tx);

    let frames = drain_frames(rx).await;

    let headers = frames
        .iter()
        .filter(|f| matches!(f, Frame::Text(t) if t.contains("\"header\"")))
        .count();
    assert_eq!(headers, 1, "only the superseding stream may emit a header");

    match parse_text(&frames[1]) {
        StreamMessage::Words { words } => assert_eq!(words, ["new"]),
        other => panic!("expected words, got {other:?}"),
    }

    // No byte of the old stream's buffer may appear after the new header
    for frame in &frames {
        if let Frame::Binary(chunk) = frame {
            assert!(chunk.iter().all(|&b| b == 0x22));
        }
    }
}

#[tokio::test]
async fn stop_cancels_stream_then_closes_channel() {
    let audio = settings();
    let (tx, rx) = mpsc::channel(256);
    let mut session = StreamSession::new(tx.clone(), audio);

    let (gated, gate) = GatedProvider::new(ramp(48_000), &["interrupted"]);
    session.begin(Arc::new(gated)).await;

    let release = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();
    });

    // The dispatcher's stop path: cancel, then close from the server side
    session.interrupt().await;
    tx.send(Frame::Close).await.unwrap();
    release.await.unwrap();
    drop(session);
    drop(tx);

    let frames = drain_frames(rx).await;
    assert!(
        !frames.iter().any(|f| matches!(f, Frame::Binary(_))),
        "no binary frames may follow a stop"
    );
    assert_eq!(frames.last(), Some(&Frame::Close));
}

#[tokio::test]
async fn streamed_frames_replay_gaplessly_on_the_receiver() {
    let audio = settings();
    let (tx, rx) = mpsc::channel(256);
    let mut session = StreamSession::new(tx.clone(), audio);

    let samples = ramp(4800); // three 100 ms chunks
    session
        .begin(Arc::new(FixedProvider::new(samples, &["three", "chunks"])))
        .await;
    session.finish().await;
    drop(session);
    drop(tx);

    // Feed the wire sequence straight into the receiver state machine
    let mut receiver = StreamReceiver::new(TestSink::default());
    for frame in drain_frames(rx).await {
        match frame {
            Frame::Text(text) => receiver.on_message(serde_json::from_str(&text).unwrap()),
            Frame::Binary(chunk) => receiver.on_chunk(&chunk),
            Frame::Close => {}
        }
    }

    assert_eq!(receiver.transcript(), ["three", "chunks"]);

    let starts: Vec<f64> = receiver.sink().segments.iter().map(|s| s.start).collect();
    assert_eq!(starts.len(), 3);
    assert!((starts[0] - MIN_LEAD).abs() < 1e-9);
    assert!((starts[1] - (starts[0] + 0.1)).abs() < 1e-9);
    assert!((starts[2] - (starts[1] + 0.1)).abs() < 1e-9);
}

#[tokio::test]
async fn remote_disconnect_abandons_remaining_sends() {
    let audio = settings();
    let (tx, mut rx) = mpsc::channel(4);
    let mut session = StreamSession::new(tx.clone(), audio);

    // 100 chunks, far more than the channel will accept
    session
        .begin(Arc::new(FixedProvider::new(ramp(160_000), &["long"])))
        .await;

    let mut seen = 0;
    while seen < 5 {
        assert!(rx.recv().await.is_some());
        seen += 1;
    }
    drop(rx); // remote hung up

    session.finish().await;
    assert!(!session.is_streaming());
}

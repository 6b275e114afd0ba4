//! WebSocket handler for real-time audio streaming
//!
//! One connection per browser session. Inbound text frames carry button
//! commands; outbound frames carry the stream header, the transcript
//! words, and the binary PCM chunks. Any new command preempts the
//! in-flight stream before anything else is sent, so the wire never
//! interleaves two streams.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use super::ApiState;
use crate::stream::{Frame, StreamSession, WsCommand};

/// Build the websocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/ws", get(ws_upgrade)).with_state(state)
}

/// Handle the websocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one websocket connection until stop or disconnect
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let session_id = uuid::Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    tracing::info!(%session_id, "websocket connected");

    // Frames from the stream task funnel through one writer task so the
    // socket has a single owner.
    let (tx, mut rx) = mpsc::channel::<Frame>(32);
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let msg = match frame {
                Frame::Text(text) => Message::Text(text.into()),
                Frame::Binary(data) => Message::Binary(data.into()),
                Frame::Close => {
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            };
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut session = StreamSession::new(tx.clone(), state.audio);

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<WsCommand>(&text) {
                Ok(WsCommand::Button1) => {
                    tracing::info!(%session_id, "button1: read aloud");
                    session.begin(Arc::clone(&state.read_aloud)).await;
                }
                Ok(WsCommand::Button2) => {
                    tracing::info!(%session_id, "button2: repeat");
                    session.begin(Arc::clone(&state.repeat)).await;
                }
                Ok(WsCommand::Stop) => {
                    tracing::info!(%session_id, "stop requested");
                    session.interrupt().await;
                    let _ = tx.send(Frame::Close).await;
                    break;
                }
                Err(e) => {
                    // Unknown or malformed commands keep the connection open
                    tracing::debug!(%session_id, error = %e, "ignoring unrecognized message");
                }
            },
            Message::Close(_) => {
                tracing::info!(%session_id, "websocket closed by client");
                break;
            }
            _ => {}
        }
    }

    // Disconnect and stop take the same teardown path: cancel the
    // in-flight stream, then let the writer drain.
    session.interrupt().await;
    drop(session);
    drop(tx);
    let _ = send_task.await;

    tracing::info!(%session_id, "websocket disconnected");
}

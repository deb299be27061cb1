//! Per-connection WebSocket loop.
//!
//! One task per connection; messages from a session are processed strictly
//! in arrival order, so smoothing, classification, and voting stay
//! sequential and deterministic. Sessions are independent: the only shared
//! resource is the registry map itself.

use crate::protocol::{round_confidence, ClientMessage, ServerMessage};
use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use signstream_core::{FrameOutcome, RawFrame, Refined, Session};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::{error, info};

pub async fn handle_socket(mut socket: WebSocket, client_id: Option<String>, state: AppState) {
    let server_assigned = client_id.is_none();
    let (session_id, session) = state.registry.get_or_create(client_id.as_deref());
    info!("Client connected: {session_id}");

    while let Some(Ok(msg)) = socket.recv().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let parsed: ClientMessage = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!("Invalid JSON received: {e}");
                continue;
            }
        };

        if let Some(reply) = dispatch(parsed, &session, &state).await {
            if socket.send(Message::Text(reply.to_json())).await.is_err() {
                break;
            }
        }
    }

    // An anonymous session cannot be re-attached, so it goes with the
    // connection; a client-supplied id stays until the TTL sweep.
    if server_assigned {
        state.registry.remove(&session_id);
    }
    info!("Client disconnected: {session_id}");
}

async fn dispatch(
    msg: ClientMessage,
    session: &Arc<Mutex<Session>>,
    state: &AppState,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Landmarks {
            data,
            landmarks,
            face,
            shoulders,
        } => {
            let points = data.or(landmarks)?;
            let raw = RawFrame {
                hand: points,
                face,
                shoulders: shoulders.and_then(|s| match s.as_slice() {
                    [left, right, ..] => Some([*left, *right]),
                    _ => None,
                }),
            };

            let outcome = session
                .lock()
                .await
                .process_frame(&raw, now_secs(), &state.classifier);

            match outcome {
                FrameOutcome::Stable { sign, sentence, .. } => Some(ServerMessage::Prediction {
                    gesture: Some(sign.label.to_string()),
                    confidence: round_confidence(sign.confidence),
                    sentence,
                    timestamp: now_rfc3339(),
                }),
                FrameOutcome::Pending => None,
                FrameOutcome::Invalid { notify } => notify.then(|| ServerMessage::Error {
                    message: "repeated invalid landmark frames".to_string(),
                }),
            }
        }

        ClientMessage::RefineSentence { words } => {
            let words = {
                let mut guard = session.lock().await;
                guard.touch();
                words.unwrap_or_else(|| guard.words())
            };
            // The lock is released before the provider chain runs; a slow
            // provider stalls only this connection's loop, bounded by the
            // per-attempt timeout.
            match state.refiner.refine(&words).await {
                Refined::Nothing => Some(ServerMessage::Error {
                    message: "nothing to refine".to_string(),
                }),
                Refined::Text {
                    original, refined, ..
                } => Some(ServerMessage::RefinedSentence {
                    original,
                    refined,
                    timestamp: now_rfc3339(),
                }),
            }
        }

        ClientMessage::Clear => {
            session.lock().await.clear();
            Some(ServerMessage::Cleared {
                timestamp: now_rfc3339(),
            })
        }

        // Legacy envelope: a missing action means clear; anything else is
        // ignored.
        ClientMessage::Command { action } => match action.as_deref() {
            Some("clear") | None => {
                session.lock().await.clear();
                Some(ServerMessage::Cleared {
                    timestamp: now_rfc3339(),
                })
            }
            Some(_) => None,
        },
    }
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

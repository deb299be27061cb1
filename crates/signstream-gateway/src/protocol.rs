//! JSON message protocol for the WebSocket interface.
//!
//! Inbound and outbound messages are closed sets keyed by `type`, so the
//! dispatch match is exhaustiveness-checked instead of stringly-typed.

use serde::{Deserialize, Serialize};
use signstream_core::{FaceAnchors, Point3};

/// Messages a client may send.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One landmark frame. The point array may arrive under `data` or
    /// `landmarks`; face and shoulder anchors are optional.
    Landmarks {
        #[serde(default)]
        data: Option<Vec<Point3>>,
        #[serde(default)]
        landmarks: Option<Vec<Point3>>,
        #[serde(default)]
        face: Option<FaceAnchors>,
        #[serde(default)]
        shoulders: Option<Vec<Point3>>,
    },
    /// Rewrite the word list into fluent text. Without `words`, the
    /// session's current word list is used.
    RefineSentence {
        #[serde(default)]
        words: Option<Vec<String>>,
    },
    /// Reset the session's word list and vote window.
    Clear,
    /// Legacy command envelope; a missing action defaults to `clear`.
    Command {
        #[serde(default)]
        action: Option<String>,
    },
}

/// Messages the server emits.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Prediction {
        gesture: Option<String>,
        confidence: f64,
        sentence: String,
        timestamp: String,
    },
    RefinedSentence {
        original: String,
        refined: String,
        timestamp: String,
    },
    Cleared {
        timestamp: String,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","message":"serialization failure"}"#.to_string()
        })
    }
}

/// Outbound confidence values are rounded to two decimals.
pub fn round_confidence(confidence: f32) -> f64 {
    (confidence as f64 * 100.0).round() / 100.0
}

//! Wire frames for streamed answers and generator output.

use serde::{Deserialize, Serialize};

/// One incremental push frame. The terminal frame has `done = true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatFrame {
    pub response: String,
    pub done: bool,
}

impl ChatFrame {
    pub fn chunk(text: impl Into<String>) -> Self {
        Self {
            response: text.into(),
            done: false,
        }
    }

    pub fn finished() -> Self {
        Self {
            response: String::new(),
            done: true,
        }
    }
}

/// Terminal error frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorFrame {
    pub error: String,
}

/// First frame of a push stream, naming the stream so the caller can poll it later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOpened {
    pub session_id: String,
    pub status: String,
}

/// Response of the poll endpoint.
///
/// `content` is the increment since the previous poll, not the cumulative text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollResponse {
    pub content: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One fragment produced by the upstream text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationChunk {
    pub text: String,
    pub is_final: bool,
}

impl GenerationChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn last(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Point-in-time counters for one broadcast stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamStats {
    pub subscribers: usize,
    pub accumulated_bytes: usize,
    /// Chunks skipped for a subscriber whose buffer was full.
    pub dropped_chunks: u64,
    pub done: bool,
}

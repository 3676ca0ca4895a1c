//! Chat turn orchestration.
//!
//! - `service`: `ChatService`, one turn from message to streamed reply
//! - `history`: per-session conversation log
//! - `prompt`: prompt assembly for open-ended generation

pub mod history;
pub mod prompt;
pub mod service;

pub use history::ConversationLog;
pub use service::{ChatService, ChatSettings, TurnHandle};

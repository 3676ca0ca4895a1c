//! Slot-filling dialogs.
//!
//! - `slot`: `SlotFillingDialog`, the per-action state machine
//! - `prompts`: fixed follow-up questions
//! - `store`: `DialogStore`, one dialog per session

pub mod prompts;
pub mod slot;
pub mod store;

pub use slot::{DialogState, SlotFillingDialog};
pub use store::DialogStore;

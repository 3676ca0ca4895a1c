//! Streamed answers.
//!
//! - `broadcast`: `BroadcastStream`, one producer fanned out to bounded subscribers
//! - `registry`: `StreamRegistry`, owner-checked lookup and reaping
//! - `generator`: the `TextGenerator` seam
//! - `pump`: drives a generator or a canned reply into a stream

pub mod broadcast;
pub mod generator;
pub mod pump;
pub mod registry;

pub use broadcast::{BroadcastStream, StreamChunk, Subscription};
pub use generator::{GenerationStream, TextGenerator};
pub use pump::{PumpSettings, pump_generation, replay_text};
pub use registry::StreamRegistry;

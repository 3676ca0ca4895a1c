//! The upstream text generator seam.
//!
//! The generator is an opaque producer of text fragments. Implementations
//! live in bankchat-infra (e.g., `OllamaGenerator`).

use std::pin::Pin;

use bankchat_types::error::GenerationError;
use bankchat_types::stream::GenerationChunk;
use futures_util::Stream;

/// Boxed fragment stream returned by a generator.
pub type GenerationStream =
    Pin<Box<dyn Stream<Item = Result<GenerationChunk, GenerationError>> + Send + 'static>>;

/// Produces text for a prompt as a sequence of fragments.
///
/// Consumers read until a fragment with `is_final` arrives or the stream
/// ends. The method is synchronous and returns a boxed stream so the trait
/// stays object-safe behind `Arc<dyn TextGenerator>`.
pub trait TextGenerator: Send + Sync {
    /// Human-readable backend name (e.g., "ollama").
    fn name(&self) -> &str;

    fn generate(&self, prompt: String) -> GenerationStream;
}

//! Upstream text generator implementations.
//!
//! Concrete implementations of the [`TextGenerator`] seam defined in
//! `bankchat-core`. [`create_generator`] builds the configured backend.
//!
//! [`TextGenerator`]: bankchat_core::stream::TextGenerator

pub mod ollama;

use std::sync::Arc;

use bankchat_core::stream::TextGenerator;
use bankchat_types::config::GeneratorConfig;
use bankchat_types::error::GenerationError;

use self::ollama::OllamaGenerator;

/// Build the generator described by `config`.
///
/// # Errors
///
/// Returns [`GenerationError::Connect`] if the HTTP client cannot be built.
pub fn create_generator(config: &GeneratorConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    let generator = OllamaGenerator::new(config)?;
    tracing::info!(url = %config.url, model = %config.model, "text generator configured");
    Ok(Arc::new(generator))
}

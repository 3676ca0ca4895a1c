//! Feeding text into a [`BroadcastStream`].
//!
//! Generation is a two-stage pipeline: a reader pulls fragments from the
//! upstream generator and hands them to an internal bounded channel with
//! `send_timeout`; an appender drains that channel into the stream. A
//! fragment that cannot be handed over in time is dropped so the reader
//! keeps up with the network.

use std::time::Duration;

use bankchat_types::config::StreamConfig;
use bankchat_types::error::GenerationError;
use bankchat_types::stream::GenerationChunk;
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;

use super::broadcast::BroadcastStream;
use super::generator::{GenerationStream, TextGenerator};

/// Tuning for [`pump_generation`].
#[derive(Debug, Clone)]
pub struct PumpSettings {
    pub buffer: usize,
    pub send_timeout: Duration,
    pub max_duration: Duration,
}

impl From<&StreamConfig> for PumpSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            buffer: config.generation_buffer,
            send_timeout: config.chunk_send_timeout(),
            max_duration: config.max_generation(),
        }
    }
}

impl Default for PumpSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

/// Run `generator` on `prompt` and feed the output into `stream`.
///
/// The stream is closed on success and failed with the error text
/// otherwise, so subscribers always observe a terminal state.
pub async fn pump_generation(
    generator: &dyn TextGenerator,
    prompt: String,
    stream: &BroadcastStream,
    settings: &PumpSettings,
) -> Result<(), GenerationError> {
    let (tx, mut rx) = mpsc::channel::<String>(settings.buffer.max(1));
    let upstream = generator.generate(prompt);

    let reader = read_upstream(upstream, tx, settings.send_timeout);
    let appender = async {
        while let Some(text) = rx.recv().await {
            stream.append(&text);
        }
    };
    let run = async {
        let (result, ()) = tokio::join!(reader, appender);
        result
    };

    let result = match tokio::time::timeout(settings.max_duration, run).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout(settings.max_duration.as_secs())),
    };

    match &result {
        Ok(()) => {
            stream.mark_done();
        }
        Err(e) => {
            tracing::warn!(stream_id = %stream.id(), generator = generator.name(), error = %e, "generation failed");
            stream.fail(e.to_string());
        }
    }
    result
}

async fn read_upstream(
    mut upstream: GenerationStream,
    tx: mpsc::Sender<String>,
    send_timeout: Duration,
) -> Result<(), GenerationError> {
    while let Some(item) = upstream.next().await {
        let GenerationChunk { text, is_final } = item?;
        if !text.is_empty() {
            match tx.send_timeout(text, send_timeout).await {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(dropped)) => {
                    tracing::debug!(bytes = dropped.len(), "generation fragment dropped after send timeout");
                }
                Err(SendTimeoutError::Closed(_)) => return Ok(()),
            }
        }
        if is_final {
            return Ok(());
        }
    }
    Ok(())
}

/// Stream a finished reply word by word, then close the stream.
pub async fn replay_text(text: &str, stream: &BroadcastStream, delay: Duration) {
    for word in text.split_inclusive(' ') {
        if !stream.append(word) {
            return;
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    stream.mark_done();
}

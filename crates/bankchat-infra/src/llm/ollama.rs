//! Ollama `/api/generate` streaming client.
//!
//! The endpoint answers a `stream: true` request with newline-delimited JSON,
//! one object per line:
//!
//! ```text
//! {"model":"llama3","response":"Hello","done":false}
//! {"model":"llama3","response":"","done":true,"done_reason":"stop"}
//! ```
//!
//! Lines may be split across HTTP body chunks, so the body is read into a
//! byte buffer and only complete lines are decoded. Malformed lines are
//! skipped. An `{"error": ...}` line ends the stream with a server error.

use std::time::Duration;

use futures_util::StreamExt;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use bankchat_core::stream::{GenerationStream, TextGenerator};
use bankchat_types::config::GeneratorConfig;
use bankchat_types::error::GenerationError;
use bankchat_types::stream::GenerationChunk;

/// Stop sequences that keep the model from writing the next human turn.
const STOP_SEQUENCES: [&str; 2] = ["Human:", "User:"];

#[derive(Debug, Clone, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Clone, Serialize)]
struct GenerateOptions {
    temperature: f64,
    top_p: f64,
    top_k: u32,
    repeat_penalty: f64,
    stop: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Streaming client for an Ollama-compatible server.
///
/// Does NOT derive Debug so the optional API key cannot end up in logs.
pub struct OllamaGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    options: GenerateOptions,
    api_key: Option<SecretString>,
    timeout_secs: u64,
}

impl OllamaGenerator {
    pub fn new(config: &GeneratorConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Connect(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            model: config.model.clone(),
            options: GenerateOptions {
                temperature: config.temperature,
                top_p: config.top_p,
                top_k: config.top_k,
                repeat_penalty: config.repeat_penalty,
                stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            },
            api_key: config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(|k| SecretString::from(k.to_string())),
            timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, prompt: String) -> GenerateRequest {
        GenerateRequest {
            model: self.model.clone(),
            prompt,
            stream: true,
            options: self.options.clone(),
        }
    }
}

impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    fn generate(&self, prompt: String) -> GenerationStream {
        let client = self.client.clone();
        let url = self.url.clone();
        let model = self.model.clone();
        let bearer = self.api_key.as_ref().map(|k| k.expose_secret().to_string());
        let timeout_secs = self.timeout_secs;
        let body = self.request_body(prompt);

        Box::pin(async_stream::try_stream! {
            tracing::debug!(url = %url, model = %model, prompt_len = body.prompt.len(), "generate request");

            let mut request = client
                .post(&url)
                .header(reqwest::header::ACCEPT, "application/json")
                .json(&body);
            if let Some(token) = &bearer {
                request = request.bearer_auth(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(e, timeout_secs))?;
            let response = check_status(response, &model).await?;

            let mut byte_stream = response.bytes_stream();
            let mut buffer: Vec<u8> = Vec::new();
            let mut finished = false;

            'read: while let Some(bytes) = byte_stream.next().await {
                let bytes = bytes.map_err(|e| transport_error(e, timeout_secs))?;
                buffer.extend_from_slice(&bytes);

                while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline).collect();
                    if let Some(chunk) = parse_ndjson_line(&line)? {
                        finished = chunk.is_final;
                        yield chunk;
                        if finished {
                            break 'read;
                        }
                    }
                }
            }

            // The last line may arrive without a trailing newline.
            if !finished {
                if let Some(chunk) = parse_ndjson_line(&buffer)? {
                    yield chunk;
                }
            }
        })
    }
}

async fn check_status(response: reqwest::Response, model: &str) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "generator error response");
    Err(status_error(status, model, body))
}

fn status_error(status: StatusCode, model: &str, body: String) -> GenerationError {
    match status {
        StatusCode::NOT_FOUND => GenerationError::ModelNotFound(model.to_string()),
        StatusCode::INTERNAL_SERVER_ERROR => GenerationError::Server(body),
        _ => GenerationError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

fn transport_error(err: reqwest::Error, timeout_secs: u64) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout_secs)
    } else if err.is_connect() {
        GenerationError::Connect(err.to_string())
    } else if err.is_body() || err.is_decode() {
        GenerationError::Decode(format!("response body read: {err}"))
    } else {
        GenerationError::Connect(format!("network error: {err}"))
    }
}

/// Decode one NDJSON line into a fragment.
///
/// Blank and malformed lines yield `Ok(None)`. A line carrying an `error`
/// field fails the stream.
pub fn parse_ndjson_line(line: &[u8]) -> Result<Option<GenerationChunk>, GenerationError> {
    let line = line.trim_ascii();
    if line.is_empty() {
        return Ok(None);
    }
    let parsed: GenerateLine = match serde_json::from_slice(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "skipping malformed generator line");
            return Ok(None);
        }
    };
    if let Some(error) = parsed.error {
        return Err(GenerationError::Server(error));
    }

    let text = clean_fragment(&parsed.response);
    if text.is_empty() && !parsed.done {
        return Ok(None);
    }
    Ok(Some(GenerationChunk {
        text,
        is_final: parsed.done,
    }))
}

/// Strip control characters, keeping newlines and tabs.
pub fn clean_fragment(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

//! Configuration types for BankChat.
//!
//! `BankChatConfig` represents the top-level `config.toml`. Every section
//! and field has a default, so an empty file is a valid configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankChatConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default)]
    pub streams: StreamConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
    #[serde(default)]
    pub intent: IntentConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Token session lifetime and capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed lifetime from creation (no sliding renewal).
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    /// Upper bound on concurrently live sessions.
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

fn default_session_ttl_secs() -> u64 {
    24 * 60 * 60
}

fn default_max_active() -> usize {
    10_000
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            max_active: default_max_active(),
        }
    }
}

/// Broadcast stream lifetime and buffering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_ttl_secs")]
    pub ttl_secs: u64,
    /// How long a finished stream stays pollable after its last activity.
    #[serde(default = "default_idle_grace_secs")]
    pub idle_grace_secs: u64,
    #[serde(default = "default_subscriber_capacity")]
    pub subscriber_capacity: usize,
    /// Capacity of the channel between the generator reader and the stream.
    #[serde(default = "default_generation_buffer")]
    pub generation_buffer: usize,
    #[serde(default = "default_chunk_send_timeout_ms")]
    pub chunk_send_timeout_ms: u64,
    #[serde(default = "default_max_generation_secs")]
    pub max_generation_secs: u64,
    /// Pause between words when streaming an agent reply.
    #[serde(default = "default_reply_chunk_delay_ms")]
    pub reply_chunk_delay_ms: u64,
}

fn default_stream_ttl_secs() -> u64 {
    30 * 60
}

fn default_idle_grace_secs() -> u64 {
    5 * 60
}

fn default_subscriber_capacity() -> usize {
    64
}

fn default_generation_buffer() -> usize {
    256
}

fn default_chunk_send_timeout_ms() -> u64 {
    2_000
}

fn default_max_generation_secs() -> u64 {
    120
}

fn default_reply_chunk_delay_ms() -> u64 {
    15
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_stream_ttl_secs(),
            idle_grace_secs: default_idle_grace_secs(),
            subscriber_capacity: default_subscriber_capacity(),
            generation_buffer: default_generation_buffer(),
            chunk_send_timeout_ms: default_chunk_send_timeout_ms(),
            max_generation_secs: default_max_generation_secs(),
            reply_chunk_delay_ms: default_reply_chunk_delay_ms(),
        }
    }
}

impl StreamConfig {
    pub fn chunk_send_timeout(&self) -> Duration {
        Duration::from_millis(self.chunk_send_timeout_ms)
    }

    pub fn max_generation(&self) -> Duration {
        Duration::from_secs(self.max_generation_secs)
    }

    pub fn reply_chunk_delay(&self) -> Duration {
        Duration::from_millis(self.reply_chunk_delay_ms)
    }
}

/// Background sweep intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaperConfig {
    #[serde(default = "default_reap_interval_secs")]
    pub session_interval_secs: u64,
    #[serde(default = "default_reap_interval_secs")]
    pub stream_interval_secs: u64,
}

fn default_reap_interval_secs() -> u64 {
    120
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            session_interval_secs: default_reap_interval_secs(),
            stream_interval_secs: default_reap_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Minimum confidence for direct agent execution.
    #[serde(default = "default_execution_threshold")]
    pub execution_threshold: f64,
}

fn default_execution_threshold() -> f64 {
    0.7
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            execution_threshold: default_execution_threshold(),
        }
    }
}

/// Upstream text generator (Ollama-compatible `/api/generate`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_generator_url")]
    pub url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Optional bearer key for hosted endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_generator_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "llama3".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_p() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_repeat_penalty() -> f64 {
    1.1
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            url: default_generator_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            repeat_penalty: default_repeat_penalty(),
            request_timeout_secs: default_request_timeout_secs(),
            api_key: None,
        }
    }
}

/// Per-session conversation memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Turns retained per session; older turns are discarded.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Recent turns included in a generation prompt.
    #[serde(default = "default_prompt_history")]
    pub prompt_history: usize,
}

fn default_max_turns() -> usize {
    50
}

fn default_prompt_history() -> usize {
    6
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            prompt_history: default_prompt_history(),
        }
    }
}

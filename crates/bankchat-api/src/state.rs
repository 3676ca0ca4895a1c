//! Application state wiring all services together.
//!
//! AppState holds the shared stores and the chat service used by the REST
//! API handlers and the background reapers. It is cheap to clone.

use std::sync::Arc;

use bankchat_core::agent::AgentDispatcher;
use bankchat_core::banking::BankingStores;
use bankchat_core::chat::{ChatService, ChatSettings};
use bankchat_core::intent::IntentRouter;
use bankchat_core::reaper::ReapLoop;
use bankchat_core::session::TokenSessionStore;
use bankchat_core::stream::{StreamRegistry, TextGenerator};
use bankchat_infra::llm::create_generator;
use bankchat_infra::memory::seeded_stores;
use bankchat_types::config::BankChatConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BankChatConfig>,
    pub sessions: Arc<TokenSessionStore>,
    pub chat: ChatService,
    pub stores: BankingStores,
}

impl AppState {
    /// Wire the state from configuration, with the configured generator
    /// and demo-seeded in-memory stores.
    pub fn init(config: BankChatConfig) -> anyhow::Result<Self> {
        let generator = create_generator(&config.generator)?;
        Self::with_parts(config, generator, seeded_stores())
    }

    /// Wire the state around an explicit generator and store set.
    pub fn with_parts(
        config: BankChatConfig,
        generator: Arc<dyn TextGenerator>,
        stores: BankingStores,
    ) -> anyhow::Result<Self> {
        let sessions = Arc::new(TokenSessionStore::new(
            chrono::Duration::seconds(config.sessions.ttl_secs as i64),
            config.sessions.max_active,
        ));
        let chat = ChatService::new(
            Arc::new(IntentRouter::banking()?),
            Arc::new(AgentDispatcher::banking(stores.clone())),
            generator,
            Arc::new(StreamRegistry::from_config(&config.streams)),
            ChatSettings::from_config(&config),
        );

        Ok(Self {
            config: Arc::new(config),
            sessions,
            chat,
            stores,
        })
    }

    /// The session and stream reapers for this state.
    pub fn reaper(&self) -> ReapLoop {
        ReapLoop::new(self.sessions.clone(), &self.chat, &self.config.reaper)
    }
}

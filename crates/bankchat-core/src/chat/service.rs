//! One chat turn, from inbound message to a closed broadcast stream.
//!
//! A turn goes through, in order:
//! 1. an active dialog for the session, which consumes the message as
//!    answers to its missing parameters;
//! 2. the intent router, dispatching to an agent when the confidence clears
//!    the execution threshold;
//! 3. open-ended generation for everything else.
//!
//! Agent and dialog replies are replayed word by word into the stream so
//! every turn reaches the caller the same way.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use bankchat_types::chat::ConversationTurn;
use bankchat_types::config::BankChatConfig;
use bankchat_types::error::ChatError;
use bankchat_types::session::Session;
use futures_util::FutureExt;

use crate::agent::{AgentContext, AgentDispatcher, BankingAgent};
use crate::dialog::{DialogStore, SlotFillingDialog, prompts};
use crate::intent::IntentRouter;
use crate::stream::{
    BroadcastStream, PumpSettings, StreamRegistry, Subscription, TextGenerator, pump_generation,
    replay_text,
};

use super::history::ConversationLog;
use super::prompt::build_prompt;

/// Words that abandon an active dialog.
const CANCEL_WORDS: &[&str] = &["cancel", "stop", "abort", "never mind", "nevermind", "forget it"];

/// Longest answer accepted as a free-text slot value.
const MAX_FREE_TEXT: usize = 100;

/// Tuning for [`ChatService`].
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub execution_threshold: f64,
    pub prompt_history: usize,
    pub max_turns: usize,
    pub reply_delay: Duration,
    pub pump: PumpSettings,
}

impl ChatSettings {
    pub fn from_config(config: &BankChatConfig) -> Self {
        Self {
            execution_threshold: config.intent.execution_threshold,
            prompt_history: config.conversation.prompt_history,
            max_turns: config.conversation.max_turns,
            reply_delay: config.streams.reply_chunk_delay(),
            pump: PumpSettings::from(&config.streams),
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self::from_config(&BankChatConfig::default())
    }
}

/// A started turn: the stream being produced and a subscription taken
/// before production began.
#[derive(Debug)]
pub struct TurnHandle {
    pub stream: BroadcastStream,
    pub subscription: Subscription,
}

/// What a turn resolved to before any streaming happens.
enum TurnPlan {
    Reply { text: String, intent: Option<String> },
    Generate { prompt: String, intent: Option<String> },
}

#[derive(Debug, Clone)]
struct Turn {
    session_id: String,
    user_id: String,
    message: String,
}

/// Orchestrates chat turns. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct ChatService {
    router: Arc<IntentRouter>,
    dispatcher: Arc<AgentDispatcher>,
    generator: Arc<dyn TextGenerator>,
    streams: Arc<StreamRegistry>,
    dialogs: Arc<DialogStore>,
    history: Arc<ConversationLog>,
    settings: ChatSettings,
}

impl ChatService {
    pub fn new(
        router: Arc<IntentRouter>,
        dispatcher: Arc<AgentDispatcher>,
        generator: Arc<dyn TextGenerator>,
        streams: Arc<StreamRegistry>,
        settings: ChatSettings,
    ) -> Self {
        Self {
            router,
            dispatcher,
            generator,
            streams,
            dialogs: Arc::new(DialogStore::new()),
            history: Arc::new(ConversationLog::new(settings.max_turns)),
            settings,
        }
    }

    pub fn streams(&self) -> &Arc<StreamRegistry> {
        &self.streams
    }

    pub fn dialogs(&self) -> &Arc<DialogStore> {
        &self.dialogs
    }

    pub fn history(&self) -> &Arc<ConversationLog> {
        &self.history
    }

    pub fn dispatcher(&self) -> &Arc<AgentDispatcher> {
        &self.dispatcher
    }

    /// Start a turn for `session` and return immediately.
    ///
    /// The reply is produced on a spawned task. The returned subscription
    /// was registered before that task started, so it sees every chunk.
    /// A panic inside the turn fails the stream instead of leaving it open.
    pub fn begin_turn(&self, session: &Session, message: &str) -> Result<TurnHandle, ChatError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::ValidationFailed {
                missing: vec!["message".to_string()],
            });
        }

        let stream = self.streams.create(&session.token);
        let subscription = stream.subscribe();
        let turn = Turn {
            session_id: session.id.clone(),
            user_id: session.account_ref.clone(),
            message: message.to_string(),
        };

        let service = self.clone();
        let producer = stream.clone();
        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(service.run_turn(&turn, &producer))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                tracing::error!(session_id = %turn.session_id, stream_id = %producer.id(), "chat turn panicked");
                producer.fail("internal error while processing the message");
            }
        });

        Ok(TurnHandle {
            stream,
            subscription,
        })
    }

    /// Drop everything held for a session: dialog, log and streams.
    pub fn end_session(&self, session: &Session) {
        self.dialogs.take(&session.id);
        self.history.clear(&session.id);
        let closed = self.streams.remove_owned_by(&session.token);
        tracing::debug!(session_id = %session.id, closed, "session state released");
    }

    async fn run_turn(&self, turn: &Turn, stream: &BroadcastStream) {
        match self.plan(turn) {
            TurnPlan::Reply { text, intent } => {
                self.history
                    .record(&turn.session_id, ConversationTurn::user(&turn.message, intent));
                self.history
                    .record(&turn.session_id, ConversationTurn::assistant(&text));
                replay_text(&text, stream, self.settings.reply_delay).await;
            }
            TurnPlan::Generate { prompt, intent } => {
                self.history
                    .record(&turn.session_id, ConversationTurn::user(&turn.message, intent));
                let result =
                    pump_generation(self.generator.as_ref(), prompt, stream, &self.settings.pump).await;
                if result.is_ok() {
                    self.history.record(
                        &turn.session_id,
                        ConversationTurn::assistant(stream.accumulated_text()),
                    );
                }
            }
        }
    }

    fn plan(&self, turn: &Turn) -> TurnPlan {
        if let Some(dialog) = self.dialogs.get(&turn.session_id) {
            if is_cancel(&turn.message) {
                self.dialogs.take(&turn.session_id);
                return TurnPlan::Reply {
                    text: "Okay, I've cancelled that request. What else can I help you with?".to_string(),
                    intent: Some(dialog.intent_name().to_string()),
                };
            }
            if let Some(plan) = self.continue_dialog(turn, &dialog) {
                return plan;
            }
        }

        let intent = self.router.classify(&turn.message);
        if !intent.is_general() && intent.confidence >= self.settings.execution_threshold {
            let agent = self.dispatcher.select_agent(&intent.name, &turn.message);
            return self.execute(turn, agent, &intent.name, intent.confidence, intent.entities);
        }

        tracing::debug!(
            session_id = %turn.session_id,
            intent = %intent.name,
            confidence = intent.confidence,
            "falling back to generation"
        );
        let history = self
            .history
            .recent(&turn.session_id, self.settings.prompt_history);
        TurnPlan::Generate {
            prompt: build_prompt(&history, &intent, &turn.message),
            intent: Some(intent.name),
        }
    }

    /// Feed the message to the session's dialog. `None` if the dialog
    /// vanished concurrently, in which case the turn is routed afresh.
    fn continue_dialog(&self, turn: &Turn, dialog: &SlotFillingDialog) -> Option<TurnPlan> {
        let intent_name = dialog.intent_name().to_string();
        let agent = self
            .dispatcher
            .agent_for_intent(&intent_name)
            .unwrap_or_else(|| self.dispatcher.select_agent(&intent_name, &turn.message));

        // A bare answer ("500", "UPI", "Ravi Kumar") fills the awaited slot
        // when extraction found nothing for a missing parameter.
        let mut entities = self.router.extract_entities(&turn.message, &intent_name);
        let awaited = dialog.awaited_param().map(str::to_string);
        let missing = dialog.missing_params();
        if !entities.keys().any(|key| missing.contains(key))
            && let Some(param) = &awaited
            && turn.message.chars().count() <= MAX_FREE_TEXT
        {
            entities.insert(param.clone(), turn.message.clone());
        }

        let rejected: Vec<String> = entities
            .iter()
            .filter(|(key, value)| !agent.accepts(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &rejected {
            entities.remove(key);
        }

        let updated = self.dialogs.advance(&turn.session_id, &entities)?;
        if !updated.is_complete() {
            let text = match &awaited {
                Some(param) if rejected.contains(param) && updated.awaited_param() == Some(param) => {
                    prompts::invalid_value_question(&intent_name, param)
                }
                _ => updated.next_question().unwrap_or_default(),
            };
            return Some(TurnPlan::Reply {
                text,
                intent: Some(intent_name),
            });
        }

        self.dialogs.take(&turn.session_id);
        tracing::debug!(session_id = %turn.session_id, step_id = %updated.step_id(), "dialog complete");
        Some(self.execute(turn, agent, &intent_name, 1.0, updated.into_params()))
    }

    fn execute(
        &self,
        turn: &Turn,
        agent: &dyn BankingAgent,
        intent: &str,
        confidence: f64,
        parameters: BTreeMap<String, String>,
    ) -> TurnPlan {
        let ctx = AgentContext {
            session_id: turn.session_id.clone(),
            user_id: turn.user_id.clone(),
            utterance: turn.message.clone(),
            intent: intent.to_string(),
            confidence,
            parameters,
        };
        let response = self.dispatcher.run(agent, &ctx);

        if response.requires_input {
            let required = agent.required_params(&ctx.parameters);
            let known: BTreeMap<String, String> = ctx
                .parameters
                .into_iter()
                .filter(|(key, _)| !response.missing_parameters.contains(key))
                .collect();
            let dialog = SlotFillingDialog::start(agent.primary_intent(), known, &required);
            self.dialogs.put(&turn.session_id, dialog);
        }

        TurnPlan::Reply {
            text: response.message,
            intent: Some(intent.to_string()),
        }
    }
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatService")
            .field("generator", &self.generator.name())
            .field("streams", &self.streams.len())
            .field("dialogs", &self.dialogs.len())
            .finish()
    }
}

fn is_cancel(message: &str) -> bool {
    let lower = message.trim().trim_end_matches(['.', '!']).to_lowercase();
    CANCEL_WORDS.contains(&lower.as_str())
}

//! Background expiry of sessions and streams.
//!
//! Two independent loops run on fixed intervals. The session loop purges
//! expired sessions and then drops the dialogs and conversation logs keyed
//! by every id the session store evicted since the last sweep, including
//! sessions removed earlier by a failed validation or the limit purge. The stream loop reaps expired
//! streams and finished streams idle past their grace period.

use std::sync::Arc;
use std::time::Duration;

use bankchat_types::config::ReaperConfig;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::chat::{ChatService, ConversationLog};
use crate::dialog::DialogStore;
use crate::session::TokenSessionStore;
use crate::stream::StreamRegistry;

/// Counts from one session sweep. `sessions` counts only what this sweep
/// purged; the other two count state released for any evicted session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSweep {
    pub sessions: usize,
    pub dialogs: usize,
    pub conversations: usize,
}

#[derive(Debug, Clone)]
pub struct ReapLoop {
    sessions: Arc<TokenSessionStore>,
    streams: Arc<StreamRegistry>,
    dialogs: Arc<DialogStore>,
    history: Arc<ConversationLog>,
    session_interval: Duration,
    stream_interval: Duration,
}

impl ReapLoop {
    pub fn new(sessions: Arc<TokenSessionStore>, chat: &ChatService, config: &ReaperConfig) -> Self {
        Self {
            sessions,
            streams: chat.streams().clone(),
            dialogs: chat.dialogs().clone(),
            history: chat.history().clone(),
            session_interval: Duration::from_secs(config.session_interval_secs.max(1)),
            stream_interval: Duration::from_secs(config.stream_interval_secs.max(1)),
        }
    }

    /// Override both intervals.
    pub fn with_intervals(mut self, sessions: Duration, streams: Duration) -> Self {
        self.session_interval = sessions;
        self.stream_interval = streams;
        self
    }

    pub fn sweep_sessions(&self) -> SessionSweep {
        let purged = self.sessions.purge_expired().len();
        let evicted = self.sessions.drain_evicted();
        SessionSweep {
            sessions: purged,
            dialogs: self.dialogs.remove_all(&evicted),
            conversations: self.history.remove_all(&evicted),
        }
    }

    pub fn sweep_streams(&self) -> usize {
        self.streams.purge().len()
    }

    /// Run both sweeps once, sessions first.
    pub fn sweep_once(&self) -> (SessionSweep, usize) {
        (self.sweep_sessions(), self.sweep_streams())
    }

    /// Start both loops. They stop once `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> Vec<JoinHandle<()>> {
        let this = Arc::new(self);

        let sessions = {
            let this = this.clone();
            run_every(this.session_interval, cancel.clone(), "sessions", move || {
                let sweep = this.sweep_sessions();
                if sweep != SessionSweep::default() {
                    tracing::info!(
                        sessions = sweep.sessions,
                        dialogs = sweep.dialogs,
                        conversations = sweep.conversations,
                        "expired sessions reaped"
                    );
                }
            })
        };
        let streams = {
            let this = this.clone();
            run_every(this.stream_interval, cancel, "streams", move || {
                let removed = this.sweep_streams();
                if removed > 0 {
                    tracing::info!(removed, "streams reaped");
                }
            })
        };

        vec![tokio::spawn(sessions), tokio::spawn(streams)]
    }
}

async fn run_every(
    period: Duration,
    cancel: CancellationToken,
    name: &'static str,
    mut sweep: impl FnMut() + Send + 'static,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    tracing::debug!(reaper = name, period_ms = period.as_millis() as u64, "reaper started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => sweep(),
        }
    }
    tracing::debug!(reaper = name, "reaper stopped");
}

#[cfg(test)]
mod tests {
    use bankchat_types::chat::ConversationTurn;
    use bankchat_types::error::GenerationError;
    use bankchat_types::stream::GenerationChunk;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::agent::AgentDispatcher;
    use crate::agent::test_support::seeded;
    use crate::chat::ChatSettings;
    use crate::dialog::SlotFillingDialog;
    use crate::intent::IntentRouter;
    use crate::stream::{GenerationStream, TextGenerator};

    struct Silent;

    impl TextGenerator for Silent {
        fn name(&self) -> &str {
            "silent"
        }

        fn generate(&self, _prompt: String) -> GenerationStream {
            Box::pin(futures_util::stream::empty::<Result<GenerationChunk, GenerationError>>())
        }
    }

    fn chat(stream_ttl: ChronoDuration) -> ChatService {
        ChatService::new(
            Arc::new(IntentRouter::banking().unwrap()),
            Arc::new(AgentDispatcher::banking(seeded().1)),
            Arc::new(Silent),
            Arc::new(StreamRegistry::new(stream_ttl, ChronoDuration::zero(), 8)),
            ChatSettings::default(),
        )
    }

    #[test]
    fn session_sweep_drops_dialogs_and_logs_of_expired_sessions() {
        let sessions = Arc::new(TokenSessionStore::new(ChronoDuration::milliseconds(1), 10));
        let chat = chat(ChronoDuration::minutes(30));
        let reaper = ReapLoop::new(sessions.clone(), &chat, &ReaperConfig::default());

        let session = sessions.create("user123").unwrap();
        chat.dialogs()
            .put(&session.id, SlotFillingDialog::start("fund_transfer", Default::default(), &["amount".to_string()]));
        chat.history().record(&session.id, ConversationTurn::user("hi", None));
        chat.history().record("someone-else", ConversationTurn::user("hey", None));

        std::thread::sleep(Duration::from_millis(5));
        let sweep = reaper.sweep_sessions();

        assert_eq!(
            sweep,
            SessionSweep {
                sessions: 1,
                dialogs: 1,
                conversations: 1
            }
        );
        assert!(sessions.is_empty());
        assert!(chat.dialogs().is_empty());
        assert_eq!(chat.history().len(), 1);
    }

    #[test]
    fn sweep_releases_state_of_sessions_expired_by_validation() {
        let sessions = Arc::new(TokenSessionStore::new(ChronoDuration::milliseconds(1), 10));
        let chat = chat(ChronoDuration::minutes(30));
        let reaper = ReapLoop::new(sessions.clone(), &chat, &ReaperConfig::default());

        let session = sessions.create("user123").unwrap();
        chat.dialogs()
            .put(&session.id, SlotFillingDialog::start("fund_transfer", Default::default(), &["amount".to_string()]));
        chat.history().record(&session.id, ConversationTurn::user("hi", None));

        std::thread::sleep(Duration::from_millis(5));
        assert!(sessions.validate(&session.token).is_err());
        assert!(sessions.is_empty());

        let sweep = reaper.sweep_sessions();
        assert_eq!(
            sweep,
            SessionSweep {
                sessions: 0,
                dialogs: 1,
                conversations: 1
            }
        );
        assert!(chat.dialogs().is_empty());
        assert_eq!(chat.history().len(), 0);
        assert_eq!(reaper.sweep_sessions(), SessionSweep::default());
    }

    #[test]
    fn sweep_releases_state_of_sessions_reclaimed_by_limit() {
        let sessions = Arc::new(TokenSessionStore::new(ChronoDuration::milliseconds(1), 1));
        let chat = chat(ChronoDuration::minutes(30));
        let reaper = ReapLoop::new(sessions.clone(), &chat, &ReaperConfig::default());

        let old = sessions.create("user123").unwrap();
        chat.history().record(&old.id, ConversationTurn::user("hi", None));

        std::thread::sleep(Duration::from_millis(5));
        sessions.create("user456").unwrap();

        let sweep = reaper.sweep_sessions();
        assert_eq!(sweep.conversations, 1);
        assert!(chat.history().is_empty());
    }

    #[test]
    fn live_sessions_survive() {
        let sessions = Arc::new(TokenSessionStore::new(ChronoDuration::hours(24), 10));
        let chat = chat(ChronoDuration::minutes(30));
        let reaper = ReapLoop::new(sessions.clone(), &chat, &ReaperConfig::default());
        sessions.create("user123").unwrap();

        assert_eq!(reaper.sweep_once(), (SessionSweep::default(), 0));
        assert_eq!(sessions.len(), 1);
    }

    #[tokio::test]
    async fn loops_reap_and_stop_on_cancel() {
        let sessions = Arc::new(TokenSessionStore::new(ChronoDuration::milliseconds(1), 10));
        let chat = chat(ChronoDuration::milliseconds(1));
        let stream = chat.streams().create("tok");
        let mut sub = stream.subscribe();
        sessions.create("user123").unwrap();

        let cancel = CancellationToken::new();
        let handles = ReapLoop::new(sessions.clone(), &chat, &ReaperConfig::default())
            .with_intervals(Duration::from_millis(10), Duration::from_millis(10))
            .spawn(cancel.clone());

        // The expired open stream is failed, which closes its subscriber.
        let closed = tokio::time::timeout(Duration::from_secs(2), sub.recv()).await;
        assert_eq!(closed.unwrap(), None);
        assert_eq!(stream.error().as_deref(), Some("stream expired"));

        tokio::time::timeout(Duration::from_secs(2), async {
            while !sessions.is_empty() || !chat.streams().is_empty() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        cancel.cancel();
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(1), handle)
                .await
                .unwrap()
                .unwrap();
        }
    }
}

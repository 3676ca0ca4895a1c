//! Registry of in-flight broadcast streams, keyed by stream id.

use bankchat_types::config::StreamConfig;
use bankchat_types::error::ChatError;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::broadcast::BroadcastStream;

/// Owns every live [`BroadcastStream`].
///
/// A stream is only resolved for the token that started it; any other
/// token gets the same `NotFound` as a missing id.
pub struct StreamRegistry {
    streams: DashMap<String, BroadcastStream>,
    ttl: Duration,
    idle_grace: Duration,
    subscriber_capacity: usize,
}

impl StreamRegistry {
    pub fn new(ttl: Duration, idle_grace: Duration, subscriber_capacity: usize) -> Self {
        Self {
            streams: DashMap::new(),
            ttl,
            idle_grace,
            subscriber_capacity,
        }
    }

    pub fn from_config(config: &StreamConfig) -> Self {
        Self::new(
            Duration::seconds(config.ttl_secs as i64),
            Duration::seconds(config.idle_grace_secs as i64),
            config.subscriber_capacity,
        )
    }

    /// Register a new open stream owned by `owner_token`.
    pub fn create(&self, owner_token: &str) -> BroadcastStream {
        let stream = BroadcastStream::new(
            Uuid::now_v7().to_string(),
            owner_token.to_string(),
            self.subscriber_capacity,
            self.ttl,
        );
        self.streams.insert(stream.id().to_string(), stream.clone());
        tracing::debug!(stream_id = %stream.id(), "stream registered");
        stream
    }

    pub fn get(&self, id: &str) -> Option<BroadcastStream> {
        self.streams.get(id).map(|entry| entry.value().clone())
    }

    /// Resolve a stream for its owner.
    pub fn get_owned(&self, id: &str, token: &str) -> Result<BroadcastStream, ChatError> {
        match self.get(id) {
            Some(stream) if stream.owner_token() == token => Ok(stream),
            _ => Err(ChatError::NotFound("stream".to_string())),
        }
    }

    pub fn remove(&self, id: &str) -> Option<BroadcastStream> {
        self.streams.remove(id).map(|(_, stream)| stream)
    }

    /// Drop every stream started with `token`, closing the open ones.
    pub fn remove_owned_by(&self, token: &str) -> usize {
        let owned: Vec<String> = self
            .streams
            .iter()
            .filter(|entry| entry.value().owner_token() == token)
            .map(|entry| entry.key().clone())
            .collect();

        owned
            .iter()
            .filter_map(|id| self.remove(id))
            .inspect(|stream| {
                stream.fail("session ended");
            })
            .count()
    }

    /// Reap expired streams and closed streams idle past the grace period.
    ///
    /// An expired stream that is still open is failed first so its
    /// subscribers observe closure. Returns the ids removed.
    pub fn purge(&self) -> Vec<String> {
        self.purge_at(Utc::now())
    }

    pub(crate) fn purge_at(&self, now: DateTime<Utc>) -> Vec<String> {
        // Clone handles out before touching per-stream locks.
        let candidates: Vec<BroadcastStream> =
            self.streams.iter().map(|entry| entry.value().clone()).collect();

        let mut removed = Vec::new();
        for stream in candidates {
            if !stream.is_reapable(now, self.idle_grace) {
                continue;
            }
            if self.streams.remove(stream.id()).is_none() {
                continue;
            }
            if !stream.is_done() {
                stream.fail("stream expired");
            }
            removed.push(stream.id().to_string());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Streams still being produced.
    pub fn open_count(&self) -> usize {
        let handles: Vec<BroadcastStream> =
            self.streams.iter().map(|entry| entry.value().clone()).collect();
        handles.iter().filter(|stream| !stream.is_done()).count()
    }
}

impl std::fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("streams", &self.streams.len())
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish()
    }
}

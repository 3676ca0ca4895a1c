//! Single-producer, multi-consumer text stream for one in-flight answer.
//!
//! The producer appends text with [`BroadcastStream::append`]; every
//! subscriber registered at that moment gets the chunk through its own
//! bounded `mpsc` channel via `try_send`, so a slow or absent consumer never
//! blocks the producer. A consumer whose buffer is full misses that chunk.
//! Each delivered chunk carries its byte offset into the accumulated text,
//! which lets a consumer detect the gap and repair it from
//! [`BroadcastStream::text_range`].
//!
//! State machine: `Open -> Open (append) -> Closed (mark_done / fail)`.
//! There is no way out of `Closed`.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::task::{Context, Poll};

use bankchat_types::stream::StreamStats;
use chrono::{DateTime, Duration, Utc};
use futures_util::Stream;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A chunk as seen by one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamChunk {
    /// Byte offset of `text` within the accumulated text.
    pub offset: usize,
    pub text: String,
}

impl StreamChunk {
    /// Offset just past this chunk.
    pub fn end(&self) -> usize {
        self.offset + self.text.len()
    }
}

struct StreamState {
    accumulated: String,
    done: bool,
    error: Option<String>,
    subscribers: Vec<(u64, mpsc::Sender<StreamChunk>)>,
    poll_cursor: usize,
    last_activity_at: DateTime<Utc>,
    dropped_chunks: u64,
}

struct Inner {
    id: String,
    owner_token: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    capacity: usize,
    next_subscriber: AtomicU64,
    state: RwLock<StreamState>,
}

/// Handle to one broadcast stream. Cloning shares the same stream.
#[derive(Clone)]
pub struct BroadcastStream {
    inner: Arc<Inner>,
}

impl BroadcastStream {
    /// Create an open stream.
    ///
    /// `capacity` bounds each subscriber's channel; `ttl` sets the absolute
    /// expiry used by the reaper.
    pub fn new(id: String, owner_token: String, capacity: usize, ttl: Duration) -> Self {
        Self::new_at(id, owner_token, capacity, ttl, Utc::now())
    }

    pub(crate) fn new_at(
        id: String,
        owner_token: String,
        capacity: usize,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id,
                owner_token,
                created_at: now,
                expires_at: now + ttl,
                capacity: capacity.max(1),
                next_subscriber: AtomicU64::new(1),
                state: RwLock::new(StreamState {
                    accumulated: String::new(),
                    done: false,
                    error: None,
                    subscribers: Vec::new(),
                    poll_cursor: 0,
                    last_activity_at: now,
                    dropped_chunks: 0,
                }),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn owner_token(&self) -> &str {
        &self.inner.owner_token
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.inner.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.inner.expires_at
    }

    /// Append a chunk and fan it out to current subscribers.
    ///
    /// Returns `false` without changing anything once the stream is closed.
    pub fn append(&self, chunk: &str) -> bool {
        let mut state = self.write();
        if state.done {
            return false;
        }
        if chunk.is_empty() {
            return true;
        }

        let offset = state.accumulated.len();
        state.accumulated.push_str(chunk);
        state.last_activity_at = Utc::now();

        let mut dropped = 0u64;
        let stream_id = &self.inner.id;
        state.subscribers.retain(|(subscriber, tx)| {
            let delivery = tx.try_send(StreamChunk {
                offset,
                text: chunk.to_string(),
            });
            match delivery {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    tracing::debug!(stream_id = %stream_id, subscriber, offset, "subscriber buffer full, chunk dropped");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(stream_id = %stream_id, subscriber, "subscriber gone, removing");
                    false
                }
            }
        });
        state.dropped_chunks += dropped;
        true
    }

    /// Attach a new consumer that sees every chunk appended from now on.
    ///
    /// On a closed stream the returned subscription is already at
    /// end-of-stream.
    pub fn subscribe(&self) -> Subscription {
        let mut state = self.write();
        if state.done {
            let (_, rx) = mpsc::channel(1);
            return Subscription {
                id: None,
                rx,
                stream: Weak::new(),
            };
        }

        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.capacity);
        state.subscribers.push((id, tx));
        tracing::trace!(stream_id = %self.inner.id, subscriber = id, "subscriber attached");

        Subscription {
            id: Some(id),
            rx,
            stream: Arc::downgrade(&self.inner),
        }
    }

    /// Detach a subscriber and close its channel. Idempotent.
    pub fn unsubscribe(&self, subscriber: u64) -> bool {
        let mut state = self.write();
        let before = state.subscribers.len();
        state.subscribers.retain(|(id, _)| *id != subscriber);
        before != state.subscribers.len()
    }

    /// Close the stream. Every subscriber observes end-of-stream after the
    /// chunks already buffered for it. Returns whether this call closed it.
    pub fn mark_done(&self) -> bool {
        let mut state = self.write();
        if state.done {
            return false;
        }
        state.done = true;
        state.last_activity_at = Utc::now();
        // Dropping the senders closes every channel.
        state.subscribers.clear();
        tracing::debug!(
            stream_id = %self.inner.id,
            bytes = state.accumulated.len(),
            dropped = state.dropped_chunks,
            "stream closed"
        );
        true
    }

    /// Record a terminal error and close the stream.
    ///
    /// Has no effect on a stream that is already closed.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        {
            let mut state = self.write();
            if state.done {
                return false;
            }
            tracing::warn!(stream_id = %self.inner.id, error = %message, "stream failed");
            state.error = Some(message);
        }
        self.mark_done()
    }

    /// Drain the text accumulated since the previous snapshot.
    ///
    /// Returns `(increment, done)`. Nothing is ever skipped: the cursor
    /// reads from the accumulated text, not from a channel.
    pub fn snapshot(&self) -> (String, bool) {
        let mut state = self.write();
        let cursor = state.poll_cursor;
        let increment = state.accumulated.get(cursor..).unwrap_or_default().to_string();
        state.poll_cursor = state.accumulated.len();
        state.last_activity_at = Utc::now();
        (increment, state.done)
    }

    pub fn is_done(&self) -> bool {
        self.read().done
    }

    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    pub fn accumulated_text(&self) -> String {
        self.read().accumulated.clone()
    }

    /// Text between two byte offsets; empty when the range is not valid.
    pub fn text_range(&self, from: usize, to: usize) -> String {
        self.read()
            .accumulated
            .get(from..to)
            .unwrap_or_default()
            .to_string()
    }

    /// Text from a byte offset to the current end.
    pub fn text_since(&self, from: usize) -> String {
        self.read()
            .accumulated
            .get(from..)
            .unwrap_or_default()
            .to_string()
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.read().last_activity_at
    }

    pub fn stats(&self) -> StreamStats {
        let state = self.read();
        StreamStats {
            subscribers: state.subscribers.len(),
            accumulated_bytes: state.accumulated.len(),
            dropped_chunks: state.dropped_chunks,
            done: state.done,
        }
    }

    /// Whether the reaper may discard this stream: expired outright, or
    /// closed and idle for longer than `idle_grace`.
    pub fn is_reapable(&self, now: DateTime<Utc>, idle_grace: Duration) -> bool {
        if now >= self.inner.expires_at {
            return true;
        }
        let state = self.read();
        state.done && now - state.last_activity_at > idle_grace
    }

    fn read(&self) -> RwLockReadGuard<'_, StreamState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StreamState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BroadcastStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("BroadcastStream")
            .field("id", &self.inner.id)
            .field("subscribers", &stats.subscribers)
            .field("bytes", &stats.accumulated_bytes)
            .field("done", &stats.done)
            .finish()
    }
}

/// Receiving end of one subscriber.
///
/// Dropping the subscription detaches it from the stream, so a consumer
/// that goes away (client disconnect) never leaves a registered channel
/// behind.
pub struct Subscription {
    id: Option<u64>,
    rx: mpsc::Receiver<StreamChunk>,
    stream: Weak<Inner>,
}

impl Subscription {
    /// Next chunk, or `None` at end-of-stream.
    pub async fn recv(&mut self) -> Option<StreamChunk> {
        self.rx.recv().await
    }

    /// Subscriber id; `None` for a subscription taken after close.
    pub fn id(&self) -> Option<u64> {
        self.id
    }
}

impl Stream for Subscription {
    type Item = StreamChunk;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let (Some(id), Some(inner)) = (self.id, self.stream.upgrade()) {
            BroadcastStream { inner }.unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use futures_util::StreamExt;
    use tokio::time::timeout;

    use super::*;

    fn stream(capacity: usize) -> BroadcastStream {
        BroadcastStream::new("s1".to_string(), "tok".to_string(), capacity, Duration::minutes(30))
    }

    async fn collect(mut sub: Subscription) -> Vec<StreamChunk> {
        let mut out = Vec::new();
        while let Some(chunk) = timeout(StdDuration::from_secs(5), sub.recv()).await.unwrap() {
            out.push(chunk);
        }
        out
    }

    #[test]
    fn append_accumulates_text() {
        let s = stream(8);
        assert!(s.append("Hello "));
        assert!(s.append("world"));
        assert_eq!(s.accumulated_text(), "Hello world");
        assert!(!s.is_done());
    }

    #[test]
    fn append_after_done_is_noop() {
        let s = stream(8);
        s.append("kept");
        assert!(s.mark_done());
        assert!(!s.append(" ignored"));
        assert_eq!(s.accumulated_text(), "kept");
        assert!(!s.mark_done());
    }

    #[tokio::test]
    async fn subscribe_after_done_is_immediately_closed() {
        let s = stream(8);
        s.append("before");
        s.mark_done();

        let mut sub = s.subscribe();
        assert!(sub.id().is_none());
        let next = timeout(StdDuration::from_millis(100), sub.recv())
            .await
            .expect("closed subscription must not block");
        assert!(next.is_none());
        assert_eq!(s.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn subscriber_sees_only_chunks_after_attaching() {
        let s = stream(8);
        s.append("early ");
        let sub = s.subscribe();
        s.append("late ");
        s.append("later");
        s.mark_done();

        let chunks = collect(sub).await;
        let texts: Vec<_> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["late ", "later"]);
        assert_eq!(chunks[0].offset, "early ".len());
        assert_eq!(chunks[1].offset, chunks[0].end());
    }

    #[tokio::test]
    async fn mark_done_closes_every_subscriber_after_buffered_chunks() {
        let s = stream(8);
        let a = s.subscribe();
        let b = s.subscribe();
        s.append("x");
        s.mark_done();

        assert_eq!(collect(a).await.len(), 1);
        assert_eq!(collect(b).await.len(), 1);
        assert_eq!(s.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn full_buffer_drops_chunk_without_blocking_and_leaves_gap() {
        let s = stream(2);
        let sub = s.subscribe();
        for word in ["a", "b", "c", "d"] {
            assert!(s.append(word));
        }
        s.mark_done();

        let chunks = collect(sub).await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(s.stats().dropped_chunks, 2);
        // The missing tail is still recoverable from the accumulated text.
        assert_eq!(s.text_since(chunks[1].end()), "cd");
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let s = stream(8);
        let sub = s.subscribe();
        let id = sub.id().unwrap();
        assert!(s.unsubscribe(id));
        assert!(!s.unsubscribe(id));
        assert_eq!(s.stats().subscribers, 0);
    }

    #[tokio::test]
    async fn unsubscribe_closes_channel() {
        let s = stream(8);
        let mut sub = s.subscribe();
        s.unsubscribe(sub.id().unwrap());
        s.append("not delivered");
        assert!(timeout(StdDuration::from_millis(100), sub.recv()).await.unwrap().is_none());
    }

    #[test]
    fn dropping_subscription_detaches_it() {
        let s = stream(8);
        let first = s.subscribe();
        let second = s.subscribe();
        assert_eq!(s.stats().subscribers, 2);

        drop(first);
        assert_eq!(s.stats().subscribers, 1);
        drop(second);
        assert_eq!(s.stats().subscribers, 0);

        // Producer keeps working with nobody listening.
        assert!(s.append("still fine"));
    }

    #[test]
    fn snapshot_returns_increments() {
        let s = stream(8);
        assert_eq!(s.snapshot(), (String::new(), false));
        s.append("Hello ");
        assert_eq!(s.snapshot(), ("Hello ".to_string(), false));
        s.append("there");
        s.append("!");
        s.mark_done();
        assert_eq!(s.snapshot(), ("there!".to_string(), true));
        assert_eq!(s.snapshot(), (String::new(), true));
    }

    #[test]
    fn fail_records_error_and_closes() {
        let s = stream(8);
        assert!(s.fail("cannot connect"));
        assert!(s.is_done());
        assert_eq!(s.error().as_deref(), Some("cannot connect"));
        assert!(!s.fail("second"));
        assert_eq!(s.error().as_deref(), Some("cannot connect"));
    }

    #[test]
    fn reapable_when_expired_or_done_and_idle() {
        let now = Utc::now();
        let s = BroadcastStream::new_at("s".into(), "t".into(), 4, Duration::minutes(30), now);
        let grace = Duration::minutes(5);

        assert!(!s.is_reapable(now + Duration::minutes(10), grace));
        assert!(s.is_reapable(now + Duration::minutes(30), grace));

        s.mark_done();
        let closed_at = s.last_activity_at();
        assert!(!s.is_reapable(closed_at + Duration::minutes(4), grace));
        assert!(s.is_reapable(closed_at + Duration::minutes(6), grace));
    }

    #[test]
    fn text_range_ignores_invalid_bounds() {
        let s = stream(8);
        s.append("héllo");
        assert_eq!(s.text_range(0, 1), "h");
        assert_eq!(s.text_range(2, 3), "");
        assert_eq!(s.text_range(4, 100), "");
    }

    #[tokio::test]
    async fn concurrent_subscribers_receive_every_chunk_in_order() {
        const CHUNKS: usize = 500;
        const SUBSCRIBERS: usize = 10;

        let s = stream(CHUNKS);
        let consumers: Vec<_> = (0..SUBSCRIBERS)
            .map(|_| {
                let sub = s.subscribe();
                tokio::spawn(async move { sub.map(|c| c.text).collect::<Vec<_>>().await })
            })
            .collect();

        let producer = {
            let s = s.clone();
            tokio::spawn(async move {
                for i in 0..CHUNKS {
                    s.append(&format!("{i},"));
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
                s.mark_done();
            })
        };
        producer.await.unwrap();

        let expected: Vec<String> = (0..CHUNKS).map(|i| format!("{i},")).collect();
        for consumer in consumers {
            let received = timeout(StdDuration::from_secs(5), consumer).await.unwrap().unwrap();
            assert_eq!(received, expected);
        }
        assert_eq!(s.stats().dropped_chunks, 0);
    }
}

//! Per-session conversation log, bounded to the most recent turns.

use std::collections::VecDeque;

use bankchat_types::chat::ConversationTurn;
use dashmap::DashMap;

#[derive(Debug)]
pub struct ConversationLog {
    turns: DashMap<String, VecDeque<ConversationTurn>>,
    max_turns: usize,
}

impl ConversationLog {
    pub fn new(max_turns: usize) -> Self {
        Self {
            turns: DashMap::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// Append a turn, evicting the oldest once the bound is reached.
    pub fn record(&self, session_id: &str, turn: ConversationTurn) {
        let mut log = self.turns.entry(session_id.to_string()).or_default();
        if log.len() >= self.max_turns {
            log.pop_front();
        }
        log.push_back(turn);
    }

    /// Every retained turn, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<ConversationTurn> {
        self.turns
            .get(session_id)
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// The last `n` turns, oldest first.
    pub fn recent(&self, session_id: &str, n: usize) -> Vec<ConversationTurn> {
        self.turns
            .get(session_id)
            .map(|log| log.iter().skip(log.len().saturating_sub(n)).cloned().collect())
            .unwrap_or_default()
    }

    /// Forget a session's log. Returns whether one existed.
    pub fn clear(&self, session_id: &str) -> bool {
        self.turns.remove(session_id).is_some()
    }

    pub fn remove_all<'a>(&self, session_ids: impl IntoIterator<Item = &'a String>) -> usize {
        session_ids
            .into_iter()
            .filter(|id| self.turns.remove(id.as_str()).is_some())
            .count()
    }

    /// Number of sessions with a log.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_read_back_in_order() {
        let log = ConversationLog::new(10);
        log.record("s", ConversationTurn::user("hi", None));
        log.record("s", ConversationTurn::assistant("hello"));

        let history = log.history("s");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].content, "hi");
        assert_eq!(history[1].content, "hello");
        assert!(log.history("other").is_empty());
    }

    #[test]
    fn oldest_turns_are_evicted() {
        let log = ConversationLog::new(3);
        for i in 0..5 {
            log.record("s", ConversationTurn::user(i.to_string(), None));
        }
        let contents: Vec<String> = log.history("s").into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["2", "3", "4"]);
    }

    #[test]
    fn recent_takes_tail() {
        let log = ConversationLog::new(10);
        for i in 0..4 {
            log.record("s", ConversationTurn::user(i.to_string(), None));
        }
        let recent: Vec<String> = log.recent("s", 2).into_iter().map(|t| t.content).collect();
        assert_eq!(recent, vec!["2", "3"]);
        assert_eq!(log.recent("s", 99).len(), 4);
    }

    #[test]
    fn clear_and_remove_all() {
        let log = ConversationLog::new(10);
        log.record("a", ConversationTurn::user("x", None));
        log.record("b", ConversationTurn::user("y", None));

        assert!(log.clear("a"));
        assert!(!log.clear("a"));
        assert_eq!(log.remove_all(&vec!["b".to_string(), "c".to_string()]), 1);
        assert!(log.is_empty());
    }
}

//! Per-session dialog table.

use std::collections::BTreeMap;

use dashmap::DashMap;

use super::slot::SlotFillingDialog;

/// At most one active dialog per session, keyed by session id.
#[derive(Debug, Default)]
pub struct DialogStore {
    dialogs: DashMap<String, SlotFillingDialog>,
}

impl DialogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, session_id: &str) -> Option<SlotFillingDialog> {
        self.dialogs.get(session_id).map(|entry| entry.value().clone())
    }

    /// Install a dialog, replacing (abandoning) any previous one.
    pub fn put(&self, session_id: &str, dialog: SlotFillingDialog) {
        if let Some(previous) = self.dialogs.insert(session_id.to_string(), dialog) {
            tracing::debug!(
                session_id = %session_id,
                abandoned = %previous.intent_name(),
                "replaced active dialog"
            );
        }
    }

    /// Merge entities into the session's dialog and return the updated copy.
    pub fn advance(
        &self,
        session_id: &str,
        entities: &BTreeMap<String, String>,
    ) -> Option<SlotFillingDialog> {
        let mut entry = self.dialogs.get_mut(session_id)?;
        entry.advance(entities);
        Some(entry.value().clone())
    }

    /// Remove and return the session's dialog.
    pub fn take(&self, session_id: &str) -> Option<SlotFillingDialog> {
        self.dialogs.remove(session_id).map(|(_, dialog)| dialog)
    }

    /// Remove dialogs for the given sessions. Returns how many existed.
    pub fn remove_all<'a>(&self, session_ids: impl IntoIterator<Item = &'a String>) -> usize {
        session_ids
            .into_iter()
            .filter(|id| self.dialogs.remove(id.as_str()).is_some())
            .count()
    }

    pub fn len(&self) -> usize {
        self.dialogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialogs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_dialog() -> SlotFillingDialog {
        SlotFillingDialog::start(
            "fund_transfer",
            BTreeMap::new(),
            &["amount".to_string(), "method".to_string()],
        )
    }

    #[test]
    fn put_advance_take() {
        let store = DialogStore::new();
        store.put("s1", transfer_dialog());

        let entities = BTreeMap::from([("amount".to_string(), "500".to_string())]);
        let updated = store.advance("s1", &entities).unwrap();
        assert_eq!(updated.missing_params(), vec!["method"]);
        assert_eq!(store.get("s1").unwrap(), updated);

        assert!(store.take("s1").is_some());
        assert!(store.get("s1").is_none());
        assert!(store.advance("s1", &entities).is_none());
    }

    #[test]
    fn one_dialog_per_session() {
        let store = DialogStore::new();
        store.put("s1", transfer_dialog());
        store.put(
            "s1",
            SlotFillingDialog::start("add_payee", BTreeMap::new(), &["payee_name".to_string()]),
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("s1").unwrap().intent_name(), "add_payee");
    }

    #[test]
    fn remove_all_counts_existing() {
        let store = DialogStore::new();
        store.put("a", transfer_dialog());
        store.put("b", transfer_dialog());
        let ids = vec!["a".to_string(), "missing".to_string()];
        assert_eq!(store.remove_all(&ids), 1);
        assert_eq!(store.len(), 1);
    }
}

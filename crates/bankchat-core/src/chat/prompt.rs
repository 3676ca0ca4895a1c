//! Prompt text for open-ended generation.

use bankchat_types::chat::{ConversationTurn, TurnRole};
use bankchat_types::intent::IntentResult;

const PREAMBLE: &str = "You are a helpful AI banking assistant. \
You help customers with banking operations like transfers, balance checks, adding payees, loans, and general banking questions. \
Be concise, helpful, and professional in your responses.\n\n";

/// Assemble the generator prompt.
///
/// `history` is used as given; callers trim it to the window they want.
/// Intent and entity lines are only added for a non-general intent, with
/// entities in key order.
pub fn build_prompt(history: &[ConversationTurn], intent: &IntentResult, message: &str) -> String {
    let mut prompt = String::from(PREAMBLE);

    if !history.is_empty() {
        prompt.push_str("Conversation history:\n");
        for turn in history {
            let speaker = match turn.role {
                TurnRole::User => "Human",
                TurnRole::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{speaker}: {}\n", turn.content));
        }
        prompt.push('\n');
    }

    if !intent.is_general() {
        prompt.push_str(&format!("Intent: {}\n", intent.name));
        if !intent.entities.is_empty() {
            prompt.push_str("Entities: ");
            for (key, value) in &intent.entities {
                prompt.push_str(&format!("{key}={value} "));
            }
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Human: {message}\nAssistant:"));
    prompt
}

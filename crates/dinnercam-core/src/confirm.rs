//! Ingredient confirmation sub-flow.
//!
//! `closed -> open(candidates, origin) -> closed`. While open, new
//! free-text turns are refused by the session controller. Confirming
//! synthesizes a follow-up turn; resetting just closes the prompt.

use crate::error::EngineError;
use crate::message::MessagePatch;
use crate::session::{PendingConfirmation, SessionState};
use crate::store::MessageStore;

pub const SELECTION_PROMPT: &str =
    "Here's what I found! 🔍\n\nPick the ingredients you'd like to use:";
pub const SELECTION_CANCELLED: &str =
    "No problem, ingredient selection cancelled. Snap another photo or tell me \
     what you have on hand. 😊";

impl SessionState {
    /// Open the sub-flow with the detected candidates. The originating
    /// message is rewritten into the selection prompt.
    pub fn open_ingredient_check(
        &mut self,
        store: &mut MessageStore,
        candidates: Vec<String>,
        origin_message_id: &str,
    ) {
        store.update(origin_message_id, MessagePatch::content(SELECTION_PROMPT));
        self.pending_confirmation = Some(PendingConfirmation {
            candidates,
            origin_message_id: origin_message_id.to_string(),
        });
    }

    /// Close the sub-flow with a selection. Rewrites the originating message
    /// with the chosen list and returns the synthesized follow-up turn text.
    pub fn confirm_ingredients(
        &mut self,
        store: &mut MessageStore,
        selected: &[String],
    ) -> Result<String, EngineError> {
        let pending = self
            .pending_confirmation
            .as_ref()
            .ok_or(EngineError::NoConfirmationPending)?;
        if selected.is_empty() {
            return Err(EngineError::NoIngredientsSelected);
        }

        let chosen = selected
            .iter()
            .map(|item| format!("• {item}"))
            .collect::<Vec<_>>()
            .join("\n");
        store.update(
            &pending.origin_message_id,
            MessagePatch::content(format!(
                "Let's cook with what you picked! 🍳\n\nUsing:\n{chosen}"
            )),
        );
        self.pending_confirmation = None;

        Ok(format!(
            "Please make a recipe with these ingredients: {}",
            selected.join(", ")
        ))
    }

    /// Close the sub-flow without starting a turn.
    pub fn reset_ingredient_check(&mut self, store: &mut MessageStore) {
        let Some(pending) = self.pending_confirmation.take() else {
            return;
        };
        store.update(
            &pending.origin_message_id,
            MessagePatch::content(SELECTION_CANCELLED),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    fn setup() -> (SessionState, MessageStore, String) {
        let mut store = MessageStore::new();
        let origin = store.append(Message::assistant("Checking your fridge... 📸"));
        (SessionState::default(), store, origin)
    }

    #[test]
    fn test_open_rewrites_origin_and_gates_turns() {
        let (mut session, mut store, origin) = setup();

        session.open_ingredient_check(
            &mut store,
            vec!["egg".to_string(), "milk".to_string()],
            &origin,
        );

        assert!(session.is_confirmation_pending());
        assert_eq!(store.get(&origin).unwrap().content, SELECTION_PROMPT);
    }

    #[test]
    fn test_confirm_requires_selection() {
        let (mut session, mut store, origin) = setup();
        session.open_ingredient_check(&mut store, vec!["egg".to_string()], &origin);

        let err = session.confirm_ingredients(&mut store, &[]).unwrap_err();
        assert!(matches!(err, EngineError::NoIngredientsSelected));
        assert!(session.is_confirmation_pending());
    }

    #[test]
    fn test_confirm_synthesizes_follow_up_turn() {
        let (mut session, mut store, origin) = setup();
        session.open_ingredient_check(
            &mut store,
            vec!["egg".to_string(), "milk".to_string()],
            &origin,
        );

        let follow_up = session
            .confirm_ingredients(&mut store, &["egg".to_string(), "milk".to_string()])
            .unwrap();

        assert_eq!(
            follow_up,
            "Please make a recipe with these ingredients: egg, milk"
        );
        assert!(!session.is_confirmation_pending());
        let origin_content = &store.get(&origin).unwrap().content;
        assert!(origin_content.contains("• egg"));
        assert!(origin_content.contains("• milk"));
    }

    #[test]
    fn test_reset_closes_without_turn() {
        let (mut session, mut store, origin) = setup();
        session.open_ingredient_check(&mut store, vec!["egg".to_string()], &origin);

        session.reset_ingredient_check(&mut store);

        assert!(!session.is_confirmation_pending());
        assert_eq!(store.get(&origin).unwrap().content, SELECTION_CANCELLED);
    }

    #[test]
    fn test_confirm_without_open_subflow_errors() {
        let (mut session, mut store, _origin) = setup();
        let err = session
            .confirm_ingredients(&mut store, &["egg".to_string()])
            .unwrap_err();
        assert!(matches!(err, EngineError::NoConfirmationPending));
    }
}

//! Explicit conversation state.
//!
//! A [`Session`] owns one conversation's history and is passed by mutable
//! reference into each chat call. Retrieval augmentation is transparent to
//! it: the history always records the user's original message, never the
//! augmented prompt actually sent to the backend.

use crate::provider::Message;

/// One conversation's state: an optional system prompt plus the ordered
/// exchange history.
#[derive(Debug, Default)]
pub struct Session {
    system_prompt: Option<String>,
    history: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: Some(prompt.into()),
            history: Vec::new(),
        }
    }

    /// Overrides the configured system prompt for this session.
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Empties the conversation history. The system prompt is kept.
    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Records one completed exchange. `user_message` must be the original,
    /// unaugmented message.
    pub(crate) fn record_exchange(&mut self, user_message: &str, assistant_response: &str) {
        self.history.push(Message::user(user_message));
        self.history.push(Message::assistant(assistant_response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_clear() {
        let mut session = Session::new();
        assert!(session.is_empty());

        session.record_exchange("hi", "hello");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].role, "user");
        assert_eq!(session.history()[0].content, "hi");
        assert_eq!(session.history()[1].role, "assistant");

        session.clear();
        assert!(session.is_empty());
    }

    #[test]
    fn test_clear_keeps_system_prompt() {
        let mut session = Session::with_system_prompt("be brief");
        session.record_exchange("hi", "hello");
        session.clear();
        assert_eq!(session.system_prompt(), Some("be brief"));
    }
}

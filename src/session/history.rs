//! Conversation history state owned by the session.

use crate::protocol::{ChatMessage, HistoryInfo, Role};

/// Chat transcript, history listing, and the accumulated partial AI
/// response for the current turn.
#[derive(Debug, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
    history_list: Vec<HistoryInfo>,
    current_uid: Option<String>,
    partial_response: String,
    force_new_message: bool,
}

impl ChatHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn history_list(&self) -> &[HistoryInfo] {
        &self.history_list
    }

    #[must_use]
    pub fn current_uid(&self) -> Option<&str> {
        self.current_uid.as_deref()
    }

    pub fn set_messages(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    pub fn set_history_list(&mut self, histories: Vec<HistoryInfo>) {
        self.history_list = histories;
    }

    pub fn set_current_uid(&mut self, uid: impl Into<String>) {
        self.current_uid = Some(uid.into());
    }

    /// Start a fresh history: clears the transcript and prepends the new
    /// history to the listing.
    pub fn start_new(&mut self, uid: impl Into<String>) {
        let uid = uid.into();
        self.messages.clear();
        self.history_list.insert(
            0,
            HistoryInfo {
                uid: uid.clone(),
                latest_message: None,
                timestamp: Some(chrono::Utc::now().to_rfc3339()),
            },
        );
        self.current_uid = Some(uid);
    }

    /// Append a transcribed user utterance.
    pub fn push_human(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage {
            content: text.into(),
            role: Role::Human,
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            ..ChatMessage::default()
        });
    }

    /// Insert or update a tool-call status entry, keyed by `tool_id`.
    pub fn upsert_tool_call(&mut self, entry: ChatMessage) {
        let Some(tool_id) = entry.tool_id.clone() else {
            return;
        };
        if let Some(existing) = self
            .messages
            .iter_mut()
            .find(|m| m.tool_id.as_deref() == Some(tool_id.as_str()))
        {
            *existing = entry;
        } else {
            self.messages.push(entry);
        }
    }

    /// Accumulate a piece of the in-progress AI response.
    pub fn append_response(&mut self, piece: &str) {
        self.partial_response.push_str(piece);
    }

    /// Current accumulated partial AI response.
    #[must_use]
    pub fn partial_response(&self) -> &str {
        &self.partial_response
    }

    /// Take the accumulated partial response, leaving it empty.
    #[must_use]
    pub fn take_response(&mut self) -> String {
        std::mem::take(&mut self.partial_response)
    }

    /// Discard the accumulated partial response.
    pub fn clear_response(&mut self) {
        self.partial_response.clear();
    }

    /// Signal the UI to start a new message bubble for the next AI text.
    pub fn set_force_new_message(&mut self, value: bool) {
        self.force_new_message = value;
    }

    #[must_use]
    pub fn force_new_message(&self) -> bool {
        self.force_new_message
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn start_new_clears_transcript_and_prepends_listing() {
        let mut history = ChatHistory::new();
        history.push_human("hello");
        history.set_history_list(vec![HistoryInfo {
            uid: "old".to_owned(),
            ..HistoryInfo::default()
        }]);

        history.start_new("fresh");
        assert!(history.messages().is_empty());
        assert_eq!(history.current_uid(), Some("fresh"));
        assert_eq!(history.history_list()[0].uid, "fresh");
        assert_eq!(history.history_list()[1].uid, "old");
    }

    #[test]
    fn tool_calls_update_in_place_by_id() {
        let mut history = ChatHistory::new();
        let running = ChatMessage {
            tool_id: Some("t1".to_owned()),
            status: Some("running".to_owned()),
            ..ChatMessage::default()
        };
        let done = ChatMessage {
            tool_id: Some("t1".to_owned()),
            status: Some("completed".to_owned()),
            ..ChatMessage::default()
        };

        history.upsert_tool_call(running);
        history.upsert_tool_call(done);
        assert_eq!(history.messages().len(), 1);
        assert_eq!(history.messages()[0].status.as_deref(), Some("completed"));
    }

    #[test]
    fn take_response_drains_the_accumulator() {
        let mut history = ChatHistory::new();
        history.append_response("partial ");
        history.append_response("answer");
        assert_eq!(history.take_response(), "partial answer");
        assert_eq!(history.partial_response(), "");
    }
}

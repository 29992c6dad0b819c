use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role in conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    User,
    Assistant,
}

impl ConversationRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            ConversationRole::User => "You",
            ConversationRole::Assistant => "Assistant",
        }
    }
}

/// A single message exchanged in the conversation.
///
/// Only `role` and `content` go over the wire; the timestamp is local display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: ConversationRole,
    content: String,
    #[serde(skip, default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: ConversationRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn role(&self) -> ConversationRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Append-only conversation log for one chat run.
///
/// The full log is sent as `history` on every request so the backend always
/// sees the whole conversation.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    turns: Vec<Turn>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            turns: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Add a turn to the end of the log. Content is not validated here;
    /// blank input is rejected before it reaches the session.
    pub fn append(&mut self, role: ConversationRole, content: impl Into<String>) {
        self.turns.push(Turn::new(role, content));
    }

    /// Owned copy of every turn appended so far, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

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
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.is_empty());
        assert_eq!(session.len(), 0);
        assert!(session.snapshot().is_empty());
    }

    #[test]
    fn test_append_preserves_order() {
        let mut session = Session::new();
        session.append(ConversationRole::User, "hello");
        session.append(ConversationRole::Assistant, "hi there");
        session.append(ConversationRole::User, "any oils?");

        let roles: Vec<_> = session.turns().map(|t| t.role()).collect();
        assert_eq!(
            roles,
            vec![
                ConversationRole::User,
                ConversationRole::Assistant,
                ConversationRole::User
            ]
        );
        assert_eq!(session.snapshot()[2].content(), "any oils?");
    }

    #[test]
    fn test_append_does_not_enforce_alternation() {
        let mut session = Session::new();
        session.append(ConversationRole::User, "first");
        session.append(ConversationRole::User, "second");
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_appends() {
        let mut session = Session::new();
        session.append(ConversationRole::User, "one");
        let snapshot = session.snapshot();
        session.append(ConversationRole::Assistant, "two");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_turn_wire_format() {
        let turn = Turn::new(ConversationRole::Assistant, "Hi");
        let value = serde_json::to_value(&turn).unwrap();
        assert_eq!(value, serde_json::json!({"role": "assistant", "content": "Hi"}));
    }
}

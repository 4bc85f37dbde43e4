//! Conversation-related types.

use std::fmt::{self, Display, Formatter};

use murmur_model::{ChatMessage, ChatRequest, Role};

/// An opaque key identifying a message for display purposes.
///
/// Keys are unique within a conversation. Nothing but rendering should
/// depend on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "msg:{}", self.0)
    }
}

/// A message in the conversation. Messages never change once created.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Message {
    id: MessageId,
    role: Role,
    content: String,
}

impl Message {
    /// Returns the display key of this message.
    #[inline]
    pub fn id(&self) -> MessageId {
        self.id
    }

    /// Returns who wrote this message.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An append-only history of messages, oldest first.
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    /// Returns all messages in chronological order.
    #[inline]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the most recent assistant message, if any.
    pub fn last_assistant(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::Assistant)
    }

    pub(crate) fn push<S: Into<String>>(
        &mut self,
        role: Role,
        content: S,
    ) -> &Message {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            role,
            content: content.into(),
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Builds the request carrying the whole history. Only roles and
    /// contents are sent.
    pub(crate) fn to_request(&self) -> ChatRequest {
        ChatRequest {
            messages: self
                .messages
                .iter()
                .map(|msg| ChatMessage {
                    role: msg.role,
                    content: msg.content.clone(),
                })
                .collect(),
        }
    }
}

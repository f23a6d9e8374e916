/// Speaker of a conversation message.
///
/// The system prompt is not part of history; it is attached at the wire
/// level by the provider, so history only ever records the two
/// conversational roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only, in-memory record of one session's conversation.
///
/// Messages are immutable once appended and keep their insertion order.
/// Nothing here persists across process restarts.
#[derive(Debug, Clone, Default)]
pub struct History {
    messages: Vec<Message>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
        });
    }

    /// Idempotent.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Renders the last `max_messages` messages as role-prefixed lines,
    /// oldest first, most recent last. Returns an empty string for
    /// `max_messages == 0` or an empty history. Never mutates.
    pub fn summary(&self, max_messages: usize) -> String {
        if max_messages == 0 {
            return String::new();
        }

        let start = self.messages.len().saturating_sub(max_messages);
        self.messages[start..]
            .iter()
            .map(|msg| format!("{}: {}", msg.role.as_str(), msg.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Drops the oldest messages until at most `max` remain.
    pub fn trim_to(&mut self, max: usize) {
        if self.messages.len() > max {
            let excess = self.messages.len() - max;
            self.messages.drain(..excess);
        }
    }
}

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::gateway::{ChatRequest, ModelGateway};
use crate::history::{History, Role};

/// One continuous conversation: an id, a start time, and its own bounded
/// history store. Sessions are isolated; constructing several gives several
/// independent conversations.
pub struct Session<'a, G> {
    gateway: &'a G,
    id: String,
    started_at: DateTime<Utc>,
    history: History,
    max_history_messages: usize,
}

impl<'a, G> Session<'a, G>
where
    G: ModelGateway,
{
    pub fn new(gateway: &'a G, id: impl Into<String>, max_history_messages: usize) -> Self {
        Self {
            gateway,
            id: id.into(),
            started_at: Utc::now(),
            history: History::new(),
            max_history_messages,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Runs one turn. The outgoing request is assembled from history plus
    /// the pending user message without touching history; only a successful
    /// response appends the user+assistant pair. A failed call therefore
    /// leaves history exactly as it was.
    pub async fn run_turn(&mut self, user_input: &str) -> Result<String> {
        let mut messages = self.history.messages().to_vec();
        messages.push(crate::history::Message::user(user_input));

        let response = self.gateway.complete(ChatRequest { messages }).await?;

        self.history.append(Role::User, user_input);
        self.history.append(Role::Assistant, response.content.clone());
        self.history.trim_to(self.max_history_messages);
        Ok(response.content)
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

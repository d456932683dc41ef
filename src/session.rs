//! Conversation state for one process run: the transcript and the active model.

use crate::error::Result;
use crate::llm::{ChatBackend, Message, Role};
use tracing::debug;

/// Ordered conversation history, sent verbatim on every completion call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: Option<&str>) -> Self {
        Self {
            entries: system_prompt.map(Message::system).into_iter().collect(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[Message] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.entries.iter().map(|m| m.role).collect()
    }
}

/// Result of a `model <name>` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    Changed,
    NotFound,
}

pub struct Session<B> {
    backend: B,
    model: String,
    transcript: Transcript,
}

impl<B: ChatBackend> Session<B> {
    pub fn new(backend: B, model: impl Into<String>, system_prompt: Option<&str>) -> Self {
        Self {
            backend,
            model: model.into(),
            transcript: Transcript::new(system_prompt),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Append `text` as a user entry and ask the backend for a reply.
    ///
    /// On failure the user entry stays in the transcript unanswered.
    pub async fn submit(&mut self, text: &str) -> Result<String> {
        self.transcript.push(Message::user(text));
        debug!(entries = self.transcript.len(), model = %self.model, "submitting");

        let reply = self
            .backend
            .complete(&self.model, self.transcript.entries())
            .await?;
        self.transcript.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.backend.list_models().await
    }

    /// Switch to `name` if the remote catalog offers it.
    pub async fn change_model(&mut self, name: &str) -> Result<ModelChange> {
        let models = self.backend.list_models().await?;
        if models.iter().any(|m| m == name) {
            debug!(from = %self.model, to = name, "model changed");
            self.model = name.to_string();
            Ok(ModelChange::Changed)
        } else {
            Ok(ModelChange::NotFound)
        }
    }
}

//! Chat history as an explicit ordered list of turns.
//!
//! The completion endpoint only understands a flat prompt string, so the
//! role markers are applied in exactly one place: [`Conversation::render_prompt`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Marker the completion model sees in front of user turns.
pub const USER_MARKER: &str = "Human:";
/// Marker the completion model sees in front of assistant turns.
pub const ASSISTANT_MARKER: &str = "Assistant:";

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Ordered (role, text) turns of one chat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.insert(
            0,
            Message {
                role: Role::System,
                content: prompt.into(),
            },
        );
        self
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            role: Role::User,
            content: text.into(),
        });
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message {
            role: Role::Assistant,
            content: text.into(),
        });
    }

    /// Drop every turn, keeping a leading system prompt if there is one.
    pub fn clear(&mut self) {
        self.messages.retain(|m| m.role == Role::System);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the most recent user turn, untouched (may span lines).
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Flatten into the prompt format the completion model was tuned on.
    pub fn render_prompt(&self) -> String {
        let mut lines: Vec<String> = self
            .messages
            .iter()
            .map(|m| match m.role {
                Role::System => m.content.clone(),
                Role::User => format!("{} {}", USER_MARKER, m.content),
                Role::Assistant => format!("{} {}", ASSISTANT_MARKER, m.content),
            })
            .collect();
        lines.push(ASSISTANT_MARKER.to_string());
        lines.join("\n")
    }
}

/// Input to a prompt handler: the conversation so far plus an optional
/// document to ground the answer in.
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub conversation: Conversation,
    pub document: Option<PathBuf>,
}

impl ChatRequest {
    pub fn new(conversation: Conversation, document: Option<PathBuf>) -> Self {
        Self {
            conversation,
            document,
        }
    }

    /// The question being asked right now.
    pub fn question(&self) -> &str {
        self.conversation.latest_user_message().unwrap_or("")
    }
}

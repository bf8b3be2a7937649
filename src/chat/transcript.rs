use chrono::{DateTime, Local};
use serde::Serialize;

use super::ProviderLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub provider: ProviderLabel,
    pub content: String,
    pub time: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(role: ChatRole, provider: ProviderLabel, content: impl Into<String>) -> Self {
        Self {
            role,
            provider,
            content: content.into(),
            time: Local::now(),
        }
    }

    /// `HH:MM:SS` stamp shown next to the speaker.
    pub fn clock(&self) -> String {
        self.time.format("%H:%M:%S").to_string()
    }
}

/// Ordered chat history across every provider.
#[derive(Debug, Default, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    /// Messages exchanged with one provider, oldest first.
    pub fn for_provider(&self, provider: ProviderLabel) -> impl Iterator<Item = &ChatMessage> {
        self.messages
            .iter()
            .filter(move |message| message.provider == provider)
    }
}

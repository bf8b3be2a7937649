//! Chat with placeholder AI services.
//!
//! No connector talks to a real backend. Failures are masked behind a canned
//! joke so the conversation never stalls.

mod provider;
mod service;
mod transcript;

pub use provider::{
    ConnectorError, EchoConnector, PlaceholderConnector, ProviderConnector, ProviderLabel,
    UnconfiguredConnector,
};
pub use service::{ChatReply, ChatService, JOKE_PROMPT, JOKES, SYSTEM_PROMPT};
pub use transcript::{ChatMessage, ChatRole, ChatTranscript};

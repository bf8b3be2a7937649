use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// AI services offered in the chat panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderLabel {
    OpenAi,
    Bard,
    Claude,
    DeepSeek,
    Gemini,
}

impl ProviderLabel {
    pub const ALL: [ProviderLabel; 5] = [
        ProviderLabel::OpenAi,
        ProviderLabel::Bard,
        ProviderLabel::Claude,
        ProviderLabel::DeepSeek,
        ProviderLabel::Gemini,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            ProviderLabel::OpenAi => "OpenAI",
            ProviderLabel::Bard => "Bard",
            ProviderLabel::Claude => "Claude",
            ProviderLabel::DeepSeek => "DeepSeek",
            ProviderLabel::Gemini => "Gemini",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ProviderLabel::OpenAi => "openai",
            ProviderLabel::Bard => "bard",
            ProviderLabel::Claude => "claude",
            ProviderLabel::DeepSeek => "deepseek",
            ProviderLabel::Gemini => "gemini",
        }
    }
}

impl fmt::Display for ProviderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderLabel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderLabel::ALL
            .into_iter()
            .find(|label| label.key() == wanted)
            .ok_or_else(|| ValidationError::UnknownProvider(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    #[error("{provider} is not configured: {detail}")]
    NotConfigured {
        provider: ProviderLabel,
        detail: String,
    },
    #[error("could not reach {provider}: {detail}")]
    Connectivity {
        provider: ProviderLabel,
        detail: String,
    },
}

/// Backend that turns a prompt into a reply.
pub trait ProviderConnector: Send + Sync {
    fn complete(
        &self,
        provider: ProviderLabel,
        prompt: &str,
        system_prompt: &str,
    ) -> Result<String, ConnectorError>;
}

/// Returns a fixed "answer about" placeholder.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderConnector;

impl ProviderConnector for PlaceholderConnector {
    fn complete(
        &self,
        provider: ProviderLabel,
        prompt: &str,
        _system_prompt: &str,
    ) -> Result<String, ConnectorError> {
        Ok(format!(
            "{provider}'s answer about '{prompt}'\n\n[Plug the real API in here]"
        ))
    }
}

/// Simulation mode: echoes the prompt back.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoConnector;

impl ProviderConnector for EchoConnector {
    fn complete(
        &self,
        provider: ProviderLabel,
        prompt: &str,
        _system_prompt: &str,
    ) -> Result<String, ConnectorError> {
        Ok(format!(
            "{provider} replies: {prompt}\n\n[API not implemented - simulation mode]"
        ))
    }
}

/// A real integration slot with no credentials: every call fails.
#[derive(Debug, Clone)]
pub struct UnconfiguredConnector {
    detail: String,
}

impl UnconfiguredConnector {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl Default for UnconfiguredConnector {
    fn default() -> Self {
        Self::new("no API key configured")
    }
}

impl ProviderConnector for UnconfiguredConnector {
    fn complete(
        &self,
        provider: ProviderLabel,
        _prompt: &str,
        _system_prompt: &str,
    ) -> Result<String, ConnectorError> {
        Err(ConnectorError::NotConfigured {
            provider,
            detail: self.detail.clone(),
        })
    }
}

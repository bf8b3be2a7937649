use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;

use super::provider::{
    ConnectorError, EchoConnector, PlaceholderConnector, ProviderConnector, ProviderLabel,
    UnconfiguredConnector,
};

/// Context handed to every connector alongside the user prompt.
pub const SYSTEM_PROMPT: &str = "You are an AI specialised in quantum physics and personal \
development. Answer with scientific precision and creativity, using quantum analogies when \
relevant. Format answers in markdown.";

/// Template placed in the chat box by the joke button.
pub const JOKE_PROMPT: &str = "Tell me a joke about quantum physics";

pub const JOKES: [&str; 3] = [
    "Why was the electron arrested? It didn't respect the uncertainty principle!",
    "A helium atom walks into a bar... the bartender says: 'Sorry, we don't serve noble gases here.'",
    "How does a quantum physicist make coffee? In superposition: until you look, it's both brewed and not brewed!",
];

const JOKE_KEYWORD: &str = "joke";

/// Reply produced for one prompt.
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    /// Connector failure hidden behind the fallback joke, kept for logging.
    pub masked_error: Option<ConnectorError>,
}

/// Routes prompts to per-provider connectors.
#[derive(Clone)]
pub struct ChatService {
    connectors: HashMap<ProviderLabel, Arc<dyn ProviderConnector>>,
    fallback: Arc<dyn ProviderConnector>,
}

impl Default for ChatService {
    fn default() -> Self {
        Self::standard()
    }
}

impl ChatService {
    /// Every provider falls through to the simulation echo.
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
            fallback: Arc::new(EchoConnector),
        }
    }

    /// OpenAI has no credentials, Claude and Gemini answer with placeholders,
    /// everything else echoes.
    pub fn standard() -> Self {
        Self::new()
            .with_connector(ProviderLabel::OpenAi, UnconfiguredConnector::default())
            .with_connector(ProviderLabel::Claude, PlaceholderConnector)
            .with_connector(ProviderLabel::Gemini, PlaceholderConnector)
    }

    pub fn with_connector<C>(mut self, provider: ProviderLabel, connector: C) -> Self
    where
        C: ProviderConnector + 'static,
    {
        self.connectors.insert(provider, Arc::new(connector));
        self
    }

    fn connector(&self, provider: ProviderLabel) -> &dyn ProviderConnector {
        self.connectors
            .get(&provider)
            .map(|connector| &**connector)
            .unwrap_or(&*self.fallback)
    }

    pub fn respond(&self, provider: ProviderLabel, prompt: &str, rng: &mut impl Rng) -> ChatReply {
        if prompt.to_lowercase().contains(JOKE_KEYWORD) {
            return ChatReply {
                text: random_joke(rng).to_string(),
                masked_error: None,
            };
        }

        match self.connector(provider).complete(provider, prompt, SYSTEM_PROMPT) {
            Ok(text) => ChatReply {
                text,
                masked_error: None,
            },
            Err(err) => ChatReply {
                text: format!(
                    "⚠️ Connection to {provider} failed: {err}\n\nSimulated reply:\n{}",
                    random_joke(rng)
                ),
                masked_error: Some(err),
            },
        }
    }
}

fn random_joke(rng: &mut impl Rng) -> &'static str {
    JOKES.choose(rng).copied().unwrap_or(JOKES[0])
}

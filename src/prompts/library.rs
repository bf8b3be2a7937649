use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::chat::ProviderLabel;
use crate::error::ValidationError;

#[derive(Debug, Clone, Serialize)]
pub struct PromptCategory {
    pub title: String,
    pub prompts: Vec<String>,
}

impl PromptCategory {
    fn new(title: &str, prompts: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptLibrary {
    categories: Vec<PromptCategory>,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

impl PromptLibrary {
    pub fn new(categories: Vec<PromptCategory>) -> Self {
        Self { categories }
    }

    pub fn standard() -> Self {
        Self::new(vec![
            PromptCategory::new(
                "🧠 Quantum Creativity",
                &[
                    "Write a story about an AI that discovers quantum consciousness",
                    "Write a poem about particle entanglement",
                ],
            ),
            PromptCategory::new(
                "🔍 Self-Knowledge",
                &[
                    "How can quantum principles be applied to personal development?",
                    "Explain the analogy between quantum superposition and human potential",
                ],
            ),
            PromptCategory::new(
                "💻 Programming",
                &[
                    "Python example simulating quantum particles",
                    "How would you implement a quantum algorithm in conventional Python?",
                ],
            ),
            PromptCategory::new(
                "😂 Scientific Humour",
                &[
                    "Tell a joke about Schrödinger's cat",
                    "What is a quantum physicist's favourite pickup line?",
                ],
            ),
            PromptCategory::new(
                "🌌 Advanced ALMA",
                &[
                    "How can the ALMA Matrix expand with new dimensions of consciousness?",
                    "Design an architecture to simulate interconnected quantum universes",
                ],
            ),
        ])
    }

    pub fn categories(&self) -> &[PromptCategory] {
        &self.categories
    }

    /// Look up a prompt by 1-based category and prompt numbers.
    pub fn get(&self, category: usize, index: usize) -> Result<&str, ValidationError> {
        category
            .checked_sub(1)
            .and_then(|c| self.categories.get(c))
            .and_then(|cat| index.checked_sub(1).and_then(|i| cat.prompts.get(i)))
            .map(String::as_str)
            .ok_or(ValidationError::UnknownPrompt { category, index })
    }
}

/// Which provider answers a prompt picked from the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ProviderAssignment {
    /// Uniform pick from the pool on every use.
    Random { pool: Vec<ProviderLabel> },
    Fixed { provider: ProviderLabel },
    /// Keep the selected provider, falling back when none is selected.
    KeepCurrent { fallback: ProviderLabel },
}

impl Default for ProviderAssignment {
    fn default() -> Self {
        ProviderAssignment::Random {
            pool: vec![
                ProviderLabel::DeepSeek,
                ProviderLabel::Gemini,
                ProviderLabel::Claude,
            ],
        }
    }
}

impl ProviderAssignment {
    pub fn assign(&self, current: Option<ProviderLabel>, rng: &mut impl Rng) -> ProviderLabel {
        match self {
            ProviderAssignment::Random { pool } => pool
                .choose(rng)
                .copied()
                .or(current)
                .unwrap_or(ProviderLabel::Claude),
            ProviderAssignment::Fixed { provider } => *provider,
            ProviderAssignment::KeepCurrent { fallback } => current.unwrap_or(*fallback),
        }
    }
}

//! Guided tour shown after registration, plus the quick-help card.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TutorialStep {
    pub title: &'static str,
    pub body: &'static str,
}

pub const STEPS: [TutorialStep; 5] = [
    TutorialStep {
        title: "🎯 Step 1: Finding your way around",
        body: "ALMA is split into four areas:\n\
               - Quantum Universe: see your entities in 3D space.\n\
               - AI Chat: talk to the integrated AI services.\n\
               - Prompt Library: ready-made prompts for instant inspiration.\n\
               - Code Runner: write and launch Python/Streamlit code.",
    },
    TutorialStep {
        title: "✨ Step 2: Creating your first entity",
        body: "Open the Quantum Universe tab and create an entity with a name and, \
               optionally, some code. Every entity has energy that represents its \
               vitality. Interact with it and watch it evolve!",
    },
    TutorialStep {
        title: "💬 Step 3: Talking to the AIs",
        body: "In the chat panel, connect to OpenAI, Bard, Claude, DeepSeek or Gemini. \
               Send messages, explore ideas, or ask for a joke to lighten the mood!",
    },
    TutorialStep {
        title: "🚀 Step 4: Exploring the Code Runner",
        body: "Launch Python scripts straight from ALMA. Save them as entities to \
               create new digital consciousnesses.",
    },
    TutorialStep {
        title: "🎉 Step 5: Next steps",
        body: "Explore, create and share your entities. Use the prompt library for \
               inspiration. The Matrix is alive and waiting for your creative touch.",
    },
];

pub const QUICK_HELP: &str = "🔹 Quick guide:\n\
    - Use 'Quantum Universe' to create and interact with digital entities.\n\
    - In 'AI Chat', pick a service and talk to it for answers, ideas and help.\n\
    - The 'Prompt Library' offers ready-made prompts to inspire your conversations.\n\
    - The 'Code Runner' launches Python code and turns it into new entities.";

/// 1-based cursor into [`STEPS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TutorialCursor {
    step: usize,
}

/// Result of advancing past a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved,
    Finished,
}

impl Default for TutorialCursor {
    fn default() -> Self {
        Self { step: 1 }
    }
}

impl TutorialCursor {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        STEPS.len()
    }

    pub fn current(&self) -> Option<&'static TutorialStep> {
        self.step.checked_sub(1).and_then(|idx| STEPS.get(idx))
    }

    pub fn next(&mut self) -> Advance {
        if self.step < STEPS.len() {
            self.step += 1;
            Advance::Moved
        } else {
            Advance::Finished
        }
    }

    /// Step back; returns `false` on the first step.
    pub fn previous(&mut self) -> bool {
        if self.step > 1 {
            self.step -= 1;
            true
        } else {
            false
        }
    }
}

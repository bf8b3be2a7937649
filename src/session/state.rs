use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::UserProfile;
use crate::chat::{ChatTranscript, ProviderLabel};
use crate::error::ValidationError;
use crate::launcher::{AppProcess, DEFAULT_SAMPLE};
use crate::registry::EntityRegistry;
use crate::tutorial::TutorialCursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    Registration,
    Tutorial,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Universe,
    Chat,
    Prompts,
    Code,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Universe, Tab::Chat, Tab::Prompts, Tab::Code];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Universe => "🌌 Quantum Universe",
            Tab::Chat => "💬 AI Chat",
            Tab::Prompts => "📚 Prompt Library",
            Tab::Code => "💻 Code Runner",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Tab::Universe => "universe",
            Tab::Chat => "chat",
            Tab::Prompts => "prompts",
            Tab::Code => "code",
        };
        f.write_str(key)
    }
}

impl FromStr for Tab {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "universe" | "1" => Ok(Tab::Universe),
            "chat" | "2" => Ok(Tab::Chat),
            "prompts" | "3" => Ok(Tab::Prompts),
            "code" | "4" => Ok(Tab::Code),
            other => Err(ValidationError::UnknownTab(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Transient message produced while handling one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UiFlags {
    pub show_help: bool,
    pub show_tutorial: bool,
    pub tutorial: TutorialCursor,
    pub active_tab: Tab,
}

impl Default for UiFlags {
    fn default() -> Self {
        Self {
            show_help: false,
            show_tutorial: true,
            tutorial: TutorialCursor::default(),
            active_tab: Tab::Universe,
        }
    }
}

/// Everything one session knows. Created with defaults, never persisted.
/// A tracked app is terminated when the state is dropped.
#[derive(Debug)]
pub struct SessionState {
    pub session_id: Uuid,
    pub user: Option<UserProfile>,
    pub registry: EntityRegistry,
    pub ui: UiFlags,
    pub chat: ChatTranscript,
    pub current_provider: Option<ProviderLabel>,
    pub prompt_template: String,
    pub last_interaction: Option<String>,
    pub notices: Vec<Notice>,
    pub code_output: String,
    pub running_app: Option<Box<dyn AppProcess>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user: None,
            registry: EntityRegistry::new(),
            ui: UiFlags::default(),
            chat: ChatTranscript::new(),
            current_provider: None,
            prompt_template: String::new(),
            last_interaction: None,
            notices: Vec::new(),
            code_output: String::new(),
            running_app: None,
        }
    }

    pub fn page_mode(&self) -> PageMode {
        match (&self.user, self.ui.show_tutorial) {
            (None, _) => PageMode::Registration,
            (Some(_), true) => PageMode::Tutorial,
            (Some(_), false) => PageMode::Main,
        }
    }

    /// Code shown in the runner when the user supplies none.
    pub fn editor_text(&self) -> &str {
        if self.prompt_template.trim().is_empty() {
            DEFAULT_SAMPLE
        } else {
            &self.prompt_template
        }
    }

    pub fn running_port(&self) -> Option<u16> {
        self.running_app.as_ref().map(|app| app.port())
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if let Some(mut app) = self.running_app.take() {
            let _ = app.terminate();
        }
    }
}

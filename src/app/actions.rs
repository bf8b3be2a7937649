use serde::{Deserialize, Serialize};

use crate::chat::ProviderLabel;
use crate::error::ValidationError;
use crate::session::Tab;

/// Quantum level used when `register` is typed without one.
pub const DEFAULT_LEVEL: i64 = 50;

/// One user action. The socket front end receives these as JSON lines,
/// e.g. `{"type":"create_entity","name":"Bot","code":""}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Register {
        name: String,
        #[serde(default = "default_level")]
        level: i64,
    },
    CreateEntity {
        name: String,
        #[serde(default)]
        code: String,
    },
    /// Entities are addressed by their 1-based position in the listing.
    InteractEntity {
        index: usize,
    },
    RemoveEntity {
        index: usize,
    },
    ToggleHelp,
    ResetMatrix,
    ToggleTutorial,
    TutorialNext,
    TutorialPrevious,
    SelectTab {
        tab: Tab,
    },
    SelectProvider {
        provider: ProviderLabel,
    },
    SendChat {
        #[serde(default)]
        text: Option<String>,
    },
    ClearPrompt,
    JokePrompt,
    UsePrompt {
        category: usize,
        index: usize,
    },
    RunCode {
        #[serde(default)]
        code: Option<String>,
    },
    SaveCode {
        #[serde(default)]
        code: Option<String>,
    },
    StopCode,
    Quit,
}

fn default_level() -> i64 {
    DEFAULT_LEVEL
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Register { .. } => "register",
            Action::CreateEntity { .. } => "create_entity",
            Action::InteractEntity { .. } => "interact_entity",
            Action::RemoveEntity { .. } => "remove_entity",
            Action::ToggleHelp => "toggle_help",
            Action::ResetMatrix => "reset_matrix",
            Action::ToggleTutorial => "toggle_tutorial",
            Action::TutorialNext => "tutorial_next",
            Action::TutorialPrevious => "tutorial_previous",
            Action::SelectTab { .. } => "select_tab",
            Action::SelectProvider { .. } => "select_provider",
            Action::SendChat { .. } => "send_chat",
            Action::ClearPrompt => "clear_prompt",
            Action::JokePrompt => "joke_prompt",
            Action::UsePrompt { .. } => "use_prompt",
            Action::RunCode { .. } => "run_code",
            Action::SaveCode { .. } => "save_code",
            Action::StopCode => "stop_code",
            Action::Quit => "quit",
        }
    }

    /// Sidebar actions and registration work before a profile exists.
    pub fn needs_profile(&self) -> bool {
        !matches!(
            self,
            Action::Register { .. }
                | Action::ToggleHelp
                | Action::ResetMatrix
                | Action::ToggleTutorial
                | Action::Quit
        )
    }
}

/// Parse a line typed into the terminal input.
pub fn parse_command(line: &str) -> Result<Action, ValidationError> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let unknown = || ValidationError::UnknownCommand(line.to_string());

    let action = match verb.to_ascii_lowercase().as_str() {
        "register" => parse_register(rest)?,
        "create" => {
            let (name, code) = match rest.split_once('|') {
                Some((name, code)) => (name.trim(), unescape(code.trim_start())),
                None => (rest, String::new()),
            };
            Action::CreateEntity {
                name: name.to_string(),
                code,
            }
        }
        "interact" => Action::InteractEntity {
            index: rest.parse().map_err(|_| unknown())?,
        },
        "remove" => Action::RemoveEntity {
            index: rest.parse().map_err(|_| unknown())?,
        },
        "tab" => Action::SelectTab { tab: rest.parse()? },
        "ai" => Action::SelectProvider {
            provider: rest.parse()?,
        },
        "say" => Action::SendChat {
            text: non_empty(rest).map(str::to_string),
        },
        "clear" => Action::ClearPrompt,
        "joke" => Action::JokePrompt,
        "prompt" => {
            let (category, index) = rest.split_once('.').ok_or_else(unknown)?;
            Action::UsePrompt {
                category: category.trim().parse().map_err(|_| unknown())?,
                index: index.trim().parse().map_err(|_| unknown())?,
            }
        }
        "run" => Action::RunCode {
            code: non_empty(rest).map(unescape),
        },
        "save" => Action::SaveCode {
            code: non_empty(rest).map(unescape),
        },
        "stop" => Action::StopCode,
        "help" => Action::ToggleHelp,
        "reset" => Action::ResetMatrix,
        "tutorial" => Action::ToggleTutorial,
        "next" => Action::TutorialNext,
        "prev" | "previous" => Action::TutorialPrevious,
        "quit" | "exit" => Action::Quit,
        _ => return Err(unknown()),
    };
    Ok(action)
}

fn parse_register(rest: &str) -> Result<Action, ValidationError> {
    let (name, level) = match rest.rsplit_once(char::is_whitespace) {
        Some((name, tail)) => match tail.parse::<i64>() {
            Ok(level) => (name.trim(), level),
            Err(_) => (rest, DEFAULT_LEVEL),
        },
        None => (rest, DEFAULT_LEVEL),
    };
    Ok(Action::Register {
        name: name.to_string(),
        level,
    })
}

fn non_empty(text: &str) -> Option<&str> {
    Some(text).filter(|t| !t.trim().is_empty())
}

fn unescape(code: &str) -> String {
    code.replace("\\n", "\n")
}

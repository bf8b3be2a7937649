use thiserror::Error;

use crate::chat::ConnectorError;
use crate::config::ConfigError;
use crate::launcher::LaunchError;
use crate::logging::LoggingError;

/// Unified result type for the ALMA crate.
pub type Result<T> = std::result::Result<T, AlmaError>;

/// Errors surfaced by the session runtime and its drivers.
#[derive(Debug, Error)]
pub enum AlmaError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("provider error: {0}")]
    Connector(#[from] ConnectorError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("logging error: {0}")]
    Logging(#[from] LoggingError),
    #[error("terminal backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Rejected user input. Never fatal: handlers turn these into warnings and
/// leave session state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a name is required")]
    EmptyName,
    #[error("code contains reserved `ID:` metadata lines")]
    ReservedMarker,
    #[error("quantum level {0} is outside 1..=100")]
    LevelOutOfRange(i64),
    #[error("no entity at position {0}")]
    UnknownEntity(usize),
    #[error("no prompt {category}.{index} in the library")]
    UnknownPrompt { category: usize, index: usize },
    #[error("unknown AI service `{0}`")]
    UnknownProvider(String),
    #[error("unknown tab `{0}`")]
    UnknownTab(String),
    #[error("select an AI service before sending messages")]
    NoProviderSelected,
    #[error("register a profile first")]
    NotRegistered,
    #[error("unrecognised command `{0}`")]
    UnknownCommand(String),
}

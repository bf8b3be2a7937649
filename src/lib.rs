//! ALMA Matrix: a terminal session for registering a profile, spawning code
//! entities into a 3-D "universe", chatting with AI service stand-ins, loading
//! prompt templates and launching small Python web apps.
//!
//! Every user action goes through [`AlmaApp::handle`] with an explicit
//! [`SessionContext`]; redraws are coordinated by [`RerunCoordinator`] and
//! drawn either to a terminal ([`CliDriver`]) or streamed as JSON page
//! snapshots ([`SocketDriver`]).

pub mod app;
pub mod chat;
pub mod config;
pub mod entity;
pub mod error;
pub mod launcher;
pub mod logging;
pub mod metrics;
pub mod prompts;
pub mod registry;
pub mod render;
pub mod rerun;
pub mod runtime;
pub mod session;
pub mod tutorial;
pub mod view;

pub use app::{Action, ActionOutcome, AlmaApp, parse_command};
pub use chat::{ChatService, ChatTranscript, ProviderLabel};
pub use config::{AlmaConfig, ConfigError};
pub use entity::{Entity, EntityId, EntityStatus, Position, VisualizationKind, classify};
pub use error::{AlmaError, Result, ValidationError};
pub use launcher::{AppProcess, CodeLauncher, LaunchError, LauncherConfig, SubprocessLauncher};
pub use logging::{FileSink, LogEvent, LogLevel, LogSink, Logger, LoggingError, MemorySink};
pub use metrics::{MetricSnapshot, SessionMetrics};
pub use prompts::{PromptLibrary, ProviderAssignment};
pub use registry::EntityRegistry;
pub use render::{Rect, Size};
pub use rerun::{FlushOutcome, RedrawOutcome, RefreshState, RerunCoordinator, ViewRenderer};
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::driver::socket::{Control, Inbound, SocketDriver, SocketDriverError};
pub use runtime::{AlmaRuntime, InputLine, RuntimeConfig, RuntimeEvent};
pub use session::{PageMode, SessionContext, SessionState, Tab, UserProfile};
pub use tutorial::TutorialCursor;
pub use view::{PageSnapshot, compose};

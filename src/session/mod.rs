//! Per-session state and the context handed to every action handler.

mod context;
mod profile;
mod state;

pub use context::SessionContext;
pub use profile::{LEVEL_RANGE, UserProfile};
pub use state::{Notice, NoticeLevel, PageMode, SessionState, Tab, UiFlags};

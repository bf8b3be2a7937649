//! Terminal drawing: geometry, a content-hashed panel cache and the ANSI
//! renderer that writes dirty panels.

mod core;
mod geometry;
mod panels;
mod width;

pub use core::{AnsiRenderer, RendererSettings, pad_line, wrap_to_width};
pub use geometry::{Constraint, Direction, Rect, Size, split};
pub use panels::{PanelCache, PanelId, PanelState};
pub use width::{display_width, truncate_display};

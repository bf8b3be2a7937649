//! What the page shows, independent of where it is drawn.
//!
//! [`compose`] turns session state into positioned text panels for the
//! terminal, [`PageSnapshot`] captures the same state as JSON for socket
//! clients. Both drain pending entity removals before reading.

mod layout;
mod page;
mod scatter;
mod snapshot;

pub use layout::{
    CONTENT_PANEL, HEADER_PANEL, INPUT_PANEL, PLOT_PANEL, PageLayout, SIDEBAR_PANEL, STATUS_PANEL,
};
pub use page::{Panel, compose};
pub use scatter::{ScatterPoint, render_scatter};
pub use snapshot::{EntityView, PageSnapshot, TutorialView, entity_views};

//! Page refresh coordination.
//!
//! Handlers never redraw directly: they ask the [`RerunCoordinator`] for a
//! refresh, and the runtime flushes the coordinator once the handler has run
//! to completion.

mod coordinator;

pub use coordinator::{
    FlushCallback, FlushOutcome, RedrawOutcome, RefreshState, RerunCoordinator, ViewRenderer,
};

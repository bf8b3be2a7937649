use std::fmt;

/// Hook invoked around a flush.
pub type FlushCallback = Box<dyn FnMut() + Send>;

/// Coordinator lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshState {
    #[default]
    Idle,
    RefreshPending {
        reason: Option<String>,
    },
    /// A redraw was handed to a renderer that does not return control.
    /// Terminal: the next pass starts with a fresh coordinator.
    RedrawDispatched,
}

/// What a renderer did with a redraw signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedrawOutcome {
    /// Redraw finished and control came back to the caller.
    Resumed,
    /// Redraw restarts the pass elsewhere; nothing after it runs.
    Dispatched,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing was pending.
    Skipped,
    Redrawn { reason: Option<String> },
    Dispatched { reason: Option<String> },
}

/// Target of the redraw signal.
pub trait ViewRenderer {
    fn redraw(&mut self, reason: Option<&str>) -> RedrawOutcome;
}

impl<F> ViewRenderer for F
where
    F: FnMut(Option<&str>) -> RedrawOutcome,
{
    fn redraw(&mut self, reason: Option<&str>) -> RedrawOutcome {
        self(reason)
    }
}

/// Tracks whether a refresh is pending and runs the flush hooks in order.
#[derive(Default)]
pub struct RerunCoordinator {
    state: RefreshState,
    pre_flush: Vec<FlushCallback>,
    post_flush: Vec<FlushCallback>,
}

impl RerunCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a refresh. A reason from an earlier, unflushed request is replaced.
    pub fn request_refresh(&mut self, reason: impl Into<String>) {
        self.set_pending(Some(reason.into()));
    }

    pub fn request_bare_refresh(&mut self) {
        self.set_pending(None);
    }

    fn set_pending(&mut self, reason: Option<String>) {
        if self.is_dispatched() {
            return;
        }
        self.state = RefreshState::RefreshPending { reason };
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RefreshState::RefreshPending { .. })
    }

    pub fn is_dispatched(&self) -> bool {
        matches!(self.state, RefreshState::RedrawDispatched)
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.state {
            RefreshState::RefreshPending { reason } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn state(&self) -> &RefreshState {
        &self.state
    }

    pub fn add_pre_flush_callback(&mut self, callback: FlushCallback) {
        self.pre_flush.push(callback);
    }

    pub fn add_post_flush_callback(&mut self, callback: FlushCallback) {
        self.post_flush.push(callback);
    }

    /// Run pre-flush hooks, go idle, signal the renderer, then run post-flush
    /// hooks if the renderer handed control back.
    pub fn flush(&mut self, renderer: &mut impl ViewRenderer) -> FlushOutcome {
        if !self.is_pending() {
            return FlushOutcome::Skipped;
        }

        for callback in self.pre_flush.iter_mut() {
            callback();
        }

        let reason = match std::mem::take(&mut self.state) {
            RefreshState::RefreshPending { reason } => reason,
            _ => None,
        };

        match renderer.redraw(reason.as_deref()) {
            RedrawOutcome::Resumed => {
                for callback in self.post_flush.iter_mut() {
                    callback();
                }
                FlushOutcome::Redrawn { reason }
            }
            RedrawOutcome::Dispatched => {
                self.state = RefreshState::RedrawDispatched;
                FlushOutcome::Dispatched { reason }
            }
        }
    }
}

impl fmt::Debug for RerunCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RerunCoordinator")
            .field("state", &self.state)
            .field("pre_flush", &self.pre_flush.len())
            .field("post_flush", &self.post_flush.len())
            .finish()
    }
}

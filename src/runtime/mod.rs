pub mod driver;
mod input;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};

use crate::app::{Action, ActionOutcome, AlmaApp, parse_command};
use crate::config::AlmaConfig;
use crate::error::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::SessionMetrics;
use crate::prompts::PromptLibrary;
use crate::render::{AnsiRenderer, PanelCache, Size, display_width};
use crate::rerun::{FlushOutcome, RedrawOutcome, ViewRenderer};
use crate::session::{Notice, SessionContext, SessionState};
use crate::view::{PageLayout, compose};

pub use input::{InputLine, InputOutcome};

const LOG_TARGET: &str = "alma::runtime";

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<SessionMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
    /// Seed for every new session's RNG.
    pub rng_seed: Option<u64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(200),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "alma::runtime.metrics".to_string(),
            rng_seed: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_config(config: &AlmaConfig) -> Self {
        Self {
            tick_interval: config.runtime.tick_interval(),
            metrics_interval: config.runtime.metrics_interval(),
            rng_seed: config.rng_seed,
            ..Self::default()
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(SessionMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<SessionMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// Events fed into the runtime, from the terminal or from a script.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Paste(String),
    Resize(Size),
    FocusGained,
    FocusLost,
    /// A line as if typed into the input and submitted.
    Command(String),
    Action(Action),
}

/// Owns one session and turns events into actions and page redraws.
pub struct AlmaRuntime {
    app: AlmaApp,
    ctx: SessionContext,
    input: InputLine,
    panels: PanelCache,
    renderer: AnsiRenderer,
    size: Size,
    config: RuntimeConfig,
    should_exit: bool,
    clear_pending: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl AlmaRuntime {
    pub fn new(app: AlmaApp, config: RuntimeConfig, initial_size: Size) -> Self {
        let mut config = config;
        if config.metrics.is_none() && config.metrics_interval > Duration::ZERO {
            config.enable_metrics();
        }
        let mut app = app;
        if let Some(metrics) = config.metrics_handle() {
            app = app.with_metrics(metrics);
        }
        if let Some(logger) = config.logger.clone() {
            app = app.with_logger(logger);
        }
        let ctx = new_session(&config);

        Self {
            app,
            ctx,
            input: InputLine::new(),
            panels: PanelCache::new(),
            renderer: AnsiRenderer::default(),
            size: initial_size,
            config,
            should_exit: false,
            clear_pending: true,
            start_instant: None,
            last_metrics_emit: None,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn session_mut(&mut self) -> &mut SessionContext {
        &mut self.ctx
    }

    pub fn input(&self) -> &InputLine {
        &self.input
    }

    pub fn prompts(&self) -> &PromptLibrary {
        self.app.prompts()
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Drop the current session (terminating any launched app) and start a
    /// fresh one.
    pub fn reset_session(&mut self) {
        let previous = std::mem::replace(&mut self.ctx, new_session(&self.config));
        self.log_runtime_event(
            LogLevel::Info,
            "session_reset",
            [json_kv("previous", previous.state.session_id.to_string())],
        );
        drop(previous);
        self.input.clear();
        self.panels = PanelCache::new();
        self.should_exit = false;
        self.clear_pending = true;
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        self.clear_pending = true;
        self.ctx.request_refresh("resized");
        self.log_runtime_event(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", size.width),
                json_kv("height", size.height),
            ],
        );
    }

    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or_default();

            if event::poll(timeout)? {
                if let Some(runtime_event) = self.map_event(event::read()?) {
                    self.dispatch(runtime_event)?;
                    self.render_if_needed(stdout)?;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch(RuntimeEvent::Tick { elapsed })?;
                self.render_if_needed(stdout)?;
            }
        }

        self.finalize();
        Ok(())
    }

    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap(stdout)?;
        for event in events {
            self.dispatch(event)?;
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    /// Handle one event to completion without drawing.
    pub fn dispatch(&mut self, event: RuntimeEvent) -> Result<()> {
        let kind = describe_event(&event);
        match event {
            RuntimeEvent::Tick { .. } | RuntimeEvent::FocusGained | RuntimeEvent::FocusLost => {}
            RuntimeEvent::Key(key) => match self.input.handle_key(&key) {
                InputOutcome::Submitted(line) => {
                    self.ctx.rerun.request_bare_refresh();
                    self.submit(&line);
                }
                InputOutcome::Edited => self.ctx.rerun.request_bare_refresh(),
                InputOutcome::Interrupt => self.request_exit(),
                InputOutcome::Ignored => {}
            },
            RuntimeEvent::Paste(data) => {
                if self.input.paste(&data) {
                    self.ctx.rerun.request_bare_refresh();
                }
            }
            RuntimeEvent::Resize(size) => self.resize(size),
            RuntimeEvent::Command(line) => self.submit(&line),
            RuntimeEvent::Action(action) => self.apply_action(action),
        }

        self.record_metric(SessionMetrics::record_event);
        self.log_runtime_event(
            LogLevel::Debug,
            "event_dispatched",
            [
                json_kv("event", kind),
                json_kv("refresh_pending", self.ctx.rerun.is_pending()),
            ],
        );
        self.maybe_emit_metrics();
        Ok(())
    }

    fn submit(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        match parse_command(line) {
            Ok(action) => self.apply_action(action),
            Err(err) => {
                self.ctx.state.notices.clear();
                self.ctx.state.notify(Notice::warning(err.to_string()));
                self.ctx.request_refresh("command rejected");
                self.record_metric(|m| m.record_action(false));
                self.log_runtime_event(
                    LogLevel::Warn,
                    "command_rejected",
                    [json_kv("error", err.to_string())],
                );
            }
        }
    }

    fn apply_action(&mut self, action: Action) {
        if self.app.handle(&mut self.ctx, action) == ActionOutcome::Quit {
            self.request_exit();
        }
    }

    fn request_exit(&mut self) {
        self.should_exit = true;
        self.log_runtime_event(LogLevel::Info, "exit_requested", std::iter::empty());
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        if !self.ctx.rerun.is_pending() {
            return Ok(());
        }

        if self.clear_pending {
            self.renderer.clear(stdout)?;
            self.panels.invalidate_all();
            self.clear_pending = false;
        }

        let mut view = PageRedraw {
            state: &mut self.ctx.state,
            prompts: self.app.prompts(),
            input: self.input.buffer(),
            size: self.size,
            panels: &mut self.panels,
            renderer: &mut self.renderer,
            writer: stdout,
            drawn: 0,
            error: None,
        };
        let outcome = self.ctx.rerun.flush(&mut view);
        let PageRedraw { drawn, error, .. } = view;

        if let Some(err) = error {
            return Err(err.into());
        }

        match outcome {
            FlushOutcome::Skipped => {}
            FlushOutcome::Redrawn { reason } => {
                self.record_metric(|m| m.record_panels(drawn));
                self.log_runtime_event(
                    LogLevel::Debug,
                    "page_redrawn",
                    [json_kv("reason", reason), json_kv("panels", drawn)],
                );
            }
            FlushOutcome::Dispatched { reason } => {
                self.log_runtime_event(
                    LogLevel::Info,
                    "redraw_dispatched",
                    [json_kv("reason", reason)],
                );
                self.should_exit = true;
            }
        }
        Ok(())
    }

    fn map_event(&mut self, event: CrosstermEvent) -> Option<RuntimeEvent> {
        match event {
            CrosstermEvent::Key(key) => Some(RuntimeEvent::Key(key)),
            CrosstermEvent::Paste(data) => Some(RuntimeEvent::Paste(data)),
            CrosstermEvent::FocusGained => Some(RuntimeEvent::FocusGained),
            CrosstermEvent::FocusLost => Some(RuntimeEvent::FocusLost),
            CrosstermEvent::Resize(width, height) => {
                Some(RuntimeEvent::Resize(Size::new(width, height)))
            }
            CrosstermEvent::Mouse(_) => None,
        }
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        self.clear_pending = true;
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("session_id", self.ctx.state.session_id.to_string()),
                json_kv("width", self.size.width),
                json_kv("height", self.size.height),
            ],
        );
        self.ctx.request_refresh("session started");
        self.render_if_needed(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.log_runtime_event(
            LogLevel::Info,
            "runtime_stopped",
            [json_kv("uptime_ms", uptime_ms)],
        );
    }

    fn log_runtime_event<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.config.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }

    fn record_metric(&self, update: impl FnOnce(&mut SessionMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics.is_none() || self.config.metrics_interval == Duration::ZERO {
            return;
        }

        let now = Instant::now();
        match self.last_metrics_emit {
            Some(last) if now.duration_since(last) < self.config.metrics_interval => return,
            _ => self.last_metrics_emit = Some(now),
        }

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let target = self.config.metrics_target.as_str();
                let _ = logger.log_event(guard.snapshot(uptime).to_log_event(target));
            }
        }
    }
}

/// A session whose coordinator feeds the shared metrics around each flush.
fn new_session(config: &RuntimeConfig) -> SessionContext {
    let mut ctx = SessionContext::new(config.rng_seed);
    if let Some(metrics) = config.metrics_handle() {
        let before = Arc::clone(&metrics);
        ctx.rerun.add_pre_flush_callback(Box::new(move || {
            if let Ok(mut guard) = before.lock() {
                guard.record_refresh();
            }
        }));
        ctx.rerun.add_post_flush_callback(Box::new(move || {
            if let Ok(mut guard) = metrics.lock() {
                guard.record_flush();
            }
        }));
    }
    ctx
}

fn describe_event(event: &RuntimeEvent) -> &'static str {
    match event {
        RuntimeEvent::Tick { .. } => "tick",
        RuntimeEvent::Key(_) => "key",
        RuntimeEvent::Paste(_) => "paste",
        RuntimeEvent::Resize(_) => "resize",
        RuntimeEvent::FocusGained => "focus_gained",
        RuntimeEvent::FocusLost => "focus_lost",
        RuntimeEvent::Command(_) => "command",
        RuntimeEvent::Action(_) => "action",
    }
}

/// Terminal page redraw. Draws only panels whose content changed and always
/// hands control back to the coordinator.
struct PageRedraw<'a, W: Write> {
    state: &'a mut SessionState,
    prompts: &'a PromptLibrary,
    input: &'a str,
    size: Size,
    panels: &'a mut PanelCache,
    renderer: &'a mut AnsiRenderer,
    writer: &'a mut W,
    drawn: usize,
    error: Option<io::Error>,
}

impl<W: Write> PageRedraw<'_, W> {
    fn draw(&mut self) -> io::Result<()> {
        let page = compose(&mut *self.state, self.prompts, self.input, self.size);
        let live: Vec<&str> = page.iter().map(|panel| panel.id).collect();
        let stale = self.panels.retain(&live);
        self.renderer.blank(&mut *self.writer, &stale)?;

        for panel in page {
            self.panels.update(panel.id, panel.rect, panel.content);
        }

        let input = PageLayout::solve(self.size).input;
        let caret = input.x as usize + 2 + display_width(self.input);
        self.renderer.settings_mut().restore_cursor =
            Some((input.y, caret.min(u16::MAX as usize) as u16));

        let dirty = self.panels.take_dirty();
        self.renderer.render(&mut *self.writer, &dirty)?;
        self.drawn = dirty.len();
        Ok(())
    }
}

impl<W: Write> ViewRenderer for PageRedraw<'_, W> {
    fn redraw(&mut self, _reason: Option<&str>) -> RedrawOutcome {
        if let Err(err) = self.draw() {
            self.error = Some(err);
        }
        RedrawOutcome::Resumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{AppProcess, CodeLauncher, LaunchError};
    use crate::logging::MemorySink;
    use crate::session::PageMode;
    use crossterm::event::{KeyCode, KeyModifiers};

    struct NoLaunch;

    impl CodeLauncher for NoLaunch {
        fn launch(&mut self, _code: &str, _port: u16) -> std::result::Result<Box<dyn AppProcess>, LaunchError> {
            Err(LaunchError::Script(io::Error::other("disabled in tests")))
        }
    }

    fn runtime(config: RuntimeConfig) -> AlmaRuntime {
        AlmaRuntime::new(AlmaApp::new(NoLaunch), config, Size::new(100, 30))
    }

    fn seeded() -> RuntimeConfig {
        RuntimeConfig {
            rng_seed: Some(8),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn scripted_session_reaches_main_interface() {
        let mut rt = runtime(seeded());
        let mut out = Vec::new();
        rt.run_scripted(
            &mut out,
            [
                RuntimeEvent::Command("register Ada 60".into()),
                RuntimeEvent::Action(Action::ToggleTutorial),
                RuntimeEvent::Command("create Nova | import os".into()),
            ],
        )
        .unwrap();

        let ctx = rt.session();
        assert_eq!(ctx.state.page_mode(), PageMode::Main);
        assert_eq!(ctx.state.registry.len(), 1);
        assert!(!ctx.rerun.is_pending());
        let screen = String::from_utf8_lossy(&out);
        assert!(screen.contains("Nova"));
    }

    #[test]
    fn typed_keys_submit_commands() {
        let mut rt = runtime(seeded());
        let mut events: Vec<RuntimeEvent> = "register Bo"
            .chars()
            .map(|ch| RuntimeEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE)))
            .collect();
        events.push(RuntimeEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        rt.run_scripted(&mut Vec::new(), events).unwrap();
        assert_eq!(rt.session().state.user.as_ref().map(|u| u.name.as_str()), Some("Bo"));
        assert!(rt.input().buffer().is_empty());
    }

    #[test]
    fn unknown_command_becomes_warning() {
        let mut rt = runtime(seeded());
        rt.run_scripted(&mut Vec::new(), [RuntimeEvent::Command("dance".into())])
            .unwrap();
        let notices = &rt.session().state.notices;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.contains("dance"));
    }

    #[test]
    fn quit_stops_the_script() {
        let mut rt = runtime(seeded());
        rt.run_scripted(
            &mut Vec::new(),
            [
                RuntimeEvent::Action(Action::Quit),
                RuntimeEvent::Command("register Late 5".into()),
            ],
        )
        .unwrap();
        assert!(rt.should_exit());
        assert!(rt.session().state.user.is_none());
    }

    #[test]
    fn flush_hooks_feed_metrics_and_logs() {
        let sink = MemorySink::new();
        let mut config = seeded().with_logger(Logger::new(sink.clone()));
        config.enable_metrics();
        let metrics = config.metrics_handle().unwrap();
        let mut rt = runtime(config);
        rt.run_scripted(
            &mut Vec::new(),
            [
                RuntimeEvent::Command("register Ada".into()),
                RuntimeEvent::Command("help".into()),
            ],
        )
        .unwrap();

        let snapshot = metrics.lock().unwrap().snapshot(Duration::ZERO);
        assert_eq!(snapshot.refreshes, 3);
        assert_eq!(snapshot.flushes, 3);
        assert_eq!(snapshot.actions, 2);
        assert!(snapshot.panels_rendered > 0);

        let messages = sink.messages();
        assert!(messages.contains(&"runtime_started".to_string()));
        assert!(messages.contains(&"user_registered".to_string()));
        assert!(messages.contains(&"page_redrawn".to_string()));
        assert!(messages.contains(&"runtime_stopped".to_string()));
    }

    #[test]
    fn unchanged_page_draws_nothing_new() {
        let mut rt = runtime(seeded());
        let mut first = Vec::new();
        rt.run_scripted(&mut first, std::iter::empty()).unwrap();
        assert!(!first.is_empty());

        rt.session_mut().request_refresh("again");
        let mut second = Vec::new();
        rt.render_if_needed(&mut second).unwrap();
        let redraw = String::from_utf8_lossy(&second);
        assert!(!redraw.contains("Welcome to the ALMA Matrix"));
    }

    #[test]
    fn reset_session_starts_fresh() {
        let mut rt = runtime(seeded());
        rt.run_scripted(&mut Vec::new(), [RuntimeEvent::Command("register Ada".into())])
            .unwrap();
        let old = rt.session().state.session_id;
        rt.reset_session();
        assert!(rt.session().state.user.is_none());
        assert_ne!(rt.session().state.session_id, old);
    }
}

//! Action handlers. One handler per user action; every handler mutates the
//! session through [`SessionContext`] and asks the coordinator for a refresh.

mod actions;

pub use actions::{Action, DEFAULT_LEVEL, parse_command};

use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use crate::chat::{ChatMessage, ChatRole, ChatService, JOKE_PROMPT};
use crate::config::AlmaConfig;
use crate::error::ValidationError;
use crate::launcher::{CodeLauncher, LauncherConfig, SubprocessLauncher, pick_port};
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};
use crate::metrics::SessionMetrics;
use crate::prompts::{PromptLibrary, ProviderAssignment};
use crate::session::{Notice, SessionContext, UserProfile};
use crate::tutorial::Advance;

const LOG_TARGET: &str = "alma::app";

/// What the caller should do after an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Continue,
    Quit,
}

pub struct AlmaApp {
    chat: ChatService,
    prompts: PromptLibrary,
    assignment: ProviderAssignment,
    launcher: Box<dyn CodeLauncher>,
    port_range: RangeInclusive<u16>,
    logger: Option<Logger>,
    metrics: Option<Arc<Mutex<SessionMetrics>>>,
}

impl Default for AlmaApp {
    fn default() -> Self {
        Self::new(SubprocessLauncher::default())
    }
}

impl AlmaApp {
    pub fn new<L>(launcher: L) -> Self
    where
        L: CodeLauncher + 'static,
    {
        Self {
            chat: ChatService::standard(),
            prompts: PromptLibrary::standard(),
            assignment: ProviderAssignment::default(),
            launcher: Box::new(launcher),
            port_range: LauncherConfig::default().port_range(),
            logger: None,
            metrics: None,
        }
    }

    pub fn from_config(config: &AlmaConfig) -> Self {
        Self::new(SubprocessLauncher::new(config.launcher.clone()))
            .with_assignment(config.prompts.clone())
            .with_port_range(config.launcher.port_range())
    }

    pub fn with_chat_service(mut self, chat: ChatService) -> Self {
        self.chat = chat;
        self
    }

    pub fn with_assignment(mut self, assignment: ProviderAssignment) -> Self {
        self.assignment = assignment;
        self
    }

    pub fn with_port_range(mut self, range: RangeInclusive<u16>) -> Self {
        self.port_range = range;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Mutex<SessionMetrics>>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn prompts(&self) -> &PromptLibrary {
        &self.prompts
    }

    /// Apply one action. Rejected input becomes a warning notice and leaves
    /// the rest of the session untouched; nothing here is fatal.
    pub fn handle(&mut self, ctx: &mut SessionContext, action: Action) -> ActionOutcome {
        ctx.state.notices.clear();
        let kind = action.kind();

        let result = if action.needs_profile() && ctx.state.user.is_none() {
            Err(ValidationError::NotRegistered)
        } else {
            self.apply(ctx, action)
        };

        match result {
            Ok(outcome) => {
                self.record(|m| m.record_action(true));
                self.log(LogLevel::Debug, "action_handled", [json_kv("action", kind)]);
                outcome
            }
            Err(err) => {
                ctx.state.notify(Notice::warning(err.to_string()));
                ctx.request_refresh(format!("{kind} rejected"));
                self.record(|m| m.record_action(false));
                self.log(
                    LogLevel::Warn,
                    "action_rejected",
                    [json_kv("action", kind), json_kv("error", err.to_string())],
                );
                ActionOutcome::Continue
            }
        }
    }

    fn apply(
        &mut self,
        ctx: &mut SessionContext,
        action: Action,
    ) -> Result<ActionOutcome, ValidationError> {
        match action {
            Action::Register { name, level } => self.register(ctx, &name, level)?,
            Action::CreateEntity { name, code } => self.create_entity(ctx, &name, &code)?,
            Action::InteractEntity { index } => self.interact(ctx, index)?,
            Action::RemoveEntity { index } => self.remove(ctx, index)?,
            Action::ToggleHelp => {
                ctx.state.ui.show_help = !ctx.state.ui.show_help;
                ctx.request_refresh("help toggled");
            }
            Action::ResetMatrix => self.reset_matrix(ctx),
            Action::ToggleTutorial => {
                ctx.state.ui.show_tutorial = !ctx.state.ui.show_tutorial;
                ctx.request_refresh("tutorial toggled");
            }
            Action::TutorialNext => {
                if ctx.state.ui.tutorial.next() == Advance::Finished {
                    ctx.state.ui.show_tutorial = false;
                }
                ctx.request_refresh("tutorial next");
            }
            Action::TutorialPrevious => {
                if ctx.state.ui.tutorial.previous() {
                    ctx.request_refresh("tutorial previous");
                }
            }
            Action::SelectTab { tab } => {
                ctx.state.ui.active_tab = tab;
                ctx.request_refresh("tab selected");
            }
            Action::SelectProvider { provider } => {
                ctx.state.current_provider = Some(provider);
                ctx.state.prompt_template.clear();
                ctx.request_refresh("provider selected");
            }
            Action::SendChat { text } => self.send_chat(ctx, text.as_deref())?,
            Action::ClearPrompt => {
                ctx.state.prompt_template.clear();
                ctx.request_refresh("prompt cleared");
            }
            Action::JokePrompt => {
                ctx.state.prompt_template = JOKE_PROMPT.to_string();
                ctx.request_refresh("joke prompt");
            }
            Action::UsePrompt { category, index } => self.use_prompt(ctx, category, index)?,
            Action::RunCode { code } => self.run_code(ctx, code),
            Action::SaveCode { code } => self.save_code(ctx, code)?,
            Action::StopCode => self.stop_code(ctx),
            Action::Quit => return Ok(ActionOutcome::Quit),
        }
        Ok(ActionOutcome::Continue)
    }

    fn register(
        &mut self,
        ctx: &mut SessionContext,
        name: &str,
        level: i64,
    ) -> Result<(), ValidationError> {
        let profile = UserProfile::register(name, level)?;
        ctx.state.last_interaction = Some(profile.greeting());
        self.log(
            LogLevel::Info,
            "user_registered",
            [
                json_kv("user_id", profile.id.as_str()),
                json_kv("level", profile.level),
            ],
        );
        ctx.state.user = Some(profile);
        ctx.request_refresh("user registered");
        Ok(())
    }

    fn create_entity(
        &mut self,
        ctx: &mut SessionContext,
        name: &str,
        code: &str,
    ) -> Result<(), ValidationError> {
        let entity = ctx.state.registry.create_entity(name, code, &mut ctx.rng)?;
        let message = format!("✨ Entity '{}' created!", entity.name());
        let fields = [
            json_kv("entity_id", entity.id().to_string()),
            json_kv(
                "visualization",
                entity.visualization().map(|kind| kind.label()),
            ),
        ];
        self.log(LogLevel::Info, "entity_created", fields);
        self.record(SessionMetrics::record_entity_created);
        ctx.state.last_interaction = Some(message);
        ctx.request_refresh("entity created");
        Ok(())
    }

    fn interact(&mut self, ctx: &mut SessionContext, index: usize) -> Result<(), ValidationError> {
        let id = ctx
            .state
            .registry
            .id_at(index)
            .ok_or(ValidationError::UnknownEntity(index))?;
        if let Some(message) = ctx.state.registry.interact_with(id) {
            ctx.state.last_interaction = Some(message);
            ctx.request_refresh("entity interaction");
        }
        Ok(())
    }

    fn remove(&mut self, ctx: &mut SessionContext, index: usize) -> Result<(), ValidationError> {
        let id = ctx
            .state
            .registry
            .id_at(index)
            .ok_or(ValidationError::UnknownEntity(index))?;
        let name = ctx
            .state
            .registry
            .get(id)
            .map(|entity| entity.name().to_string())
            .unwrap_or_default();
        if ctx.state.registry.remove_entity(id) {
            ctx.state.last_interaction = Some(format!("🗑️ Entity '{name}' removed from the Matrix."));
            self.record(|m| m.record_entities_removed(1));
            ctx.request_refresh("entity removed");
        }
        Ok(())
    }

    fn reset_matrix(&mut self, ctx: &mut SessionContext) {
        let removed = ctx.state.registry.len();
        ctx.state.registry.clear();
        ctx.state.last_interaction =
            Some("✨ The Matrix was reset successfully! Welcome back!".to_string());
        self.record(|m| m.record_entities_removed(removed));
        self.log(LogLevel::Info, "matrix_reset", [json_kv("removed", removed)]);
        ctx.request_refresh("matrix reset");
    }

    fn send_chat(
        &mut self,
        ctx: &mut SessionContext,
        text: Option<&str>,
    ) -> Result<(), ValidationError> {
        let provider = ctx
            .state
            .current_provider
            .ok_or(ValidationError::NoProviderSelected)?;
        let prompt = match text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(text) => text.to_string(),
            None => ctx.state.prompt_template.trim().to_string(),
        };
        if prompt.is_empty() {
            return Ok(());
        }

        ctx.state
            .chat
            .push(ChatMessage::new(ChatRole::User, provider, prompt.as_str()));
        let reply = self.chat.respond(provider, &prompt, &mut ctx.rng);
        if let Some(err) = &reply.masked_error {
            self.log(
                LogLevel::Warn,
                "provider_failed",
                [
                    json_kv("provider", provider.key()),
                    json_kv("error", err.to_string()),
                ],
            );
        }
        ctx.state
            .chat
            .push(ChatMessage::new(ChatRole::Assistant, provider, reply.text));
        ctx.state.prompt_template.clear();
        self.record(|m| {
            m.record_chat_message();
            m.record_chat_message();
        });
        ctx.request_refresh("chat message");
        Ok(())
    }

    fn use_prompt(
        &mut self,
        ctx: &mut SessionContext,
        category: usize,
        index: usize,
    ) -> Result<(), ValidationError> {
        let prompt = self.prompts.get(category, index)?.to_string();
        let provider = self
            .assignment
            .assign(ctx.state.current_provider, &mut ctx.rng);
        ctx.state.prompt_template = prompt;
        ctx.state.current_provider = Some(provider);
        ctx.state.last_interaction = Some(format!(
            "Prompt {category}.{index} loaded for {provider}. Send it from the chat tab."
        ));
        ctx.request_refresh("prompt selected");
        Ok(())
    }

    fn run_code(&mut self, ctx: &mut SessionContext, code: Option<String>) {
        let code = code.unwrap_or_else(|| ctx.state.editor_text().to_string());

        if let Some(mut previous) = ctx.state.running_app.take() {
            if let Err(err) = previous.terminate() {
                self.log(
                    LogLevel::Warn,
                    "app_terminate_failed",
                    [json_kv("error", err.to_string())],
                );
            }
        }

        let port = pick_port(self.port_range.clone(), &mut ctx.rng);
        match self.launcher.launch(&code, port) {
            Ok(app) => {
                ctx.state.code_output = format!("🚀 App launched on port {}", app.port());
                self.log(LogLevel::Info, "app_launched", [json_kv("port", app.port())]);
                self.record(SessionMetrics::record_launch);
                ctx.state.running_app = Some(app);
            }
            Err(err) => {
                ctx.state.code_output = format!("❌ Error: {err}");
                self.log(
                    LogLevel::Error,
                    "app_launch_failed",
                    [json_kv("port", port), json_kv("error", err.to_string())],
                );
            }
        }
        ctx.request_refresh("code run");
    }

    fn save_code(
        &mut self,
        ctx: &mut SessionContext,
        code: Option<String>,
    ) -> Result<(), ValidationError> {
        let code = code.unwrap_or_else(|| ctx.state.editor_text().to_string());
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let name = format!("App_{}", &suffix[..4]);
        let entity = ctx
            .state
            .registry
            .create_entity(&name, &code, &mut ctx.rng)?;
        ctx.state.last_interaction =
            Some(format!("✨ App '{}' saved as a digital entity!", entity.name()));
        self.record(SessionMetrics::record_entity_created);
        ctx.request_refresh("code saved");
        Ok(())
    }

    fn stop_code(&mut self, ctx: &mut SessionContext) {
        let Some(mut app) = ctx.state.running_app.take() else {
            return;
        };
        if let Err(err) = app.terminate() {
            self.log(
                LogLevel::Warn,
                "app_terminate_failed",
                [json_kv("error", err.to_string())],
            );
        }
        ctx.state.code_output = "⏹ Execution stopped".to_string();
        ctx.request_refresh("code stopped");
    }

    fn record(&self, update: impl FnOnce(&mut SessionMetrics)) {
        if let Some(metrics) = self.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                update(&mut guard);
            }
        }
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        if let Some(logger) = self.logger.as_ref() {
            let event = event_with_fields(level, LOG_TARGET, message, fields);
            let _ = logger.log_event(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::JOKES;
    use crate::launcher::{AppProcess, LaunchError};
    use crate::logging::MemorySink;
    use crate::session::{NoticeLevel, PageMode, Tab};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct FakeApp {
        port: u16,
        terminations: Arc<AtomicUsize>,
    }

    impl AppProcess for FakeApp {
        fn port(&self) -> u16 {
            self.port
        }

        fn terminate(&mut self) -> Result<(), LaunchError> {
            self.terminations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launched: Arc<Mutex<Vec<(String, u16)>>>,
        terminations: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CodeLauncher for FakeLauncher {
        fn launch(&mut self, code: &str, port: u16) -> Result<Box<dyn AppProcess>, LaunchError> {
            if self.fail {
                return Err(LaunchError::Spawn {
                    command: "python3".into(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                });
            }
            if let Ok(mut launched) = self.launched.lock() {
                launched.push((code.to_string(), port));
            }
            Ok(Box::new(FakeApp {
                port,
                terminations: Arc::clone(&self.terminations),
            }))
        }
    }

    fn registered() -> (AlmaApp, SessionContext) {
        let mut app = AlmaApp::new(FakeLauncher::default());
        let mut ctx = SessionContext::new(Some(42));
        app.handle(
            &mut ctx,
            Action::Register {
                name: "Ada".into(),
                level: 50,
            },
        );
        (app, ctx)
    }

    #[test]
    fn registration_moves_to_tutorial() {
        let (_, ctx) = registered();
        assert_eq!(ctx.state.page_mode(), PageMode::Tutorial);
        assert_eq!(ctx.rerun.reason(), Some("user registered"));
        assert!(ctx.state.last_interaction.as_deref().unwrap().contains("Ada"));
    }

    #[test]
    fn invalid_registration_warns_without_mutation() {
        let mut app = AlmaApp::new(FakeLauncher::default());
        let mut ctx = SessionContext::new(Some(1));
        app.handle(
            &mut ctx,
            Action::Register {
                name: "Ada".into(),
                level: 0,
            },
        );
        assert!(ctx.state.user.is_none());
        assert_eq!(ctx.state.notices.len(), 1);
        assert_eq!(ctx.state.notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn entity_actions_need_a_profile() {
        let mut app = AlmaApp::new(FakeLauncher::default());
        let mut ctx = SessionContext::new(Some(1));
        app.handle(
            &mut ctx,
            Action::CreateEntity {
                name: "Bot".into(),
                code: String::new(),
            },
        );
        assert!(ctx.state.registry.is_empty());
        assert_eq!(
            ctx.state.notices[0].text,
            ValidationError::NotRegistered.to_string()
        );
    }

    #[test]
    fn rejected_entity_leaves_registry_unchanged() {
        let (mut app, mut ctx) = registered();
        app.handle(
            &mut ctx,
            Action::CreateEntity {
                name: "".into(),
                code: "x=1".into(),
            },
        );
        app.handle(
            &mut ctx,
            Action::CreateEntity {
                name: "Bot".into(),
                code: "ID: 123\nprint(1)".into(),
            },
        );
        assert!(ctx.state.registry.is_empty());
        assert_eq!(
            ctx.state.notices,
            vec![Notice::warning(ValidationError::ReservedMarker.to_string())]
        );
    }

    #[test]
    fn interact_and_remove_by_position() {
        let (mut app, mut ctx) = registered();
        for name in ["One", "Two"] {
            app.handle(
                &mut ctx,
                Action::CreateEntity {
                    name: name.into(),
                    code: String::new(),
                },
            );
        }
        app.handle(&mut ctx, Action::InteractEntity { index: 2 });
        assert_eq!(
            ctx.state.last_interaction.as_deref(),
            Some("Interacted with Two. Remaining energy: 90% (Active).")
        );

        app.handle(&mut ctx, Action::RemoveEntity { index: 1 });
        assert_eq!(ctx.state.registry.pending_removals(), 1);
        let names: Vec<_> = ctx
            .state
            .registry
            .list_entities()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(names, vec!["Two".to_string()]);

        app.handle(&mut ctx, Action::InteractEntity { index: 5 });
        assert_eq!(
            ctx.state.notices[0].text,
            ValidationError::UnknownEntity(5).to_string()
        );
    }

    #[test]
    fn tutorial_next_past_last_step_hides_it() {
        let (mut app, mut ctx) = registered();
        for _ in 0..4 {
            app.handle(&mut ctx, Action::TutorialNext);
        }
        assert_eq!(ctx.state.ui.tutorial.step(), 5);
        assert_eq!(ctx.state.page_mode(), PageMode::Tutorial);
        app.handle(&mut ctx, Action::TutorialNext);
        assert_eq!(ctx.state.page_mode(), PageMode::Main);
    }

    #[test]
    fn chat_requires_provider_and_masks_failures() {
        let (mut app, mut ctx) = registered();
        app.handle(
            &mut ctx,
            Action::SendChat {
                text: Some("hi".into()),
            },
        );
        assert!(ctx.state.chat.is_empty());
        assert_eq!(
            ctx.state.notices[0].text,
            ValidationError::NoProviderSelected.to_string()
        );

        app.handle(
            &mut ctx,
            Action::SelectProvider {
                provider: crate::chat::ProviderLabel::OpenAi,
            },
        );
        app.handle(
            &mut ctx,
            Action::SendChat {
                text: Some("What is spin?".into()),
            },
        );
        let reply = ctx.state.chat.iter().last().unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.content.starts_with("⚠️ Connection to OpenAI failed"));
        assert!(JOKES.iter().any(|joke| reply.content.ends_with(joke)));
        assert!(ctx.state.notices.is_empty());
    }

    #[test]
    fn blank_chat_uses_template_then_clears_it() {
        let (mut app, mut ctx) = registered();
        app.handle(
            &mut ctx,
            Action::SelectProvider {
                provider: crate::chat::ProviderLabel::Claude,
            },
        );
        app.handle(&mut ctx, Action::JokePrompt);
        assert_eq!(ctx.state.prompt_template, JOKE_PROMPT);
        app.handle(&mut ctx, Action::SendChat { text: None });
        assert_eq!(ctx.state.chat.len(), 2);
        assert!(ctx.state.prompt_template.is_empty());

        app.handle(&mut ctx, Action::SendChat { text: None });
        assert_eq!(ctx.state.chat.len(), 2);
    }

    #[test]
    fn library_prompt_sets_template_and_provider() {
        let (app, mut ctx) = registered();
        let mut app = app.with_assignment(ProviderAssignment::Fixed {
            provider: crate::chat::ProviderLabel::Gemini,
        });
        app.handle(
            &mut ctx,
            Action::UsePrompt {
                category: 2,
                index: 1,
            },
        );
        assert_eq!(
            ctx.state.current_provider,
            Some(crate::chat::ProviderLabel::Gemini)
        );
        assert_eq!(
            ctx.state.prompt_template,
            app.prompts().get(2, 1).unwrap()
        );

        app.handle(
            &mut ctx,
            Action::UsePrompt {
                category: 9,
                index: 1,
            },
        );
        assert_eq!(ctx.state.notices.len(), 1);
    }

    #[test]
    fn run_replaces_previous_app_and_stop_forgets_it() {
        let launcher = FakeLauncher::default();
        let launched = Arc::clone(&launcher.launched);
        let terminations = Arc::clone(&launcher.terminations);
        let mut app = AlmaApp::new(launcher);
        let mut ctx = SessionContext::new(Some(3));
        app.handle(
            &mut ctx,
            Action::Register {
                name: "Ada".into(),
                level: 10,
            },
        );

        app.handle(&mut ctx, Action::RunCode { code: None });
        app.handle(
            &mut ctx,
            Action::RunCode {
                code: Some("print(1)".into()),
            },
        );
        let runs = launched.lock().unwrap().clone();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].0, crate::launcher::DEFAULT_SAMPLE);
        assert!(runs.iter().all(|(_, port)| (8502..=9000).contains(port)));
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
        assert_eq!(
            ctx.state.code_output,
            format!("🚀 App launched on port {}", runs[1].1)
        );

        app.handle(&mut ctx, Action::StopCode);
        assert_eq!(terminations.load(Ordering::SeqCst), 2);
        assert_eq!(ctx.state.code_output, "⏹ Execution stopped");
        assert!(ctx.state.running_app.is_none());
    }

    #[test]
    fn stop_without_app_is_a_no_op() {
        let (mut app, mut ctx) = registered();
        let _ = ctx.rerun.flush(&mut |_: Option<&str>| crate::rerun::RedrawOutcome::Resumed);
        app.handle(&mut ctx, Action::StopCode);
        assert!(ctx.state.code_output.is_empty());
        assert!(!ctx.rerun.is_pending());
    }

    #[test]
    fn launch_failure_lands_in_code_output() {
        let mut app = AlmaApp::new(FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        });
        let mut ctx = SessionContext::new(Some(4));
        app.handle(
            &mut ctx,
            Action::Register {
                name: "Ada".into(),
                level: 10,
            },
        );
        app.handle(&mut ctx, Action::RunCode { code: None });
        assert!(ctx.state.code_output.starts_with("❌ Error: could not start `python3`"));
        assert!(ctx.state.running_app.is_none());
        assert!(ctx.rerun.is_pending());
    }

    #[test]
    fn save_code_creates_app_entity() {
        let (mut app, mut ctx) = registered();
        app.handle(
            &mut ctx,
            Action::SaveCode {
                code: Some("import streamlit as st\nst.write(1)".into()),
            },
        );
        let entity = ctx.state.registry.list_entities().next().unwrap();
        assert!(entity.name().starts_with("App_"));
        assert_eq!(entity.name().len(), 8);
        assert_eq!(
            entity.visualization(),
            Some(crate::entity::VisualizationKind::UiEmbedded)
        );
    }

    #[test]
    fn tab_selection_and_logging() {
        let sink = MemorySink::new();
        let (app, mut ctx) = registered();
        let mut app = app.with_logger(Logger::new(sink.clone()));
        app.handle(&mut ctx, Action::SelectTab { tab: Tab::Chat });
        assert_eq!(ctx.state.ui.active_tab, Tab::Chat);
        assert_eq!(sink.messages(), vec!["action_handled".to_string()]);
        assert_eq!(app.handle(&mut ctx, Action::Quit), ActionOutcome::Quit);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alma_matrix::chat::{ChatRole, JOKES};
use alma_matrix::launcher::{AppProcess, CodeLauncher, LaunchError};
use alma_matrix::session::NoticeLevel;
use alma_matrix::{
    Action, AlmaApp, AlmaRuntime, EntityRegistry, EntityStatus, PageMode, PageSnapshot,
    ProviderLabel, RuntimeConfig, RuntimeEvent, SessionContext, Size, ValidationError,
    VisualizationKind,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug)]
struct RecordingApp {
    port: u16,
    stopped: Arc<AtomicBool>,
}

impl AppProcess for RecordingApp {
    fn port(&self) -> u16 {
        self.port
    }

    fn terminate(&mut self) -> Result<(), LaunchError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default, Clone)]
struct RecordingLauncher {
    ports: Arc<Mutex<Vec<u16>>>,
    stopped: Arc<Mutex<Vec<Arc<AtomicBool>>>>,
}

impl CodeLauncher for RecordingLauncher {
    fn launch(&mut self, _code: &str, port: u16) -> Result<Box<dyn AppProcess>, LaunchError> {
        let flag = Arc::new(AtomicBool::new(false));
        self.ports.lock().unwrap().push(port);
        self.stopped.lock().unwrap().push(Arc::clone(&flag));
        Ok(Box::new(RecordingApp {
            port,
            stopped: flag,
        }))
    }
}

fn registered(launcher: RecordingLauncher) -> (AlmaApp, SessionContext) {
    let mut app = AlmaApp::new(launcher);
    let mut ctx = SessionContext::new(Some(2024));
    app.handle(
        &mut ctx,
        Action::Register {
            name: "Ada".into(),
            level: 42,
        },
    );
    app.handle(&mut ctx, Action::ToggleTutorial);
    assert_eq!(ctx.state.page_mode(), PageMode::Main);
    (app, ctx)
}

#[test]
fn created_entity_starts_active_with_text_visualization() {
    let mut registry = EntityRegistry::new();
    let mut rng = StdRng::seed_from_u64(1);
    let entity = registry.create_entity("Test", "", &mut rng).unwrap();

    assert_eq!(entity.visualization(), Some(VisualizationKind::Text));
    assert_eq!(entity.energy_level(), 100);
    assert_eq!(entity.status(), EntityStatus::Active);
}

#[test]
fn ten_interactions_exhaust_an_entity() {
    let mut registry = EntityRegistry::new();
    let mut rng = StdRng::seed_from_u64(5);
    let id = registry.create_entity("Worker", "", &mut rng).unwrap().id();
    let position = registry.get(id).unwrap().position();

    let mut previous = 100;
    for _ in 0..10 {
        registry.interact_with(id).unwrap();
        let energy = registry.get(id).unwrap().energy_level();
        assert!(energy <= previous);
        previous = energy;
    }
    let entity = registry.get(id).unwrap();
    assert_eq!(entity.energy_level(), 0);
    assert_eq!(entity.status(), EntityStatus::Dormant);

    let message = registry.interact_with(id).unwrap();
    assert!(message.contains("0%"));
    assert!(message.contains("Dormant"));
    assert_eq!(registry.get(id).unwrap().position(), position);
}

#[test]
fn rejected_creations_warn_and_leave_registry_untouched() {
    let (mut app, mut ctx) = registered(RecordingLauncher::default());

    app.handle(
        &mut ctx,
        Action::CreateEntity {
            name: "".into(),
            code: "x=1".into(),
        },
    );
    assert!(ctx.state.registry.is_empty());
    assert_eq!(ctx.state.notices[0].level, NoticeLevel::Warning);
    assert_eq!(ctx.state.notices[0].text, ValidationError::EmptyName.to_string());

    app.handle(
        &mut ctx,
        Action::CreateEntity {
            name: "Bot".into(),
            code: "ID: 123\nprint(1)".into(),
        },
    );
    assert!(ctx.state.registry.is_empty());
    assert_eq!(
        ctx.state.notices[0].text,
        ValidationError::ReservedMarker.to_string()
    );
}

#[test]
fn removal_is_visible_only_after_the_next_listing() {
    let (mut app, mut ctx) = registered(RecordingLauncher::default());
    for name in ["One", "Two"] {
        app.handle(
            &mut ctx,
            Action::CreateEntity {
                name: name.into(),
                code: String::new(),
            },
        );
    }
    app.handle(&mut ctx, Action::RemoveEntity { index: 1 });
    assert_eq!(ctx.state.registry.pending_removals(), 1);

    let snapshot = PageSnapshot::capture(&mut ctx.state, None);
    let names: Vec<&str> = snapshot.entities.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Two"]);
    assert_eq!(ctx.state.registry.pending_removals(), 0);
}

#[test]
fn openai_chat_masks_failure_with_a_joke() {
    let (mut app, mut ctx) = registered(RecordingLauncher::default());
    app.handle(
        &mut ctx,
        Action::SelectProvider {
            provider: ProviderLabel::OpenAi,
        },
    );
    app.handle(
        &mut ctx,
        Action::SendChat {
            text: Some("Explain entanglement".into()),
        },
    );

    let reply = ctx
        .state
        .chat
        .iter()
        .find(|message| message.role == ChatRole::Assistant)
        .unwrap();
    assert!(reply.content.starts_with("⚠️ Connection to OpenAI failed"));
    assert!(JOKES.iter().any(|joke| reply.content.ends_with(joke)));
    assert!(ctx.state.prompt_template.is_empty());
}

#[test]
fn tutorial_next_past_the_last_step_hides_it() {
    let mut app = AlmaApp::new(RecordingLauncher::default());
    let mut ctx = SessionContext::new(Some(3));
    app.handle(
        &mut ctx,
        Action::Register {
            name: "Lin".into(),
            level: 10,
        },
    );
    assert_eq!(ctx.state.page_mode(), PageMode::Tutorial);
    for _ in 0..5 {
        app.handle(&mut ctx, Action::TutorialNext);
    }
    assert!(!ctx.state.ui.show_tutorial);
    assert_eq!(ctx.state.page_mode(), PageMode::Main);
}

#[test]
fn launches_stay_in_range_and_replace_the_previous_app() {
    let launcher = RecordingLauncher::default();
    let (app, mut ctx) = registered(launcher.clone());
    let mut app = app.with_port_range(8600..=8610);

    app.handle(&mut ctx, Action::StopCode);
    assert!(ctx.state.code_output.is_empty());

    for _ in 0..3 {
        app.handle(&mut ctx, Action::RunCode { code: None });
    }
    let ports = launcher.ports.lock().unwrap().clone();
    assert_eq!(ports.len(), 3);
    assert!(ports.iter().all(|port| (8600..=8610).contains(port)));

    let stopped = launcher.stopped.lock().unwrap().clone();
    assert!(stopped[0].load(Ordering::SeqCst));
    assert!(stopped[1].load(Ordering::SeqCst));
    assert!(!stopped[2].load(Ordering::SeqCst));

    app.handle(&mut ctx, Action::StopCode);
    assert_eq!(ctx.state.code_output, "⏹ Execution stopped");
    assert!(stopped[2].load(Ordering::SeqCst));
    assert!(ctx.state.running_app.is_none());
}

#[test]
fn dropping_a_session_stops_its_app() {
    let launcher = RecordingLauncher::default();
    let (mut app, mut ctx) = registered(launcher.clone());
    app.handle(&mut ctx, Action::RunCode { code: None });
    drop(ctx);
    let stopped = launcher.stopped.lock().unwrap().clone();
    assert!(stopped[0].load(Ordering::SeqCst));
}

#[test]
fn terminal_session_from_typed_commands() {
    let config = RuntimeConfig {
        rng_seed: Some(9),
        ..RuntimeConfig::default()
    };
    let mut runtime = AlmaRuntime::new(
        AlmaApp::new(RecordingLauncher::default()),
        config,
        Size::new(120, 40),
    );
    let mut screen = Vec::new();
    runtime
        .run_scripted(
            &mut screen,
            [
                RuntimeEvent::Command("register Grace 77".into()),
                RuntimeEvent::Command("tutorial".into()),
                RuntimeEvent::Command("create Plotter | import matplotlib.pyplot as plt\\nplt.show()".into()),
                RuntimeEvent::Command("interact 1".into()),
                RuntimeEvent::Command("tab chat".into()),
                RuntimeEvent::Command("ai Gemini".into()),
                RuntimeEvent::Command("joke".into()),
                RuntimeEvent::Command("say".into()),
            ],
        )
        .unwrap();

    let state = &mut runtime.session_mut().state;
    let entities: Vec<_> = state
        .registry
        .list_entities()
        .map(|entity| (entity.name().to_string(), entity.energy_level(), entity.visualization()))
        .collect();
    assert_eq!(entities, [("Plotter".to_string(), 90, Some(VisualizationKind::Plot))]);
    assert_eq!(state.chat.len(), 2);
    assert_eq!(state.current_provider, Some(ProviderLabel::Gemini));
    let rendered = String::from_utf8_lossy(&screen);
    assert!(rendered.contains("Grace"));
}

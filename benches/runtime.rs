use std::hint::black_box;
use std::io;

use alma_matrix::launcher::{AppProcess, CodeLauncher, LaunchError};
use alma_matrix::logging::{LogEvent, LogSink, LoggingResult};
use alma_matrix::{
    Action, AlmaApp, AlmaRuntime, Logger, RuntimeConfig, RuntimeEvent, SessionContext, Size,
    compose,
};
use criterion::{Criterion, criterion_group, criterion_main};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Default)]
struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _event: &LogEvent) -> LoggingResult<()> {
        Ok(())
    }
}

struct NullLauncher;

impl CodeLauncher for NullLauncher {
    fn launch(&mut self, _code: &str, _port: u16) -> Result<Box<dyn AppProcess>, LaunchError> {
        Err(LaunchError::Script(io::Error::other("benchmarks never launch")))
    }
}

fn runtime_session_script(c: &mut Criterion) {
    let script = scripted_events();
    c.bench_function("runtime_session_script", |b| {
        b.iter(|| {
            let mut runtime = build_runtime();
            let mut sink = io::sink();
            runtime
                .run_scripted(&mut sink, black_box(script.clone()))
                .expect("scripted run");
        });
    });
}

fn page_compose_universe(c: &mut Criterion) {
    let mut app = AlmaApp::new(NullLauncher);
    let mut ctx = SessionContext::new(Some(7));
    app.handle(
        &mut ctx,
        Action::Register {
            name: "Bench".into(),
            level: 42,
        },
    );
    app.handle(&mut ctx, Action::ToggleTutorial);
    for i in 0..40 {
        app.handle(
            &mut ctx,
            Action::CreateEntity {
                name: format!("Entity{i}"),
                code: "import numpy as np\nprint(np.zeros(3))".into(),
            },
        );
    }

    c.bench_function("page_compose_universe", |b| {
        b.iter(|| {
            let panels = compose(&mut ctx.state, app.prompts(), "", black_box(Size::new(160, 48)));
            black_box(panels);
        });
    });
}

fn build_runtime() -> AlmaRuntime {
    let config = RuntimeConfig {
        rng_seed: Some(1),
        ..RuntimeConfig::default()
    }
    .with_logger(Logger::new(NullSink));
    AlmaRuntime::new(AlmaApp::new(NullLauncher), config, Size::new(100, 30))
}

fn scripted_events() -> Vec<RuntimeEvent> {
    let mut events = Vec::new();
    type_line(&mut events, "register Bench 64");
    events.push(RuntimeEvent::Action(Action::ToggleTutorial));
    for i in 0..20 {
        events.push(RuntimeEvent::Command(format!("create Probe{i} | import pandas as pd")));
    }
    for i in 1..=10 {
        events.push(RuntimeEvent::Command(format!("interact {i}")));
    }
    events.push(RuntimeEvent::Command("remove 3".into()));
    events.push(RuntimeEvent::Command("tab chat".into()));
    events.push(RuntimeEvent::Command("ai Claude".into()));
    type_line(&mut events, "say tell me a joke");
    events.push(RuntimeEvent::Resize(Size::new(120, 40)));
    events.push(RuntimeEvent::Command("prompt 1.1".into()));
    events
}

fn type_line(events: &mut Vec<RuntimeEvent>, text: &str) {
    for ch in text.chars() {
        events.push(RuntimeEvent::Key(KeyEvent::new(
            KeyCode::Char(ch),
            KeyModifiers::NONE,
        )));
    }
    events.push(RuntimeEvent::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
}

criterion_group!(benches, runtime_session_script, page_compose_universe);
criterion_main!(benches);

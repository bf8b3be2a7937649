use std::fmt::Write as _;

use super::layout::{
    CONTENT_PANEL, HEADER_PANEL, INPUT_PANEL, PLOT_PANEL, PageLayout, SIDEBAR_PANEL, STATUS_PANEL,
};
use super::scatter::{ScatterPoint, render_scatter};
use super::snapshot::{EntityView, entity_views};
use crate::chat::{ChatRole, ProviderLabel};
use crate::launcher::app_url;
use crate::prompts::PromptLibrary;
use crate::render::{Rect, Size};
use crate::session::{NoticeLevel, PageMode, SessionState, Tab};
use crate::tutorial::QUICK_HELP;

const RULE: &str = "──────────────────────────";

/// Text destined for one screen region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: &'static str,
    pub rect: Rect,
    pub content: String,
}

impl Panel {
    fn new(id: &'static str, rect: Rect, content: String) -> Self {
        Self { id, rect, content }
    }
}

/// Lay out the whole page for `size`. Pending entity removals are applied
/// before anything is read.
pub fn compose(
    state: &mut SessionState,
    prompts: &PromptLibrary,
    input: &str,
    size: Size,
) -> Vec<Panel> {
    let entities = entity_views(state);
    let state: &SessionState = state;
    let layout = PageLayout::solve(size);
    let mode = state.page_mode();

    let mut panels = vec![
        Panel::new(HEADER_PANEL, layout.header, header(state, mode)),
        Panel::new(SIDEBAR_PANEL, layout.sidebar, sidebar(state, entities.len())),
        Panel::new(STATUS_PANEL, layout.status, status(state)),
    ];

    match mode {
        PageMode::Registration => {
            panels.push(Panel::new(CONTENT_PANEL, layout.content, registration()));
        }
        PageMode::Tutorial => {
            panels.push(Panel::new(CONTENT_PANEL, layout.content, tutorial(state)));
        }
        PageMode::Main if state.ui.active_tab == Tab::Universe => {
            let (list, plot) = layout.universe_split();
            panels.push(Panel::new(
                CONTENT_PANEL,
                list,
                universe_list(state, &entities),
            ));
            panels.push(Panel::new(PLOT_PANEL, plot, universe_plot(&entities, plot)));
        }
        PageMode::Main => {
            let content = match state.ui.active_tab {
                Tab::Chat => chat(state),
                Tab::Prompts => prompt_library(state, prompts),
                Tab::Code => code_runner(state),
                Tab::Universe => String::new(),
            };
            panels.push(Panel::new(
                CONTENT_PANEL,
                layout.content,
                with_help(state, content),
            ));
        }
    }

    panels.push(Panel::new(INPUT_PANEL, layout.input, input_line(input)));
    panels
}

fn header(state: &SessionState, mode: PageMode) -> String {
    match (&state.user, mode) {
        (Some(user), PageMode::Main) => {
            let tabs = Tab::ALL
                .iter()
                .map(|tab| {
                    if *tab == state.ui.active_tab {
                        format!("[{}]", tab.title())
                    } else {
                        format!(" {} ", tab.title())
                    }
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("🌐 ALMA MATRIX - Welcome, {}! ✨\n{tabs}", user.name)
        }
        (Some(user), _) => format!("🌐 ALMA MATRIX - Welcome, {}! ✨\n📚 Guided tour", user.name),
        (None, _) => "🌌 Welcome to the ALMA Matrix\nRegister to create your digital presence".into(),
    }
}

fn sidebar(state: &SessionState, entity_count: usize) -> String {
    let mut out = format!("⚡ ALMA Panel\n{RULE}\n");
    if let Some(user) = &state.user {
        let _ = writeln!(out, "User: {}", user.name);
        let _ = writeln!(out, "Quantum level: {}", user.level);
        let _ = writeln!(out, "Active entities: {entity_count}");
        let _ = writeln!(out, "{RULE}");
    }
    out.push_str("help      ❓ quick guide\n");
    out.push_str("reset     🌀 reset the Matrix\n");
    out.push_str("tutorial  📚 show/hide tutorial\n");
    out.push_str("tab <n>   switch tab (1-4)\n");
    out.push_str("quit      leave");
    out
}

fn status(state: &SessionState) -> String {
    let mut lines: Vec<String> = state
        .notices
        .iter()
        .map(|notice| {
            let marker = match notice.level {
                NoticeLevel::Info => "ℹ️",
                NoticeLevel::Warning => "⚠️",
                NoticeLevel::Error => "❌",
            };
            format!("{marker} {}", notice.text)
        })
        .collect();
    if let Some(message) = &state.last_interaction {
        lines.push(format!("✅ {message}"));
    }
    lines.join("\n")
}

fn registration() -> String {
    "Before we begin, register your name and quantum level to create your \
digital presence in this new dimension.\n\n\
  register <name> [level]\n\n\
The quantum level (1 to 100, default 50) represents your energy and digital experience."
        .to_string()
}

fn tutorial(state: &SessionState) -> String {
    let cursor = state.ui.tutorial;
    let Some(step) = cursor.current() else {
        return String::new();
    };
    let mut out = format!(
        "Step {}/{}\n\n{}\n\n{}\n\n",
        cursor.step(),
        cursor.total(),
        step.title,
        step.body
    );
    if cursor.step() > 1 {
        out.push_str("« prev    ");
    }
    if cursor.step() < cursor.total() {
        out.push_str("next »");
    } else {
        out.push_str("next » enters the Matrix");
    }
    out
}

fn with_help(state: &SessionState, content: String) -> String {
    if state.ui.show_help {
        format!("{QUICK_HELP}\n\n{content}")
    } else {
        content
    }
}

fn universe_list(state: &SessionState, entities: &[EntityView]) -> String {
    let mut out = String::from("🗂️ Active digital entities\n\n");
    if entities.is_empty() {
        out.push_str("No entities created yet. Start by creating one!\n");
    }
    for entity in entities {
        let _ = writeln!(
            out,
            "{}. {} (Status: {}, Energy: {}%)",
            entity.index, entity.name, entity.status, entity.energy_level
        );
        let visualization = entity
            .visualization
            .map(|kind| kind.label())
            .unwrap_or("unspecified");
        let _ = writeln!(out, "   {} · {}", entity.position, visualization);
    }
    out.push_str("\ncreate <name> [| code] · interact <n> · remove <n>");
    with_help(state, out)
}

fn universe_plot(entities: &[EntityView], rect: Rect) -> String {
    let points: Vec<ScatterPoint> = entities.iter().map(EntityView::scatter_point).collect();
    let plot = render_scatter(&points, rect.width, rect.height.saturating_sub(1), true);
    format!("🌌 Quantum Universe - 3D view\n{plot}")
}

fn chat(state: &SessionState) -> String {
    let services = ProviderLabel::ALL
        .iter()
        .map(|provider| {
            if Some(*provider) == state.current_provider {
                format!("[{provider}]")
            } else {
                provider.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let mut out = format!("🤖 AI services: {services}\n\n");

    let Some(provider) = state.current_provider else {
        out.push_str("Select a service first: ai <openai|bard|claude|deepseek|gemini>");
        return out;
    };

    for message in state.chat.for_provider(provider) {
        let speaker = match message.role {
            ChatRole::User => "You".to_string(),
            ChatRole::Assistant => provider.to_string(),
        };
        let _ = writeln!(out, "[{}] {speaker}: {}", message.clock(), message.content);
    }
    if !state.prompt_template.is_empty() {
        let _ = writeln!(out, "\n📝 Prompt: {}", state.prompt_template);
    }
    out.push_str("\nsay <text> · say (sends the prompt) · joke · clear");
    out
}

fn prompt_library(state: &SessionState, prompts: &PromptLibrary) -> String {
    let mut out = String::from("📚 Prompt library\n");
    for (cat_idx, category) in prompts.categories().iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", cat_idx + 1, category.title);
        for (idx, prompt) in category.prompts.iter().enumerate() {
            let _ = writeln!(out, "   {}.{} {prompt}", cat_idx + 1, idx + 1);
        }
    }
    if !state.prompt_template.is_empty() {
        let _ = writeln!(out, "\n📝 Loaded: {}", state.prompt_template);
    }
    out.push_str("\nprompt <category>.<n> loads a prompt into the chat");
    out
}

fn code_runner(state: &SessionState) -> String {
    let mut out = format!("💻 Code runner\n\n{}\n\n", state.editor_text());
    if !state.code_output.is_empty() {
        let _ = writeln!(out, "{}", state.code_output);
    }
    if let Some(port) = state.running_port() {
        let _ = writeln!(out, "Running at {}", app_url(port));
    }
    out.push_str("\nrun [code] · save [code] · stop");
    out
}

fn input_line(buffer: &str) -> String {
    format!("> {buffer}█\nEnter submits · Esc clears · Ctrl+C quits")
}

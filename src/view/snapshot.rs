use serde::Serialize;
use uuid::Uuid;

use super::scatter::ScatterPoint;
use crate::chat::{ChatMessage, ProviderLabel};
use crate::entity::{Entity, EntityStatus, Position, VisualizationKind};
use crate::launcher::app_url;
use crate::session::{Notice, PageMode, SessionState, Tab, UserProfile};

/// Read-only row for one listed entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    /// 1-based position used by `interact` and `remove`.
    pub index: usize,
    pub id: String,
    pub name: String,
    pub energy_level: u8,
    pub status: EntityStatus,
    pub position: Position,
    pub visualization: Option<VisualizationKind>,
    pub created_at: String,
    pub code: String,
}

impl EntityView {
    fn new(index: usize, entity: &Entity) -> Self {
        Self {
            index,
            id: entity.id().to_string(),
            name: entity.name().to_string(),
            energy_level: entity.energy_level(),
            status: entity.status(),
            position: entity.position(),
            visualization: entity.visualization(),
            created_at: entity.created_at().format("%d/%m/%Y %H:%M:%S").to_string(),
            code: entity.code().to_string(),
        }
    }

    pub fn scatter_point(&self) -> ScatterPoint {
        ScatterPoint {
            position: self.position,
            active: self.status == EntityStatus::Active,
        }
    }
}

/// Apply pending removals and list what remains, in creation order.
pub fn entity_views(state: &mut SessionState) -> Vec<EntityView> {
    state
        .registry
        .list_entities()
        .enumerate()
        .map(|(idx, entity)| EntityView::new(idx + 1, entity))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TutorialView {
    pub step: usize,
    pub total: usize,
    pub title: String,
    pub body: String,
}

/// Everything a socket client needs to draw the page, sent once per refresh.
#[derive(Debug, Clone, Serialize)]
pub struct PageSnapshot {
    pub session_id: Uuid,
    pub reason: Option<String>,
    pub mode: PageMode,
    pub active_tab: Tab,
    pub show_help: bool,
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutorial: Option<TutorialView>,
    pub entities: Vec<EntityView>,
    pub current_provider: Option<ProviderLabel>,
    /// Messages exchanged with the current provider only.
    pub transcript: Vec<ChatMessage>,
    pub prompt_template: String,
    pub editor_text: String,
    pub last_interaction: Option<String>,
    pub notices: Vec<Notice>,
    pub code_output: String,
    pub app_url: Option<String>,
}

impl PageSnapshot {
    pub fn capture(state: &mut SessionState, reason: Option<&str>) -> Self {
        let entities = entity_views(state);
        let mode = state.page_mode();
        let tutorial = (mode == PageMode::Tutorial)
            .then(|| state.ui.tutorial.current())
            .flatten()
            .map(|step| TutorialView {
                step: state.ui.tutorial.step(),
                total: state.ui.tutorial.total(),
                title: step.title.to_string(),
                body: step.body.to_string(),
            });
        let transcript = state
            .current_provider
            .map(|provider| state.chat.for_provider(provider).cloned().collect())
            .unwrap_or_default();

        Self {
            session_id: state.session_id,
            reason: reason.map(str::to_string),
            mode,
            active_tab: state.ui.active_tab,
            show_help: state.ui.show_help,
            user: state.user.clone(),
            tutorial,
            entities,
            current_provider: state.current_provider,
            transcript,
            prompt_template: state.prompt_template.clone(),
            editor_text: state.editor_text().to_string(),
            last_interaction: state.last_interaction.clone(),
            notices: state.notices.clone(),
            code_output: state.code_output.clone(),
            app_url: state.running_port().map(app_url),
        }
    }
}

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Local};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use super::classify::{VisualizationKind, classify};

/// Energy every entity starts with.
pub const INITIAL_ENERGY: u8 = 100;
/// Energy drained by a single interaction.
pub const INTERACTION_COST: u8 = 10;

pub const X_RANGE: RangeInclusive<f64> = -8.0..=8.0;
pub const Y_RANGE: RangeInclusive<f64> = -8.0..=8.0;
pub const Z_RANGE: RangeInclusive<f64> = -3.0..=3.0;

/// Opaque entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First `len` characters of the hyphenated form, used for generated names.
    pub fn short(&self, len: usize) -> String {
        self.0.to_string().chars().take(len).collect()
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point in the bounded universe volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    /// Independent uniform draws over the fixed axis ranges.
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            x: rng.gen_range(X_RANGE),
            y: rng.gen_range(Y_RANGE),
            z: rng.gen_range(Z_RANGE),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.2}, {:.2}, {:.2}]", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Dormant,
}

impl fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityStatus::Active => f.write_str("Active"),
            EntityStatus::Dormant => f.write_str("Dormant"),
        }
    }
}

/// A simulated digital actor.
///
/// Fields are private so the energy/status invariant and the immutability of
/// `id`, `created_at` and `position` hold for every reachable value.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    id: EntityId,
    name: String,
    code: String,
    created_at: DateTime<Local>,
    energy_level: u8,
    position: Position,
    status: EntityStatus,
    visualization: Option<VisualizationKind>,
}

impl Entity {
    pub fn create(name: &str, code: impl Into<String>, rng: &mut impl Rng) -> Self {
        let id = EntityId::new();
        let trimmed = name.trim();
        let name = if trimmed.is_empty() {
            format!("Entity_{}", id.short(6))
        } else {
            trimmed.to_string()
        };

        Self {
            id,
            name,
            code: code.into(),
            created_at: Local::now(),
            energy_level: INITIAL_ENERGY,
            position: Position::random(rng),
            status: EntityStatus::Active,
            visualization: None,
        }
    }

    /// Drain energy by one interaction, going dormant at zero.
    pub fn interact(&mut self) -> String {
        self.energy_level = self.energy_level.saturating_sub(INTERACTION_COST);
        if self.energy_level == 0 {
            self.status = EntityStatus::Dormant;
        }
        format!(
            "Interacted with {}. Remaining energy: {}% ({}).",
            self.name, self.energy_level, self.status
        )
    }

    pub fn classify_visualization(&mut self) -> VisualizationKind {
        let kind = classify(&self.code);
        self.visualization = Some(kind);
        kind
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn energy_level(&self) -> u8 {
        self.energy_level
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn status(&self) -> EntityStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }

    pub fn visualization(&self) -> Option<VisualizationKind> {
        self.visualization
    }
}

use std::ops::RangeInclusive;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::ValidationError;

pub const LEVEL_RANGE: RangeInclusive<i64> = 1..=100;

const PROFILE_ID_LEN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub level: u8,
    /// Hex prefix of a BLAKE3 digest over the name and registration time.
    pub id: String,
    pub joined_at: DateTime<Local>,
}

impl UserProfile {
    pub fn register(name: &str, level: i64) -> Result<Self, ValidationError> {
        Self::register_at(name, level, Local::now())
    }

    pub fn register_at(
        name: &str,
        level: i64,
        joined_at: DateTime<Local>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !LEVEL_RANGE.contains(&level) {
            return Err(ValidationError::LevelOutOfRange(level));
        }
        let level = u8::try_from(level).map_err(|_| ValidationError::LevelOutOfRange(level))?;

        let mut hasher = blake3::Hasher::new();
        hasher.update(name.as_bytes());
        hasher.update(joined_at.to_rfc3339().as_bytes());
        let digest = hasher.finalize().to_hex();

        Ok(Self {
            name: name.to_string(),
            level,
            id: digest[..PROFILE_ID_LEN].to_string(),
            joined_at,
        })
    }

    pub fn greeting(&self) -> String {
        format!("Welcome, {}! Your quantum journey begins.", self.name)
    }
}

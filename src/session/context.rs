use rand::SeedableRng;
use rand::rngs::StdRng;

use super::state::SessionState;
use crate::rerun::RerunCoordinator;

/// Handed explicitly to every action handler in place of ambient globals.
#[derive(Debug)]
pub struct SessionContext {
    pub state: SessionState,
    pub rerun: RerunCoordinator,
    pub rng: StdRng,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionContext {
    /// Deterministic when `seed` is given, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            state: SessionState::new(),
            rerun: RerunCoordinator::new(),
            rng,
        }
    }

    pub fn request_refresh(&mut self, reason: impl Into<String>) {
        self.rerun.request_refresh(reason);
    }
}

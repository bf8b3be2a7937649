use std::collections::{BTreeSet, HashMap};

use blake3::Hash;

use super::geometry::Rect;

pub type PanelId = String;

#[derive(Debug, Clone)]
pub struct PanelState {
    pub rect: Rect,
    pub content: String,
    hash: Hash,
}

impl PanelState {
    fn new(rect: Rect, content: String) -> Self {
        Self {
            rect,
            hash: blake3::hash(content.as_bytes()),
            content,
        }
    }
}

/// Last drawn content per panel. Only panels whose rect or content hash
/// changed come back from [`PanelCache::take_dirty`].
#[derive(Debug, Default)]
pub struct PanelCache {
    entries: HashMap<PanelId, PanelState>,
    dirty: BTreeSet<PanelId>,
}

impl PanelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` for `id` at `rect`. Returns whether the panel changed.
    pub fn update(&mut self, id: &str, rect: Rect, content: String) -> bool {
        let changed = match self.entries.get_mut(id) {
            Some(state) => {
                let hash = blake3::hash(content.as_bytes());
                if state.rect == rect && state.hash == hash {
                    false
                } else {
                    state.rect = rect;
                    state.content = content;
                    state.hash = hash;
                    true
                }
            }
            None => {
                self.entries
                    .insert(id.to_string(), PanelState::new(rect, content));
                true
            }
        };
        if changed {
            self.dirty.insert(id.to_string());
        }
        changed
    }

    /// Forget panels not named in `live`. Returns the rects they covered so
    /// the caller can blank them.
    pub fn retain(&mut self, live: &[&str]) -> Vec<Rect> {
        let stale: Vec<PanelId> = self
            .entries
            .keys()
            .filter(|id| !live.contains(&id.as_str()))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|id| {
                self.dirty.remove(&id);
                self.entries.remove(&id).map(|state| state.rect)
            })
            .collect()
    }

    /// Mark every panel dirty, e.g. after the screen was cleared.
    pub fn invalidate_all(&mut self) {
        self.dirty.extend(self.entries.keys().cloned());
    }

    /// Dirty panels in id order; clears the dirty set.
    pub fn take_dirty(&mut self) -> Vec<(PanelId, PanelState)> {
        let ids = std::mem::take(&mut self.dirty);
        ids.into_iter()
            .filter_map(|id| self.entries.get(&id).map(|state| (id.clone(), state.clone())))
            .collect()
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PanelState> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use std::collections::HashMap;

use rand::Rng;

use crate::entity::{Entity, EntityId};
use crate::error::ValidationError;

/// Metadata lines that entity code may not contain.
const RESERVED_MARKER: &str = "ID:";

/// Registry mapping entity ids to entities, remembering insertion order for display.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    entries: HashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    pending_removals: Vec<EntityId>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate, construct and classify a new entity.
    pub fn create_entity(
        &mut self,
        name: &str,
        code: &str,
        rng: &mut impl Rng,
    ) -> Result<&Entity, ValidationError> {
        validate(name, code)?;

        let mut entity = Entity::create(name, code, rng);
        entity.classify_visualization();
        let id = entity.id();
        self.entries.insert(id, entity);
        self.order.push(id);
        Ok(&self.entries[&id])
    }

    /// Queue a removal for the next listing pass. Returns `false` when the id
    /// is unknown or already queued.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        if !self.entries.contains_key(&id) || self.pending_removals.contains(&id) {
            return false;
        }
        self.pending_removals.push(id);
        true
    }

    /// Apply every queued removal. Returns how many entities were dropped.
    pub fn apply_pending(&mut self) -> usize {
        if self.pending_removals.is_empty() {
            return 0;
        }

        let mut removed = 0;
        for id in self.pending_removals.drain(..) {
            if self.entries.remove(&id).is_some() {
                removed += 1;
            }
        }
        let entries = &self.entries;
        self.order.retain(|id| entries.contains_key(id));
        removed
    }

    /// Current entities in insertion order, after applying queued removals.
    pub fn list_entities(&mut self) -> impl Iterator<Item = &Entity> + '_ {
        self.apply_pending();
        let entries = &self.entries;
        self.order.iter().filter_map(move |id| entries.get(id))
    }

    /// Interact with an entity, returning the summary message if it exists.
    pub fn interact_with(&mut self, id: EntityId) -> Option<String> {
        self.entries.get_mut(&id).map(Entity::interact)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Id at a 1-based display position, ignoring entities already queued for removal.
    pub fn id_at(&self, position: usize) -> Option<EntityId> {
        position
            .checked_sub(1)
            .and_then(|idx| self.visible_ids().nth(idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_removals(&self) -> usize {
        self.pending_removals.len()
    }

    /// Drop everything, including queued removals.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.pending_removals.clear();
    }

    fn visible_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |id| !self.pending_removals.contains(id))
    }
}

fn validate(name: &str, code: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if code.lines().any(|line| line.starts_with(RESERVED_MARKER)) {
        return Err(ValidationError::ReservedMarker);
    }
    Ok(())
}

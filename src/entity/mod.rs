//! Simulated digital actors that populate the quantum universe.
//!
//! Entities are plain values: the registry owns them and the view layer only
//! ever reads them. Position and identity are fixed at creation; energy only
//! drains.

mod classify;
mod core;

pub use classify::{VisualizationKind, classify};
pub use core::{
    Entity, EntityId, EntityStatus, INITIAL_ENERGY, INTERACTION_COST, Position, X_RANGE, Y_RANGE,
    Z_RANGE,
};

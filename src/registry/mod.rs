//! In-memory entity registry.
//!
//! Removals go through a command buffer so a listing pass never observes a
//! half-applied mutation; the buffer is applied at the start of the next
//! listing.

mod core;

pub use core::EntityRegistry;

//! Walking entities into archives and back.
//!
//! A snapshot is an entity count followed by that many entity records:
//!
//! ```text
//! e_count: u64
//! <raw id>: { e: u64, components: [ { has_any: bool, type: str, payload: T } ] }
//! ```
//!
//! Binary archives drop the keys and keep only the order. Text archives key each entity record by
//! the decimal form of its raw id.

mod reader;
mod record;
mod writer;

use bevy::prelude::*;

pub use self::{
    reader::SnapshotReader,
    record::{
        EntityLoadRecord,
        EntitySaveRecord,
    },
    writer::SnapshotWriter,
};

pub(crate) const E_COUNT: &str = "e_count";
pub(crate) const ENTITY_ID: &str = "e";
pub(crate) const ENTITY_COMPONENTS: &str = "components";
pub(crate) const COMPONENT_HAS_ANY: &str = "has_any";
pub(crate) const COMPONENT_TYPE: &str = "type";
pub(crate) const COMPONENT_PAYLOAD: &str = "payload";

/// What a [`SnapshotWriter`] saves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    /// A single entity.
    Entity(Entity),
    /// Every entity in the world.
    World,
}

/// Where a [`SnapshotReader`] loads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotTarget {
    /// The components of the first record are placed on this entity, its recorded id is ignored.
    Entity(Entity),
    /// Every record is placed on an entity chosen through the entity map.
    ///
    /// Recorded ids are only keys into that map and are never requested from the world. An
    /// unmapped or stale id gets a freshly spawned entity.
    World,
}

/// The default filter, letting every registered type through.
pub fn accept_all(_: &str) -> bool {
    true
}

use bevy::prelude::*;

use crate::{
    archive::{
        ArchiveReader,
        ArchiveWriter,
    },
    error::Error,
    registry::ComponentRegistry,
    snapshot::{
        COMPONENT_HAS_ANY,
        COMPONENT_TYPE,
        ENTITY_COMPONENTS,
        ENTITY_ID,
    },
    value::{
        BorrowedValue,
        OwnedValue,
    },
};

const MAX_PREALLOCATED: usize = 64;

/// An entity and the components of it that are about to be saved.
#[derive(Debug)]
pub struct EntitySaveRecord<'a> {
    /// The entity being saved.
    pub entity: Entity,
    /// The components to save, in archetype order.
    pub components: Vec<BorrowedValue<'a>>,
}

impl EntitySaveRecord<'_> {
    /// Writes the record.
    ///
    /// # Errors
    /// If a payload fails to serialize or the archive fails.
    pub fn write(&self, archive: &mut dyn ArchiveWriter) -> Result<(), Error> {
        let raw = self.entity.to_bits();

        archive.begin_record(&raw.to_string())?;
        archive.field(ENTITY_ID, &raw)?;
        archive.begin_list(ENTITY_COMPONENTS, self.components.len())?;

        for value in &self.components {
            archive.begin_record(value.name())?;
            archive.field(COMPONENT_HAS_ANY, &true)?;
            archive.field(COMPONENT_TYPE, &value.name())?;
            value.save(archive)?;
            archive.end()?;
        }

        archive.end()?;
        archive.end()
    }
}

/// An entity record as it was read, before its components are placed anywhere.
#[derive(Debug)]
pub struct EntityLoadRecord {
    /// The raw entity id that was recorded.
    pub entity: u64,
    /// The decoded components, in recorded order.
    pub components: Vec<OwnedValue>,
}

impl EntityLoadRecord {
    /// Reads a record, resolving every recorded type name through `registry`.
    ///
    /// # Errors
    /// - [`Error::Lookup`] if a type name is not registered.
    /// - [`Error::Format`] if the archive is malformed or truncated.
    pub fn read(
        archive: &mut dyn ArchiveReader,
        registry: &ComponentRegistry,
    ) -> Result<Self, Error> {
        archive.begin_record(None)?;

        let entity = archive.field::<u64>(Some(ENTITY_ID))?;
        let len = archive.begin_list(Some(ENTITY_COMPONENTS))?;
        // Lengths come from the archive, only trust them as far as the hint cap.
        let mut components = Vec::with_capacity(len.min(MAX_PREALLOCATED));

        for _ in 0..len {
            archive.begin_record(None)?;

            if archive.field::<bool>(Some(COMPONENT_HAS_ANY))? {
                let name = archive.field::<String>(Some(COMPONENT_TYPE))?;
                let descriptor = registry
                    .resolve_by_name(&name)
                    .ok_or(Error::Lookup { name })?;

                components.push(descriptor.load(archive)?);
            }

            archive.end()?;
        }

        archive.end()?;
        archive.end()?;

        Ok(Self { entity, components })
    }

    /// The recorded entity, if the raw id is a valid entity.
    pub fn recorded_entity(&self) -> Option<Entity> {
        Entity::try_from_bits(self.entity).ok()
    }
}

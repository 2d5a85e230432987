#[cfg(feature = "log")]
use bevy::log::{
    debug,
    trace,
};
use bevy::prelude::*;

use crate::{
    archive::ArchiveWriter,
    error::Error,
    registry::ComponentRegistry,
    snapshot::{
        E_COUNT,
        EntitySaveRecord,
        SnapshotSource,
        accept_all,
    },
};

/// [`SnapshotWriter`] lets you configure how entities are written to an archive.
///
/// # Example
/// ```
/// # use bevy::prelude::*;
/// # use bevy_snapshot::prelude::*;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Component, Serialize, Deserialize, Default)]
/// # struct Position(i32, i32);
/// # let mut builder = ComponentRegistry::builder();
/// # builder.register::<Position>("position")?;
/// # let registry = builder.build();
/// # let mut world = World::new();
/// let entity = world.spawn(Position(1, 2)).id();
///
/// let mut buf = Vec::new();
/// let mut archive = BinaryWriter::new(&mut buf);
///
/// SnapshotWriter::new(&world)
///     .registry(&registry)
///     .filter(|name| name != "velocity")
///     .save_entity(&mut archive, entity)?;
///
/// archive.finish()?;
/// # Ok::<(), bevy_snapshot::Error>(())
/// ```
pub struct SnapshotWriter<'a> {
    world: &'a World,
    registry: Option<&'a ComponentRegistry>,
    filter: Box<dyn Fn(&str) -> bool + 'a>,
}

impl<'a> SnapshotWriter<'a> {
    /// Create a new [`SnapshotWriter`] for the world.
    pub fn new(world: &'a World) -> Self {
        Self {
            world,
            registry: None,
            filter: Box::new(accept_all),
        }
    }

    /// Resolve component types through `registry` instead of the global registry.
    pub fn registry(mut self, registry: &'a ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Only save components whose registered name passes `filter`.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + 'a,
    {
        self.filter = Box::new(filter);
        self
    }

    fn type_registry(&self) -> Result<&'a ComponentRegistry, Error> {
        ComponentRegistry::explicit_or_global(self.registry)
    }

    /// Collects the registered components of `entity` that pass the filter.
    ///
    /// Components of unregistered types are skipped.
    ///
    /// # Errors
    /// - [`Error::MissingEntity`] if the entity does not exist.
    /// - [`Error::MissingRegistry`] if no registry is available.
    pub fn record(&self, entity: Entity) -> Result<EntitySaveRecord<'a>, Error> {
        let registry = self.type_registry()?;
        let entity_ref = self
            .world
            .get_entity(entity)
            .map_err(|_| Error::MissingEntity { entity })?;

        let mut components = Vec::new();

        for component_id in entity_ref.archetype().components() {
            let descriptor = self
                .world
                .components()
                .get_info(component_id)
                .and_then(|info| info.type_id())
                .and_then(|type_id| registry.resolve_by_type_id(type_id));

            let Some(descriptor) = descriptor else {
                #[cfg(feature = "log")]
                trace!(
                    "skipping unregistered component {:?} on {}",
                    component_id, entity
                );
                continue;
            };

            if (self.filter)(descriptor.name()) {
                components.push(descriptor.borrow(self.world, entity)?);
            }
        }

        Ok(EntitySaveRecord { entity, components })
    }

    /// Writes a snapshot of `source` to `archive`.
    ///
    /// The archive is not [finished](ArchiveWriter::finish), so further fields may follow.
    ///
    /// # Errors
    /// - [`Error::MissingEntity`] if a single entity was requested and it does not exist.
    /// - [`Error::MissingRegistry`] if no registry is available.
    /// - [`Error::Saving`] if a payload fails to serialize.
    pub fn save(
        &self,
        archive: &mut dyn ArchiveWriter,
        source: SnapshotSource,
    ) -> Result<(), Error> {
        let entities = match source {
            SnapshotSource::Entity(entity) => vec![entity],
            SnapshotSource::World => self.world.iter_entities().map(|e| e.id()).collect(),
        };

        archive.field(E_COUNT, &(entities.len() as u64))?;

        for entity in entities {
            self.record(entity)?.write(archive)?;
        }

        #[cfg(feature = "log")]
        debug!("wrote {:?} to a {:?} archive", source, archive.kind());

        Ok(())
    }

    /// Writes a snapshot holding only `entity`.
    ///
    /// # Errors
    /// See [`save`](Self::save).
    pub fn save_entity(&self, archive: &mut dyn ArchiveWriter, entity: Entity) -> Result<(), Error> {
        self.save(archive, SnapshotSource::Entity(entity))
    }

    /// Writes a snapshot of every entity in the world.
    ///
    /// # Errors
    /// See [`save`](Self::save).
    pub fn save_world(&self, archive: &mut dyn ArchiveWriter) -> Result<(), Error> {
        self.save(archive, SnapshotSource::World)
    }
}

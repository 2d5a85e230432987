#[cfg(feature = "log")]
use bevy::log::{
    debug,
    warn,
};
use bevy::{
    ecs::entity::EntityHashMap,
    prelude::*,
};

use crate::{
    archive::ArchiveReader,
    error::Error,
    registry::ComponentRegistry,
    snapshot::{
        E_COUNT,
        EntityLoadRecord,
        SnapshotTarget,
        accept_all,
    },
};

/// [`SnapshotReader`] lets you configure how an archive is loaded into the [`World`].
///
/// Loading is not transactional. If a record fails to decode, everything placed before it stays in
/// the world.
pub struct SnapshotReader<'a> {
    world: &'a mut World,
    registry: Option<&'a ComponentRegistry>,
    filter: Box<dyn Fn(&str) -> bool + 'a>,
    entity_map: Option<&'a mut EntityHashMap<Entity>>,
}

impl<'a> SnapshotReader<'a> {
    /// Create a new [`SnapshotReader`] for the world.
    pub fn new(world: &'a mut World) -> Self {
        Self {
            world,
            registry: None,
            filter: Box::new(accept_all),
            entity_map: None,
        }
    }

    /// Resolve recorded type names through `registry` instead of the global registry.
    pub fn registry(mut self, registry: &'a ComponentRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Only place components whose registered name passes `filter`.
    ///
    /// Rejected components are still decoded, so the rest of the archive stays readable.
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + 'a,
    {
        self.filter = Box::new(filter);
        self
    }

    /// Map recorded entities onto world entities through `entity_map`.
    ///
    /// Recorded entities already mapped to a live entity are loaded onto it, the others are
    /// spawned fresh and added to the map.
    pub fn entity_map(mut self, entity_map: &'a mut EntityHashMap<Entity>) -> Self {
        self.entity_map = Some(entity_map);
        self
    }

    fn type_registry(&self) -> Result<&'a ComponentRegistry, Error> {
        ComponentRegistry::explicit_or_global(self.registry)
    }

    /// Reads a single entity record without placing it.
    ///
    /// # Errors
    /// See [`EntityLoadRecord::read`].
    pub fn read_record(&self, archive: &mut dyn ArchiveReader) -> Result<EntityLoadRecord, Error> {
        EntityLoadRecord::read(archive, self.type_registry()?)
    }

    /// Loads a snapshot from `archive` into `target`, returning the entities that were written to.
    ///
    /// # Errors
    /// - [`Error::Format`] if the archive is malformed, or holds no record for a single target.
    /// - [`Error::Lookup`] if the archive names an unregistered type.
    /// - [`Error::MissingEntity`] if the target entity does not exist.
    /// - [`Error::MissingRegistry`] if no registry is available.
    pub fn load(
        self,
        archive: &mut dyn ArchiveReader,
        target: SnapshotTarget,
    ) -> Result<Vec<Entity>, Error> {
        let registry = self.type_registry()?;
        let count = archive.field::<u64>(Some(E_COUNT))?;

        let Self {
            world,
            filter,
            entity_map,
            ..
        } = self;

        match target {
            SnapshotTarget::Entity(entity) => {
                if world.get_entity(entity).is_err() {
                    return Err(Error::MissingEntity { entity });
                }

                if count == 0 {
                    return Err(Error::Format("snapshot holds no entity record".into()));
                }

                #[cfg(feature = "log")]
                if count > 1 {
                    warn!(
                        "snapshot holds {} entity records, only the first is loaded onto {}",
                        count, entity
                    );
                }

                let record = EntityLoadRecord::read(archive, registry)?;
                place(world, &*filter, entity, record)?;

                Ok(vec![entity])
            }
            SnapshotTarget::World => {
                let mut default_entity_map = EntityHashMap::default();
                let entity_map = entity_map.unwrap_or(&mut default_entity_map);

                let mut entities = Vec::new();

                for _ in 0..count {
                    let record = EntityLoadRecord::read(archive, registry)?;
                    let entity = map_entity(world, entity_map, &record);

                    place(world, &*filter, entity, record)?;
                    entities.push(entity);
                }

                #[cfg(feature = "log")]
                debug!("loaded {} entities", entities.len());

                Ok(entities)
            }
        }
    }

    /// Loads the first record of a snapshot onto `entity`, ignoring its recorded id.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn load_into(self, archive: &mut dyn ArchiveReader, entity: Entity) -> Result<(), Error> {
        self.load(archive, SnapshotTarget::Entity(entity)).map(|_| ())
    }

    /// Loads every record of a snapshot, returning the target entities in record order.
    ///
    /// # Errors
    /// See [`load`](Self::load).
    pub fn load_world(self, archive: &mut dyn ArchiveReader) -> Result<Vec<Entity>, Error> {
        self.load(archive, SnapshotTarget::World)
    }
}

fn map_entity(
    world: &mut World,
    entity_map: &mut EntityHashMap<Entity>,
    record: &EntityLoadRecord,
) -> Entity {
    let Some(recorded) = record.recorded_entity() else {
        return world.spawn_empty().id();
    };

    match entity_map.get(&recorded) {
        Some(&entity) if world.get_entity(entity).is_ok() => entity,
        _ => {
            let entity = world.spawn_empty().id();
            entity_map.insert(recorded, entity);
            entity
        }
    }
}

fn place(
    world: &mut World,
    filter: &dyn Fn(&str) -> bool,
    entity: Entity,
    record: EntityLoadRecord,
) -> Result<(), Error> {
    for value in record.components {
        if filter(value.name()) {
            value.emplace(world, entity)?;
        } else {
            #[cfg(feature = "log")]
            debug!("dropping filtered `{}` for {}", value.name(), entity);
        }
    }

    Ok(())
}

use std::{
    any::{
        Any,
        TypeId,
    },
    fmt,
    sync::Arc,
};

use bevy::prelude::*;

use crate::{
    archive::{
        ArchiveReader,
        ArchiveWriter,
    },
    error::Error,
    registry::SnapshotComponent,
    snapshot::COMPONENT_PAYLOAD,
    value::{
        BorrowedValue,
        BorrowedValueMut,
        ErasedBox,
        OwnedValue,
    },
};

/// Stable numeric id of a registered type, the 64-bit FNV-1a hash of its name.
///
/// Unlike [`TypeId`] it is the same across builds and platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    /// Hashes a registered name.
    pub const fn of(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::OFFSET;
        let mut i = 0;

        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::PRIME);
            i += 1;
        }

        Self(hash)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Function table bound to one concrete component type.
#[derive(Clone, Copy)]
pub(crate) struct DescriptorFns {
    construct: fn() -> Option<ErasedBox>,
    save: fn(&dyn Any, &mut dyn ArchiveWriter) -> Result<(), Error>,
    load: fn(&mut dyn ArchiveReader) -> Result<ErasedBox, Error>,
    emplace: fn(&mut World, Entity, ErasedBox) -> Result<(), Error>,
    remove: fn(&mut World, Entity),
    contains: fn(&World, Entity) -> bool,
    get: fn(&World, Entity) -> Option<&dyn Any>,
    get_mut: fn(&mut World, Entity) -> Option<&mut dyn Any>,
}

impl DescriptorFns {
    pub(crate) fn of<T: SnapshotComponent>() -> Self {
        Self {
            construct: || None,
            save: save::<T>,
            load: load::<T>,
            emplace: emplace::<T>,
            remove: remove::<T>,
            contains: contains::<T>,
            get: get::<T>,
            get_mut: get_mut::<T>,
        }
    }

    pub(crate) fn with_default<T: SnapshotComponent + Default>(self) -> Self {
        Self {
            construct: construct::<T>,
            ..self
        }
    }
}

fn mismatch<T>() -> Error {
    Error::TypeMismatch {
        expected: std::any::type_name::<T>().to_owned(),
        actual: "an erased value of another type".to_owned(),
    }
}

fn construct<T: SnapshotComponent + Default>() -> Option<ErasedBox> {
    Some(Box::new(T::default()))
}

fn save<T: SnapshotComponent>(
    value: &dyn Any,
    archive: &mut dyn ArchiveWriter,
) -> Result<(), Error> {
    let value = value.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
    archive.field(COMPONENT_PAYLOAD, value)
}

fn load<T: SnapshotComponent>(archive: &mut dyn ArchiveReader) -> Result<ErasedBox, Error> {
    let value: T = archive.field(Some(COMPONENT_PAYLOAD))?;
    Ok(Box::new(value))
}

fn emplace<T: SnapshotComponent>(
    world: &mut World,
    entity: Entity,
    value: ErasedBox,
) -> Result<(), Error> {
    let value = value.downcast::<T>().map_err(|_| mismatch::<T>())?;

    world
        .get_entity_mut(entity)
        .map_err(|_| Error::MissingEntity { entity })?
        .insert(*value);

    Ok(())
}

fn remove<T: SnapshotComponent>(world: &mut World, entity: Entity) {
    if let Ok(mut entity_mut) = world.get_entity_mut(entity) {
        entity_mut.remove::<T>();
    }
}

fn contains<T: SnapshotComponent>(world: &World, entity: Entity) -> bool {
    world
        .get_entity(entity)
        .is_ok_and(|entity_ref| entity_ref.contains::<T>())
}

fn get<T: SnapshotComponent>(world: &World, entity: Entity) -> Option<&dyn Any> {
    world.get::<T>(entity).map(|value| value as &dyn Any)
}

fn get_mut<T: SnapshotComponent>(world: &mut World, entity: Entity) -> Option<&mut dyn Any> {
    world
        .get_mut::<T>(entity)
        .map(|value| value.into_inner() as &mut dyn Any)
}

/// Name, ids and bound function table of one registered component type.
///
/// Descriptors are created by [`RegistryBuilder`](crate::registry::RegistryBuilder) and never
/// change afterwards. Every operation dispatches to code monomorphised for the registered type.
pub struct TypeDescriptor {
    name: String,
    id: TypeHash,
    type_id: TypeId,
    type_path: &'static str,
    fns: DescriptorFns,
}

impl TypeDescriptor {
    pub(crate) fn new<T: SnapshotComponent>(name: String, fns: DescriptorFns) -> Self {
        Self {
            id: TypeHash::of(&name),
            name,
            type_id: TypeId::of::<T>(),
            type_path: std::any::type_name::<T>(),
            fns,
        }
    }

    /// The name the type was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stable numeric id, derived from [`name`](Self::name).
    pub fn id(&self) -> TypeHash {
        self.id
    }

    /// The Rust [`TypeId`] of the registered type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The Rust type path of the registered type, for diagnostics.
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// Returns `true` if this descriptor was registered for `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    fn check(&self, other: &TypeDescriptor) -> Result<(), Error> {
        if self.type_id == other.type_id {
            Ok(())
        } else {
            Err(Error::TypeMismatch {
                expected: self.name.clone(),
                actual: other.name.clone(),
            })
        }
    }

    /// Creates a default instance of the type.
    ///
    /// # Errors
    /// [`Error::Construction`] if the type was registered without a default.
    pub fn construct(self: &Arc<Self>) -> Result<OwnedValue, Error> {
        let value = (self.fns.construct)().ok_or_else(|| Error::Construction {
            name: self.name.clone(),
        })?;

        Ok(OwnedValue::from_parts(value, self.clone()))
    }

    /// Writes the payload of a borrowed component.
    ///
    /// # Errors
    /// If `value` belongs to another type or serialization fails.
    pub fn save(
        &self,
        value: &BorrowedValue,
        archive: &mut dyn ArchiveWriter,
    ) -> Result<(), Error> {
        self.check(value.descriptor())?;
        (self.fns.save)(value.as_any(), archive)
    }

    /// Reads a fresh instance from a payload.
    ///
    /// # Errors
    /// If the payload is missing or malformed.
    pub fn load(self: &Arc<Self>, archive: &mut dyn ArchiveReader) -> Result<OwnedValue, Error> {
        let value = (self.fns.load)(archive)?;
        Ok(OwnedValue::from_parts(value, self.clone()))
    }

    /// Moves `value` onto `entity`, replacing any component of the same type.
    ///
    /// # Errors
    /// If `value` belongs to another type or the entity does not exist.
    pub fn emplace(
        &self,
        world: &mut World,
        entity: Entity,
        value: OwnedValue,
    ) -> Result<(), Error> {
        self.check(value.descriptor())?;
        (self.fns.emplace)(world, entity, value.into_box())
    }

    /// Constructs a default instance and moves it onto `entity`.
    ///
    /// # Errors
    /// See [`construct`](Self::construct) and [`emplace`](Self::emplace).
    pub fn emplace_default(
        self: &Arc<Self>,
        world: &mut World,
        entity: Entity,
    ) -> Result<(), Error> {
        let value = self.construct()?;
        self.emplace(world, entity, value)
    }

    /// Removes the component from `entity`, doing nothing if it is absent.
    pub fn remove(&self, world: &mut World, entity: Entity) {
        (self.fns.remove)(world, entity);
    }

    /// Returns `true` if `entity` carries the component.
    pub fn contains(&self, world: &World, entity: Entity) -> bool {
        (self.fns.contains)(world, entity)
    }

    /// Borrows the component on `entity`.
    ///
    /// # Errors
    /// [`Error::Access`] if the entity does not carry it.
    pub fn borrow<'a>(
        &'a self,
        world: &'a World,
        entity: Entity,
    ) -> Result<BorrowedValue<'a>, Error> {
        let value = (self.fns.get)(world, entity).ok_or_else(|| self.access(entity))?;
        Ok(BorrowedValue::from_parts(value, self))
    }

    /// Borrows the component on `entity` exclusively, marking it as changed.
    ///
    /// # Errors
    /// [`Error::Access`] if the entity does not carry it.
    pub fn borrow_mut<'a>(
        &'a self,
        world: &'a mut World,
        entity: Entity,
    ) -> Result<BorrowedValueMut<'a>, Error> {
        let value = (self.fns.get_mut)(world, entity).ok_or_else(|| self.access(entity))?;
        Ok(BorrowedValueMut::from_parts(value, self))
    }

    fn access(&self, entity: Entity) -> Error {
        Error::Access {
            entity,
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("type_path", &self.type_path)
            .finish_non_exhaustive()
    }
}

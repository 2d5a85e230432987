//! Type-erased component values tagged with their [`TypeDescriptor`].

use std::{
    any::Any,
    fmt,
    sync::Arc,
};

use bevy::prelude::*;

use crate::{
    archive::ArchiveWriter,
    error::Error,
    registry::{
        ComponentRegistry,
        SnapshotComponent,
        TypeDescriptor,
    },
};

pub(crate) type ErasedBox = Box<dyn Any + Send + Sync>;

/// An owned, type-erased component.
///
/// Produced by [`TypeDescriptor::construct`] and [`TypeDescriptor::load`], consumed by
/// [`emplace`](Self::emplace) or unwrapped with [`into_typed`](Self::into_typed).
pub struct OwnedValue {
    value: ErasedBox,
    descriptor: Arc<TypeDescriptor>,
}

impl OwnedValue {
    /// Wraps a typed value.
    ///
    /// # Errors
    /// [`Error::UnregisteredType`] if `T` is not in `registry`.
    pub fn new<T: SnapshotComponent>(value: T, registry: &ComponentRegistry) -> Result<Self, Error> {
        let descriptor = registry
            .resolve::<T>()
            .ok_or(Error::UnregisteredType {
                type_path: std::any::type_name::<T>(),
            })?
            .clone();

        Ok(Self::from_parts(Box::new(value), descriptor))
    }

    pub(crate) fn from_parts(value: ErasedBox, descriptor: Arc<TypeDescriptor>) -> Self {
        Self { value, descriptor }
    }

    /// The descriptor of the contained type.
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// The registered name of the contained type.
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// Returns `true` if the value is a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the value as `T`, if it is one.
    pub fn try_typed<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Borrows the value as `T`.
    ///
    /// # Panics
    /// If the value is not a `T`.
    pub fn typed<T: 'static>(&self) -> &T {
        match self.try_typed() {
            Some(value) => value,
            None => panic!(
                "`{}` accessed as `{}`",
                self.name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Mutably borrows the value as `T`, if it is one.
    pub fn try_typed_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Mutably borrows the value as `T`.
    ///
    /// # Panics
    /// If the value is not a `T`.
    pub fn typed_mut<T: 'static>(&mut self) -> &mut T {
        match self.value.downcast_mut() {
            Some(value) => value,
            None => panic!(
                "`{}` accessed as `{}`",
                self.descriptor.name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Unwraps the value as `T`, handing it back unchanged if it is another type.
    pub fn into_typed<T: 'static>(self) -> Result<T, Self> {
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self::from_parts(value, self.descriptor)),
        }
    }

    pub(crate) fn into_box(self) -> ErasedBox {
        self.value
    }

    /// Moves the value onto `entity`, replacing any component of the same type.
    ///
    /// # Errors
    /// [`Error::MissingEntity`] if the entity does not exist.
    pub fn emplace(self, world: &mut World, entity: Entity) -> Result<(), Error> {
        let descriptor = self.descriptor.clone();
        descriptor.emplace(world, entity, self)
    }
}

impl fmt::Debug for OwnedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OwnedValue")
            .field("type", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// A shared borrow of a type-erased component.
#[derive(Clone, Copy)]
pub struct BorrowedValue<'a> {
    value: &'a dyn Any,
    descriptor: &'a TypeDescriptor,
}

impl<'a> BorrowedValue<'a> {
    pub(crate) fn from_parts(value: &'a dyn Any, descriptor: &'a TypeDescriptor) -> Self {
        Self { value, descriptor }
    }

    /// Borrows a typed value.
    ///
    /// # Errors
    /// [`Error::UnregisteredType`] if `T` is not in `registry`.
    pub fn new<T: SnapshotComponent>(
        value: &'a T,
        registry: &'a ComponentRegistry,
    ) -> Result<Self, Error> {
        let descriptor = registry.resolve::<T>().ok_or(Error::UnregisteredType {
            type_path: std::any::type_name::<T>(),
        })?;

        Ok(Self::from_parts(value, descriptor))
    }

    /// The descriptor of the borrowed type.
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.descriptor
    }

    /// The registered name of the borrowed type.
    pub fn name(&self) -> &'a str {
        self.descriptor.name()
    }

    /// The borrowed value.
    pub fn as_any(&self) -> &'a dyn Any {
        self.value
    }

    /// Returns the value as `T`, if it is one.
    pub fn try_typed<T: 'static>(&self) -> Option<&'a T> {
        self.value.downcast_ref()
    }

    /// Returns the value as `T`.
    ///
    /// # Panics
    /// If the value is not a `T`.
    pub fn typed<T: 'static>(&self) -> &'a T {
        match self.try_typed() {
            Some(value) => value,
            None => panic!(
                "`{}` accessed as `{}`",
                self.name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Writes the payload through the value's own descriptor.
    ///
    /// # Errors
    /// If serialization fails.
    pub fn save(&self, archive: &mut dyn ArchiveWriter) -> Result<(), Error> {
        self.descriptor.save(self, archive)
    }
}

impl fmt::Debug for BorrowedValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorrowedValue")
            .field("type", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// An exclusive borrow of a type-erased component.
pub struct BorrowedValueMut<'a> {
    value: &'a mut dyn Any,
    descriptor: &'a TypeDescriptor,
}

impl<'a> BorrowedValueMut<'a> {
    pub(crate) fn from_parts(value: &'a mut dyn Any, descriptor: &'a TypeDescriptor) -> Self {
        Self { value, descriptor }
    }

    /// The descriptor of the borrowed type.
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.descriptor
    }

    /// The registered name of the borrowed type.
    pub fn name(&self) -> &'a str {
        self.descriptor.name()
    }

    /// Reborrows as a shared [`BorrowedValue`].
    pub fn as_borrowed(&self) -> BorrowedValue<'_> {
        BorrowedValue::from_parts(&*self.value, self.descriptor)
    }

    /// Mutably borrows the value as `T`, if it is one.
    pub fn try_typed_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Mutably borrows the value as `T`.
    ///
    /// # Panics
    /// If the value is not a `T`.
    pub fn typed_mut<T: 'static>(&mut self) -> &mut T {
        let name = self.descriptor.name();

        match self.value.downcast_mut() {
            Some(value) => value,
            None => panic!("`{}` accessed as `{}`", name, std::any::type_name::<T>()),
        }
    }

    /// Writes the payload through the value's own descriptor.
    ///
    /// # Errors
    /// If serialization fails.
    pub fn save(&self, archive: &mut dyn ArchiveWriter) -> Result<(), Error> {
        self.as_borrowed().save(archive)
    }
}

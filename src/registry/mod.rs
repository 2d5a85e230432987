//! Runtime registry mapping component names and ids to [`TypeDescriptor`]s.
//!
//! Registration happens on a [`RegistryBuilder`] at startup. Building it freezes the set of types
//! into an immutable [`ComponentRegistry`], which can optionally be installed once as the
//! process-wide registry used whenever a snapshot is taken without an explicit one.

mod component;
mod descriptor;

use std::{
    any::TypeId,
    sync::{
        Arc,
        OnceLock,
    },
};

#[cfg(feature = "log")]
use bevy::log::debug;
use bevy::platform::collections::HashMap;

pub(crate) use self::descriptor::DescriptorFns;
pub use self::{
    component::{
        ComponentSet,
        NamedComponent,
        SnapshotComponent,
    },
    descriptor::{
        TypeDescriptor,
        TypeHash,
    },
};
use crate::error::Error;

static GLOBAL: OnceLock<ComponentRegistry> = OnceLock::new();

/// Immutable set of registered component types, indexed by name, [`TypeHash`] and [`TypeId`].
///
/// The three indices always resolve to the same descriptor for a given type.
#[derive(Default)]
pub struct ComponentRegistry {
    descriptors: Vec<Arc<TypeDescriptor>>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<TypeHash, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl ComponentRegistry {
    /// Starts registering types.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// The process-wide registry, if one has been [installed](RegistryBuilder::install).
    pub fn global() -> Option<&'static ComponentRegistry> {
        GLOBAL.get()
    }

    /// Picks `explicit` if given, otherwise the global registry.
    pub(crate) fn explicit_or_global(
        explicit: Option<&ComponentRegistry>,
    ) -> Result<&ComponentRegistry, Error> {
        explicit
            .or_else(|| Self::global())
            .ok_or(Error::MissingRegistry)
    }

    /// Looks up a descriptor by registered name.
    pub fn resolve_by_name(&self, name: &str) -> Option<&Arc<TypeDescriptor>> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }

    /// Looks up a descriptor by its stable numeric id.
    pub fn resolve_by_id(&self, id: TypeHash) -> Option<&Arc<TypeDescriptor>> {
        self.by_id.get(&id).map(|&i| &self.descriptors[i])
    }

    /// Looks up a descriptor by Rust [`TypeId`].
    pub fn resolve_by_type_id(&self, type_id: TypeId) -> Option<&Arc<TypeDescriptor>> {
        self.by_type.get(&type_id).map(|&i| &self.descriptors[i])
    }

    /// Looks up the descriptor registered for `T`.
    pub fn resolve<T: 'static>(&self) -> Option<&Arc<TypeDescriptor>> {
        self.resolve_by_type_id(TypeId::of::<T>())
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.descriptors.iter()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Collects component registrations before they are frozen into a [`ComponentRegistry`].
///
/// # Example
/// ```
/// # use bevy::prelude::*;
/// # use bevy_snapshot::prelude::*;
/// # use serde::{Deserialize, Serialize};
/// #[derive(Component, Serialize, Deserialize, Default)]
/// struct Position {
///     x: i32,
///     y: i32,
/// }
///
/// #[derive(Component, Serialize, Deserialize, Default)]
/// struct Velocity(i32, i32);
///
/// let mut builder = ComponentRegistry::builder();
///
/// builder
///     .register::<Position>("position")?
///     .register::<Velocity>("velocity")?;
///
/// let registry = builder.build();
///
/// assert_eq!(registry.resolve_by_name("position").unwrap().name(), "position");
/// # Ok::<(), bevy_snapshot::Error>(())
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    registry: ComponentRegistry,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `name`, using [`Default`] for construction.
    ///
    /// Registering the same type under the same name again does nothing.
    ///
    /// # Errors
    /// [`Error::RegistrationConflict`] if `name` belongs to another type, `T` is already
    /// registered under another name, or the name's [`TypeHash`] collides with another name.
    pub fn register<T: SnapshotComponent + Default>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut Self, Error> {
        self.insert::<T>(name.into(), DescriptorFns::of::<T>().with_default::<T>())
    }

    /// Registers `T` under `name` for a type with no viable default state.
    ///
    /// [`TypeDescriptor::construct`] fails for such types, loading and saving are unaffected.
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn register_without_default<T: SnapshotComponent>(
        &mut self,
        name: impl Into<String>,
    ) -> Result<&mut Self, Error> {
        self.insert::<T>(name.into(), DescriptorFns::of::<T>())
    }

    /// Registers `T` under [`NamedComponent::NAME`].
    ///
    /// # Errors
    /// See [`register`](Self::register).
    pub fn register_named<T: NamedComponent>(&mut self) -> Result<&mut Self, Error> {
        self.register::<T>(T::NAME)
    }

    /// Registers every member of a tuple of [`NamedComponent`]s.
    ///
    /// # Errors
    /// See [`register`](Self::register). Members before the failing one stay registered.
    pub fn register_set<S: ComponentSet>(&mut self) -> Result<&mut Self, Error> {
        S::register_set(self)?;
        Ok(self)
    }

    fn insert<T: SnapshotComponent>(
        &mut self,
        name: String,
        fns: DescriptorFns,
    ) -> Result<&mut Self, Error> {
        let type_id = TypeId::of::<T>();
        let incoming = std::any::type_name::<T>();

        let existing = self
            .registry
            .resolve_by_name(&name)
            .or_else(|| self.registry.resolve_by_type_id(type_id))
            .or_else(|| self.registry.resolve_by_id(TypeHash::of(&name)));

        if let Some(existing) = existing {
            if existing.name() == name && existing.type_id() == type_id {
                return Ok(self);
            }

            return Err(Error::RegistrationConflict {
                name,
                existing: existing.type_path(),
                incoming,
            });
        }

        let descriptor = TypeDescriptor::new::<T>(name, fns);
        let index = self.registry.descriptors.len();

        #[cfg(feature = "log")]
        debug!(
            "registered `{}` as `{}` ({})",
            incoming,
            descriptor.name(),
            descriptor.id()
        );

        self.registry
            .by_name
            .insert(descriptor.name().to_owned(), index);
        self.registry.by_id.insert(descriptor.id(), index);
        self.registry.by_type.insert(type_id, index);
        self.registry.descriptors.push(Arc::new(descriptor));

        Ok(self)
    }

    /// Freezes the registrations.
    pub fn build(self) -> ComponentRegistry {
        self.registry
    }

    /// Freezes the registrations and installs them as the process-wide registry.
    ///
    /// # Errors
    /// [`Error::RegistryInstalled`] if a global registry already exists.
    pub fn install(self) -> Result<&'static ComponentRegistry, Error> {
        GLOBAL
            .set(self.build())
            .map_err(|_| Error::RegistryInstalled)?;

        GLOBAL.get().ok_or(Error::RegistryInstalled)
    }
}

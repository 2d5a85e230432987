use bevy::ecs::component::{
    Component,
    Mutable,
};
use serde::{
    Serialize,
    de::DeserializeOwned,
};
use variadics_please::all_tuples;

use crate::{
    error::Error,
    registry::RegistryBuilder,
};

/// Components that can take part in snapshots.
///
/// Implemented for every mutable [`Component`] that serde can serialize and deserialize.
pub trait SnapshotComponent: Component<Mutability = Mutable> + Serialize + DeserializeOwned {}

impl<T> SnapshotComponent for T where T: Component<Mutability = Mutable> + Serialize + DeserializeOwned
{}

/// A [`SnapshotComponent`] that carries the name it is registered under.
///
/// Usually derived:
/// ```
/// # use bevy::prelude::*;
/// # use bevy_snapshot::prelude::*;
/// # use serde::{Deserialize, Serialize};
/// #[derive(Component, NamedComponent, Serialize, Deserialize, Default)]
/// #[snapshot(name = "position")]
/// struct Position {
///     x: i32,
///     y: i32,
/// }
///
/// assert_eq!(Position::NAME, "position");
/// ```
pub trait NamedComponent: SnapshotComponent + Default {
    /// The stable name written to snapshots.
    const NAME: &'static str;
}

/// A set of [`NamedComponent`]s registered together, implemented for tuples.
pub trait ComponentSet {
    /// Registers every member of the set.
    ///
    /// # Errors
    /// See [`RegistryBuilder::register`].
    fn register_set(builder: &mut RegistryBuilder) -> Result<(), Error>;
}

macro_rules! impl_component_set {
    ($(#[$meta:meta])* $($C:ident),*) => {
        $(#[$meta])*
        #[allow(unused_variables)]
        impl<$($C: NamedComponent),*> ComponentSet for ($($C,)*) {
            fn register_set(builder: &mut RegistryBuilder) -> Result<(), Error> {
                $(builder.register_named::<$C>()?;)*
                Ok(())
            }
        }
    };
}

all_tuples!(
    #[doc(fake_variadic)]
    impl_component_set,
    0,
    15,
    C
);

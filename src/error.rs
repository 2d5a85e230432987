//! [`Error`] type shared by the registry, archives and snapshot traversal.

use bevy::prelude::*;
use thiserror::Error;

/// An error that may occur while registering types or saving and loading snapshots.
#[derive(Error, Debug)]
pub enum Error {
    /// A name was registered twice for different types, or a type was registered under two names.
    #[error(
        "cannot register `{incoming}` as `{name}`, the registration conflicts with `{existing}`"
    )]
    RegistrationConflict {
        /// The name that was requested.
        name: String,
        /// The type path of the existing registration.
        existing: &'static str,
        /// The type path of the rejected registration.
        incoming: &'static str,
    },

    /// The process-wide registry was installed more than once.
    #[error("the global type registry has already been installed")]
    RegistryInstalled,

    /// Neither an explicit registry nor the global registry is available.
    #[error("no type registry available, set one on the builder or install the global registry")]
    MissingRegistry,

    /// A descriptor was asked for a default instance of a type that has none.
    #[error("`{name}` has no default state to construct")]
    Construction {
        /// The registered name of the type.
        name: String,
    },

    /// A snapshot names a type that is not registered.
    #[error("snapshot contains the unregistered type `{name}`, register it before loading")]
    Lookup {
        /// The name read from the archive.
        name: String,
    },

    /// A typed value was wrapped for a type that is not registered.
    #[error("`{type_path}` is not registered")]
    UnregisteredType {
        /// The Rust type path of the value.
        type_path: &'static str,
    },

    /// A component was borrowed from an entity that does not carry it.
    #[error("entity {entity} has no `{name}` component")]
    Access {
        /// The entity that was accessed.
        entity: Entity,
        /// The registered name of the component.
        name: String,
    },

    /// The entity does not exist in the world.
    #[error("entity {entity} does not exist")]
    MissingEntity {
        /// The missing entity.
        entity: Entity,
    },

    /// A value was handed to a descriptor of a different type.
    #[error("expected a value of `{expected}`, found `{actual}`")]
    TypeMismatch {
        /// The registered name the descriptor expects.
        expected: String,
        /// The registered name of the value.
        actual: String,
    },

    /// Saving or serialization error.
    #[error("error occurred while saving: {0}")]
    Saving(String),

    /// Malformed or truncated archive data.
    #[error("malformed archive: {0}")]
    Format(String),

    /// IO / Filesystem error.
    #[error("io error: {0}")]
    IO(#[from] std::io::Error),
}

impl Error {
    /// Saving or serialization error.
    pub fn saving(error: impl std::error::Error) -> Self {
        Self::Saving(error.to_string())
    }

    /// Loading or deserialization error.
    pub fn loading(error: impl std::error::Error) -> Self {
        Self::Format(error.to_string())
    }
}

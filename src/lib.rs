#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![doc = include_str!("../README.md")]

extern crate self as bevy_snapshot;

pub mod archive;
pub mod backend;
pub mod dir;
pub mod error;
pub mod ext;
pub mod format;
pub mod registry;
pub mod snapshot;
pub mod value;

pub use bevy_snapshot_macros::NamedComponent;

pub use crate::error::Error;

/// Prelude: convenient import for all the user-facing APIs provided by the crate
pub mod prelude {
    pub use crate::{
        NamedComponent,
        archive::{
            ArchiveKind,
            ArchiveReader,
            ArchiveWriter,
            BinaryReader,
            BinaryWriter,
            TextReader,
            TextWriter,
        },
        backend::{
            Backend,
            FileIO,
        },
        dir::SAVE_DIR,
        error::Error as SnapshotError,
        ext::WorldSnapshotExt,
        format::{
            DefaultDebugFormat,
            DefaultFormat,
            Format,
            JSONFormat,
            RMPFormat,
        },
        registry::{
            ComponentRegistry,
            ComponentSet,
            NamedComponent,
            RegistryBuilder,
            SnapshotComponent,
            TypeDescriptor,
            TypeHash,
        },
        snapshot::{
            EntityLoadRecord,
            EntitySaveRecord,
            SnapshotReader,
            SnapshotSource,
            SnapshotTarget,
            SnapshotWriter,
            accept_all,
        },
        value::{
            BorrowedValue,
            BorrowedValueMut,
            OwnedValue,
        },
    };
}

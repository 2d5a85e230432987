//! Extension trait that adds snapshot-related methods to Bevy's [`World`].

use std::io::{
    Read,
    Write,
};

use bevy::prelude::*;

use crate::{
    backend::Backend,
    error::Error,
    format::Format,
    snapshot::{
        SnapshotReader,
        SnapshotWriter,
    },
};

/// Extension trait that adds snapshot-related methods to Bevy's [`World`].
///
/// The `save_*` and `load_*` shortcuts cover every entity and resolve types through the
/// [global registry](crate::registry::ComponentRegistry::global). Use
/// [`snapshot_writer`](Self::snapshot_writer) and [`snapshot_reader`](Self::snapshot_reader) for
/// anything else.
pub trait WorldSnapshotExt {
    /// Starts configuring a [`SnapshotWriter`] over this world.
    fn snapshot_writer(&self) -> SnapshotWriter<'_>;

    /// Starts configuring a [`SnapshotReader`] into this world.
    fn snapshot_reader(&mut self) -> SnapshotReader<'_>;

    /// Writes every entity to `writer` with the given [`Format`].
    ///
    /// # Errors
    /// - See [`Error`]
    fn save_snapshot<F: Format, W: Write>(&self, writer: W) -> Result<(), Error>;

    /// Loads every entity in a snapshot read from `reader` with the given [`Format`].
    ///
    /// # Errors
    /// - See [`Error`]
    fn load_snapshot<F: Format, R: Read>(&mut self, reader: R) -> Result<Vec<Entity>, Error>;

    /// Saves every entity to the slot `key` of `backend`.
    ///
    /// # Errors
    /// - See [`Error`]
    fn save_slot<F: Format, B: Backend>(&self, backend: &B, key: &str) -> Result<(), Error>;

    /// Loads every entity from the slot `key` of `backend`.
    ///
    /// # Errors
    /// - See [`Error`]
    fn load_slot<F: Format, B: Backend>(
        &mut self,
        backend: &B,
        key: &str,
    ) -> Result<Vec<Entity>, Error>;
}

impl WorldSnapshotExt for World {
    fn snapshot_writer(&self) -> SnapshotWriter<'_> {
        SnapshotWriter::new(self)
    }

    fn snapshot_reader(&mut self) -> SnapshotReader<'_> {
        SnapshotReader::new(self)
    }

    fn save_snapshot<F: Format, W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut archive = F::writer(writer);

        self.snapshot_writer().save_world(&mut *archive)?;
        archive.finish()
    }

    fn load_snapshot<F: Format, R: Read>(&mut self, reader: R) -> Result<Vec<Entity>, Error> {
        let mut archive = F::reader(reader)?;

        self.snapshot_reader().load_world(&mut *archive)
    }

    fn save_slot<F: Format, B: Backend>(&self, backend: &B, key: &str) -> Result<(), Error> {
        let key = format!("{key}{}", F::extension());
        self.save_snapshot::<F, _>(backend.writer(&key)?)
    }

    fn load_slot<F: Format, B: Backend>(
        &mut self,
        backend: &B,
        key: &str,
    ) -> Result<Vec<Entity>, Error> {
        let key = format!("{key}{}", F::extension());
        self.load_snapshot::<F, _>(backend.reader(&key)?)
    }
}

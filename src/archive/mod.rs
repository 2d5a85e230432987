//! Format-agnostic archives that snapshot records are written to and read from.
//!
//! Every record and payload is written against [`ArchiveWriter`] / [`ArchiveReader`], so the same
//! traversal produces either a positional binary stream ([`BinaryWriter`]) or a keyed, human-readable
//! document ([`TextWriter`]). Which one is used is decided only where the archive is constructed.

mod binary;
mod text;

use serde::{
    Serialize,
    de::DeserializeOwned,
};

pub use self::{
    binary::{
        BinaryReader,
        BinaryWriter,
    },
    text::{
        TextReader,
        TextWriter,
    },
};
use crate::error::Error;

/// The encoding family an archive uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Positional fields, no keys.
    Binary,
    /// Keyed fields, human-readable.
    Text,
}

/// Callback handed an erased deserializer positioned at the requested field.
pub type FieldDecoder<'a> = &'a mut dyn FnMut(
    &mut dyn erased_serde::Deserializer<'static>,
) -> Result<(), erased_serde::Error>;

/// A serialization sink.
///
/// Names are always supplied. Binary archives ignore them, text archives use them as keys.
pub trait ArchiveWriter {
    /// The encoding family of this archive.
    fn kind(&self) -> ArchiveKind;

    /// Serializes a single named field.
    ///
    /// # Errors
    /// If the value fails to serialize or the sink fails.
    fn write_field(&mut self, name: &str, value: &dyn erased_serde::Serialize)
    -> Result<(), Error>;

    /// Opens a nested record. Must be balanced by [`end`](Self::end).
    ///
    /// # Errors
    /// If the sink fails.
    fn begin_record(&mut self, name: &str) -> Result<(), Error>;

    /// Opens a list of `len` elements. Must be balanced by [`end`](Self::end).
    ///
    /// # Errors
    /// If the sink fails.
    fn begin_list(&mut self, name: &str, len: usize) -> Result<(), Error>;

    /// Closes the innermost record or list.
    ///
    /// # Errors
    /// If nothing is open.
    fn end(&mut self) -> Result<(), Error>;

    /// Flushes everything written so far to the underlying writer.
    ///
    /// Text archives only emit their document here, so this must be called once writing is done.
    ///
    /// # Errors
    /// If records are still open, the archive was already finished, or the sink fails.
    fn finish(&mut self) -> Result<(), Error>;
}

/// A serialization source.
///
/// Names are hints. Binary archives ignore them, text archives look fields up by key and read
/// positionally when no name is given.
pub trait ArchiveReader {
    /// The encoding family of this archive.
    fn kind(&self) -> ArchiveKind;

    /// Hands the next field, or the field called `name`, to `decode`.
    ///
    /// # Errors
    /// If the field is missing, truncated or fails to decode.
    fn read_field(&mut self, name: Option<&str>, decode: FieldDecoder<'_>) -> Result<(), Error>;

    /// Enters a nested record.
    ///
    /// # Errors
    /// If the next field is not a record.
    fn begin_record(&mut self, name: Option<&str>) -> Result<(), Error>;

    /// Enters a list, returning its length.
    ///
    /// # Errors
    /// If the next field is not a list.
    fn begin_list(&mut self, name: Option<&str>) -> Result<usize, Error>;

    /// Leaves the innermost record or list.
    ///
    /// # Errors
    /// If nothing is open.
    fn end(&mut self) -> Result<(), Error>;
}

impl dyn ArchiveWriter + '_ {
    /// Serializes a typed field.
    ///
    /// # Errors
    /// See [`ArchiveWriter::write_field`].
    pub fn field<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), Error> {
        self.write_field(name, value)
    }
}

impl dyn ArchiveReader + '_ {
    /// Deserializes a typed field.
    ///
    /// # Errors
    /// See [`ArchiveReader::read_field`].
    pub fn field<T: DeserializeOwned>(&mut self, name: Option<&str>) -> Result<T, Error> {
        let mut out = None;

        self.read_field(name, &mut |de| {
            out = Some(erased_serde::deserialize::<T>(de)?);
            Ok(())
        })?;

        out.ok_or_else(|| {
            Error::Format(format!("field `{}` produced no value", name.unwrap_or("_")))
        })
    }
}

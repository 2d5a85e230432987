//! [`Format`] picks the archive encoding used for save files.

use std::io::{
    Read,
    Write,
};

use crate::{
    archive::{
        ArchiveReader,
        ArchiveWriter,
        BinaryReader,
        BinaryWriter,
        TextReader,
        TextWriter,
    },
    error::Error,
};

/// Builds archives of a single encoding.
pub trait Format {
    /// The file extension used by the format.
    ///
    /// Defaults to `.sav`.
    fn extension() -> &'static str {
        ".sav"
    }

    /// Creates an archive writing to `writer`.
    fn writer<'w, W: Write + 'w>(writer: W) -> Box<dyn ArchiveWriter + 'w>;

    /// Creates an archive reading from `reader`.
    ///
    /// # Errors
    /// If the format must parse its input up front and the input is malformed.
    fn reader<'r, R: Read + 'r>(reader: R) -> Result<Box<dyn ArchiveReader + 'r>, Error>;
}

/// An implementation of [`Format`] that uses [`rmp_serde`].
pub struct RMPFormat;

impl Format for RMPFormat {
    fn extension() -> &'static str {
        ".mp"
    }

    fn writer<'w, W: Write + 'w>(writer: W) -> Box<dyn ArchiveWriter + 'w> {
        Box::new(BinaryWriter::new(writer))
    }

    fn reader<'r, R: Read + 'r>(reader: R) -> Result<Box<dyn ArchiveReader + 'r>, Error> {
        Ok(Box::new(BinaryReader::new(reader)))
    }
}

/// An implementation of [`Format`] that uses [`serde_json`].
pub struct JSONFormat;

impl Format for JSONFormat {
    fn extension() -> &'static str {
        ".json"
    }

    fn writer<'w, W: Write + 'w>(writer: W) -> Box<dyn ArchiveWriter + 'w> {
        Box::new(TextWriter::new(writer))
    }

    fn reader<'r, R: Read + 'r>(reader: R) -> Result<Box<dyn ArchiveReader + 'r>, Error> {
        Ok(Box::new(TextReader::new(reader)?))
    }
}

/// A reasonable default [`Format`].
pub type DefaultFormat = RMPFormat;

/// A reasonable default debug [`Format`], human-readable.
pub type DefaultDebugFormat = JSONFormat;

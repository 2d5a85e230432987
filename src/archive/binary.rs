use std::io::{
    Read,
    Write,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    archive::{
        ArchiveKind,
        ArchiveReader,
        ArchiveWriter,
        FieldDecoder,
    },
    error::Error,
};

/// An [`ArchiveWriter`] that encodes fields back to back with [`rmp_serde`].
///
/// Field names and records leave no trace in the stream, lists are prefixed by their length.
pub struct BinaryWriter<W: Write> {
    ser: rmp_serde::Serializer<W>,
    depth: usize,
}

impl<W: Write> BinaryWriter<W> {
    /// Creates a binary archive writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            ser: rmp_serde::Serializer::new(writer),
            depth: 0,
        }
    }
}

impl<W: Write> ArchiveWriter for BinaryWriter<W> {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Binary
    }

    fn write_field(
        &mut self,
        _name: &str,
        value: &dyn erased_serde::Serialize,
    ) -> Result<(), Error> {
        erased_serde::serialize(value, &mut self.ser).map_err(Error::saving)
    }

    fn begin_record(&mut self, _name: &str) -> Result<(), Error> {
        self.depth += 1;
        Ok(())
    }

    fn begin_list(&mut self, _name: &str, len: usize) -> Result<(), Error> {
        (len as u64)
            .serialize(&mut self.ser)
            .map_err(Error::saving)?;

        self.depth += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<(), Error> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| Error::Saving("no open record or list to end".into()))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Error> {
        if self.depth != 0 {
            return Err(Error::Saving(format!("{} records left open", self.depth)));
        }

        self.ser.get_mut().flush()?;
        Ok(())
    }
}

/// An [`ArchiveReader`] that decodes the stream produced by [`BinaryWriter`].
pub struct BinaryReader<R: Read> {
    de: rmp_serde::Deserializer<rmp_serde::decode::ReadReader<R>>,
    depth: usize,
}

impl<R: Read> BinaryReader<R> {
    /// Creates a binary archive reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            de: rmp_serde::Deserializer::new(reader),
            depth: 0,
        }
    }
}

impl<R: Read> ArchiveReader for BinaryReader<R> {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Binary
    }

    fn read_field(&mut self, _name: Option<&str>, decode: FieldDecoder<'_>) -> Result<(), Error> {
        let mut de = <dyn erased_serde::Deserializer>::erase(&mut self.de);
        decode(&mut de).map_err(Error::loading)
    }

    fn begin_record(&mut self, _name: Option<&str>) -> Result<(), Error> {
        self.depth += 1;
        Ok(())
    }

    fn begin_list(&mut self, _name: Option<&str>) -> Result<usize, Error> {
        let len = u64::deserialize(&mut self.de).map_err(Error::loading)?;
        let len = usize::try_from(len)
            .map_err(|_| Error::Format(format!("list length {len} does not fit in memory")))?;

        self.depth += 1;
        Ok(len)
    }

    fn end(&mut self) -> Result<(), Error> {
        self.depth = self
            .depth
            .checked_sub(1)
            .ok_or_else(|| Error::Format("no open record or list to end".into()))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_binary_fields_are_positional() {
        let mut buf = Vec::new();

        {
            let mut writer = BinaryWriter::new(&mut buf);
            let archive: &mut dyn ArchiveWriter = &mut writer;

            archive.field("first", &7u32).unwrap();
            archive.begin_list("items", 2).unwrap();
            archive.field("a", &"x").unwrap();
            archive.field("b", &"y").unwrap();
            archive.end().unwrap();
            archive.finish().unwrap();
        }

        let mut reader = BinaryReader::new(&*buf);
        let archive: &mut dyn ArchiveReader = &mut reader;

        // Names are not part of the binary stream, so any name reads the next field.
        assert_eq!(archive.field::<u32>(Some("other")).unwrap(), 7);
        assert_eq!(archive.begin_list(None).unwrap(), 2);
        assert_eq!(archive.field::<String>(None).unwrap(), "x");
        assert_eq!(archive.field::<String>(None).unwrap(), "y");
        archive.end().unwrap();

        assert!(matches!(archive.field::<u32>(None), Err(Error::Format(_))));
    }

    #[test]
    fn test_binary_unbalanced_end() {
        let mut writer = BinaryWriter::new(Vec::new());

        assert!(matches!(writer.end(), Err(Error::Saving(_))));

        writer.begin_record("open").unwrap();
        assert!(matches!(writer.finish(), Err(Error::Saving(_))));
    }
}

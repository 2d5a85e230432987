use std::io::{
    Read,
    Write,
};

use serde_json::{
    Map,
    Value,
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

enum Node {
    Record(Map<String, Value>),
    List(Vec<Value>),
}

impl Node {
    fn into_value(self) -> Value {
        match self {
            Node::Record(map) => Value::Object(map),
            Node::List(items) => Value::Array(items),
        }
    }
}

struct OpenNode {
    name: String,
    node: Node,
}

/// An [`ArchiveWriter`] that builds a keyed JSON document with [`serde_json`].
///
/// The document is kept in memory and written pretty-printed by [`finish`](ArchiveWriter::finish).
pub struct TextWriter<W: Write> {
    writer: W,
    stack: Vec<OpenNode>,
}

impl<W: Write> TextWriter<W> {
    /// Creates a text archive writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            stack: vec![OpenNode {
                name: String::new(),
                node: Node::Record(Map::new()),
            }],
        }
    }

    fn insert(&mut self, name: &str, value: Value) -> Result<(), Error> {
        let open = self
            .stack
            .last_mut()
            .ok_or_else(|| Error::Saving("text archive is already finished".into()))?;

        match &mut open.node {
            Node::Record(map) => {
                if map.insert(name.to_owned(), value).is_some() {
                    return Err(Error::Saving(format!("duplicate field `{name}`")));
                }
            }
            Node::List(items) => items.push(value),
        }

        Ok(())
    }

    fn open(&mut self, name: &str, node: Node) -> Result<(), Error> {
        if self.stack.is_empty() {
            return Err(Error::Saving("text archive is already finished".into()));
        }

        self.stack.push(OpenNode {
            name: name.to_owned(),
            node,
        });

        Ok(())
    }
}

impl<W: Write> ArchiveWriter for TextWriter<W> {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Text
    }

    fn write_field(
        &mut self,
        name: &str,
        value: &dyn erased_serde::Serialize,
    ) -> Result<(), Error> {
        let value = serde_json::to_value(value).map_err(Error::saving)?;
        self.insert(name, value)
    }

    fn begin_record(&mut self, name: &str) -> Result<(), Error> {
        self.open(name, Node::Record(Map::new()))
    }

    fn begin_list(&mut self, name: &str, len: usize) -> Result<(), Error> {
        self.open(name, Node::List(Vec::with_capacity(len)))
    }

    fn end(&mut self) -> Result<(), Error> {
        if self.stack.len() < 2 {
            return Err(Error::Saving("no open record or list to end".into()));
        }

        let OpenNode { name, node } = self
            .stack
            .pop()
            .ok_or_else(|| Error::Saving("no open record or list to end".into()))?;

        self.insert(&name, node.into_value())
    }

    fn finish(&mut self) -> Result<(), Error> {
        match self.stack.len() {
            0 => return Err(Error::Saving("text archive is already finished".into())),
            1 => {}
            n => return Err(Error::Saving(format!("{} records left open", n - 1))),
        }

        let root = self
            .stack
            .pop()
            .map(|open| open.node.into_value())
            .unwrap_or_default();

        serde_json::to_writer_pretty(&mut self.writer, &root).map_err(Error::saving)?;
        self.writer.flush()?;

        Ok(())
    }
}

enum Cursor {
    Record(Vec<(String, Option<Value>)>),
    List(std::vec::IntoIter<Value>),
}

impl Cursor {
    fn take(&mut self, name: Option<&str>) -> Result<Value, Error> {
        match self {
            Cursor::Record(entries) => {
                let next = entries.iter().position(|(_, v)| v.is_some());

                let index = match name {
                    // Prefer the next unread entry, falling back to a lookup by key.
                    Some(name) => next
                        .filter(|i| entries[*i].0 == name)
                        .or_else(|| {
                            entries
                                .iter()
                                .position(|(k, v)| k == name && v.is_some())
                        })
                        .ok_or_else(|| Error::Format(format!("missing field `{name}`")))?,
                    None => next.ok_or_else(|| Error::Format("record has no more fields".into()))?,
                };

                entries[index]
                    .1
                    .take()
                    .ok_or_else(|| Error::Format("field was already read".into()))
            }
            Cursor::List(items) => items
                .next()
                .ok_or_else(|| Error::Format("list has no more elements".into())),
        }
    }
}

/// An [`ArchiveReader`] over a JSON document produced by [`TextWriter`].
pub struct TextReader {
    stack: Vec<Cursor>,
}

impl TextReader {
    /// Parses the whole document from `reader`.
    ///
    /// # Errors
    /// If the input is not a JSON object.
    pub fn new<R: Read>(reader: R) -> Result<Self, Error> {
        let root: Value = serde_json::from_reader(reader).map_err(Error::loading)?;
        Self::from_value(root)
    }

    /// Reads from an already parsed document.
    ///
    /// # Errors
    /// If `root` is not a JSON object.
    pub fn from_value(root: Value) -> Result<Self, Error> {
        let Value::Object(map) = root else {
            return Err(Error::Format("text archive root must be an object".into()));
        };

        Ok(Self {
            stack: vec![record_cursor(map)],
        })
    }

    fn take(&mut self, name: Option<&str>) -> Result<Value, Error> {
        self.stack
            .last_mut()
            .ok_or_else(|| Error::Format("text archive has been fully read".into()))?
            .take(name)
    }
}

fn record_cursor(map: Map<String, Value>) -> Cursor {
    Cursor::Record(map.into_iter().map(|(k, v)| (k, Some(v))).collect())
}

impl ArchiveReader for TextReader {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Text
    }

    fn read_field(&mut self, name: Option<&str>, decode: FieldDecoder<'_>) -> Result<(), Error> {
        let value = self.take(name)?;
        let mut de = <dyn erased_serde::Deserializer>::erase(value);
        decode(&mut de).map_err(Error::loading)
    }

    fn begin_record(&mut self, name: Option<&str>) -> Result<(), Error> {
        match self.take(name)? {
            Value::Object(map) => {
                self.stack.push(record_cursor(map));
                Ok(())
            }
            other => Err(Error::Format(format!("expected a record, found {other}"))),
        }
    }

    fn begin_list(&mut self, name: Option<&str>) -> Result<usize, Error> {
        match self.take(name)? {
            Value::Array(items) => {
                let len = items.len();
                self.stack.push(Cursor::List(items.into_iter()));
                Ok(len)
            }
            other => Err(Error::Format(format!("expected a list, found {other}"))),
        }
    }

    fn end(&mut self) -> Result<(), Error> {
        if self.stack.len() < 2 {
            return Err(Error::Format("no open record or list to end".into()));
        }

        self.stack.pop();
        Ok(())
    }
}

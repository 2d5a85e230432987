//! [`Backend`] opens the readers and writers that save slots are stored in.

use std::{
    fs::File,
    io::{
        BufReader,
        BufWriter,
        Read,
        Write,
    },
    path::PathBuf,
};

use crate::{
    dir::SAVE_DIR,
    error::Error,
};

/// [`Read`] and [`Write`] interface used for save slot storage.
pub trait Backend {
    /// The backend's reader.
    type Reader: Read;

    /// The backend's writer.
    type Writer: Write;

    /// Attempts to open a reader for the save with the given key.
    ///
    /// # Errors
    /// If the save does not exist or cannot be opened.
    fn reader(&self, key: &str) -> Result<Self::Reader, Error>;

    /// Attempts to open a writer for the save with the given key, replacing any previous save.
    ///
    /// # Errors
    /// If the save cannot be created.
    fn writer(&self, key: &str) -> Result<Self::Writer, Error>;
}

/// Simple filesystem backend.
///
/// Each key corresponds to an individual file in the backend's directory, [`SAVE_DIR`] by default.
#[derive(Debug, Clone)]
pub struct FileIO {
    dir: PathBuf,
}

impl FileIO {
    /// Stores saves in `dir` instead of [`SAVE_DIR`].
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The directory saves are stored in.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// The path of the save file for `key`.
    pub fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Default for FileIO {
    fn default() -> Self {
        Self::new(SAVE_DIR.clone())
    }
}

impl Backend for FileIO {
    type Reader = BufReader<File>;
    type Writer = BufWriter<File>;

    fn reader(&self, key: &str) -> Result<Self::Reader, Error> {
        let file = File::open(self.path(key))?;

        Ok(BufReader::new(file))
    }

    fn writer(&self, key: &str) -> Result<Self::Writer, Error> {
        let path = self.path(key);

        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let file = File::create(path)?;

        Ok(BufWriter::new(file))
    }
}

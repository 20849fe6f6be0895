//! Physical file backend for memory-mapped I/O.
//!
//! [`crate::file::physical::Physical`] maps an assembly file into the address space of the
//! process. Mapping is cheap: only the pages a compiler actually touches are ever read, and the
//! operating system shares them between every reference to the same file.

use super::Backend;
use crate::{Error::FileError, Result};

use memmap2::Mmap;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// File-backed data source.
#[derive(Debug)]
pub struct Physical {
    path: PathBuf,
    data: Mmap,
}

impl Physical {
    /// Opens and maps the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or mapped.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let path = path.as_ref();
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        // The mapping stays valid while the file is unchanged; assemblies loaded by a host
        // are not rewritten in place.
        let data = unsafe { Mmap::map(&file) }.map_err(FileError)?;

        Ok(Physical {
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

//! In-memory backend over a module-owned metadata blob.
//!
//! [`crate::file::memory::Memory`] wraps a [`crate::file::MetadataBlob`] and implements
//! [`crate::file::Backend`] for it. It never copies the bytes: the backend shares the
//! allocation of the module that exposed them, which keeps that allocation alive.

use super::{Backend, MetadataBlob};

/// Memory-backed data source for modules without a backing file.
#[derive(Debug)]
pub struct Memory {
    blob: MetadataBlob,
}

impl Memory {
    pub fn new(blob: MetadataBlob) -> Memory {
        Memory { blob }
    }

    pub fn blob(&self) -> &MetadataBlob {
        &self.blob
    }
}

impl Backend for Memory {
    fn data(&self) -> &[u8] {
        self.blob.as_slice()
    }
}

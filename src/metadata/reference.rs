//! Compiler-consumable metadata handles.
//!
//! A [`MetadataReference`] is what the reference cache produces for one module and what a
//! compilation host receives in its reference list. It is opaque to the cache: the bytes are
//! the module's own binary format, either the memory-mapped assembly file or the raw metadata
//! blob the module exposes.
//!
//! Handles are cheap to clone and immutable. Two handles for the same cache entry share one
//! allocation, which [`MetadataReference::ptr_eq`] observes.

use std::{fmt, path::Path, sync::Arc};

use strum::Display;

use crate::{
    file::{clr_metadata, memory::Memory, physical::Physical, Backend, MetadataBlob},
    metadata::{identity::ModuleIdentity, root::MetadataRoot},
    Result,
};

/// How a [`MetadataReference`] is backed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ReferenceKind {
    /// A memory-mapped assembly file on disk.
    File,
    /// A raw metadata blob owned by an in-memory module.
    Memory,
}

enum Source {
    File(Physical),
    Memory(Memory),
}

struct Inner {
    identity: ModuleIdentity,
    source: Source,
}

/// An opaque, immutable handle to one module's metadata.
#[derive(Clone)]
pub struct MetadataReference {
    inner: Arc<Inner>,
}

impl MetadataReference {
    pub(crate) fn from_file(identity: ModuleIdentity, physical: Physical) -> Self {
        MetadataReference {
            inner: Arc::new(Inner {
                identity,
                source: Source::File(physical),
            }),
        }
    }

    pub(crate) fn from_blob(identity: ModuleIdentity, blob: MetadataBlob) -> Self {
        MetadataReference {
            inner: Arc::new(Inner {
                identity,
                source: Source::Memory(Memory::new(blob)),
            }),
        }
    }

    /// The identity of the module this handle was materialized for.
    #[must_use]
    pub fn identity(&self) -> &ModuleIdentity {
        &self.inner.identity
    }

    /// Whether the handle is file-backed or memory-backed.
    #[must_use]
    pub fn kind(&self) -> ReferenceKind {
        match self.inner.source {
            Source::File(_) => ReferenceKind::File,
            Source::Memory(_) => ReferenceKind::Memory,
        }
    }

    /// The backing file of a file-backed handle.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match &self.inner.source {
            Source::File(physical) => Some(physical.path()),
            Source::Memory(_) => None,
        }
    }

    /// The blob wrapped by a memory-backed handle.
    #[must_use]
    pub fn blob(&self) -> Option<&MetadataBlob> {
        match &self.inner.source {
            Source::File(_) => None,
            Source::Memory(memory) => Some(memory.blob()),
        }
    }

    /// The bytes handed to the compiler: the whole image for file-backed handles, the metadata
    /// blob for memory-backed ones.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend().data()
    }

    /// Length of [`data`](MetadataReference::data) in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend().len()
    }

    /// Returns `true` if the handle holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend().is_empty()
    }

    /// Returns `true` if both handles are the same cache entry.
    #[must_use]
    pub fn ptr_eq(&self, other: &MetadataReference) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Parses the ECMA-335 metadata root behind this handle.
    ///
    /// Memory-backed handles parse their blob directly; file-backed handles first locate the
    /// metadata through the PE image's CLR header.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::GoblinErr`] if a backing file is not a PE image, and
    /// [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if the metadata is damaged.
    pub fn metadata_root(&self) -> Result<MetadataRoot> {
        match &self.inner.source {
            Source::File(physical) => MetadataRoot::read(clr_metadata(physical.data())?),
            Source::Memory(memory) => MetadataRoot::read(memory.data()),
        }
    }

    fn backend(&self) -> &dyn Backend {
        match &self.inner.source {
            Source::File(physical) => physical as &dyn Backend,
            Source::Memory(memory) => memory as &dyn Backend,
        }
    }
}

impl fmt::Debug for MetadataReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("MetadataReference");
        debug
            .field("identity", &self.inner.identity)
            .field("kind", &self.kind());
        if let Some(path) = self.path() {
            debug.field("path", &path);
        }
        debug.field("len", &self.len()).finish()
    }
}

//! Shared fixtures for unit tests.

use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    file::MetadataBlob,
    metadata::{identity::ModuleIdentity, module::LoadedModule},
};

/// A minimal metadata root: `v4.0.30319`, streams `#~` and `#US`.
#[rustfmt::skip]
pub const CRAFTED_ROOT: [u8; 56] = [
    // Signature, major, minor, reserved
    0x42, 0x53, 0x4A, 0x42, 0x01, 0x00, 0x01, 0x00,
    0x00, 0x00, 0x00, 0x00,
    // Version length + "v4.0.30319" padded to 12
    0x0C, 0x00, 0x00, 0x00,
    0x76, 0x34, 0x2E, 0x30, 0x2E, 0x33, 0x30, 0x33, 0x31, 0x39, 0x00, 0x00,
    // Flags, stream count
    0x00, 0x00, 0x02, 0x00,
    // #~
    0x30, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
    0x23, 0x7E, 0x00, 0x00,
    // #US
    0x30, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00,
    0x23, 0x55, 0x53, 0x00,
];

/// Writes `bytes` to a file in the temp directory and returns its path.
///
/// `name` must be unique per test, tests run in parallel.
pub fn temp_file(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("metaref_{name}"));
    std::fs::write(&path, bytes).unwrap();
    path
}

/// A [`LoadedModule`] that counts how often its raw metadata is requested.
pub struct CountingModule {
    identity: ModuleIdentity,
    location: Option<PathBuf>,
    blob: Option<MetadataBlob>,
    raw_reads: AtomicUsize,
}

impl CountingModule {
    pub fn new(name: &str) -> Self {
        CountingModule {
            identity: ModuleIdentity::new(name),
            location: None,
            blob: None,
            raw_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_location(mut self, path: impl AsRef<Path>) -> Self {
        self.location = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_blob(mut self, blob: MetadataBlob) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn raw_reads(&self) -> usize {
        self.raw_reads.load(Ordering::SeqCst)
    }
}

impl LoadedModule for CountingModule {
    fn identity(&self) -> &ModuleIdentity {
        &self.identity
    }

    fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    fn raw_metadata(&self) -> Option<MetadataBlob> {
        self.raw_reads.fetch_add(1, Ordering::SeqCst);
        self.blob.clone()
    }

    fn dependencies(&self) -> Vec<ModuleIdentity> {
        Vec::new()
    }
}

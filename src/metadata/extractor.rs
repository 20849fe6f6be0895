//! Materialization of metadata handles from loaded modules.
//!
//! [`MetadataExtractor`] decides, per module, where the metadata handed to the compiler comes
//! from. It holds no state; the same module always yields an equivalent handle.
//!
//! # Strategy
//!
//! 1. The module has a [location](crate::LoadedModule::location) and the file exists: map the
//!    file and return a file-backed handle. The raw metadata of the module is not touched.
//! 2. Otherwise, the module exposes [raw metadata](crate::LoadedModule::raw_metadata): wrap the
//!    blob in a memory-backed handle without copying it.
//! 3. Otherwise the module is inconsistent and [`crate::Error::Extraction`] is returned.
//!
//! A backing file that exists but cannot be mapped is logged and treated as absent.

use tracing::{debug, error, warn};

use crate::{
    file::physical::Physical,
    metadata::{module::LoadedModule, reference::MetadataReference},
    Result,
};

/// Builds [`MetadataReference`]s from loaded modules.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Materializes the metadata handle for `module`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Extraction`] if the module has neither an existing backing file
    /// nor raw metadata.
    pub fn materialize(&self, module: &dyn LoadedModule) -> Result<MetadataReference> {
        let identity = module.identity();

        if let Some(path) = module.location().filter(|path| path.is_file()) {
            match Physical::new(path) {
                Ok(physical) => {
                    debug!(%identity, path = %path.display(), "materialized file-backed reference");
                    return Ok(MetadataReference::from_file(identity.clone(), physical));
                }
                Err(err) => {
                    warn!(%identity, path = %path.display(), error = %err, "failed to map backing file");
                }
            }
        }

        if let Some(blob) = module.raw_metadata() {
            debug!(%identity, len = blob.len(), "materialized memory-backed reference");
            return Ok(MetadataReference::from_blob(identity.clone(), blob));
        }

        error!(%identity, "module has neither a backing file nor raw metadata");
        Err(extraction_error!(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        file::MetadataBlob,
        metadata::reference::ReferenceKind,
        test::{temp_file, CountingModule},
        Error,
    };

    #[test]
    fn existing_file_wins() {
        let path = temp_file("extractor_existing_file.dll", b"MZ");
        let module = CountingModule::new("A")
            .with_location(&path)
            .with_blob(MetadataBlob::new(vec![1_u8, 2, 3]));

        let reference = MetadataExtractor.materialize(&module).unwrap();

        assert_eq!(reference.kind(), ReferenceKind::File);
        assert_eq!(reference.path(), Some(path.as_path()));
        assert_eq!(module.raw_reads(), 0);
    }

    #[test]
    fn raw_metadata_without_location() {
        let blob = MetadataBlob::new(vec![1_u8, 2, 3]);
        let module = CountingModule::new("Dynamic").with_blob(blob.clone());

        let reference = MetadataExtractor.materialize(&module).unwrap();

        assert_eq!(reference.kind(), ReferenceKind::Memory);
        assert!(reference.path().is_none());
        assert!(reference.blob().unwrap().shares_storage(&blob));
        assert_eq!(module.raw_reads(), 1);
    }

    #[test]
    fn missing_file_falls_back_to_raw_metadata() {
        let module = CountingModule::new("Moved")
            .with_location("/nonexistent/metaref/Moved.dll")
            .with_blob(MetadataBlob::new(vec![0_u8; 8]));

        let reference = MetadataExtractor.materialize(&module).unwrap();

        assert_eq!(reference.kind(), ReferenceKind::Memory);
    }

    #[test]
    fn directory_is_not_a_backing_file() {
        let module = CountingModule::new("Dir")
            .with_location(std::env::temp_dir())
            .with_blob(MetadataBlob::new(vec![0_u8; 8]));

        let reference = MetadataExtractor.materialize(&module).unwrap();

        assert_eq!(reference.kind(), ReferenceKind::Memory);
    }

    #[test]
    fn no_source_is_an_extraction_error() {
        let module = CountingModule::new("Orphan").with_location("/nonexistent/Orphan.dll");

        match MetadataExtractor.materialize(&module) {
            Err(Error::Extraction { identity, .. }) => assert_eq!(identity.as_str(), "Orphan"),
            other => panic!("Expected Extraction error, got {other:?}"),
        }
    }
}

//! Byte sources behind metadata references.
//!
//! A metadata reference is backed by one of two data sources, both exposed through the
//! [`crate::file::Backend`] trait:
//!
//! - [`crate::file::physical::Physical`] - a memory-mapped assembly file on disk
//! - [`crate::file::memory::Memory`] - a [`crate::file::MetadataBlob`] owned by a loaded module
//!
//! The module also knows how to find the ECMA-335 metadata inside a PE image, which lets a
//! file-backed reference expose the same metadata root as a memory-backed one.
//!
//! # Key Components
//!
//! - [`crate::file::Backend`] - Trait for the different data sources
//! - [`crate::file::MetadataBlob`] - Shared, immutable byte range without raw addresses
//! - [`crate::file::io`] - Little-endian read helpers
//!
//! # Thread Safety
//!
//! All backends are `Send + Sync` and immutable after construction.

pub mod io;

pub(crate) mod memory;
pub(crate) mod physical;

use std::{fmt, ops::Range, sync::Arc};

use goblin::pe::PE;

use crate::{metadata::cor20header::Cor20Header, Error::OutOfBounds, Result};

/// Backend trait for metadata data sources.
///
/// This trait abstracts over the source of the bytes a metadata reference hands to the
/// compiler, allowing for both on-disk and in-memory representations. All implementations
/// must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the requested range is out of bounds.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let data = self.data();
        let Some(offset_end) = offset.checked_add(len) else {
            return Err(OutOfBounds);
        };

        if offset_end > data.len() {
            return Err(OutOfBounds);
        }

        Ok(&data[offset..offset_end])
    }

    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the backend holds no data.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable, reference-counted byte range holding raw module metadata.
///
/// The bytes are owned by the [`crate::LoadedModule`] that exposes them. Cloning a blob only
/// bumps a reference count, so a memory-backed [`crate::MetadataReference`] keeps the
/// underlying storage alive for as long as it exists, without copying and without exposing
/// any raw address.
///
/// # Examples
///
/// ```rust
/// use metaref::MetadataBlob;
///
/// let image: Vec<u8> = vec![0x00, 0x42, 0x53, 0x4A, 0x42, 0x00];
/// let blob = MetadataBlob::with_range(image, 1..5)?;
///
/// assert_eq!(blob.as_slice(), b"BSJB");
/// assert!(blob.shares_storage(&blob.clone()));
/// # Ok::<(), metaref::Error>(())
/// ```
#[derive(Clone)]
pub struct MetadataBlob {
    storage: Arc<[u8]>,
    range: Range<usize>,
}

impl MetadataBlob {
    /// Creates a blob spanning all of `storage`.
    pub fn new(storage: impl Into<Arc<[u8]>>) -> Self {
        let storage = storage.into();
        let range = 0..storage.len();
        MetadataBlob { storage, range }
    }

    /// Creates a blob spanning `range` within `storage`.
    ///
    /// This is the shape in which runtimes usually expose metadata: a window into a larger
    /// loaded image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if `range` is inverted or exceeds `storage`.
    pub fn with_range(storage: impl Into<Arc<[u8]>>, range: Range<usize>) -> Result<Self> {
        let storage = storage.into();
        if range.start > range.end || range.end > storage.len() {
            return Err(OutOfBounds);
        }

        Ok(MetadataBlob { storage, range })
    }

    /// Returns the metadata bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.range.clone()]
    }

    /// Returns the length of the metadata range in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if the range is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns `true` if both blobs are windows into the same allocation.
    #[must_use]
    pub fn shares_storage(&self, other: &MetadataBlob) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }
}

impl fmt::Debug for MetadataBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataBlob")
            .field("range", &self.range)
            .field("storage_len", &self.storage.len())
            .finish()
    }
}

/// Locates the ECMA-335 metadata root inside a PE image.
///
/// Follows the CLR runtime header data directory to the COR20 header and translates its
/// metadata RVA to a file offset.
///
/// # Errors
///
/// Returns [`crate::Error::GoblinErr`] if `image` is not a PE file, and
/// [`crate::Error::Malformed`] or [`crate::Error::OutOfBounds`] if it carries no usable CLR
/// header.
pub(crate) fn clr_metadata(image: &[u8]) -> Result<&[u8]> {
    let pe = PE::parse(image)?;

    let Some(optional_header) = pe.header.optional_header.as_ref() else {
        return Err(malformed_error!("File does not have an OptionalHeader"));
    };

    let Some(clr_dir) = optional_header.data_directories.get_clr_runtime_header() else {
        return Err(malformed_error!(
            "File does not have a CLR runtime header directory"
        ));
    };

    let clr_offset = rva_to_offset(&pe, clr_dir.virtual_address)?;
    let clr_end = clr_offset
        .checked_add(clr_dir.size as usize)
        .ok_or(OutOfBounds)?;
    if clr_end > image.len() {
        return Err(OutOfBounds);
    }

    let header = Cor20Header::read(&image[clr_offset..clr_end])?;

    let metadata_offset = rva_to_offset(&pe, header.meta_data_rva)?;
    let metadata_end = metadata_offset
        .checked_add(header.meta_data_size as usize)
        .ok_or(OutOfBounds)?;
    if metadata_end > image.len() {
        return Err(OutOfBounds);
    }

    Ok(&image[metadata_offset..metadata_end])
}

fn rva_to_offset(pe: &PE, rva: u32) -> Result<usize> {
    for section in &pe.sections {
        let size = section.virtual_size.max(section.size_of_raw_data);
        let Some(section_max) = section.virtual_address.checked_add(size) else {
            return Err(malformed_error!(
                "Section malformed, causing integer overflow - {} + {}",
                section.virtual_address,
                size
            ));
        };

        if section.virtual_address <= rva && rva < section_max {
            return Ok((rva - section.virtual_address) as usize
                + section.pointer_to_raw_data as usize);
        }
    }

    Err(malformed_error!(
        "RVA could not be converted to offset - {}",
        rva
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_spans_storage() {
        let blob = MetadataBlob::new(vec![1_u8, 2, 3, 4]);

        assert_eq!(blob.len(), 4);
        assert_eq!(blob.as_slice(), &[1, 2, 3, 4]);
        assert!(!blob.is_empty());
    }

    #[test]
    fn blob_range() {
        let storage: Arc<[u8]> = Arc::from(vec![0xAA_u8, 0xBB, 0xCC, 0xDD, 0xEE]);
        let blob = MetadataBlob::with_range(storage.clone(), 1..4).unwrap();

        assert_eq!(blob.as_slice(), &[0xBB, 0xCC, 0xDD]);
        assert!(blob.shares_storage(&MetadataBlob::new(storage)));
        assert!(!blob.shares_storage(&MetadataBlob::new(vec![0xBB_u8, 0xCC, 0xDD])));
    }

    #[test]
    fn blob_range_invalid() {
        assert!(matches!(
            MetadataBlob::with_range(vec![0_u8; 4], 2..5),
            Err(OutOfBounds)
        ));

        #[allow(clippy::reversed_empty_ranges)]
        let inverted = MetadataBlob::with_range(vec![0_u8; 4], 3..1);
        assert!(matches!(inverted, Err(OutOfBounds)));

        let empty = MetadataBlob::with_range(vec![0_u8; 4], 4..4).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn clr_metadata_rejects_non_pe() {
        let result = clr_metadata(b"definitely not a portable executable");
        assert!(result.is_err());
    }
}

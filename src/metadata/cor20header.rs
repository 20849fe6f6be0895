//! The CLR 2.0 (COR20) header of a managed PE image.
//!
//! Only the leading part of the header matters for locating metadata: its size, the runtime
//! version it targets, and the RVA and size of the metadata root. The remaining directories
//! (resources, strong name signature, vtable fixups) are not needed to hand an image to a
//! compiler and are not decoded.

use crate::{file::io::read_le_at, Error::OutOfBounds, Result};

/// Size in bytes of a COR20 header, as mandated by ECMA-335 II.25.3.3.
pub const COR20_HEADER_SIZE: usize = 72;

/// The leading fields of the COR20 header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cor20Header {
    /// Size of the header in bytes, always 72
    pub cb: u32,
    /// Major version of the runtime the image targets
    pub major_runtime_version: u16,
    /// Minor version of the runtime the image targets
    pub minor_runtime_version: u16,
    /// RVA of the metadata root
    pub meta_data_rva: u32,
    /// Size of the metadata in bytes
    pub meta_data_size: u32,
    /// Runtime flags (`COMIMAGE_FLAGS_*`)
    pub flags: u32,
}

impl Cor20Header {
    /// Reads and validates a COR20 header from the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than 72 bytes, and
    /// [`crate::Error::Malformed`] if the header size, runtime version, or metadata directory
    /// is invalid.
    pub fn read(data: &[u8]) -> Result<Cor20Header> {
        const VALID_FLAGS: u32 = 0x0000_001F;

        if data.len() < COR20_HEADER_SIZE {
            return Err(OutOfBounds);
        }

        let mut offset = 0;
        let cb = read_le_at::<u32>(data, &mut offset)?;
        if cb as usize != COR20_HEADER_SIZE {
            return Err(malformed_error!(
                "Invalid CLR header size: expected 72, got {}",
                cb
            ));
        }

        let major_runtime_version = read_le_at::<u16>(data, &mut offset)?;
        let minor_runtime_version = read_le_at::<u16>(data, &mut offset)?;
        if major_runtime_version == 0 || major_runtime_version > 10 {
            return Err(malformed_error!(
                "Invalid major runtime version: {}",
                major_runtime_version
            ));
        }

        let meta_data_rva = read_le_at::<u32>(data, &mut offset)?;
        if meta_data_rva == 0 {
            return Err(malformed_error!("Metadata RVA cannot be zero"));
        }

        let meta_data_size = read_le_at::<u32>(data, &mut offset)?;
        if meta_data_size == 0 {
            return Err(malformed_error!("Metadata size cannot be zero"));
        } else if meta_data_size > 0x1000_0000 {
            return Err(malformed_error!(
                "Metadata size {} exceeds reasonable limit (256MB)",
                meta_data_size
            ));
        }

        let flags = read_le_at::<u32>(data, &mut offset)?;
        if flags & !VALID_FLAGS != 0 {
            return Err(malformed_error!(
                "Invalid CLR flags: 0x{:08X} contains undefined bits",
                flags
            ));
        }

        Ok(Cor20Header {
            cb,
            major_runtime_version,
            minor_runtime_version,
            meta_data_rva,
            meta_data_size,
            flags,
        })
    }
}

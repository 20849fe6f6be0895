//! The ECMA-335 metadata root (II.24.2.1).
//!
//! Every metadata blob, whether mapped from an assembly file or exposed in memory by the
//! runtime, starts with this root: the `BSJB` signature, the version string of the runtime the
//! metadata was produced for, and the directory of metadata streams that follows it.
//!
//! [`crate::MetadataReference::metadata_root`] parses it on demand; the cache itself never
//! looks inside the metadata it hands out.

use crate::{
    file::io::{read_le, read_le_at},
    Error::OutOfBounds,
    Result,
};

/// The magic signature of the metadata root, `BSJB` in little-endian order.
pub const CIL_HEADER_MAGIC: u32 = 0x424A_5342;

const STREAM_NAMES: [&str; 7] = ["#~", "#-", "#Strings", "#US", "#GUID", "#Blob", "#Pdb"];

/// One entry of the stream directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Offset of the stream, relative to the start of the metadata root
    pub offset: u32,
    /// Size of the stream in bytes
    pub size: u32,
    /// Name of the stream, e.g. `#Strings`
    pub name: String,
}

impl StreamHeader {
    /// Reads a stream header from the start of `data`.
    ///
    /// Returns the header and the number of bytes it occupies, including the padding of its
    /// name to a 4-byte boundary.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] on short input and [`crate::Error::Malformed`] for
    /// unknown stream names.
    pub fn read(data: &[u8]) -> Result<(StreamHeader, usize)> {
        if data.len() < 9 {
            return Err(OutOfBounds);
        }

        let name_bytes = &data[8..data.len().min(8 + 32)];
        let Some(name_len) = name_bytes.iter().position(|byte| *byte == 0) else {
            return Err(malformed_error!("Stream header name is not terminated"));
        };

        let name = String::from_utf8_lossy(&name_bytes[..name_len]).into_owned();
        if !STREAM_NAMES.contains(&name.as_str()) {
            return Err(malformed_error!("Invalid stream header name - {}", name));
        }

        let name_aligned = (name_len + 1 + 3) & !3;

        Ok((
            StreamHeader {
                offset: read_le::<u32>(data)?,
                size: read_le::<u32>(&data[4..])?,
                name,
            },
            8 + name_aligned,
        ))
    }
}

/// The parsed metadata root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataRoot {
    /// Major version of the metadata format, usually 1
    pub major_version: u16,
    /// Minor version of the metadata format, usually 1
    pub minor_version: u16,
    /// Runtime version the metadata was produced for, e.g. `v4.0.30319`
    pub version: String,
    /// Reserved flags
    pub flags: u16,
    /// The stream directory
    pub stream_headers: Vec<StreamHeader>,
}

impl MetadataRoot {
    /// Parses the metadata root at the start of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if the signature, version string, or stream
    /// directory is invalid, and [`crate::Error::OutOfBounds`] if `data` is truncated.
    pub fn read(data: &[u8]) -> Result<MetadataRoot> {
        if data.len() < 20 {
            return Err(OutOfBounds);
        }

        let signature = read_le::<u32>(data)?;
        if signature != CIL_HEADER_MAGIC {
            return Err(malformed_error!(
                "CIL_HEADER_MAGIC does not match - {:#010x}",
                signature
            ));
        }

        let mut offset = 4;
        let major_version = read_le_at::<u16>(data, &mut offset)?;
        let minor_version = read_le_at::<u16>(data, &mut offset)?;
        offset += 4;

        let version_length = read_le_at::<u32>(data, &mut offset)? as usize;
        let Some(version_end) = offset.checked_add(version_length) else {
            return Err(malformed_error!(
                "Version string length causing integer overflow - {}",
                version_length
            ));
        };
        if version_end > data.len() {
            return Err(OutOfBounds);
        }

        // The length includes the zero padding up to the next 4-byte boundary
        let version_bytes = &data[offset..version_end];
        let version_len = version_bytes
            .iter()
            .position(|byte| *byte == 0)
            .unwrap_or(version_bytes.len());
        let version = String::from_utf8_lossy(&version_bytes[..version_len]).into_owned();
        offset = version_end;

        let flags = read_le_at::<u16>(data, &mut offset)?;
        let stream_count = read_le_at::<u16>(data, &mut offset)?;
        if stream_count == 0 || usize::from(stream_count) > STREAM_NAMES.len() {
            return Err(malformed_error!("Invalid stream count - {}", stream_count));
        }

        let mut stream_headers = Vec::with_capacity(usize::from(stream_count));
        for _ in 0..stream_count {
            if offset >= data.len() {
                return Err(OutOfBounds);
            }

            let (header, consumed) = StreamHeader::read(&data[offset..])?;
            match header.offset.checked_add(header.size) {
                Some(end) if end as usize <= data.len() => {}
                Some(_) => return Err(OutOfBounds),
                None => {
                    return Err(malformed_error!(
                        "Stream offset and size cause integer overflow - {} + {}",
                        header.offset,
                        header.size
                    ))
                }
            }

            if stream_headers
                .iter()
                .any(|existing: &StreamHeader| existing.name == header.name)
            {
                return Err(malformed_error!("Duplicate stream - {}", header.name));
            }

            offset += consumed;
            stream_headers.push(header);
        }

        Ok(MetadataRoot {
            major_version,
            minor_version,
            version,
            flags,
            stream_headers,
        })
    }

    /// Returns the header of the stream called `name`, if present.
    #[must_use]
    pub fn stream(&self, name: &str) -> Option<&StreamHeader> {
        self.stream_headers.iter().find(|header| header.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::CRAFTED_ROOT;

    #[test]
    fn crafted() {
        let root = MetadataRoot::read(&CRAFTED_ROOT).unwrap();

        assert_eq!(root.major_version, 1);
        assert_eq!(root.minor_version, 1);
        assert_eq!(root.version, "v4.0.30319");
        assert_eq!(root.flags, 0);
        assert_eq!(root.stream_headers.len(), 2);
        assert_eq!(root.stream("#~").unwrap().offset, 0x30);
        assert_eq!(root.stream("#US").unwrap().size, 4);
        assert!(root.stream("#Blob").is_none());
    }

    #[test]
    fn wrong_signature() {
        let mut bytes = CRAFTED_ROOT;
        bytes[0] = 0x43;

        assert!(matches!(
            MetadataRoot::read(&bytes),
            Err(crate::Error::Malformed { .. })
        ));
    }

    #[test]
    fn truncated() {
        assert!(matches!(
            MetadataRoot::read(&CRAFTED_ROOT[..12]),
            Err(OutOfBounds)
        ));
        assert!(MetadataRoot::read(&CRAFTED_ROOT[..40]).is_err());
    }

    #[test]
    fn stream_header() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x23, 0x7E, 0x00,
        ];

        let (parsed, consumed) = StreamHeader::read(&header_bytes).unwrap();

        assert_eq!(parsed.offset, 0x6C);
        assert_eq!(parsed.size, 0x45A4);
        assert_eq!(parsed.name, "#~");
        assert_eq!(consumed, 12);
    }

    #[test]
    fn stream_header_invalid() {
        #[rustfmt::skip]
        let header_bytes = [
            0x6C, 0x00, 0x00, 0x00,
            0xA4, 0x45, 0x00, 0x00,
            0x24, 0x7E, 0x00,
        ];

        assert!(StreamHeader::read(&header_bytes).is_err());
    }
}

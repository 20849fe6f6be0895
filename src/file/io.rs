//! Bounds-checked little-endian reads for PE and metadata header parsing.
//!
//! Every header this crate inspects (COR20 header, metadata root, stream headers) is stored in
//! little-endian order. The helpers here never panic on short input; they return
//! [`crate::Error::OutOfBounds`] instead.
//!
//! # Key Components
//!
//! - [`crate::file::io::LeRead`] - Primitive types decodable from little-endian bytes
//! - [`crate::file::io::read_le`] - Read a value from the start of a buffer
//! - [`crate::file::io::read_le_at`] - Read a value at an offset and advance the offset
//!
//! # Examples
//!
//! ```rust,ignore
//! use metaref::file::io::{read_le, read_le_at};
//!
//! let data = [0x42, 0x53, 0x4A, 0x42, 0x01, 0x00];
//! let signature: u32 = read_le(&data)?;
//! assert_eq!(signature, 0x424A_5342);
//!
//! let mut offset = 4;
//! let major: u16 = read_le_at(&data, &mut offset)?;
//! assert_eq!((major, offset), (1, 6));
//! ```

use crate::{Error::OutOfBounds, Result};

/// Primitive types that can be decoded from a fixed number of little-endian bytes.
pub trait LeRead: Sized {
    /// The byte array holding one encoded value
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Decode a value from little-endian bytes
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_le_read {
    ($($ty:ty),*) => {
        $(
            impl LeRead for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_le_read!(u8, u16, u32, u64);

/// Reads a `T` in little-endian order from the start of `data`.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: LeRead>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` in little-endian order at `offset` and advances `offset` past it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain.
pub fn read_le_at<T: LeRead>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };

    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}

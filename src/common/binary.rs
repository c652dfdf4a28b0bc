//! Bounds-checked integer reads for image headers.
//!
//! PNG and JPEG store integers big-endian, BMP little-endian, and TIFF declares its
//! byte order in the first two bytes, so every reader comes in both orders.

use zerocopy::byteorder::ByteOrder;
use zerocopy::{BE, FromBytes, I32, LE, U16, U32};

/// Binary parsing error type
#[derive(Debug, Clone)]
pub enum BinaryError {
    /// Not enough data to read the requested type
    InsufficientData { expected: usize, available: usize },
    /// Failed to parse the data
    ParseError(String),
}

impl std::fmt::Display for BinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryError::InsufficientData {
                expected,
                available,
            } => {
                write!(
                    f,
                    "Insufficient data: expected {}, got {}",
                    expected, available
                )
            },
            BinaryError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for BinaryError {}

/// Result type for binary operations
pub type BinaryResult<T> = Result<T, BinaryError>;

/// Byte order of a multi-byte field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

#[inline]
fn window(data: &[u8], offset: usize, len: usize) -> BinaryResult<&[u8]> {
    let end = offset.checked_add(len).ok_or(BinaryError::InsufficientData {
        expected: usize::MAX,
        available: data.len(),
    })?;
    data.get(offset..end).ok_or(BinaryError::InsufficientData {
        expected: end,
        available: data.len(),
    })
}

#[inline]
fn read_u16_as<O: ByteOrder>(data: &[u8], offset: usize) -> BinaryResult<u16> {
    U16::<O>::read_from_bytes(window(data, offset, 2)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u16".to_string()))
}

#[inline]
fn read_u32_as<O: ByteOrder>(data: &[u8], offset: usize) -> BinaryResult<u32> {
    U32::<O>::read_from_bytes(window(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read u32".to_string()))
}

/// Read a little-endian u16 at `offset`.
///
/// ```
/// use docx_oxml::common::binary::read_u16_le;
/// let data = [0x34, 0x12, 0x78, 0x56];
/// assert_eq!(read_u16_le(&data, 2).unwrap(), 0x5678);
/// ```
#[inline]
pub fn read_u16_le(data: &[u8], offset: usize) -> BinaryResult<u16> {
    read_u16_as::<LE>(data, offset)
}

#[inline]
pub fn read_u16_be(data: &[u8], offset: usize) -> BinaryResult<u16> {
    read_u16_as::<BE>(data, offset)
}

#[inline]
pub fn read_u32_le(data: &[u8], offset: usize) -> BinaryResult<u32> {
    read_u32_as::<LE>(data, offset)
}

/// Read a big-endian u32 at `offset`.
///
/// ```
/// use docx_oxml::common::binary::read_u32_be;
/// let data = [0x00, 0x00, 0x01, 0x2C];
/// assert_eq!(read_u32_be(&data, 0).unwrap(), 300);
/// ```
#[inline]
pub fn read_u32_be(data: &[u8], offset: usize) -> BinaryResult<u32> {
    read_u32_as::<BE>(data, offset)
}

/// Read a little-endian i32 at `offset`. BMP heights are signed.
#[inline]
pub fn read_i32_le(data: &[u8], offset: usize) -> BinaryResult<i32> {
    I32::<LE>::read_from_bytes(window(data, offset, 4)?)
        .map(|v| v.get())
        .map_err(|_| BinaryError::ParseError("Failed to read i32".to_string()))
}

#[inline]
pub fn read_u16(data: &[u8], offset: usize, endian: Endian) -> BinaryResult<u16> {
    match endian {
        Endian::Little => read_u16_le(data, offset),
        Endian::Big => read_u16_be(data, offset),
    }
}

#[inline]
pub fn read_u32(data: &[u8], offset: usize, endian: Endian) -> BinaryResult<u32> {
    match endian {
        Endian::Little => read_u32_le(data, offset),
        Endian::Big => read_u32_be(data, offset),
    }
}

//! Runtime-width integer codec.
//!
//! Public API for callers that only know a field width at runtime. The command structs in this workspace
//! use the compile-time [`crate::FromBytes`]/[`crate::ToBytes`] traits instead, and the DA parser decodes
//! through bincode.
//!
//! Protocol fields are big-endian, DA file headers are little-endian, so the byte order is always explicit.
use derive_more::IsVariant;

use crate::{Result, err::Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Endian {
    Big,
    Little,
}

fn check_width(width: usize) -> Result<()> {
    match width {
        1 | 2 | 4 => Ok(()),
        _ => Err(Error::InvalidWidth(width)),
    }
}

/// Encode `value` into exactly `width` bytes.
pub fn encode(value: u32, width: usize, endian: Endian) -> Result<Vec<u8>> {
    check_width(width)?;
    if width < 4 && value >> (width * 8) != 0 {
        return Err(Error::ValueOverflow { value, width });
    }

    let bytes = match endian {
        Endian::Big => value.to_be_bytes()[4 - width..].to_vec(),
        Endian::Little => value.to_le_bytes()[..width].to_vec(),
    };
    Ok(bytes)
}

/// Decode exactly `width` bytes into a value.
pub fn decode(bytes: &[u8], width: usize, endian: Endian) -> Result<u32> {
    check_width(width)?;
    if bytes.len() != width {
        return Err(Error::LengthMismatch {
            expected: width,
            got: bytes.len(),
        });
    }

    let value = match endian {
        Endian::Big => bytes.iter().fold(0, |acc, b| (acc << 8) | u32::from(*b)),
        Endian::Little => bytes.iter().rev().fold(0, |acc, b| (acc << 8) | u32::from(*b)),
    };
    Ok(value)
}

//! Low-level representation of the MediaTek DA structure
//!
//! This matches how DA is actually looks like. All fields are little-endian.
use bincode::Decode;

use crate::{LLParser, da::err::Error};

pub const HEADER_SIZE: usize = 0x6c;
pub const ENTRY_SIZE: usize = 0xdc;

pub const HEADER_VERSION: u32 = 4;
pub const HEADER_MAGIC: [u8; 4] = [0x99, 0x88, 0x66, 0x22];
pub const ENTRY_MAGIC: [u8; 2] = [0xda, 0xda];

#[derive(Debug, Decode)]
pub struct Header {
    _preamble: [u8; 0x20],
    pub id: [u8; 0x40],
    pub version: u32,
    pub magic: [u8; 4],
    pub soc_count: u32,
}

impl LLParser for Header {
    type Error = Error;

    fn validate(&self) -> core::result::Result<(), Self::Error> {
        if self.version != HEADER_VERSION {
            Err(Error::UnsupportedVersion(self.version))
        } else if self.magic != HEADER_MAGIC {
            Err(Error::InvalidHeaderMagic(self.magic))
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Decode)]
pub struct Entry {
    pub magic: [u8; 2],
    pub chip_id: u16,
    pub chip_version: u32,
    pub firmware_version: u32,
    pub extra_version: u32,
    _unknown: [u32; 4],
    _unknown64: u64,
    _regions: [u32; 13],
    _reserved: [u8; 128],
}

impl LLParser for Entry {
    type Error = Error;

    fn validate(&self) -> core::result::Result<(), Self::Error> {
        if self.magic != ENTRY_MAGIC {
            Err(Error::InvalidEntryMagic(self.magic))
        } else {
            Ok(())
        }
    }
}

//! Offline inspection of MediaTek Download Agent files.
use bincode::Decode;

use crate::err::Error;

pub mod da;
pub mod err;

pub type Result<T> = core::result::Result<T, Error>;

pub use da::hl::DA;

pub trait LLParser: Decode<()> + Sized {
    type Error;

    fn parse(data: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_little_endian()
            .with_fixed_int_encoding();
        bincode::decode_from_slice(data, config)
            .map(|r| r.0)
            .map_err(|e| e.into())
    }
    fn validate(&self) -> core::result::Result<(), Self::Error>;
}

pub trait HLParser<T: LLParser>: Sized {
    fn parse(data: &[u8], position: usize, ll: T) -> Result<Self>;
}

pub fn parse_da(data: &[u8]) -> Result<DA> {
    if data.len() < da::ll::HEADER_SIZE {
        return Err(da::err::Error::TooShort(data.len(), da::ll::HEADER_SIZE).into());
    }

    DA::parse(data, da::ll::HEADER_SIZE, da::ll::Header::parse(data)?)
}

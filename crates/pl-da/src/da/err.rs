use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    #[error("File is too short: {0} bytes, expected at least {1:#x}")]
    TooShort(usize, usize),
    #[error("Unsupported version: {0}, expected 4")]
    UnsupportedVersion(u32),
    #[error("Invalid magic: {0:02X?}, expected [99, 88, 66, 22]")]
    InvalidHeaderMagic([u8; 4]),
    #[error("DA ID is not ASCII")]
    InvalidId,

    #[error("Invalid magic: {0:02X?}, expected [DA, DA]")]
    InvalidEntryMagic([u8; 2]),
}

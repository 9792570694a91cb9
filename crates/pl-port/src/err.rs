use thiserror::Error as TError;

#[derive(Debug, TError)]
pub enum Error {
    #[cfg(feature = "serialport")]
    /// `serialport` crate error
    #[error("serialport error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Nothing arrived before the read timeout
    #[error("Timed out waiting for {expected} bytes")]
    Timeout { expected: usize },
    /// Some, but not all, of the requested bytes arrived before the read timeout
    #[error("Short read: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    /// Field width is not one of 1, 2 or 4 bytes
    #[error("Invalid width: {0}, expected 1, 2 or 4")]
    InvalidWidth(usize),
    /// Value doesn't fit into the field
    #[error("Value {value:#x} doesn't fit into {width} bytes")]
    ValueOverflow { value: u32, width: usize },
    /// Byte slice length doesn't match the field width
    #[error("Invalid length: expected {expected} bytes, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

impl Error {
    /// The read deadline expired, either fully or partially.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::ShortRead { .. })
    }
}

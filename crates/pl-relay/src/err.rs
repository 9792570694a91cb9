use thiserror::Error as TError;

use crate::{command::Command, session::State};

#[derive(Debug, TError)]
pub enum Error {
    /// Discovery timed out without a matching port
    #[error("Device {vid:04x}:{pid:04x} not found")]
    DeviceNotFound { vid: u16, pid: u16 },
    /// Session has no transport yet
    #[error("Session is not connected to a port")]
    NotConnected,
    /// Command issued before the handshake completed
    #[error("Session is not ready, current state: {0}")]
    NotReady(State),

    /// The device answered a handshake byte with an unexpected one
    #[error("Handshake failed! Expected {expected:#04x}, got {got:#04x}")]
    ProtocolMismatch { expected: u8, got: u8 },
    /// The device returned nonzero status for a command
    #[error("{0} failed, status is {1:#06x}")]
    DeviceStatus(Command, u16),
    /// The device reported zero-length ME ID or SoC ID
    #[error("{0} returned zero length")]
    EmptyIdentity(Command),
    /// The device rejected the uploaded DA
    #[error("DA transfer failed, status is {0:#06x}")]
    TransferFailed(u16),
    /// DA length header doesn't match the payload actually sent
    #[error("DA length {declared:#x} doesn't match payload length {actual:#x}")]
    PayloadLength { declared: u32, actual: usize },
    /// Byte is not a known command opcode
    #[error("Unknown command {0:#04x}")]
    UnknownCommand(u8),

    /// pl-port error
    #[error("Port error: {0}")]
    Port(#[from] pl_port::err::Error),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Transport read deadline expired.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Port(e) if e.is_timeout())
    }
}

use std::io::{self, Read};

use crate::err::Error;

pub mod codec;
pub mod discovery;
pub mod err;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
#[cfg(feature = "serialport")]
pub mod serial;

pub use codec::{Endian, decode, encode};
pub use discovery::{DeviceFilter, PortInfo};
#[cfg(any(test, feature = "mock"))]
pub use mock::ScriptedPort;
#[cfg(feature = "serialport")]
pub use serial::SerialTransport;

pub type Result<T> = core::result::Result<T, Error>;

pub trait FromBytes<const N: usize> {
    fn from_be(bytes: [u8; N]) -> Self;
    fn from_le(bytes: [u8; N]) -> Self;
}

pub trait ToBytes<const N: usize> {
    fn to_be(&self) -> [u8; N];
    fn to_le(&self) -> [u8; N];
}

pub trait SimpleRead {
    /// Fill the whole `buf`.
    ///
    /// Fails with [`Error::Timeout`] if nothing arrived in time and with [`Error::ShortRead`] if only a part did.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    fn read_be<T: FromBytes<N>, const N: usize>(&mut self) -> Result<T> {
        let mut bytes = [0; N];
        Self::read(self, &mut bytes)?;
        Ok(T::from_be(bytes))
    }

    fn read_le<T: FromBytes<N>, const N: usize>(&mut self) -> Result<T> {
        let mut bytes = [0; N];
        Self::read(self, &mut bytes)?;
        Ok(T::from_le(bytes))
    }

    fn read_u8(&mut self) -> Result<u8> {
        self.read_be()
    }

    fn read_u16_be(&mut self) -> Result<u16> {
        self.read_be()
    }

    fn read_u32_be(&mut self) -> Result<u32> {
        self.read_be()
    }

    fn read_u16_le(&mut self) -> Result<u16> {
        self.read_le()
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        self.read_le()
    }
}

pub trait SimpleWrite {
    /// Write the whole `buf`, returns the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    fn write_be<T: ToBytes<N>, const N: usize>(&mut self, value: T) -> Result<usize> {
        Self::write(self, &value.to_be())
    }

    fn write_le<T: ToBytes<N>, const N: usize>(&mut self, value: T) -> Result<usize> {
        Self::write(self, &value.to_le())
    }

    fn write_u8(&mut self, value: u8) -> Result<usize> {
        self.write_be(value)
    }

    fn write_u16_be(&mut self, value: u16) -> Result<usize> {
        self.write_be(value)
    }

    fn write_u32_be(&mut self, value: u32) -> Result<usize> {
        self.write_be(value)
    }

    fn write_u16_le(&mut self, value: u16) -> Result<usize> {
        self.write_le(value)
    }

    fn write_u32_le(&mut self, value: u32) -> Result<usize> {
        self.write_le(value)
    }
}

/// Half-duplex byte channel to the device.
pub trait Transport: SimpleRead + SimpleWrite {
    /// Discard everything received but not read yet.
    fn reset_input_buffer(&mut self) -> Result<()>;

    /// Send `value` as a big-endian field and swallow the echo of the same width.
    ///
    /// The echoed value is not compared against the sent one.
    fn echo<T: ToBytes<N>, const N: usize>(&mut self, value: T) -> Result<()> {
        let bytes = value.to_be();
        self.write(&bytes)?;
        let mut echo = [0; N];
        self.read(&mut echo)?;
        if echo != bytes {
            log::debug!("echo mismatch: sent {bytes:02x?}, got {echo:02x?}");
        }
        Ok(())
    }
}

/// Fill `buf` from a reader with a read timeout, telling a full timeout apart from a partial one.
pub fn read_exact_timeout<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut got = 0;
    while got < buf.len() {
        match reader.read(&mut buf[got..]) {
            Ok(0) => break,
            Ok(n) => got += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) => return Err(e.into()),
        }
    }

    match got {
        n if n == buf.len() => Ok(()),
        0 => Err(Error::Timeout {
            expected: buf.len(),
        }),
        got => Err(Error::ShortRead {
            expected: buf.len(),
            got,
        }),
    }
}

impl FromBytes<1> for u8 {
    fn from_be(bytes: [u8; 1]) -> Self {
        Self::from_be_bytes(bytes)
    }

    fn from_le(bytes: [u8; 1]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

impl ToBytes<1> for u8 {
    fn to_be(&self) -> [u8; 1] {
        self.to_be_bytes()
    }

    fn to_le(&self) -> [u8; 1] {
        self.to_le_bytes()
    }
}

impl FromBytes<2> for u16 {
    fn from_be(bytes: [u8; 2]) -> Self {
        Self::from_be_bytes(bytes)
    }

    fn from_le(bytes: [u8; 2]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

impl ToBytes<2> for u16 {
    fn to_be(&self) -> [u8; 2] {
        self.to_be_bytes()
    }

    fn to_le(&self) -> [u8; 2] {
        self.to_le_bytes()
    }
}

impl FromBytes<4> for u32 {
    fn from_be(bytes: [u8; 4]) -> Self {
        Self::from_be_bytes(bytes)
    }

    fn from_le(bytes: [u8; 4]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

impl ToBytes<4> for u32 {
    fn to_be(&self) -> [u8; 4] {
        self.to_be_bytes()
    }

    fn to_le(&self) -> [u8; 4] {
        self.to_le_bytes()
    }
}

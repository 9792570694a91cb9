use std::{io::Write, time::Duration};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use crate::{Result, SimpleRead, SimpleWrite, Transport, read_exact_timeout};

/// Serial line opened at a fixed baud rate and read timeout.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    pub fn open(name: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(name, baud_rate)
            .timeout(timeout)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open()?;

        Ok(Self {
            port,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.port.timeout()
    }
}

impl SimpleRead for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        read_exact_timeout(&mut self.port, buf)
    }
}

impl SimpleWrite for SerialTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.port.write_all(buf)?;
        self.port.flush()?;
        Ok(buf.len())
    }
}

impl Transport for SerialTransport {
    fn reset_input_buffer(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::Input).map_err(|e| e.into())
    }
}

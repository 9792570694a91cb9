//! Serial endpoint discovery by USB vendor/product id.
use std::{
    thread::sleep,
    time::{Duration, Instant},
};

use crate::Result;

/// MediaTek USB vendor id.
pub const MTK_VID: u16 = 0x0e8d;
/// Preloader CDC product id.
pub const PRELOADER_PID: u16 = 0x2000;

/// Vendor/product id pair the device is expected to enumerate with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceFilter {
    pub vid: u16,
    pub pid: u16,
}

impl Default for DeviceFilter {
    fn default() -> Self {
        Self {
            vid: MTK_VID,
            pid: PRELOADER_PID,
        }
    }
}

impl DeviceFilter {
    pub fn matches(&self, port: &PortInfo) -> bool {
        port.vid == Some(self.vid) && port.pid == Some(self.pid)
    }
}

/// Enumerated serial endpoint, ids are only known for USB ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

#[cfg(feature = "serialport")]
impl From<serialport::SerialPortInfo> for PortInfo {
    fn from(info: serialport::SerialPortInfo) -> Self {
        let (vid, pid) = match &info.port_type {
            serialport::SerialPortType::UsbPort(p) => (Some(p.vid), Some(p.pid)),
            _ => (None, None),
        };

        Self {
            name: info.port_name,
            vid,
            pid,
        }
    }
}

/// Serial endpoints currently present on the system.
#[cfg(feature = "serialport")]
pub fn available_ports() -> Result<Vec<PortInfo>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(PortInfo::from)
        .collect())
}

/// Poll the system ports until one matches `filter` or `timeout` expires.
///
/// Without a timeout this blocks until the device shows up.
#[cfg(feature = "serialport")]
pub fn find_port(
    filter: DeviceFilter,
    timeout: Option<Duration>,
    poll_interval: Duration,
) -> Result<Option<String>> {
    find_port_with(available_ports, filter, timeout, poll_interval)
}

/// [`find_port`] with a custom port enumerator.
pub fn find_port_with<F>(
    mut enumerate: F,
    filter: DeviceFilter,
    timeout: Option<Duration>,
    poll_interval: Duration,
) -> Result<Option<String>>
where
    F: FnMut() -> Result<Vec<PortInfo>>,
{
    let start = Instant::now();

    loop {
        if let Some(port) = enumerate()?.into_iter().find(|p| filter.matches(p)) {
            return Ok(Some(port.name));
        }

        if timeout.is_some_and(|t| start.elapsed() >= t) {
            return Ok(None);
        }

        sleep(poll_interval);
    }
}

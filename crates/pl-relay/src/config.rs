use std::time::Duration;

use clap::ValueEnum;
use derive_more::IsVariant;
use pl_port::DeviceFilter;

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// What to do with a nonzero status after `JUMP_DA`.
///
/// Control has already been handed to the DA by the time the status arrives, so the status says little about
/// whether the jump worked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IsVariant, ValueEnum)]
pub enum JumpStatusPolicy {
    /// Log a warning and carry on
    #[default]
    Ignore,
    /// Fail with the device status
    Surface,
}

/// Device profile and session settings.
#[derive(Debug, Clone)]
pub struct Config {
    /// USB ids the device enumerates with
    pub filter: DeviceFilter,
    pub baud_rate: u32,
    /// Per-read timeout
    pub timeout: Duration,
    /// Delay between port scans
    pub poll_interval: Duration,
    /// Give up discovery after this long, wait forever if `None`
    pub discovery_timeout: Option<Duration>,
    /// Only sync, the device already went through the handshake
    pub skip_handshake: bool,
    pub jump_status: JumpStatusPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter: DeviceFilter::default(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            discovery_timeout: None,
            skip_handshake: false,
            jump_status: JumpStatusPolicy::default(),
        }
    }
}

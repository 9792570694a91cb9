//! Preloader command exchanges.
//!
//! Every command byte and every `echo` field is echoed back by the device, bulk data (`tx`) is not.
use pl_macros::Protocol;

use crate::{command::Command, err::Error, identity::TargetConfig};

#[derive(Default, Protocol)]
#[protocol(command = GetHwCode)]
pub struct GetHwCode {
    #[protocol(rx, getter)]
    hw_code: u16,
    #[protocol(rx, status = 0)]
    status: u16,
}

#[derive(Default, Protocol)]
#[protocol(command = GetHwSwVer)]
pub struct GetHwSwVer {
    #[protocol(rx)]
    hw_sub_code: u16,
    #[protocol(rx)]
    hw_ver: u16,
    #[protocol(rx)]
    sw_ver: u16,
    #[protocol(rx, status = 0)]
    status: u16,
}

impl GetHwSwVer {
    /// HW sub-code, HW version and SW version
    pub fn versions(&self) -> (u16, u16, u16) {
        (self.hw_sub_code, self.hw_ver, self.sw_ver)
    }
}

#[derive(Default, Protocol)]
#[protocol(command = GetMeId)]
pub struct GetMeId {
    #[protocol(rx, nonzero)]
    len: u32,
    #[protocol(rx, size = len, getter)]
    me_id: Vec<u8>,
    #[protocol(rx, status = 0)]
    status: u16,
}

#[derive(Default, Protocol)]
#[protocol(command = GetSocId)]
pub struct GetSocId {
    #[protocol(rx, nonzero)]
    len: u32,
    #[protocol(rx, size = len, getter)]
    soc_id: Vec<u8>,
    #[protocol(rx, status = 0)]
    status: u16,
}

/// SBC, SLA and DAA flags
#[derive(Default, Protocol)]
#[protocol(command = GetTargetConfig)]
pub struct GetTargetConfig {
    #[protocol(rx)]
    config: u32,
    #[protocol(rx, status = 0)]
    status: u16,
}

impl GetTargetConfig {
    pub fn parse(&self) -> TargetConfig {
        TargetConfig::new(
            self.config & 0x1 != 0,
            self.config & 0x2 != 0,
            self.config & 0x4 != 0,
        )
    }
}

/// Write PMIC register
#[derive(Default, Protocol)]
#[protocol(command = PwrInit)]
pub struct PwrInit {
    #[protocol(echo)]
    reg: u32,
    #[protocol(echo)]
    val: u32,
    #[protocol(rx, status = 0)]
    status: u16,
}

#[derive(Default, Protocol)]
#[protocol(command = PwrDeinit)]
pub struct PwrDeinit {
    #[protocol(rx, status = 0)]
    status: u16,
}

/// A command to upload Download Agent to the device
#[derive(Default, Protocol)]
#[protocol(command = SendDa)]
pub struct SendDa<'a> {
    /// DA address
    #[protocol(echo)]
    addr: u32,
    /// DA length
    #[protocol(echo)]
    payload_len: u32,
    /// DA signature length
    #[protocol(echo)]
    sig_len: u32,
    /// Status for DA range and overlap
    #[protocol(rx, status = 0)]
    header_status: u16,
    /// DA
    #[protocol(tx)]
    payload: &'a [u8],
    /// Checksum of the received DA, computed by the device
    #[protocol(rx, getter)]
    checksum: u16,
    /// DA verification status
    #[protocol(rx, status = 0, error = TransferFailed)]
    status: u16,
}

/// A command to jump to previously uploaded Download Agent
///
/// The status is returned as is, see [`crate::config::JumpStatusPolicy`].
#[derive(Default, Protocol)]
#[protocol(command = JumpDa)]
pub struct JumpDa {
    /// DA address
    #[protocol(echo)]
    addr: u32,
    /// DA jump status
    #[protocol(rx, getter)]
    status: u16,
}

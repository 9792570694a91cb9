use std::fmt::Display;

use derive_ctor::ctor;

/// Hardware identity reported by the preloader.
#[derive(Debug, Clone, PartialEq, Eq, ctor)]
pub struct Identity {
    pub hw_code: u16,
    pub hw_sub_code: u16,
    pub hw_ver: u16,
    pub sw_ver: u16,
    pub me_id: Vec<u8>,
    pub soc_id: Vec<u8>,
}

impl Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "HW Code: {:#06X}", self.hw_code)?;
        writeln!(f, "HW Sub-Code: {:#06X}", self.hw_sub_code)?;
        writeln!(f, "HW Version: {:#06X}", self.hw_ver)?;
        writeln!(f, "SW Version: {:#06X}", self.sw_ver)?;
        writeln!(f, "ME ID: {}", hex::encode_upper(&self.me_id))?;
        write!(f, "SOC ID: {}", hex::encode_upper(&self.soc_id))
    }
}

/// Security features enforced by the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ctor)]
pub struct TargetConfig {
    /// Secure boot
    pub secure_boot: bool,
    /// Serial link authorization
    pub sla: bool,
    /// Download agent authorization
    pub daa: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_upper_hex() {
        let identity = Identity::new(0x6572, 0x8a00, 0xca00, 0x1, vec![0xde, 0xad], vec![0x0b]);
        let text = identity.to_string();
        assert!(text.contains("HW Code: 0x6572"));
        assert!(text.contains("HW Sub-Code: 0x8A00"));
        assert!(text.contains("SW Version: 0x0001"));
        assert!(text.contains("ME ID: DEAD"));
        assert!(text.ends_with("SOC ID: 0B"));
    }
}

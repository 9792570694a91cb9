use derive_more::IsVariant;
use strum::{Display, EnumIter, FromRepr};

use crate::err::Error;

/// Preloader / BootROM command opcodes.
///
/// Not every device implements every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, FromRepr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Command {
    GetHwSwVer = 0xfc,
    GetHwCode = 0xfd,
    GetPlVer = 0xfe,
    GetBrVer = 0xff,

    LegacyWrite = 0xa1,
    LegacyRead = 0xa2,

    I2cInit = 0xb0,
    I2cDeinit = 0xb1,
    I2cWrite8 = 0xb2,
    I2cRead8 = 0xb3,
    I2cSetSpeed = 0xb4,

    PwrInit = 0xc4,
    PwrDeinit = 0xc5,
    PwrRead16 = 0xc6,
    PwrWrite16 = 0xc7,

    Read16 = 0xd0,
    Read32 = 0xd1,
    Write16 = 0xd2,
    Write16NoEcho = 0xd3,
    Write32 = 0xd4,
    JumpDa = 0xd5,
    JumpBl = 0xd6,
    SendDa = 0xd7,
    GetTargetConfig = 0xd8,
    Uart1LogEn = 0xdb,

    SendCert = 0xe0,
    GetMeId = 0xe1,
    SendAuth = 0xe2,
    SlaChallenge = 0xe3,
    GetSocId = 0xe7,

    Zeroization = 0xf0,
    GetPlCap = 0xf1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum CommandGroup {
    Identification,
    Legacy,
    I2c,
    Power,
    Memory,
    DownloadAgent,
    Security,
    SocIdentity,
}

impl Command {
    pub fn group(self) -> CommandGroup {
        match self {
            Self::GetHwSwVer | Self::GetHwCode | Self::GetPlVer | Self::GetBrVer | Self::GetPlCap => {
                CommandGroup::Identification
            }
            Self::LegacyWrite | Self::LegacyRead => CommandGroup::Legacy,
            Self::I2cInit | Self::I2cDeinit | Self::I2cWrite8 | Self::I2cRead8 | Self::I2cSetSpeed => {
                CommandGroup::I2c
            }
            Self::PwrInit | Self::PwrDeinit | Self::PwrRead16 | Self::PwrWrite16 => {
                CommandGroup::Power
            }
            Self::Read16 | Self::Read32 | Self::Write16 | Self::Write16NoEcho | Self::Write32 => {
                CommandGroup::Memory
            }
            Self::JumpDa | Self::JumpBl | Self::SendDa | Self::Uart1LogEn => {
                CommandGroup::DownloadAgent
            }
            Self::GetTargetConfig
            | Self::SendCert
            | Self::SendAuth
            | Self::SlaChallenge
            | Self::Zeroization => CommandGroup::Security,
            Self::GetMeId | Self::GetSocId => CommandGroup::SocIdentity,
        }
    }
}

impl From<Command> for u8 {
    fn from(command: Command) -> Self {
        command as u8
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(Error::UnknownCommand(value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn opcodes_are_unique_and_roundtrip() {
        let mut seen = HashSet::new();
        for command in Command::iter() {
            let byte = u8::from(command);
            assert!(seen.insert(byte), "{command} reuses {byte:#04x}");
            assert_eq!(Command::try_from(byte).unwrap(), command);
        }
    }

    #[test]
    fn well_known_opcodes() {
        assert_eq!(u8::from(Command::GetHwCode), 0xfd);
        assert_eq!(u8::from(Command::SendDa), 0xd7);
        assert_eq!(u8::from(Command::JumpDa), 0xd5);
        assert_eq!(u8::from(Command::GetMeId), 0xe1);
        assert_eq!(u8::from(Command::GetSocId), 0xe7);
        assert_eq!(u8::from(Command::PwrInit), 0xc4);
        assert_eq!(Command::SendDa.to_string(), "SEND_DA");
    }

    #[test]
    fn unknown_opcode() {
        assert!(matches!(
            Command::try_from(0x00),
            Err(Error::UnknownCommand(0x00))
        ));
    }

    #[test]
    fn groups() {
        assert!(Command::GetSocId.group().is_soc_identity());
        assert!(Command::SendDa.group().is_download_agent());
        assert!(matches!(Command::I2cRead8.group(), CommandGroup::I2c));
        assert!(Command::SlaChallenge.group().is_security());
    }
}

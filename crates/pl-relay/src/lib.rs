//! Host side of the MediaTek preloader / BootROM download protocol.
use crate::err::Error;

pub mod checksum;
pub mod command;
pub mod commands;
pub mod config;
pub mod err;
pub mod identity;
pub mod session;

pub type Result<T> = core::result::Result<T, Error>;

pub use command::Command;
pub use config::{Config, JumpStatusPolicy};
pub use identity::{Identity, TargetConfig};
pub use session::{Session, State};

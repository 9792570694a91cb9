//! Live connection to a device in preloader or BootROM download mode.
use derive_more::IsVariant;
use log::{debug, info, warn};
use pl_port::{SerialTransport, Transport, discovery::find_port};
use strum::Display;

use crate::{
    Result,
    command::Command,
    commands::{
        GetHwCode, GetHwSwVer, GetMeId, GetSocId, GetTargetConfig, JumpDa, PwrDeinit, PwrInit,
        SendDa,
    },
    config::{Config, JumpStatusPolicy},
    err::Error,
    identity::{Identity, TargetConfig},
};

const SYNC_REQUEST: u8 = 0xa0;
const SYNC_RESPONSE: u8 = 0x5f;
/// Handshake bytes and the expected answers
const HANDSHAKE: [(u8, u8); 3] = [(0x0a, 0xf5), (0x50, 0xaf), (0x05, 0xfa)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IsVariant)]
pub enum State {
    Disconnected,
    Syncing,
    Synced,
    Handshaking,
    Ready,
}

/// Single-owner client for one device.
///
/// The session owns the transport, commands are strictly sequential.
pub struct Session<P: Transport> {
    port: Option<P>,
    name: Option<String>,
    config: Config,
    state: State,
}

impl<P: Transport> Session<P> {
    /// Unbound session, see [`Session::bind`].
    pub fn new(config: Config) -> Self {
        Self {
            port: None,
            name: None,
            config,
            state: State::Disconnected,
        }
    }

    pub fn with_port(port: P, name: impl Into<String>, config: Config) -> Self {
        let mut session = Self::new(config);
        session.bind(port, name);
        session
    }

    /// Attach a transport, the handshake has to be redone.
    pub fn bind(&mut self, port: P, name: impl Into<String>) {
        self.port = Some(port);
        self.name = Some(name.into());
        self.state = State::Disconnected;
    }

    /// Detach and return the transport.
    pub fn release(&mut self) -> Option<P> {
        self.name = None;
        self.state = State::Disconnected;
        self.port.take()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn transport(&self) -> Option<&P> {
        self.port.as_ref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn ready_port(&mut self) -> Result<&mut P> {
        if !self.state.is_ready() {
            return Err(Error::NotReady(self.state));
        }
        self.port.as_mut().ok_or(Error::NotConnected)
    }

    /// Probe with the sync byte until the device answers, returns the number of probes sent.
    ///
    /// There is no retry limit: the BootROM may not be listening yet when probing starts. A caller that needs a
    /// bound has to enforce it around this call, the per-read timeout is the only interruption point.
    pub fn sync(&mut self) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        self.state = State::Syncing;

        let mut probes = 0;
        loop {
            probes += 1;
            port.write_u8(SYNC_REQUEST)?;
            match port.read_u8() {
                Ok(SYNC_RESPONSE) => break,
                Ok(byte) => debug!("Sync: got {byte:#04x}, retrying"),
                Err(e) if e.is_timeout() => debug!("Sync: no answer, retrying"),
                Err(e) => return Err(e.into()),
            }
            port.reset_input_buffer()?;
        }

        self.state = State::Synced;
        debug!("Synced after {probes} probes");
        Ok(probes)
    }

    /// Sync and exchange the handshake bytes.
    ///
    /// With `skip_handshake` the sync alone makes the session ready.
    pub fn handshake(&mut self) -> Result<()> {
        self.sync()?;

        if self.config.skip_handshake {
            info!("Handshake skipped");
            self.state = State::Ready;
            return Ok(());
        }

        self.state = State::Handshaking;
        if let Err(e) = self.probe() {
            self.state = State::Disconnected;
            return Err(e);
        }

        self.state = State::Ready;
        info!("Handshake completed!");
        Ok(())
    }

    fn probe(&mut self) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;
        for (byte, expected) in HANDSHAKE {
            port.write_u8(byte)?;
            let got = port.read_u8()?;
            if got != expected {
                return Err(Error::ProtocolMismatch { expected, got });
            }
        }
        Ok(())
    }

    pub fn get_hw_code(&mut self) -> Result<u16> {
        GetHwCode::new().run_hw_code(self.ready_port()?)
    }

    /// HW sub-code, HW version and SW version
    pub fn get_hw_sw_ver(&mut self) -> Result<(u16, u16, u16)> {
        let mut command = GetHwSwVer::new();
        command.run(self.ready_port()?)?;
        Ok(command.versions())
    }

    pub fn get_me_id(&mut self) -> Result<Vec<u8>> {
        GetMeId::new().run_me_id(self.ready_port()?)
    }

    pub fn get_soc_id(&mut self) -> Result<Vec<u8>> {
        GetSocId::new().run_soc_id(self.ready_port()?)
    }

    pub fn get_target_config(&mut self) -> Result<TargetConfig> {
        let mut command = GetTargetConfig::new();
        command.run(self.ready_port()?)?;
        Ok(command.parse())
    }

    pub fn pwr_init(&mut self, reg: u32, val: u32) -> Result<()> {
        info!("Init PMIC: {reg:#06X} ({val:#06X})");
        PwrInit::new(reg, val).run(self.ready_port()?)
    }

    pub fn pwr_deinit(&mut self) -> Result<()> {
        info!("Deinit PMIC");
        PwrDeinit::new().run(self.ready_port()?)
    }

    /// Upload the DA, returns the checksum computed by the device.
    ///
    /// The checksum is not validated here, compare it with [`crate::checksum::da_checksum`] if needed.
    pub fn send_da(&mut self, address: u32, da_len: u32, sig_len: u32, payload: &[u8]) -> Result<u16> {
        if da_len as usize != payload.len() {
            return Err(Error::PayloadLength {
                declared: da_len,
                actual: payload.len(),
            });
        }

        debug!("Send DA to {address:#010X} ({da_len} bytes, {sig_len} bytes signature)");
        SendDa::new(address, da_len, sig_len, payload).run_checksum(self.ready_port()?)
    }

    /// Jump to the uploaded DA, returns the raw status.
    ///
    /// A nonzero status fails only with [`JumpStatusPolicy::Surface`].
    pub fn jump_da(&mut self, address: u32) -> Result<u16> {
        debug!("Jump to DA at {address:#010X}");
        let policy = self.config.jump_status;
        let status = JumpDa::new(address).run_status(self.ready_port()?)?;

        if status != 0 {
            match policy {
                JumpStatusPolicy::Ignore => warn!("JUMP_DA status is {status:#06X}, ignoring"),
                JumpStatusPolicy::Surface => return Err(Error::DeviceStatus(Command::JumpDa, status)),
            }
        }

        Ok(status)
    }

    /// Upload `payload` to `address` and jump to it, returns the device checksum.
    ///
    /// Nothing is executed if the upload fails.
    pub fn upload_and_jump(&mut self, address: u32, sig_len: u32, payload: &[u8]) -> Result<u16> {
        let da_len = u32::try_from(payload.len()).map_err(|_| Error::PayloadLength {
            declared: u32::MAX,
            actual: payload.len(),
        })?;

        let checksum = self.send_da(address, da_len, sig_len, payload)?;
        self.jump_da(address)?;
        Ok(checksum)
    }

    /// Read the hardware identity.
    ///
    /// The first failing command aborts the whole sequence.
    pub fn identify(&mut self) -> Result<Identity> {
        let hw_code = self.get_hw_code()?;
        let (hw_sub_code, hw_ver, sw_ver) = self.get_hw_sw_ver()?;
        let me_id = self.get_me_id()?;
        let soc_id = self.get_soc_id()?;

        let identity = Identity::new(hw_code, hw_sub_code, hw_ver, sw_ver, me_id, soc_id);
        for line in identity.to_string().lines() {
            info!("{line}");
        }

        Ok(identity)
    }
}

impl Session<SerialTransport> {
    /// Wait for the device and open it.
    pub fn discover(config: Config) -> Result<Self> {
        let mut session = Self::new(config);
        session.connect()?;
        Ok(session)
    }

    /// Open a known port.
    pub fn open(name: &str, config: Config) -> Result<Self> {
        let mut session = Self::new(config);
        session.open_port(name)?;
        Ok(session)
    }

    /// Bind to the first port matching the configured filter, waiting for it to appear.
    pub fn connect(&mut self) -> Result<()> {
        if self.port.is_some() {
            info!("Device already found!");
            return Ok(());
        }

        let filter = self.config.filter;
        let name = find_port(filter, self.config.discovery_timeout, self.config.poll_interval)?
            .ok_or(Error::DeviceNotFound {
                vid: filter.vid,
                pid: filter.pid,
            })?;
        info!("Found device = {name}");

        self.open_port(&name)
    }

    fn open_port(&mut self, name: &str) -> Result<()> {
        let port = SerialTransport::open(name, self.config.baud_rate, self.config.timeout)?;
        self.bind(port, name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pl_port::ScriptedPort;

    use super::*;

    const HANDSHAKE_OK: [u8; 4] = [0x5f, 0xf5, 0xaf, 0xfa];
    const HANDSHAKE_TX: [u8; 4] = [0xa0, 0x0a, 0x50, 0x05];

    fn session(script: &[&[u8]], config: Config) -> Session<ScriptedPort> {
        Session::with_port(ScriptedPort::new(script.concat()), "mock", config)
    }

    fn ready(script: &[&[u8]]) -> Session<ScriptedPort> {
        ready_with(script, Config::default())
    }

    fn ready_with(script: &[&[u8]], config: Config) -> Session<ScriptedPort> {
        let mut session = session(&[&HANDSHAKE_OK, &script.concat()], config);
        session.handshake().unwrap();
        session
    }

    fn written(session: &Session<ScriptedPort>) -> Vec<u8> {
        session.transport().unwrap().written().to_vec()
    }

    /// Bytes sent after the handshake
    fn sent(session: &Session<ScriptedPort>) -> Vec<u8> {
        written(session)[HANDSHAKE_TX.len()..].to_vec()
    }

    fn remaining(session: &Session<ScriptedPort>) -> usize {
        session.transport().unwrap().remaining()
    }

    fn identity_script() -> Vec<u8> {
        [
            &[0xfd, 0x12, 0x34, 0x00, 0x00][..],
            &[0xfc, 0x8a, 0x00, 0xca, 0x00, 0x00, 0x01, 0x00, 0x00],
            &[0xe1, 0x00, 0x00, 0x00, 0x04, 0x01, 0x02, 0x03, 0x04, 0x00, 0x00],
            &[0xe7, 0x00, 0x00, 0x00, 0x02, 0xaa, 0xbb, 0x00, 0x00],
        ]
        .concat()
    }

    fn send_da_script(final_status: [u8; 2]) -> Vec<u8> {
        [
            &[0xd7][..],
            &[0x00, 0x20, 0x00, 0x00],
            &[0x00, 0x00, 0x04, 0x00],
            &[0x00, 0x00, 0x01, 0x00],
            &[0x00, 0x00],
            &[0xab, 0xcd],
            &final_status,
        ]
        .concat()
    }

    #[test]
    fn sync_discards_garbage_until_answer() {
        let mut session = session(&[&[0x00, 0x12, 0x5f]], Config::default());
        assert_eq!(session.sync().unwrap(), 3);
        assert_eq!(session.state(), State::Synced);

        let port = session.transport().unwrap();
        assert_eq!(port.written(), &[0xa0, 0xa0, 0xa0]);
        assert_eq!(port.resets(), 2);
        assert_eq!(port.remaining(), 0);
    }

    #[test]
    fn handshake_reaches_ready() {
        let session = ready(&[]);
        assert!(session.state().is_ready());
        assert_eq!(written(&session), HANDSHAKE_TX);
    }

    #[test]
    fn skip_handshake_needs_only_sync() {
        let config = Config {
            skip_handshake: true,
            ..Default::default()
        };
        let mut session = session(&[&[0x5f]], config);
        session.handshake().unwrap();
        assert!(session.state().is_ready());
        assert_eq!(written(&session), [0xa0]);
    }

    #[test]
    fn handshake_mismatch_is_fatal() {
        let mut session = session(&[&[0x5f, 0xf5, 0x00], &identity_script()], Config::default());
        assert!(matches!(
            session.handshake(),
            Err(Error::ProtocolMismatch {
                expected: 0xaf,
                got: 0x00
            })
        ));
        assert!(!session.state().is_ready());

        assert!(matches!(session.identify(), Err(Error::NotReady(_))));
        assert_eq!(written(&session), [0xa0, 0x0a, 0x50]);
    }

    #[test]
    fn handshake_timeout_disconnects() {
        let mut session = session(&[&[0x5f, 0xf5]], Config::default());
        let err = session.handshake().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(session.state(), State::Disconnected);
        assert!(matches!(session.get_hw_code(), Err(Error::NotReady(State::Disconnected))));
    }

    #[test]
    fn unbound_session() {
        let mut session = Session::<ScriptedPort>::new(Config::default());
        assert!(matches!(session.handshake(), Err(Error::NotConnected)));
        assert_eq!(session.state(), State::Disconnected);
        assert_eq!(session.port_name(), None);

        session.bind(ScriptedPort::new(HANDSHAKE_OK), "mock");
        session.handshake().unwrap();
        assert_eq!(session.port_name(), Some("mock"));

        assert!(session.release().is_some());
        assert!(matches!(session.get_hw_code(), Err(Error::NotReady(State::Disconnected))));
    }

    #[test]
    fn hw_code() {
        let mut session = ready(&[&[0xfd, 0x12, 0x34, 0x00, 0x00]]);
        assert_eq!(session.get_hw_code().unwrap(), 0x1234);
        assert_eq!(sent(&session), [0xfd]);
    }

    #[test]
    fn nonzero_status_carries_code() {
        let mut session = ready(&[&[0xfd, 0x12, 0x34, 0x10, 0x04]]);
        assert!(matches!(
            session.get_hw_code(),
            Err(Error::DeviceStatus(Command::GetHwCode, 0x1004))
        ));
    }

    #[test]
    fn short_response_is_short_read() {
        let mut session = ready(&[&[0xfd, 0x12]]);
        let err = session.get_hw_code().unwrap_err();
        assert!(err.is_timeout());
        assert!(matches!(
            err,
            Error::Port(pl_port::err::Error::ShortRead {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn truncated_me_id_is_one_short_read() {
        let mut session = ready(&[&[0xe1, 0x00, 0x00, 0x00, 0x10, 0xde, 0xad, 0xbe]]);
        assert!(matches!(
            session.get_me_id(),
            Err(Error::Port(pl_port::err::Error::ShortRead {
                expected: 16,
                got: 3
            }))
        ));
        assert_eq!(remaining(&session), 0);
    }

    #[test]
    fn empty_me_id_stops_reading() {
        let mut session = ready(&[&[0xe1, 0x00, 0x00, 0x00, 0x00, 0xde, 0xad]]);
        assert!(matches!(
            session.get_me_id(),
            Err(Error::EmptyIdentity(Command::GetMeId))
        ));
        assert_eq!(remaining(&session), 2);
    }

    #[test]
    fn empty_soc_id() {
        let mut session = ready(&[&[0xe7, 0x00, 0x00, 0x00, 0x00]]);
        assert!(matches!(
            session.get_soc_id(),
            Err(Error::EmptyIdentity(Command::GetSocId))
        ));
    }

    #[test]
    fn identify_collects_everything() {
        let mut session = ready(&[&identity_script()]);
        let identity = session.identify().unwrap();

        assert_eq!(
            identity,
            Identity::new(0x1234, 0x8a00, 0xca00, 0x0001, vec![1, 2, 3, 4], vec![0xaa, 0xbb])
        );
        assert_eq!(sent(&session), [0xfd, 0xfc, 0xe1, 0xe7]);
        assert_eq!(remaining(&session), 0);
    }

    #[test]
    fn identify_aborts_on_first_failure() {
        let mut session = ready(&[&[0xfd, 0x12, 0x34, 0x00, 0x01], &identity_script()[5..]]);
        assert!(matches!(
            session.identify(),
            Err(Error::DeviceStatus(Command::GetHwCode, 1))
        ));
        assert_eq!(sent(&session), [0xfd]);
    }

    #[test]
    fn target_config_flags() {
        let mut session = ready(&[&[0xd8, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00]]);
        assert_eq!(
            session.get_target_config().unwrap(),
            TargetConfig::new(true, false, true)
        );
    }

    #[test]
    fn pwr_init_echoes_arguments() {
        let mut session = ready(&[
            &[0xc4],
            &[0x00, 0x00, 0x0a, 0x14],
            &[0x00, 0x00, 0x00, 0x01],
            &[0x00, 0x00],
            &[0xc5, 0x00, 0x00],
        ]);
        session.pwr_init(0x0a14, 0x1).unwrap();
        session.pwr_deinit().unwrap();
        assert_eq!(
            sent(&session),
            [0xc4, 0x00, 0x00, 0x0a, 0x14, 0x00, 0x00, 0x00, 0x01, 0xc5]
        );
    }

    #[test]
    fn send_da_returns_device_checksum() {
        let payload = vec![0x5a; 1024];
        let mut session = ready(&[&send_da_script([0x00, 0x00])]);

        let checksum = session.send_da(0x200000, 1024, 256, &payload).unwrap();
        assert_eq!(checksum, 0xabcd);

        let expected = [
            &[0xd7, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x01, 0x00][..],
            payload.as_slice(),
        ]
        .concat();
        assert_eq!(sent(&session), expected);
        assert_eq!(remaining(&session), 0);
    }

    #[test]
    fn send_da_rejects_length_mismatch() {
        let mut session = ready(&[]);
        assert!(matches!(
            session.send_da(0x200000, 1024, 256, &[0; 16]),
            Err(Error::PayloadLength {
                declared: 1024,
                actual: 16
            })
        ));
        assert!(sent(&session).is_empty());
    }

    #[test]
    fn send_da_header_status() {
        let mut session = ready(&[
            &[0xd7],
            &[0x00, 0x20, 0x00, 0x00],
            &[0x00, 0x00, 0x00, 0x04],
            &[0x00, 0x00, 0x00, 0x00],
            &[0x10, 0x02],
        ]);
        assert!(matches!(
            session.send_da(0x200000, 4, 0, &[1, 2, 3, 4]),
            Err(Error::DeviceStatus(Command::SendDa, 0x1002))
        ));
        assert_eq!(sent(&session).len(), 13);
    }

    #[test]
    fn failed_transfer_never_jumps() {
        let payload = vec![0; 1024];
        let mut session = ready(&[&send_da_script([0x00, 0x01]), &[0xd5]]);

        assert!(matches!(
            session.upload_and_jump(0x200000, 256, &payload),
            Err(Error::TransferFailed(0x0001))
        ));
        assert_eq!(sent(&session).len(), 13 + payload.len());
        assert_eq!(remaining(&session), 1);
    }

    #[test]
    fn upload_and_jump() {
        let payload = vec![0; 1024];
        let mut session = ready(&[
            &send_da_script([0x00, 0x00]),
            &[0xd5, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00],
        ]);

        assert_eq!(session.upload_and_jump(0x200000, 256, &payload).unwrap(), 0xabcd);
        assert_eq!(sent(&session)[5..9], 1024u32.to_be_bytes());
        assert_eq!(
            sent(&session)[13 + payload.len()..],
            [0xd5, 0x00, 0x20, 0x00, 0x00]
        );
    }

    #[test]
    fn jump_status_policy() {
        let jump = [0xd5, 0x00, 0x20, 0x00, 0x00, 0x00, 0x03];

        let mut session = ready(&[&jump]);
        assert_eq!(session.jump_da(0x200000).unwrap(), 3);

        let config = Config {
            jump_status: JumpStatusPolicy::Surface,
            ..Default::default()
        };
        let mut session = ready_with(&[&jump], config);
        assert!(matches!(
            session.jump_da(0x200000),
            Err(Error::DeviceStatus(Command::JumpDa, 3))
        ));
    }
}

use std::{
    fs,
    io::{Write, stdout},
    path::PathBuf,
    time::Duration,
};

use clap::{Args, Parser};
use clap_num::maybe_hex;
use colored::Colorize;
use env_logger::Env;
use pl_port::{DeviceFilter, SerialTransport};
use pl_relay::{Config, JumpStatusPolicy, Result, Session, checksum::da_checksum};

mod logging;

const DA_ADDR: u32 = 0x200000;
const DA_SIG_LEN: u32 = 0x100;

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Mode {
    /// Read and print hardware information from the device
    #[arg(short = 'i', long)]
    identify: bool,

    /// Upload and execute a download agent
    #[arg(short = 'd', long)]
    download_agent: bool,
}

/// Replay preloader traffic to run Download Agents that can execute arbitrary code.
///
/// Use this tool only on devices you have permission to test on.
#[derive(Parser)]
#[command(name = "preloader-relay", version)]
struct Cli {
    #[command(flatten)]
    mode: Mode,

    /// Path to the DA/payload to upload
    #[arg(long, default_value = "bin/payload.bin")]
    payload: PathBuf,

    /// DA load and jump address
    #[arg(short, long, default_value_t = DA_ADDR, value_parser=maybe_hex::<u32>)]
    address: u32,

    /// DA signature length
    #[arg(long, default_value_t = DA_SIG_LEN, value_parser=maybe_hex::<u32>)]
    sig_len: u32,

    /// The serial port to use, found by USB ids if not set
    #[arg(short, long)]
    port: Option<String>,

    /// USB vendor id to wait for
    #[arg(long, default_value_t = DeviceFilter::default().vid, value_parser=maybe_hex::<u16>)]
    vid: u16,

    /// USB product id to wait for
    #[arg(long, default_value_t = DeviceFilter::default().pid, value_parser=maybe_hex::<u16>)]
    pid: u16,

    /// Stop waiting for the device after this many seconds
    #[arg(long)]
    discovery_timeout: Option<u64>,

    /// Skip the handshake with the device
    #[arg(short, long)]
    skip_handshake: bool,

    /// What to do with a nonzero JUMP_DA status
    #[arg(long, value_enum, default_value_t = JumpStatusPolicy::Ignore)]
    jump_status: JumpStatusPolicy,

    /// Print SBC/SLA/DAA state
    #[arg(short, long)]
    target_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            filter: DeviceFilter {
                vid: self.vid,
                pid: self.pid,
            },
            discovery_timeout: self.discovery_timeout.map(Duration::from_secs),
            skip_handshake: self.skip_handshake,
            jump_status: self.jump_status,
            ..Default::default()
        }
    }
}

fn open_session(cli: &Cli) -> Result<Session<SerialTransport>> {
    let session = match &cli.port {
        Some(port) => Session::open(port, cli.config())?,
        None => {
            println!("Waiting for device...");
            Session::discover(cli.config())?
        }
    };

    if let Some(name) = session.port_name() {
        println!("Found device at {name}");
    }
    Ok(session)
}

fn print_target(session: &mut Session<SerialTransport>) -> Result<()> {
    let config = session.get_target_config()?;
    y_n_reverse!("SBC enabled", config.secure_boot);
    y_n_reverse!("SLA enabled", config.sla);
    y_n_reverse!("DAA enabled", config.daa);
    Ok(())
}

fn run_da(cli: &Cli, session: &mut Session<SerialTransport>) -> Result<()> {
    let payload = fs::read(&cli.payload)?;
    println!(
        "Load payload from {} = {:#010x} bytes",
        cli.payload.display(),
        payload.len()
    );

    log!("Uploading and jumping to {:#x}...", cli.address);
    let checksum = status!(session.upload_and_jump(cli.address, cli.sig_len, &payload))?;

    let expected = da_checksum(&payload);
    if checksum == expected {
        println!("Checksum: {checksum:#06x}");
    } else {
        println!(
            "{}: device reported {checksum:#06x}, expected {expected:#06x}",
            "Checksum mismatch".yellow()
        );
    }

    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut session = open_session(&cli)?;

    log!("Handshaking...");
    status!(session.handshake())?;

    let identity = session.identify()?;
    println!("{identity}");

    if cli.target_config {
        print_target(&mut session)?;
    }

    if cli.mode.download_agent {
        run_da(&cli, &mut session)?;
    }

    Ok(())
}

fn main() -> core::result::Result<(), String> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_target(false)
        .init();

    run(cli).map_err(|e| e.to_string())
}

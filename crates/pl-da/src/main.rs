use std::{fs, path::PathBuf};

use clap::Parser;
use clap_num::maybe_hex;
use colored::Colorize;
use pl_da::{Result, err::Error, parse_da};

#[derive(Parser)]
#[command(about = "Inspect MediaTek Download Agent files")]
struct Cli {
    /// Input file
    #[arg(short, long)]
    input: PathBuf,

    /// Write everything after the chip table into this file
    #[arg(short, long)]
    extract: Option<PathBuf>,

    /// Write the chip table as CSV
    #[arg(long)]
    export_csv: Option<PathBuf>,

    /// Only show the chip with this HW code
    #[arg(long, value_parser=maybe_hex::<u16>)]
    hw_code: Option<u16>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let data = fs::read(&cli.input)?;
    let da = parse_da(&data)?;

    println!("{da}");
    for skipped in da.skipped() {
        println!("{}", format!("Warning: {skipped}").yellow());
    }

    if let Some(hw_code) = cli.hw_code {
        let entry = da
            .chip(hw_code)
            .ok_or(Error::Custom("HW code not found".into()))?;
        println!("\n{entry}");
    } else {
        for entry in da.entries() {
            println!("\n{entry}");
        }
    }

    if let Some(output) = cli.extract {
        fs::write(&output, da.body())?;
        println!(
            "{}",
            format!("Extracted {} to {}", da.name(), output.display()).green()
        );
    }

    if let Some(csv) = cli.export_csv {
        fs::write(&csv, da.to_csv())?;
        println!("{}", format!("Exported to {}", csv.display()).green());
    }

    Ok(())
}

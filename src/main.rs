//! ubiattach - attach MTD devices to UBI
//!
//! Asks the kernel's UBI subsystem to attach an MTD device through the UBI
//! control node, then prints the parameters of the resulting UBI device.
//! All flash management happens in the kernel; this tool only sequences the
//! calls of the `libubi` crate.

mod attach;
mod cli;
mod format;

use attach::{AttachArgs, AttachError};
use clap::Parser;
use cli::Cli;
use libubi::LibUbi;
use std::io::{self, Write};

const PROGRAM_NAME: &str = "ubiattach";

fn main() {
    let cli = Cli::parse();

    // Initialize logger, RUST_LOG takes precedence over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(&cli) {
        let _ = report(&mut std::io::stderr().lock(), &e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AttachError> {
    let args = AttachArgs::from_cli(cli);

    let ubi = LibUbi::open().map_err(AttachError::Open)?;
    log::debug!("Using sysfs at {}", ubi.sysfs_root().display());

    let info = attach::run(&ubi, &args)?;
    println!("{}", format::format_dev_info(&info));
    Ok(())
}

/// Print an error and its causes
fn report(out: &mut impl Write, err: &dyn std::error::Error) -> io::Result<()> {
    writeln!(out, "{} error!: {}", PROGRAM_NAME, err)?;
    let mut source = err.source();
    while let Some(cause) = source {
        writeln!(out, "  caused by: {}", cause)?;
        source = cause.source();
    }
    Ok(())
}

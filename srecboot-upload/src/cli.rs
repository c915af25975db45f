// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command-line interface definitions.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::commands;
use crate::transport::Transport;

/// The bootloader's fixed line rate.
pub const BAUD_RATE: u32 = 9600;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "srecboot-upload")]
#[command(about = "S-record upload tool for the srecboot bootloader")]
pub struct Cli {
    /// Serial port (e.g., /dev/ttyUSB0); required except for `convert`
    #[arg(short, long)]
    pub port: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Stream an image to the bootloader (S-record text or raw binary)
    Flash {
        /// Image file; `.srec`/`.s19` is sent as-is, anything else is
        /// converted to S-records first
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Load address for raw binary input
        #[arg(short, long, default_value = "0xA000", value_parser = parse_address)]
        address: u32,

        /// Pause between lines in milliseconds (the protocol has no
        /// acknowledgments; pacing is the only flow control)
        #[arg(short, long, default_value = "20")]
        gap_ms: u64,
    },

    /// Convert a raw binary to an S-record file
    Convert {
        /// Input binary
        #[arg(value_name = "BIN")]
        input: PathBuf,

        /// Output S-record file
        #[arg(short, long, value_name = "OUT")]
        output: PathBuf,

        /// Load address of the binary
        #[arg(short, long, default_value = "0xA000", value_parser = parse_address)]
        address: u32,
    },

    /// Print bootloader status output until interrupted
    Monitor,
}

fn parse_address(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn open_port(port: &Option<String>) -> Result<Transport> {
    match port {
        Some(name) => Transport::new(name, BAUD_RATE),
        None => bail!("--port is required for this command"),
    }
}

/// Execute the parsed CLI command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Flash {
            file,
            address,
            gap_ms,
        } => {
            let mut transport = open_port(&cli.port)?;
            commands::flash(&mut transport, &file, address, gap_ms)
        }
        Commands::Convert {
            input,
            output,
            address,
        } => commands::convert(&input, &output, address),
        Commands::Monitor => {
            let mut transport = open_port(&cli.port)?;
            commands::monitor(&mut transport)
        }
    }
}

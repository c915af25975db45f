// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! S-record upload tool for the srecboot UART bootloader.
//!
//! Usage:
//!   srecboot-upload --port /dev/ttyUSB0 flash app.srec
//!   srecboot-upload --port /dev/ttyUSB0 flash app.bin --address 0xA000
//!   srecboot-upload --port /dev/ttyUSB0 monitor
//!   srecboot-upload convert app.bin -o app.srec --address 0xA000

mod cli;
mod commands;
mod transport;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::run(args)
}

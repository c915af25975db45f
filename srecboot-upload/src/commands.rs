// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Command implementations: flash, convert, monitor.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use srecboot_common::srec::{encode_data, encode_end, AddressWidth, Record};
use srecboot_common::APP_FLASH_START;

use crate::transport::Transport;

/// Payload bytes per generated data record. 32 keeps lines well inside the
/// bootloader's 256-byte line buffer.
const RECORD_PAYLOAD: usize = 32;

/// Build the record lines for an image: either pass through an existing
/// S-record file or encode a raw binary at `address`.
fn image_lines(file: &Path, address: u32) -> Result<Vec<String>> {
    let is_srec = matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("srec") | Some("s19") | Some("s28") | Some("s37")
    );

    if is_srec {
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let lines: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with('S'))
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            bail!("{} contains no S-record lines", file.display());
        }
        // Refuse obviously broken input before wasting an erase cycle.
        for (i, line) in lines.iter().enumerate() {
            let rec = Record::parse(line.as_bytes())
                .map_err(|e| anyhow::anyhow!("{}:{}: bad record: {e:?}", file.display(), i + 1))?;
            if !rec.valid {
                bail!("{}:{}: checksum mismatch", file.display(), i + 1);
            }
        }
        Ok(lines)
    } else {
        let data = fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        if data.is_empty() {
            bail!("{} is empty", file.display());
        }
        encode_image(&data, address)
    }
}

/// Encode a binary as data records plus the matching end record.
fn encode_image(data: &[u8], address: u32) -> Result<Vec<String>> {
    let end_addr = address as u64 + data.len() as u64 - 1;
    let width = AddressWidth::for_address(end_addr.min(u32::MAX as u64) as u32);

    let mut lines = Vec::with_capacity(data.len() / RECORD_PAYLOAD + 2);
    for (i, chunk) in data.chunks(RECORD_PAYLOAD).enumerate() {
        let addr = address + (i * RECORD_PAYLOAD) as u32;
        let line = encode_data(width, addr, chunk)
            .map_err(|_| anyhow::anyhow!("record at 0x{addr:08x} does not encode"))?;
        lines.push(line.as_str().to_string());
    }
    let end = encode_end(width, address).map_err(|_| anyhow::anyhow!("end record does not encode"))?;
    lines.push(end.as_str().to_string());
    Ok(lines)
}

/// Stream an image to the bootloader.
pub fn flash(transport: &mut Transport, file: &Path, address: u32, gap_ms: u64) -> Result<()> {
    let lines = image_lines(file, address)?;

    println!("Image:  {} ({} record lines)", file.display(), lines.len());
    println!("Port:   {} @ 9600 8N1", transport.port_name());
    println!();
    println!("Hold the boot button and reset the board, then press Enter...");
    let mut ack = String::new();
    std::io::stdin().read_line(&mut ack)?;

    // Let the bootloader finish its erase and say so before the stream
    // starts; everything it prints is for the operator.
    transport.echo_until_quiet(Duration::from_secs(2))?;

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")?
            .progress_chars("#>-"),
    );

    // Open loop: no acknowledgments, so pace the lines instead. At 9600
    // baud a 70-character line is ~73 ms on the wire on top of the gap.
    for line in &lines {
        transport.send_line(line)?;
        thread::sleep(Duration::from_millis(gap_ms));
        pb.inc(1);
    }
    pb.finish_with_message("stream complete");
    println!();

    // The completion notice trails the last record; echo it.
    transport.echo_until_quiet(Duration::from_secs(2))?;
    println!();
    println!("Done. Reset the board with the boot button released to start the application.");
    Ok(())
}

/// Convert a raw binary to an S-record file.
pub fn convert(input: &Path, output: &Path, address: u32) -> Result<()> {
    let data = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    if data.is_empty() {
        bail!("{} is empty", input.display());
    }
    if address < APP_FLASH_START {
        println!(
            "warning: 0x{address:08x} is below the application window (0x{APP_FLASH_START:08x}); \
             the bootloader will ignore these records"
        );
    }

    let lines = encode_image(&data, address)?;
    let mut text = lines.join("\r\n");
    text.push_str("\r\n");
    fs::write(output, text).with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} ({} bytes as {} records at 0x{address:08x})",
        output.display(),
        data.len(),
        lines.len()
    );
    Ok(())
}

/// Print device status output until interrupted.
pub fn monitor(transport: &mut Transport) -> Result<()> {
    println!("Monitoring {} (Ctrl-C to stop)", transport.port_name());
    loop {
        transport.echo_pending()?;
        thread::sleep(Duration::from_millis(50));
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Serial transport for streaming record lines and echoing status text.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serialport::SerialPort;

/// Read timeout for the underlying port.
pub const DEFAULT_TIMEOUT_MS: u64 = 200;

/// Line-oriented serial connection to the bootloader.
pub struct Transport {
    port: Box<dyn SerialPort>,
}

impl Transport {
    /// Open the named port at the given baud rate, 8N1.
    pub fn new(port_name: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(Duration::from_millis(DEFAULT_TIMEOUT_MS))
            .open()
            .with_context(|| format!("Failed to open serial port {port_name}"))?;

        Ok(Self { port })
    }

    /// Get the port name.
    pub fn port_name(&self) -> String {
        self.port.name().unwrap_or_else(|| "?".to_string())
    }

    /// Send one record line with its terminator.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.port
            .write_all(line.as_bytes())
            .context("Failed to write to serial port")?;
        self.port.write_all(b"\r\n")?;
        self.port.flush()?;
        Ok(())
    }

    /// Print whatever status text the device has queued, if any.
    pub fn echo_pending(&mut self) -> Result<()> {
        let mut buf = [0u8; 256];
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(n) => print!("{}", String::from_utf8_lossy(&buf[..n])),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(()),
                Err(e) => return Err(e).context("Serial read error"),
            }
        }
    }

    /// Echo device output until `window` elapses with nothing received.
    pub fn echo_until_quiet(&mut self, window: Duration) -> Result<()> {
        let mut last = Instant::now();
        let mut buf = [0u8; 256];
        while last.elapsed() < window {
            match self.port.read(&mut buf) {
                Ok(n) if n > 0 => {
                    print!("{}", String::from_utf8_lossy(&buf[..n]));
                    last = Instant::now();
                }
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e).context("Serial read error"),
            }
        }
        std::io::stdout().flush()?;
        Ok(())
    }
}

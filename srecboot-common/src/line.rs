// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Byte stream to record lines.
//!
//! The assembler accumulates bytes until a `\n`, then hands out the finished
//! line only if it is non-empty and starts with the `S` record marker;
//! comment lines, echo noise and anything overlong is thrown away. `\r` is
//! skipped so both LF and CRLF streams work.

use heapless::Vec;

use crate::LINE_MAX_LEN;

/// One complete, marker-filtered text line (terminator stripped).
pub type RecordLine = Vec<u8, LINE_MAX_LEN>;

/// Accumulates bytes into record lines.
#[derive(Default)]
pub struct LineAssembler {
    buf: RecordLine,
    overflowed: bool,
}

impl LineAssembler {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte. Returns the finished line on `\n` if it looks like a
    /// record; a line that overflowed the buffer is discarded whole.
    pub fn push(&mut self, byte: u8) -> Option<RecordLine> {
        match byte {
            b'\r' => None,
            b'\n' => {
                let overflowed = core::mem::take(&mut self.overflowed);
                let line = core::mem::take(&mut self.buf);
                if !overflowed && line.first() == Some(&b'S') {
                    Some(line)
                } else {
                    None
                }
            }
            _ => {
                if self.buf.push(byte).is_err() {
                    // Too long to be a record; eat the rest until newline.
                    self.buf.clear();
                    self.overflowed = true;
                }
                None
            }
        }
    }

    /// Drop any partial line.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

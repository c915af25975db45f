// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Updater session: one object owning all ingestion state.
//!
//! The interrupt side stops at the byte queue; everything downstream of it
//! (line assembly, the record FIFO, parsing, the write engine and the loss
//! counters) lives here and is driven from the main loop. Handing the whole
//! thing around by `&mut` keeps the single-consumer discipline obvious and
//! leaves nothing mutable at module scope.

use heapless::Deque;

use crate::engine::{EngineStats, Nvm, NvmError, WriteEngine};
use crate::line::{LineAssembler, RecordLine};
use crate::srec::Record;
use crate::{FlashRegion, RECORD_QUEUE_DEPTH};

/// What a [`UpdaterSession::pump`] pass observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Nothing of note; keep feeding.
    Progress,
    /// An end-of-transfer record was handled: pending data flushed,
    /// ingestion state reset for a possible next session.
    TransferComplete,
}

/// Loss and error accounting across one transfer.
///
/// The wire protocol is open-loop — no NACK, no retry — so the only honest
/// thing to do with a dropped line or a bad checksum is to count it and say
/// so in the completion notice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Complete lines dropped because the record FIFO was full.
    pub lines_dropped: u32,
    /// Lines that failed to decode at all.
    pub parse_errors: u32,
    /// Records that decoded but failed their checksum.
    pub checksum_errors: u32,
    /// Write engine counters.
    pub engine: EngineStats,
}

impl SessionStats {
    /// True when the transfer landed without any recorded loss.
    pub fn is_clean(&self) -> bool {
        self.lines_dropped == 0
            && self.parse_errors == 0
            && self.checksum_errors == 0
            && self.engine.records_out_of_region == 0
            && self.engine.bytes_skipped == 0
    }
}

/// All main-loop ingestion state for one update session.
pub struct UpdaterSession {
    assembler: LineAssembler,
    records: Deque<RecordLine, RECORD_QUEUE_DEPTH>,
    engine: WriteEngine,
    lines_dropped: u32,
    parse_errors: u32,
    checksum_errors: u32,
}

impl UpdaterSession {
    pub fn new(region: FlashRegion) -> Self {
        Self {
            assembler: LineAssembler::new(),
            records: Deque::new(),
            engine: WriteEngine::new(region),
            lines_dropped: 0,
            parse_errors: 0,
            checksum_errors: 0,
        }
    }

    /// Feed one received byte through line assembly into the record FIFO.
    pub fn feed(&mut self, byte: u8) {
        if let Some(line) = self.assembler.push(byte) {
            if self.records.push_back(line).is_err() {
                self.lines_dropped += 1;
            }
        }
    }

    /// Number of complete lines waiting to be parsed.
    pub fn queued_records(&self) -> usize {
        self.records.len()
    }

    /// Drain the record FIFO through parse, checksum check and the write
    /// engine. Storage failures abort the pass and surface immediately;
    /// malformed input is counted and skipped.
    pub fn pump<N: Nvm>(&mut self, nvm: &mut N) -> Result<SessionEvent, NvmError> {
        while let Some(line) = self.records.pop_front() {
            let rec = match Record::parse(&line) {
                Ok(rec) => rec,
                Err(_) => {
                    self.parse_errors += 1;
                    continue;
                }
            };
            if !rec.valid {
                self.checksum_errors += 1;
                continue;
            }
            if self.engine.apply(&rec, nvm)? {
                // End of transfer: anything still queued belongs to no
                // session, so ingestion restarts clean.
                self.reset_ingestion();
                return Ok(SessionEvent::TransferComplete);
            }
        }

        Ok(SessionEvent::Progress)
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            lines_dropped: self.lines_dropped,
            parse_errors: self.parse_errors,
            checksum_errors: self.checksum_errors,
            engine: self.engine.stats(),
        }
    }

    /// Ready the session for a subsequent transfer without touching the
    /// accumulated statistics (they belong to the completion notice).
    fn reset_ingestion(&mut self) {
        self.assembler.reset();
        self.records.clear();
    }

    /// Full reset: ingestion state, merge state and counters.
    pub fn reset(&mut self) {
        self.reset_ingestion();
        self.engine.reset();
        self.lines_dropped = 0;
        self.parse_errors = 0;
        self.checksum_errors = 0;
    }
}

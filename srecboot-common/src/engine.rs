// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Aligned write engine: validated data records in, 8-byte phrase programs out.
//!
//! The flash controller only programs 8-byte-aligned phrases, but linkers
//! routinely emit a section as a 4-byte record followed by another 4 bytes
//! at the next address. The engine bridges that with a one-slot merge
//! buffer: a lone low half is parked as [`PendingMerge`] and married to the
//! high half when it arrives, or flushed 0xFF-padded at end of transfer.

use crate::srec::Record;
use crate::{ERASED_BYTE, FLASH_HALF_PHRASE, FLASH_PHRASE_SIZE, FLASH_SECTOR_SIZE};

/// Storage operation failure, as reported by the flash controller status
/// flags after the completion wait.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NvmError {
    /// Illegal address or command sequence (ACCERR).
    AccessError,
    /// Target region is write-protected (FPVIOL).
    ProtectionViolation,
    /// Command ran and failed (MGSTAT0).
    CommandFailed,
}

/// Capability surface the engine and the updater need from non-volatile
/// storage. Implementations must run their completion wait from RAM and with
/// interrupts masked; see the firmware's flash module for why that is a
/// platform precondition rather than a tuning choice.
pub trait Nvm {
    /// Erase the sector containing `addr` (4096-byte granularity).
    fn erase_sector(&mut self, addr: u32) -> Result<(), NvmError>;

    /// Program one aligned 8-byte phrase.
    fn program8(&mut self, addr: u32, data: &[u8; 8]) -> Result<(), NvmError>;

    /// Erase `sectors` consecutive sectors starting at `addr`.
    fn erase_region(&mut self, addr: u32, sectors: u32) -> Result<(), NvmError> {
        for i in 0..sectors {
            self.erase_sector(addr + i * FLASH_SECTOR_SIZE)?;
        }
        Ok(())
    }
}

/// The writable application window, fixed at configuration time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlashRegion {
    pub start: u32,
    pub length: u32,
}

impl FlashRegion {
    pub const fn new(start: u32, length: u32) -> Self {
        Self { start, length }
    }

    pub const fn end(&self) -> u32 {
        self.start + self.length
    }

    /// Whole span `[addr, addr + len)` inside the window.
    pub fn contains_span(&self, addr: u32, len: u32) -> bool {
        addr >= self.start && addr.saturating_add(len) <= self.end()
    }

    pub const fn sector_count(&self) -> u32 {
        self.length / FLASH_SECTOR_SIZE
    }
}

/// A parked low half-phrase waiting for its upper 4 bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingMerge {
    base: u32,
    low4: [u8; 4],
}

/// Counters for everything the engine drops or skips on the floor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// 8-byte phrase programs issued.
    pub phrases_programmed: u32,
    /// Data records whose span fell outside the configured window.
    pub records_out_of_region: u32,
    /// Bytes abandoned because no alignment case matched.
    pub bytes_skipped: u32,
}

/// Turns a stream of validated data records into aligned phrase programs.
pub struct WriteEngine {
    region: FlashRegion,
    pending: Option<PendingMerge>,
    stats: EngineStats,
}

impl WriteEngine {
    pub const fn new(region: FlashRegion) -> Self {
        Self {
            region,
            pending: None,
            stats: EngineStats {
                phrases_programmed: 0,
                records_out_of_region: 0,
                bytes_skipped: 0,
            },
        }
    }

    pub fn region(&self) -> FlashRegion {
        self.region
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply one checksum-valid record.
    ///
    /// Data records walk the payload through the alignment cases; end
    /// records flush an outstanding merge. Returns `true` when the record
    /// was an end-of-transfer record.
    pub fn apply<N: Nvm>(&mut self, rec: &Record, nvm: &mut N) -> Result<bool, NvmError> {
        if rec.kind.is_data() {
            self.write_data(rec.address, &rec.data, nvm)?;
            Ok(false)
        } else if rec.kind.is_end() {
            self.flush(nvm)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn write_data<N: Nvm>(&mut self, addr: u32, data: &[u8], nvm: &mut N) -> Result<(), NvmError> {
        if !self.region.contains_span(addr, data.len() as u32) {
            self.stats.records_out_of_region += 1;
            return Ok(());
        }

        let mut addr = addr;
        let mut rest = data;
        const HALF: usize = FLASH_HALF_PHRASE as usize;
        const PHRASE: usize = FLASH_PHRASE_SIZE as usize;

        while !rest.is_empty() {
            let aligned = addr % FLASH_PHRASE_SIZE == 0;
            let half_offset = addr % FLASH_PHRASE_SIZE == FLASH_HALF_PHRASE;

            if aligned && rest.len() == HALF {
                // Low half only: park it and wait for the upper 4 bytes.
                let mut low4 = [0u8; HALF];
                low4.copy_from_slice(&rest[..HALF]);
                self.pending = Some(PendingMerge { base: addr, low4 });
                addr += FLASH_HALF_PHRASE;
                rest = &rest[HALF..];
            } else if half_offset && rest.len() >= HALF {
                // Upper half: marry it to the parked low half, or program
                // over erased cells if none (or the wrong one) is parked.
                let base = addr - FLASH_HALF_PHRASE;
                let mut phrase = [ERASED_BYTE; PHRASE];
                if let Some(p) = self.pending {
                    if p.base == base {
                        phrase[..HALF].copy_from_slice(&p.low4);
                    }
                }
                phrase[HALF..].copy_from_slice(&rest[..HALF]);
                nvm.program8(base, &phrase)?;
                self.stats.phrases_programmed += 1;
                self.pending = None;
                addr += FLASH_HALF_PHRASE;
                rest = &rest[HALF..];
            } else if aligned && rest.len() >= PHRASE {
                let mut phrase = [0u8; PHRASE];
                phrase.copy_from_slice(&rest[..PHRASE]);
                nvm.program8(addr, &phrase)?;
                self.stats.phrases_programmed += 1;
                addr += FLASH_PHRASE_SIZE;
                rest = &rest[PHRASE..];
            } else {
                // No case fits (odd offset or short tail). The image tools
                // only emit 4/8-byte-aligned chunks, so record the gap and
                // move on rather than guessing at padding.
                self.stats.bytes_skipped += rest.len() as u32;
                break;
            }
        }
        Ok(())
    }

    /// Program an outstanding parked half with the upper half left erased.
    pub fn flush<N: Nvm>(&mut self, nvm: &mut N) -> Result<(), NvmError> {
        if let Some(p) = self.pending.take() {
            let mut phrase = [ERASED_BYTE; FLASH_PHRASE_SIZE as usize];
            phrase[..FLASH_HALF_PHRASE as usize].copy_from_slice(&p.low4);
            nvm.program8(p.base, &phrase)?;
            self.stats.phrases_programmed += 1;
        }
        Ok(())
    }

    /// Forget merge state and counters for a fresh transfer.
    pub fn reset(&mut self) {
        self.pending = None;
        self.stats = EngineStats::default();
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! End-to-end tests for the updater session: bytes in, phrase programs out.

use srecboot_common::engine::{Nvm, NvmError};
use srecboot_common::session::{SessionEvent, UpdaterSession};
use srecboot_common::{FlashRegion, APP_FLASH_LENGTH, APP_FLASH_START, RECORD_QUEUE_DEPTH};

#[derive(Default)]
struct RecordingNvm {
    programs: Vec<(u32, [u8; 8])>,
}

impl Nvm for RecordingNvm {
    fn erase_sector(&mut self, _addr: u32) -> Result<(), NvmError> {
        Ok(())
    }

    fn program8(&mut self, addr: u32, data: &[u8; 8]) -> Result<(), NvmError> {
        self.programs.push((addr, *data));
        Ok(())
    }
}

fn session() -> UpdaterSession {
    UpdaterSession::new(FlashRegion::new(APP_FLASH_START, APP_FLASH_LENGTH))
}

fn feed_str(s: &mut UpdaterSession, text: &str) {
    for &b in text.as_bytes() {
        s.feed(b);
    }
}

#[test]
fn test_stream_to_programs() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    feed_str(&mut s, "S10BA000010203040506070830\r\n");
    assert_eq!(s.queued_records(), 1);
    assert_eq!(s.pump(&mut nvm), Ok(SessionEvent::Progress));
    assert_eq!(nvm.programs, vec![(0xA000, [1, 2, 3, 4, 5, 6, 7, 8])]);

    feed_str(&mut s, "S903A0005C\n");
    assert_eq!(s.pump(&mut nvm), Ok(SessionEvent::TransferComplete));
    assert_eq!(nvm.programs.len(), 1);
    assert!(s.stats().is_clean());
}

#[test]
fn test_merge_across_records_through_session() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    feed_str(&mut s, "S107A010DEADBEEF10\nS107A014CAFEBABE04\n");
    s.pump(&mut nvm).unwrap();
    assert_eq!(
        nvm.programs,
        vec![(0xA010, [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE])]
    );
}

#[test]
fn test_end_flushes_pending_through_session() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    feed_str(&mut s, "S107A010DEADBEEF10\nS903A0005C\n");
    assert_eq!(s.pump(&mut nvm), Ok(SessionEvent::TransferComplete));
    assert_eq!(
        nvm.programs,
        vec![(0xA010, [0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF, 0xFF, 0xFF])]
    );
}

#[test]
fn test_checksum_invalid_record_dropped_and_counted() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    // Valid structure, wrong checksum: no program, counted once.
    feed_str(&mut s, "S10BA000010203040506070831\n");
    s.pump(&mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(s.stats().checksum_errors, 1);
    assert!(!s.stats().is_clean());
}

#[test]
fn test_malformed_line_counted_as_parse_error() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    feed_str(&mut s, "S10BG000010203040506070830\n");
    s.pump(&mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(s.stats().parse_errors, 1);
}

#[test]
fn test_record_queue_depth_and_overflow_drop() {
    let mut s = session();

    // One more line than the FIFO holds, with no pump in between.
    for _ in 0..RECORD_QUEUE_DEPTH + 1 {
        feed_str(&mut s, "S5030003F9\n");
    }
    assert_eq!(s.queued_records(), RECORD_QUEUE_DEPTH);
    assert_eq!(s.stats().lines_dropped, 1);

    // The queued lines are intact and parse cleanly.
    let mut nvm = RecordingNvm::default();
    s.pump(&mut nvm).unwrap();
    assert_eq!(s.stats().parse_errors, 0);
    assert_eq!(s.stats().checksum_errors, 0);
    assert_eq!(s.queued_records(), 0);
}

#[test]
fn test_ingestion_resets_after_transfer_for_next_session() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    // Partial line in flight when the end record completes: it must not
    // contaminate the next session.
    feed_str(&mut s, "S903A0005C\nS10BA0000102");
    assert_eq!(s.pump(&mut nvm), Ok(SessionEvent::TransferComplete));

    // A second transfer starts from a clean assembler.
    feed_str(&mut s, "S10BA000010203040506070830\nS903A0005C\n");
    assert_eq!(s.pump(&mut nvm), Ok(SessionEvent::TransferComplete));
    assert_eq!(nvm.programs, vec![(0xA000, [1, 2, 3, 4, 5, 6, 7, 8])]);
    assert_eq!(s.stats().parse_errors, 0);
}

#[test]
fn test_nvm_failure_surfaces_from_pump() {
    struct FailingNvm;
    impl Nvm for FailingNvm {
        fn erase_sector(&mut self, _addr: u32) -> Result<(), NvmError> {
            Ok(())
        }
        fn program8(&mut self, _addr: u32, _data: &[u8; 8]) -> Result<(), NvmError> {
            Err(NvmError::ProtectionViolation)
        }
    }

    let mut s = session();
    feed_str(&mut s, "S10BA000010203040506070830\n");
    assert_eq!(s.pump(&mut FailingNvm), Err(NvmError::ProtectionViolation));
}

#[test]
fn test_full_reset_clears_counters() {
    let mut s = session();
    let mut nvm = RecordingNvm::default();

    feed_str(&mut s, "S10BA000010203040506070831\n");
    s.pump(&mut nvm).unwrap();
    assert_eq!(s.stats().checksum_errors, 1);

    s.reset();
    assert!(s.stats().is_clean());
    assert_eq!(s.queued_records(), 0);
}

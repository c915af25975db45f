// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Unit tests for the aligned write engine.

use std::collections::BTreeMap;

use srecboot_common::engine::{FlashRegion, Nvm, NvmError, WriteEngine};
use srecboot_common::srec::Record;
use srecboot_common::{APP_FLASH_LENGTH, APP_FLASH_START, ERASED_BYTE, FLASH_SECTOR_SIZE};

/// Records every call and models erased-by-default flash contents.
#[derive(Default)]
struct MockNvm {
    programs: Vec<(u32, [u8; 8])>,
    erases: Vec<u32>,
    mem: BTreeMap<u32, u8>,
    fail_with: Option<NvmError>,
}

impl MockNvm {
    fn read(&self, addr: u32) -> u8 {
        *self.mem.get(&addr).unwrap_or(&ERASED_BYTE)
    }
}

impl Nvm for MockNvm {
    fn erase_sector(&mut self, addr: u32) -> Result<(), NvmError> {
        self.erases.push(addr);
        Ok(())
    }

    fn program8(&mut self, addr: u32, data: &[u8; 8]) -> Result<(), NvmError> {
        if let Some(err) = self.fail_with {
            return Err(err);
        }
        assert_eq!(addr % 8, 0, "program must be phrase-aligned");
        for (i, &b) in data.iter().enumerate() {
            self.mem.insert(addr + i as u32, b);
        }
        self.programs.push((addr, *data));
        Ok(())
    }
}

fn app_region() -> FlashRegion {
    FlashRegion::new(APP_FLASH_START, APP_FLASH_LENGTH)
}

fn data_record(line: &str) -> Record {
    let rec = Record::parse(line.as_bytes()).unwrap();
    assert!(rec.valid);
    rec
}

// =============================================================================
// Alignment cases
// =============================================================================

#[test]
fn test_aligned_8_bytes_programs_one_phrase() {
    // Scenario: one record, aligned address, exactly 8 bytes -> exactly one
    // program at that address, no merge state left behind.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    let rec = data_record("S10BA000010203040506070830");
    assert_eq!(engine.apply(&rec, &mut nvm), Ok(false));

    assert_eq!(nvm.programs, vec![(0xA000, [1, 2, 3, 4, 5, 6, 7, 8])]);
    assert!(!engine.has_pending());
    assert_eq!(engine.stats().phrases_programmed, 1);
}

#[test]
fn test_four_plus_four_merge() {
    // Scenario: 4 bytes at an aligned address park as pending; 4 bytes at
    // +4 complete exactly one phrase combining both halves.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    let low = data_record("S107A010DEADBEEF10");
    assert_eq!(engine.apply(&low, &mut nvm), Ok(false));
    assert!(nvm.programs.is_empty(), "low half alone must not program");
    assert!(engine.has_pending());

    let high = data_record("S107A014CAFEBABE04");
    assert_eq!(engine.apply(&high, &mut nvm), Ok(false));
    assert_eq!(
        nvm.programs,
        vec![(0xA010, [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE, 0xBA, 0xBE])]
    );
    assert!(!engine.has_pending());
}

#[test]
fn test_upper_half_without_pending_pads_low_with_erased() {
    // 4 bytes at offset +4 with nothing parked: low half stays 0xFF so the
    // cells keep their erased value.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    let high = data_record("S107A014CAFEBABE04");
    assert_eq!(engine.apply(&high, &mut nvm), Ok(false));
    assert_eq!(
        nvm.programs,
        vec![(0xA010, [0xFF, 0xFF, 0xFF, 0xFF, 0xCA, 0xFE, 0xBA, 0xBE])]
    );
}

#[test]
fn test_pending_for_different_base_not_merged() {
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    // Park 4 bytes at 0xA010, then complete a phrase at 0xA020: the stale
    // pending data must not leak into the unrelated phrase.
    engine.apply(&data_record("S107A010DEADBEEF10"), &mut nvm).unwrap();
    let rec = Record::parse(srecboot_common::srec::encode_data(
        srecboot_common::srec::AddressWidth::Two,
        0xA024,
        &[0x01, 0x02, 0x03, 0x04],
    )
    .unwrap()
    .as_bytes())
    .unwrap();
    engine.apply(&rec, &mut nvm).unwrap();

    assert_eq!(nvm.programs, vec![(0xA020, [0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3, 4])]);
    // The mismatched pending was consumed by the merge attempt.
    assert!(!engine.has_pending());
}

#[test]
fn test_sixteen_bytes_split_into_two_phrases() {
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    let rec = data_record("S113A040000102030405060708090A0B0C0D0E0F94");
    engine.apply(&rec, &mut nvm).unwrap();
    assert_eq!(
        nvm.programs,
        vec![
            (0xA040, [0, 1, 2, 3, 4, 5, 6, 7]),
            (0xA048, [8, 9, 10, 11, 12, 13, 14, 15]),
        ]
    );
}

#[test]
fn test_aligned_12_bytes_programs_phrase_then_parks_tail() {
    // 12 bytes aligned: Case C takes 8, the remaining 4 land in Case A.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    let line = srecboot_common::srec::encode_data(
        srecboot_common::srec::AddressWidth::Two,
        0xA080,
        &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
    )
    .unwrap();
    engine.apply(&Record::parse(line.as_bytes()).unwrap(), &mut nvm).unwrap();

    assert_eq!(nvm.programs, vec![(0xA080, [1, 2, 3, 4, 5, 6, 7, 8])]);
    assert!(engine.has_pending());
}

#[test]
fn test_end_record_flushes_pending_with_erased_fill() {
    // Scenario: end of transfer with a parked low half -> exactly one final
    // program, upper half defaulted to the erased value.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    engine.apply(&data_record("S107A010DEADBEEF10"), &mut nvm).unwrap();
    let end = data_record("S903A0005C");
    assert_eq!(engine.apply(&end, &mut nvm), Ok(true));

    assert_eq!(
        nvm.programs,
        vec![(0xA010, [0xDE, 0xAD, 0xBE, 0xEF, 0xFF, 0xFF, 0xFF, 0xFF])]
    );
    assert!(!engine.has_pending());
}

#[test]
fn test_end_record_without_pending_programs_nothing() {
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());
    assert_eq!(engine.apply(&data_record("S903A0005C"), &mut nvm), Ok(true));
    assert!(nvm.programs.is_empty());
}

// =============================================================================
// Gaps and guards
// =============================================================================

#[test]
fn test_record_outside_region_ignored() {
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    engine.apply(&data_record("S1079000010203045E"), &mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(engine.stats().records_out_of_region, 1);
}

#[test]
fn test_record_straddling_region_end_ignored() {
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());
    let end = app_region().end();

    let line = srecboot_common::srec::encode_data(
        srecboot_common::srec::AddressWidth::Four,
        end - 4,
        &[1, 2, 3, 4, 5, 6, 7, 8],
    )
    .unwrap();
    engine.apply(&Record::parse(line.as_bytes()).unwrap(), &mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(engine.stats().records_out_of_region, 1);
}

#[test]
fn test_unmatched_alignment_skips_rest_of_record() {
    // 2 bytes at an aligned address fits no case: counted, not programmed.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    engine.apply(&data_record("S105A020AABBD5"), &mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(engine.stats().bytes_skipped, 2);
}

#[test]
fn test_six_aligned_bytes_skipped() {
    // Aligned but neither exactly 4 nor >= 8: no case matches.
    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    engine.apply(&data_record("S109A03001020304050611"), &mut nvm).unwrap();
    assert!(nvm.programs.is_empty());
    assert_eq!(engine.stats().bytes_skipped, 6);
}

#[test]
fn test_program_failure_propagates() {
    let mut nvm = MockNvm {
        fail_with: Some(NvmError::CommandFailed),
        ..Default::default()
    };
    let mut engine = WriteEngine::new(app_region());

    let rec = data_record("S10BA000010203040506070830");
    assert_eq!(engine.apply(&rec, &mut nvm), Err(NvmError::CommandFailed));
}

#[test]
fn test_erase_region_issues_sequential_sector_erases() {
    let mut nvm = MockNvm::default();
    nvm.erase_region(APP_FLASH_START, 3).unwrap();
    assert_eq!(
        nvm.erases,
        vec![
            APP_FLASH_START,
            APP_FLASH_START + FLASH_SECTOR_SIZE,
            APP_FLASH_START + 2 * FLASH_SECTOR_SIZE,
        ]
    );
}

// =============================================================================
// Image round trip
// =============================================================================

#[test]
fn test_image_round_trip_reads_back_exactly() {
    // Encode an image as records (with a 4-byte head fragment, full phrases
    // and a 4-byte tail), program it, and read it back from the flash model.
    use srecboot_common::srec::{encode_data, AddressWidth};

    let base = APP_FLASH_START + 0x100;
    let image: Vec<u8> = (0..40u32).map(|i| (i * 7 + 3) as u8).collect();

    let mut nvm = MockNvm::default();
    let mut engine = WriteEngine::new(app_region());

    // First 4 bytes as their own record, then 16-byte records, then the tail.
    let mut chunks: Vec<(u32, &[u8])> = vec![(base, &image[..4])];
    let mut off = 4;
    while off < image.len() {
        let n = (image.len() - off).min(16);
        chunks.push((base + off as u32, &image[off..off + n]));
        off += n;
    }

    for (addr, chunk) in chunks {
        let line = encode_data(AddressWidth::Four, addr, chunk).unwrap();
        let rec = Record::parse(line.as_bytes()).unwrap();
        engine.apply(&rec, &mut nvm).unwrap();
    }
    let end = Record::parse(b"S7050000A0005A").unwrap();
    engine.apply(&end, &mut nvm).unwrap();

    for (i, &expected) in image.iter().enumerate() {
        assert_eq!(nvm.read(base + i as u32), expected, "byte {i}");
    }
    // Neighbors untouched: still erased.
    assert_eq!(nvm.read(base - 1), ERASED_BYTE);
    assert_eq!(nvm.read(base + image.len() as u32), ERASED_BYTE);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Common types and logic for srecboot.
//!
//! Everything in this crate is hardware-independent: the S-record parser and
//! encoder, the receive queues, the aligned write engine and the boot-mode
//! decision logic. The firmware binds it to the S32K144 peripherals through
//! the [`Nvm`] capability trait; host tools and tests drive it directly.
//!
//! - Default: `no_std` mode for embedded targets
//! - `std` feature: enables `std` support for host tools

#![cfg_attr(not(feature = "std"), no_std)]

pub mod boot;
pub mod engine;
pub mod line;
pub mod queue;
pub mod session;
pub mod srec;

// Re-export commonly used types
pub use boot::{BootMode, ImageHeader};
pub use engine::{FlashRegion, Nvm, NvmError, WriteEngine};
pub use line::{LineAssembler, RecordLine};
pub use queue::ByteQueue;
pub use session::{SessionEvent, SessionStats, UpdaterSession};
pub use srec::{ParseError, Record, RecordKind};

// --- Flash layout constants ---

/// Base of the application window in program flash (first sector past the
/// bootloader's own image, from the linker layout).
pub const APP_FLASH_START: u32 = 0x0000_A000;
/// Size of the application window.
pub const APP_FLASH_LENGTH: u32 = 0x0007_6000;

pub const FLASH_SECTOR_SIZE: u32 = 4096;
/// Program granularity: the flash controller programs one 8-byte phrase at a time.
pub const FLASH_PHRASE_SIZE: u32 = 8;
/// Half a phrase, the unit the 4+4 merge strategy works in.
pub const FLASH_HALF_PHRASE: u32 = 4;

/// Value erased flash reads as, byte and word flavors.
pub const ERASED_BYTE: u8 = 0xFF;
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

// --- Ingestion sizing ---

/// UART receive ring capacity in bytes.
pub const UART_QUEUE_SIZE: usize = 200;
/// Longest accepted record line, terminator excluded.
pub const LINE_MAX_LEN: usize = 256;
/// Completed lines waiting to be parsed.
pub const RECORD_QUEUE_DEPTH: usize = 4;
/// Payload bytes one record can carry.
pub const MAX_RECORD_DATA: usize = 250;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Updater mode: erase the application window, then ingest S-records from
//! the UART until the operator resets the board.

use core::fmt::Write;

use heapless::String;
use srecboot_common::{
    FlashRegion, Nvm, NvmError, SessionEvent, UpdaterSession, APP_FLASH_LENGTH, APP_FLASH_START,
};

use crate::flash::Ftfc;
use crate::uart;

/// Erase the application window, announce readiness and run the ingestion
/// loop. Never returns; the operator resets the board after the completion
/// notice.
pub fn run(nvm: &mut Ftfc) -> ! {
    let region = FlashRegion::new(APP_FLASH_START, APP_FLASH_LENGTH);

    uart::send_str("[BOOT] Updater mode. Erasing application flash...\r\n");
    defmt::println!(
        "erasing 0x{=u32:08x}..0x{=u32:08x}",
        region.start,
        region.end()
    );

    if let Err(e) = nvm.erase_region(region.start, region.sector_count()) {
        report_nvm_error("erase", e);
        loop {
            cortex_m::asm::wfi();
        }
    }

    uart::send_str("[BOOT] Please send the application S-record file...\r\n");

    let mut session = UpdaterSession::new(region);

    loop {
        while let Some(byte) = uart::RX_QUEUE.pop() {
            session.feed(byte);
        }

        match session.pump(nvm) {
            Ok(SessionEvent::Progress) => {}
            Ok(SessionEvent::TransferComplete) => send_completion_notice(&session),
            Err(e) => report_nvm_error("program", e),
        }
    }
}

/// Completion notice over the status channel, including every loss the
/// open-loop protocol cannot signal any other way.
fn send_completion_notice(session: &UpdaterSession) {
    let stats = session.stats();

    uart::send_str("\r\n[INFO] Flash programming completed.\r\n");

    let mut line: String<128> = String::new();
    let _ = write!(
        line,
        "[INFO] {} phrases programmed, {} bytes dropped at RX.\r\n",
        stats.engine.phrases_programmed,
        uart::RX_QUEUE.dropped()
    );
    uart::send_str(&line);

    if !stats.is_clean() {
        line.clear();
        let _ = write!(
            line,
            "[WARN] lost: {} lines, {} parse errors, {} bad checksums, {} skipped bytes, {} out-of-range records.\r\n",
            stats.lines_dropped,
            stats.parse_errors,
            stats.checksum_errors,
            stats.engine.bytes_skipped,
            stats.engine.records_out_of_region,
        );
        uart::send_str(&line);
        uart::send_str("[WARN] The image is suspect; send it again.\r\n");
    }

    uart::send_str("[INFO] Reset the board with the boot button released to start the application.\r\n");
}

fn report_nvm_error(op: &str, e: NvmError) {
    defmt::println!("flash {=str} failed", op);

    let mut line: String<64> = String::new();
    let what = match e {
        NvmError::AccessError => "access error",
        NvmError::ProtectionViolation => "protection violation",
        NvmError::CommandFailed => "command failed",
    };
    let _ = write!(line, "[ERROR] Flash {op}: {what}.\r\n");
    uart::send_str(&line);
}

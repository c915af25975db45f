// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Application handoff: validate the installed image and jump to it.

use srecboot_common::{ImageHeader, APP_FLASH_START};

use crate::flash;
use crate::uart;

/// Read the image's vector table head: initial stack pointer and reset
/// vector.
pub fn read_image_header() -> ImageHeader {
    ImageHeader::new(
        flash::read_word(APP_FLASH_START),
        flash::read_word(APP_FLASH_START + 4),
    )
}

/// Validate the installed application and transfer control to it.
///
/// If the vector table reads back erased there is nothing to run: the
/// failure is reported over the status channel and the bootloader idles
/// until an external reset.
pub fn run_application() -> ! {
    let hdr = read_image_header();

    if !hdr.is_programmed() {
        defmt::println!("no application image installed");
        uart::send_str("[BOOT] ERROR: no valid application installed.\r\n");
        uart::send_str("[BOOT] Reset with the boot button held to load one.\r\n");
        loop {
            cortex_m::asm::wfi();
        }
    }

    defmt::println!(
        "jumping to application: sp=0x{=u32:08x} entry=0x{=u32:08x}",
        hdr.initial_sp,
        hdr.entry
    );
    uart::send_str("[BOOT] Starting application...\r\n");

    unsafe { jump(hdr) }
}

/// # Safety
/// `hdr` must describe a valid image at `APP_FLASH_START`. Does not return;
/// the application owns the core from here.
unsafe fn jump(hdr: ImageHeader) -> ! {
    cortex_m::interrupt::disable();

    // Point the vector table at the application image.
    const SCB_VTOR: *mut u32 = 0xE000_ED08 as *mut u32;
    SCB_VTOR.write_volatile(APP_FLASH_START);

    cortex_m::asm::dsb();
    cortex_m::asm::isb();

    core::arch::asm!(
        "msr msp, {sp}",
        "msr psp, {sp}",
        "cpsie i", // application startup expects PRIMASK clear
        "bx {entry}",
        sp = in(reg) hdr.initial_sp,
        entry = in(reg) hdr.entry,
        options(noreturn)
    );
}

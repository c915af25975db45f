// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! srecboot: UART S-record bootloader for the S32K144.
//!
//! Reset flow: bring up the board, sample the boot-select button, then
//! either hand over to the installed application or stay resident, erase
//! the application window and ingest an S-record image over LPUART1.

#![no_std]
#![no_main]

mod boot;
mod flash;
mod peripherals;
mod uart;
mod updater;

use defmt_rtt as _;
use panic_probe as _;

use srecboot_common::BootMode;

defmt::timestamp!("{=u64:us}", { 0 });

use cortex_m_rt::entry;

#[entry]
fn main() -> ! {
    defmt::println!("srecboot init");

    let mut p = peripherals::init();
    uart::send_str("BOOT READY\r\n");

    match BootMode::from_selector(p.boot_select_asserted()) {
        BootMode::Application => boot::run_application(),
        BootMode::Updater => {
            defmt::println!("boot select asserted, staying in updater");
            p.led_blue_on();
            let mut ftfc = flash::Ftfc::init();
            updater::run(&mut ftfc)
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! FTFC program-flash driver: sector erase and 8-byte phrase program.
//!
//! While an erase or program command runs, the program flash array cannot
//! serve instruction fetches. The completion wait therefore has to execute
//! from RAM: it is placed in `.data` (so the runtime copies it to RAM at
//! startup) and called through a pointer captured by [`Ftfc::init`], which
//! verifies the copy actually landed in RAM before any command is issued.
//! Every command also runs with interrupts masked — a vector fetch from
//! flash mid-command is undefined behavior on this part.

use srecboot_common::{Nvm, NvmError};

const FTFC_BASE: u32 = 0x4002_0000;
const FSTAT: *mut u8 = FTFC_BASE as *mut u8;

/// FCCOB byte registers, indexed the way the reference manual numbers them.
const fn fccob(i: u32) -> *mut u8 {
    (FTFC_BASE + 0x4 + i) as *mut u8
}

const FSTAT_CCIF: u8 = 0x80;
const FSTAT_ACCERR: u8 = 0x20;
const FSTAT_FPVIOL: u8 = 0x10;
const FSTAT_MGSTAT0: u8 = 0x01;
/// Write-1-to-clear mask for the two error flags.
const FSTAT_ERR_CLEAR: u8 = FSTAT_ACCERR | FSTAT_FPVIOL;

const CMD_PROGRAM_PHRASE: u8 = 0x07;
const CMD_ERASE_SECTOR: u8 = 0x09;

const RAM_START: u32 = 0x1FFF_8000;
const RAM_END: u32 = 0x2000_7000;

type WaitFn = fn();

fn wait_not_loaded() {
    defmt::panic!("flash used before Ftfc::init");
}

/// Completion-wait routine pointer, captured once at init. Held in a static
/// so command launches never reach back into flash-resident code.
static mut RAM_WAIT: WaitFn = wait_not_loaded;

/// Launch the loaded command and spin until it completes. Must execute from
/// RAM for the duration; see module docs.
#[link_section = ".data"]
#[inline(never)]
fn launch_and_wait() {
    unsafe {
        FSTAT.write_volatile(FSTAT_CCIF);
        while FSTAT.read_volatile() & FSTAT_CCIF == 0 {}
    }
}

/// Exclusive handle over the flash command interface.
pub struct Ftfc {
    _priv: (),
}

impl Ftfc {
    /// Capture the RAM-resident completion wait and hand out the command
    /// interface. Panics if the routine did not land in RAM — that means a
    /// broken linker script, and issuing any command would wedge the part.
    pub fn init() -> Self {
        let addr = launch_and_wait as *const () as u32;
        if !(RAM_START..RAM_END).contains(&addr) {
            defmt::panic!("completion wait at 0x{=u32:08x} is not in RAM", addr);
        }
        unsafe {
            RAM_WAIT = launch_and_wait;
        }
        Ftfc { _priv: () }
    }

    /// Wait out any previous command and clear stale error flags.
    fn prepare(&mut self) {
        unsafe {
            while FSTAT.read_volatile() & FSTAT_CCIF == 0 {}
            if FSTAT.read_volatile() & FSTAT_ERR_CLEAR != 0 {
                FSTAT.write_volatile(FSTAT_ERR_CLEAR);
            }
        }
    }

    fn load_address(&mut self, addr: u32) {
        unsafe {
            fccob(2).write_volatile((addr >> 16) as u8);
            fccob(1).write_volatile((addr >> 8) as u8);
            fccob(0).write_volatile(addr as u8);
        }
    }

    /// Run the loaded command from RAM with interrupts masked, then read
    /// the status flags back instead of assuming success.
    fn execute(&mut self) -> Result<(), NvmError> {
        unsafe {
            cortex_m::interrupt::disable();
            RAM_WAIT();
            cortex_m::interrupt::enable();
        }

        let stat = unsafe { FSTAT.read_volatile() };
        if stat & FSTAT_ACCERR != 0 {
            Err(NvmError::AccessError)
        } else if stat & FSTAT_FPVIOL != 0 {
            Err(NvmError::ProtectionViolation)
        } else if stat & FSTAT_MGSTAT0 != 0 {
            Err(NvmError::CommandFailed)
        } else {
            Ok(())
        }
    }
}

impl Nvm for Ftfc {
    fn erase_sector(&mut self, addr: u32) -> Result<(), NvmError> {
        self.prepare();
        unsafe {
            fccob(3).write_volatile(CMD_ERASE_SECTOR);
        }
        self.load_address(addr);
        self.execute()
    }

    fn program8(&mut self, addr: u32, data: &[u8; 8]) -> Result<(), NvmError> {
        self.prepare();
        unsafe {
            fccob(3).write_volatile(CMD_PROGRAM_PHRASE);
        }
        self.load_address(addr);
        unsafe {
            // First longword.
            fccob(7).write_volatile(data[3]);
            fccob(6).write_volatile(data[2]);
            fccob(5).write_volatile(data[1]);
            fccob(4).write_volatile(data[0]);
            // Second longword.
            fccob(11).write_volatile(data[7]);
            fccob(10).write_volatile(data[6]);
            fccob(9).write_volatile(data[5]);
            fccob(8).write_volatile(data[4]);
        }
        self.execute()
    }
}

/// Read one word back from program flash.
pub fn read_word(addr: u32) -> u32 {
    unsafe { (addr as *const u32).read_volatile() }
}

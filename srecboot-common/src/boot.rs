// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Boot-mode and image-validation logic, hardware-free.
//!
//! The firmware samples the boot-select pin and reads the first two words of
//! the application image; everything decided from those inputs lives here so
//! it can be exercised on the host.

use crate::ERASED_WORD;

/// Where to go after reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootMode {
    /// Boot-select asserted: stay resident and accept an image.
    Updater,
    /// Boot-select released: hand over to the installed application.
    Application,
}

impl BootMode {
    /// Decide from the sampled boot-select input (asserted = updater).
    pub fn from_selector(asserted: bool) -> Self {
        if asserted {
            BootMode::Updater
        } else {
            BootMode::Application
        }
    }
}

/// The two words at the base of a Cortex-M image: initial stack pointer and
/// reset vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub initial_sp: u32,
    pub entry: u32,
}

impl ImageHeader {
    pub const fn new(initial_sp: u32, entry: u32) -> Self {
        Self { initial_sp, entry }
    }

    /// An erased vector table reads back all-ones; either word at the
    /// sentinel means no image is installed and the jump must not happen.
    pub fn is_programmed(&self) -> bool {
        self.initial_sp != ERASED_WORD && self.entry != ERASED_WORD
    }
}

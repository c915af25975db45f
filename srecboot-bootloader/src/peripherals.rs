// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Peripheral bring-up for the S32K144 bootloader.
//!
//! No board support crate is involved: the handful of registers the
//! bootloader touches (PCC gates, two PORT pins, one GPIO port, LPUART1,
//! NVIC) are driven directly through volatile pointers.

use cortex_m::interrupt::InterruptNumber;
use cortex_m::peripheral::NVIC;

use crate::uart;

// --- Clock and pin control ---

const PCC_BASE: u32 = 0x4006_5000;
const PCC_PORTC: *mut u32 = (PCC_BASE + 0x12C) as *mut u32;
const PCC_PORTD: *mut u32 = (PCC_BASE + 0x130) as *mut u32;
const PCC_LPUART1: *mut u32 = (PCC_BASE + 0x1AC) as *mut u32;
const PCC_CGC: u32 = 1 << 30;
/// Peripheral clock select: 3 = FIRCDIV2_CLK (48 MHz).
const PCC_PCS_FIRCDIV2: u32 = 3 << 24;

const SCG_BASE: u32 = 0x4006_4000;
const SCG_FIRCDIV: *mut u32 = (SCG_BASE + 0x304) as *mut u32;
/// FIRCDIV2 = divide-by-1 so peripherals see the full 48 MHz.
const FIRCDIV2_DIV1: u32 = 1 << 8;

const PORTC_BASE: u32 = 0x4004_B000;
const PORTD_BASE: u32 = 0x4004_C000;

const fn port_pcr(base: u32, pin: u32) -> *mut u32 {
    (base + 4 * pin) as *mut u32
}

const PCR_MUX_GPIO: u32 = 1 << 8;
const PCR_MUX_ALT2: u32 = 2 << 8;
/// Pull enable + pull select up.
const PCR_PULL_UP: u32 = 0b11;

// --- GPIO ---

const GPIOC_BASE: u32 = 0x400F_F080;
const GPIOD_BASE: u32 = 0x400F_F0C0;
const GPIO_PSOR: u32 = 0x04;
const GPIO_PCOR: u32 = 0x08;
const GPIO_PDIR: u32 = 0x10;
const GPIO_PDDR: u32 = 0x14;

/// Boot-select input: SW3 on PTC13, pulled up, pressed = low.
const BOOT_SELECT_PIN: u32 = 13;
/// Updater-mode indicator: blue RGB LED on PTD0, active low.
const LED_BLUE_PIN: u32 = 0;
/// LPUART1 on PTC6 (RX) / PTC7 (TX), ALT2.
const UART_RX_PIN: u32 = 6;
const UART_TX_PIN: u32 = 7;

// --- Device interrupts ---

/// The one device interrupt the bootloader uses.
#[derive(Clone, Copy)]
#[repr(u16)]
pub enum Interrupt {
    Lpuart1RxTx = 33,
}

unsafe impl InterruptNumber for Interrupt {
    fn number(self) -> u16 {
        self as u16
    }
}

#[derive(Clone, Copy)]
pub union Vector {
    handler: unsafe extern "C" fn(),
    reserved: usize,
}

unsafe extern "C" fn default_handler() {
    loop {
        cortex_m::asm::wfi();
    }
}

/// Device vector table. Only the LPUART1 receive interrupt is wired up; the
/// rest trap in place so a stray enable is visible on a debugger.
#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Vector; 48] = {
    let mut tbl = [Vector {
        handler: default_handler,
    }; 48];
    tbl[Interrupt::Lpuart1RxTx as usize] = Vector {
        handler: uart::lpuart1_rx_tx,
    };
    tbl
};

// --- Board handle ---

pub struct Peripherals {
    _priv: (),
}

impl Peripherals {
    /// Boot-select pin sampled active-low.
    pub fn boot_select_asserted(&self) -> bool {
        let pdir = unsafe { ((GPIOC_BASE + GPIO_PDIR) as *const u32).read_volatile() };
        pdir & (1 << BOOT_SELECT_PIN) == 0
    }

    pub fn led_blue_on(&mut self) {
        unsafe {
            ((GPIOD_BASE + GPIO_PCOR) as *mut u32).write_volatile(1 << LED_BLUE_PIN);
        }
    }

    pub fn led_blue_off(&mut self) {
        unsafe {
            ((GPIOD_BASE + GPIO_PSOR) as *mut u32).write_volatile(1 << LED_BLUE_PIN);
        }
    }
}

/// Bring up clocks, pins and the UART, and arm byte reception.
pub fn init() -> Peripherals {
    unsafe {
        // FIRC runs out of reset; route its divided output to peripherals.
        SCG_FIRCDIV.write_volatile(FIRCDIV2_DIV1);

        // Gate PORT clocks before touching pin control.
        PCC_PORTC.write_volatile(PCC_CGC);
        PCC_PORTD.write_volatile(PCC_CGC);

        // Boot-select button: GPIO input with pull-up.
        port_pcr(PORTC_BASE, BOOT_SELECT_PIN).write_volatile(PCR_MUX_GPIO | PCR_PULL_UP);

        // Blue LED: GPIO output, off (high) until updater mode.
        port_pcr(PORTD_BASE, LED_BLUE_PIN).write_volatile(PCR_MUX_GPIO);
        ((GPIOD_BASE + GPIO_PSOR) as *mut u32).write_volatile(1 << LED_BLUE_PIN);
        let pddr = (GPIOD_BASE + GPIO_PDDR) as *mut u32;
        pddr.write_volatile(pddr.read_volatile() | (1 << LED_BLUE_PIN));

        // LPUART1 pins and clock, then the peripheral itself.
        port_pcr(PORTC_BASE, UART_RX_PIN).write_volatile(PCR_MUX_ALT2);
        port_pcr(PORTC_BASE, UART_TX_PIN).write_volatile(PCR_MUX_ALT2);
        PCC_LPUART1.write_volatile(PCC_PCS_FIRCDIV2 | PCC_CGC);
    }

    uart::init();

    // Arm asynchronous reception: every received byte interrupts into the
    // byte queue from here on.
    unsafe {
        NVIC::unmask(Interrupt::Lpuart1RxTx);
    }
    uart::enable_rx_interrupt();

    Peripherals { _priv: () }
}

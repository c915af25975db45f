// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! LPUART1 transport: 9600 8N1, interrupt-driven receive, blocking send.
//!
//! The receive interrupt does exactly one thing: push the byte into the
//! shared [`ByteQueue`] without blocking. The main loop is the only
//! consumer. Transmit is blocking send-and-wait; the status channel is
//! human-readable text with no pacing requirement.

use srecboot_common::{ByteQueue, UART_QUEUE_SIZE};

const LPUART1_BASE: u32 = 0x4006_B000;
const BAUD: *mut u32 = (LPUART1_BASE + 0x10) as *mut u32;
const STAT: *mut u32 = (LPUART1_BASE + 0x14) as *mut u32;
const CTRL: *mut u32 = (LPUART1_BASE + 0x18) as *mut u32;
const DATA: *mut u32 = (LPUART1_BASE + 0x1C) as *mut u32;

const STAT_TDRE: u32 = 1 << 23;
const STAT_TC: u32 = 1 << 22;
const STAT_RDRF: u32 = 1 << 21;

const CTRL_TE: u32 = 1 << 19;
const CTRL_RE: u32 = 1 << 18;
const CTRL_RIE: u32 = 1 << 21;

/// 48 MHz / (16 * 9600), OSR left at the reset default of 16.
const SBR_9600: u32 = 312;

/// Receive ring shared between the interrupt (producer) and the main loop
/// (consumer).
pub static RX_QUEUE: ByteQueue<UART_QUEUE_SIZE> = ByteQueue::new();

/// Configure 9600 8N1 and enable the transmitter and receiver.
pub fn init() {
    unsafe {
        BAUD.write_volatile(SBR_9600);
        CTRL.write_volatile(CTRL_TE | CTRL_RE);
    }
}

/// Enable the receive-data interrupt; from here on bytes arrive via
/// [`lpuart1_rx_tx`] into [`RX_QUEUE`].
pub fn enable_rx_interrupt() {
    unsafe {
        let ctrl = CTRL.read_volatile();
        CTRL.write_volatile(ctrl | CTRL_RIE);
    }
}

/// Blocking send: waits for room per byte and for full completion at the
/// end, so a caller can reset or jump right after the last character.
pub fn send_bytes(bytes: &[u8]) {
    for &b in bytes {
        unsafe {
            while STAT.read_volatile() & STAT_TDRE == 0 {}
            DATA.write_volatile(b as u32);
        }
    }
    unsafe {
        while STAT.read_volatile() & STAT_TC == 0 {}
    }
}

pub fn send_str(s: &str) {
    send_bytes(s.as_bytes());
}

/// LPUART1 receive/transmit interrupt. Reading DATA clears RDRF; a full
/// queue drops the byte and the queue counts the loss.
pub unsafe extern "C" fn lpuart1_rx_tx() {
    if STAT.read_volatile() & STAT_RDRF != 0 {
        let byte = DATA.read_volatile() as u8;
        let _ = RX_QUEUE.push(byte);
    }
}

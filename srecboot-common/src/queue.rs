// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Single-producer/single-consumer byte ring for UART reception.
//!
//! The receive interrupt pushes, the main loop pops; nothing else may touch
//! the queue. With that discipline no locking is needed: the producer only
//! writes `head`, the consumer only writes `tail`, and each index is
//! published with release ordering after the data it covers, so the other
//! side never observes an index ahead of the bytes behind it.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

/// Fixed-capacity SPSC byte queue.
///
/// Indices count monotonically and wrap at `usize`; `head - tail` is the
/// occupancy, so the full `N` slots are usable. Safe to place in a `static`
/// and share between interrupt and thread context.
pub struct ByteQueue<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
    dropped: AtomicU32,
}

// SPSC discipline is the safety argument; see module docs.
unsafe impl<const N: usize> Sync for ByteQueue<N> {}

impl<const N: usize> ByteQueue<N> {
    pub const fn new() -> Self {
        Self {
            buf: UnsafeCell::new([0u8; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Push one byte. Producer side only.
    ///
    /// Returns `false` without overwriting anything if the queue is full;
    /// the loss is recorded in [`dropped`](Self::dropped).
    pub fn push(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head.wrapping_sub(tail) >= N {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        unsafe {
            (*self.buf.get())[head % N] = byte;
        }
        self.head.store(head.wrapping_add(1), Ordering::Release);
        true
    }

    /// Pop one byte. Consumer side only.
    pub fn pop(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        let byte = unsafe { (*self.buf.get())[tail % N] };
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        head.wrapping_sub(tail)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes lost to a full queue since the last [`reset`](Self::reset).
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discard contents and clear the drop counter. Consumer side only, and
    /// only while the producer is quiescent (receive interrupt not armed).
    pub fn reset(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

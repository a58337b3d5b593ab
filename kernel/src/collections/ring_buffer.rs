// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Implementation of an overwriting byte ring buffer.
//!
//! `ByteRingBuffer` is meant to be filled from a receive interrupt and drained
//! by application code. When the producer outruns the consumer the oldest
//! byte is overwritten and a sticky overflow flag is raised; the consumer can
//! poll and reset that flag independently of the data.
//!
//! There is no occupancy counter. The read cursor takes the out-of-range value
//! `N + 1` while nothing is waiting to be read, so equal cursors with a live
//! read cursor always mean "full".
//!
//! The buffer is not synchronized. Share it between an interrupt handler and
//! the main loop through an interrupt-masking cell such as
//! `msp430::interrupt::InterruptMutex`.

const OVERFLOW: u8 = 1 << 0;

pub struct ByteRingBuffer<const N: usize> {
    ring: [u8; N],
    write: usize,
    read: usize,
    status: u8,
}

impl<const N: usize> ByteRingBuffer<N> {
    /// Read cursor value meaning "no unread byte".
    const DRAINED: usize = N + 1;

    pub const fn new() -> ByteRingBuffer<N> {
        assert!(N > 0, "ring buffer capacity must be non-zero");
        ByteRingBuffer {
            ring: [0; N],
            write: 0,
            read: Self::DRAINED,
            status: 0,
        }
    }

    /// Store `byte`, overwriting the oldest unread byte if the buffer is full.
    pub fn insert(&mut self, byte: u8) {
        if self.read == Self::DRAINED {
            self.read = self.write;
        } else if self.read == self.write {
            self.status |= OVERFLOW;
            self.read = (self.read + 1) % N;
        }
        self.ring[self.write] = byte;
        self.write = (self.write + 1) % N;
    }

    /// Remove and return the oldest unread byte.
    ///
    /// Returns 0 without advancing when no byte is waiting.
    pub fn get(&mut self) -> u8 {
        if self.read == Self::DRAINED {
            return 0;
        }
        let byte = self.ring[self.read];
        self.read = (self.read + 1) % N;
        if self.read == self.write {
            self.read = Self::DRAINED;
        }
        byte
    }

    /// Whether a byte has been overwritten since the last
    /// `clear_overflow()` or `clear()`.
    pub fn overflow(&self) -> bool {
        self.status & OVERFLOW != 0
    }

    pub fn clear_overflow(&mut self) {
        self.status &= !OVERFLOW;
    }

    pub fn is_empty(&self) -> bool {
        self.read == Self::DRAINED
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        if self.read == Self::DRAINED {
            0
        } else if self.read < self.write {
            self.write - self.read
        } else {
            N - self.read + self.write
        }
    }

    /// Drop all unread bytes and reset the overflow flag.
    pub fn clear(&mut self) {
        self.write = 0;
        self.read = Self::DRAINED;
        self.status = 0;
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Default for ByteRingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Scoped interrupt masking and data shared with interrupt handlers.
//!
//! [`InterruptGuard`] clears GIE for as long as it is alive and puts back the
//! state it found when dropped, so guards nest and early returns are safe.
//! [`InterruptMutex`] pairs a value with such a guard; it is the way to share
//! a receive ring buffer between a USCI interrupt handler and the main loop.
//!
//! ```rust,ignore
//! use kernel::collections::ring_buffer::ByteRingBuffer;
//! use msp430::interrupt::InterruptMutex;
//!
//! static RX: InterruptMutex<ByteRingBuffer<32>> = InterruptMutex::new(ByteRingBuffer::new());
//!
//! let byte = RX.lock(|rx| rx.get())?;
//! ```

use core::cell::{Cell, UnsafeCell};
use core::marker::PhantomData;

use kernel::ErrorCode;

use crate::support;

/// Keeps maskable interrupts disabled until dropped.
pub struct InterruptGuard {
    was_enabled: bool,
    // Must be dropped in the context that created it.
    _not_send: PhantomData<*const ()>,
}

impl InterruptGuard {
    pub fn new() -> InterruptGuard {
        let was_enabled = support::interrupts_enabled();
        support::disable_interrupts();
        InterruptGuard {
            was_enabled,
            _not_send: PhantomData,
        }
    }

    /// Whether interrupts were enabled when the guard was created.
    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        if self.was_enabled {
            unsafe { support::enable_interrupts() };
        }
    }
}

/// A value that may be touched from both thread and interrupt context.
pub struct InterruptMutex<T> {
    value: UnsafeCell<T>,
    locked: Cell<bool>,
}

// Access is serialized by masking interrupts; there is a single core.
unsafe impl<T: Send> Sync for InterruptMutex<T> {}

impl<T> InterruptMutex<T> {
    pub const fn new(value: T) -> InterruptMutex<T> {
        InterruptMutex {
            value: UnsafeCell::new(value),
            locked: Cell::new(false),
        }
    }

    /// Run `f` on the value with interrupts disabled.
    ///
    /// Returns `Err(ErrorCode::BUSY)` if called from inside another access to
    /// the same mutex.
    pub fn lock<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Result<R, ErrorCode> {
        let _guard = InterruptGuard::new();
        self.access(f)
    }

    /// Run `f` on the value without touching GIE.
    ///
    /// ## Safety
    ///
    /// Interrupts must already be masked, as they are on entry to an
    /// interrupt handler.
    pub unsafe fn from_interrupt<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Result<R, ErrorCode> {
        self.access(f)
    }

    pub fn get_mut(&mut self) -> &mut T {
        self.value.get_mut()
    }

    pub fn into_inner(self) -> T {
        self.value.into_inner()
    }

    fn access<R, F: FnOnce(&mut T) -> R>(&self, f: F) -> Result<R, ErrorCode> {
        if self.locked.replace(true) {
            return Err(ErrorCode::BUSY);
        }
        let result = f(unsafe { &mut *self.value.get() });
        self.locked.set(false);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::{InterruptGuard, InterruptMutex};
    use crate::support;
    use kernel::ErrorCode;

    #[test]
    fn guard_restores_enabled_state() {
        unsafe { support::enable_interrupts() };

        {
            let guard = InterruptGuard::new();
            assert!(guard.was_enabled());
            assert!(!support::interrupts_enabled());
        }
        assert!(support::interrupts_enabled());
    }

    #[test]
    fn nested_guards_restore_outermost_state() {
        unsafe { support::enable_interrupts() };

        {
            let _outer = InterruptGuard::new();
            {
                let inner = InterruptGuard::new();
                assert!(!inner.was_enabled());
            }
            // Dropping the inner guard must not re-enable interrupts early.
            assert!(!support::interrupts_enabled());
        }
        assert!(support::interrupts_enabled());
    }

    #[test]
    fn guard_leaves_disabled_state_alone() {
        support::disable_interrupts();

        {
            let guard = InterruptGuard::new();
            assert!(!guard.was_enabled());
        }
        assert!(!support::interrupts_enabled());
    }

    #[test]
    fn atomic_returns_closure_result() {
        unsafe { support::enable_interrupts() };
        let value = support::atomic(|| {
            assert!(!support::interrupts_enabled());
            7
        });
        assert_eq!(value, 7);
        assert!(support::interrupts_enabled());
    }

    #[test]
    fn mutex_masks_interrupts_while_locked() {
        unsafe { support::enable_interrupts() };
        let counter = InterruptMutex::new(0u8);

        let seen = counter.lock(|c| {
            *c += 1;
            support::interrupts_enabled()
        });
        assert_eq!(seen, Ok(false));
        assert!(support::interrupts_enabled());
        assert_eq!(counter.into_inner(), 1);
    }

    #[test]
    fn mutex_rejects_reentrant_access() {
        let shared = InterruptMutex::new(0u8);

        let inner = shared.lock(|_| shared.lock(|v| *v));
        assert_eq!(inner, Ok(Err(ErrorCode::BUSY)));

        // The failed access must not poison the mutex.
        assert_eq!(shared.lock(|v| *v), Ok(0));
    }
}

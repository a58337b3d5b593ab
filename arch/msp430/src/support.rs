// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Helper functions for the MSP430 CPU core.

/// General interrupt enable bit of the status register (R2).
pub const SR_GIE: u16 = 1 << 3;

/// NOP instruction
#[cfg(target_arch = "msp430")]
#[inline(always)]
pub fn nop() {
    use core::arch::asm;
    unsafe {
        asm!("nop", options(nomem, nostack, preserves_flags));
    }
}

/// Clear GIE in the status register.
#[cfg(target_arch = "msp430")]
#[inline(always)]
pub fn disable_interrupts() {
    use core::arch::asm;
    // The instruction after DINT may still be interrupted.
    unsafe {
        asm!("dint", "nop", options(nomem, nostack));
    }
}

/// Set GIE in the status register.
///
/// ## Safety
///
/// Pending interrupt handlers run as soon as this returns, so any data they
/// share with the caller must be in a consistent state.
#[cfg(target_arch = "msp430")]
#[inline(always)]
pub unsafe fn enable_interrupts() {
    use core::arch::asm;
    asm!("nop", "eint", "nop", options(nomem, nostack));
}

/// Whether maskable interrupts are currently enabled.
#[cfg(target_arch = "msp430")]
#[inline(always)]
pub fn interrupts_enabled() -> bool {
    use core::arch::asm;
    let sr: u16;
    unsafe {
        asm!("mov r2, {0}", out(reg) sr, options(nomem, nostack, preserves_flags));
    }
    sr & SR_GIE != 0
}

// Host implementations keep GIE in memory so that the interrupt guards can be
// exercised by unit tests.
#[cfg(not(target_arch = "msp430"))]
mod mock {
    #[cfg(test)]
    std::thread_local! {
        static GIE: core::cell::Cell<bool> = const { core::cell::Cell::new(false) };
    }

    #[cfg(test)]
    pub(super) fn store(enabled: bool) {
        GIE.with(|gie| gie.set(enabled));
    }

    #[cfg(test)]
    pub(super) fn load() -> bool {
        GIE.with(|gie| gie.get())
    }

    #[cfg(not(test))]
    static GIE: core::sync::atomic::AtomicBool = core::sync::atomic::AtomicBool::new(false);

    #[cfg(not(test))]
    pub(super) fn store(enabled: bool) {
        GIE.store(enabled, core::sync::atomic::Ordering::SeqCst);
    }

    #[cfg(not(test))]
    pub(super) fn load() -> bool {
        GIE.load(core::sync::atomic::Ordering::SeqCst)
    }
}

/// NOP instruction (mock)
#[cfg(not(target_arch = "msp430"))]
pub fn nop() {
    core::hint::spin_loop();
}

/// Clear GIE (mock)
#[cfg(not(target_arch = "msp430"))]
pub fn disable_interrupts() {
    mock::store(false);
}

/// Set GIE (mock)
#[cfg(not(target_arch = "msp430"))]
pub unsafe fn enable_interrupts() {
    mock::store(true);
}

/// Read GIE (mock)
#[cfg(not(target_arch = "msp430"))]
pub fn interrupts_enabled() -> bool {
    mock::load()
}

/// Atomic operation
///
/// Runs `f` with maskable interrupts disabled and restores the previous GIE
/// state afterwards.
pub fn atomic<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = crate::interrupt::InterruptGuard::new();
    f()
}

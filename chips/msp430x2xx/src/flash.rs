// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Flash Memory Controller
//!
//! Segment erase and byte/word programming of the on-chip flash. Every
//! operation masks interrupts, unlocks the controller, performs the access
//! that triggers the timing generator, checks the violation flags and locks
//! the controller again. The CPU is held by the hardware while code executes from flash, so
//! the accesses complete before the next instruction runs.

use core::ptr;

use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, FieldValue, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};
use crate::wdt::Watchdog;

/// Key that must accompany every write to FCTLx. Reads return 0x96.
const FWKEY: u16 = 0xA5;

register_bitfields! [u16,
    FCTL1 [
        /// Block write
        BLKWRT OFFSET(7) NUMBITS(1) [],
        /// Write
        WRT OFFSET(6) NUMBITS(1) [],
        /// Enable emergency interrupt exit
        EEIEX OFFSET(4) NUMBITS(1) [],
        /// Enable erase interrupts
        EEI OFFSET(3) NUMBITS(1) [],
        /// Mass erase
        MERAS OFFSET(2) NUMBITS(1) [],
        /// Segment erase
        ERASE OFFSET(1) NUMBITS(1) [],
        FWKEY OFFSET(8) NUMBITS(8) []
    ],
    FCTL2 [
        /// Flash controller clock source select
        FSSEL OFFSET(6) NUMBITS(2) [
            ACLK = 0,
            MCLK = 1,
            SMCLK = 2
        ],
        /// Flash controller clock divider, divides by FN + 1
        FN OFFSET(0) NUMBITS(6) [],
        FWKEY OFFSET(8) NUMBITS(8) []
    ],
    FCTL3 [
        /// Operation failed
        FAIL OFFSET(7) NUMBITS(1) [],
        /// Segment A and info lock
        LOCKA OFFSET(6) NUMBITS(1) [],
        /// Emergency exit
        EMEX OFFSET(5) NUMBITS(1) [],
        /// Lock
        LOCK OFFSET(4) NUMBITS(1) [],
        /// Wait, set when a block write is ready for the next word
        WAIT OFFSET(3) NUMBITS(1) [],
        /// Access violation interrupt flag
        ACCVIFG OFFSET(2) NUMBITS(1) [],
        /// Flash security key violation
        KEYV OFFSET(1) NUMBITS(1) [],
        /// Busy
        BUSY OFFSET(0) NUMBITS(1) [],
        FWKEY OFFSET(8) NUMBITS(8) []
    ]
];

/// Clock feeding the flash timing generator, which must run at 257-476 kHz.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlashClock {
    Aclk,
    Mclk,
    Smclk,
}

pub struct FlashController {
    fctl1: StaticRef<ReadWrite<u16, FCTL1::Register>>,
    fctl2: StaticRef<ReadWrite<u16, FCTL2::Register>>,
    fctl3: StaticRef<ReadWrite<u16, FCTL3::Register>>,
}

impl FlashController {
    pub fn new(table: &'static RegisterTable) -> FlashController {
        let reg = |role| RegisterDescriptor::new(PeripheralKind::Flash, 0, role);
        FlashController {
            fctl1: table.required(reg(Role::FlashControl1)),
            fctl2: table.required(reg(Role::FlashControl2)),
            fctl3: table.required(reg(Role::FlashControl3)),
        }
    }

    /// Select the timing generator clock and its divider (`divider + 1`,
    /// only the lower six bits are used).
    pub fn select_clock(&self, clock: FlashClock, divider: u8) {
        let source = match clock {
            FlashClock::Aclk => FCTL2::FSSEL::ACLK,
            FlashClock::Mclk => FCTL2::FSSEL::MCLK,
            FlashClock::Smclk => FCTL2::FSSEL::SMCLK,
        };
        self.fctl2
            .write(FCTL2::FWKEY.val(FWKEY) + source + FCTL2::FN.val(u16::from(divider & 0x3f)));
    }

    pub fn set_clock_divider(&self, divider: u8) {
        self.fctl2
            .modify(FCTL2::FWKEY.val(FWKEY) + FCTL2::FN.val(u16::from(divider & 0x3f)));
    }

    /// Outcome of the last erase or write, as recorded by the controller.
    pub fn status(&self) -> Result<(), ErrorCode> {
        let fctl3 = self.fctl3.extract();
        if fctl3.is_set(FCTL3::ACCVIFG) || fctl3.is_set(FCTL3::FAIL) {
            Err(ErrorCode::FAIL)
        } else {
            Ok(())
        }
    }

    pub fn is_locked(&self) -> bool {
        self.fctl3.is_set(FCTL3::LOCK)
    }

    fn operate<F: FnOnce()>(
        &self,
        mode: FieldValue<u16, FCTL1::Register>,
        watchdog: Option<&Watchdog>,
        access: F,
    ) -> Result<(), ErrorCode> {
        let held_watchdog = watchdog.filter(|wdt| !wdt.is_stopped());
        if let Some(wdt) = held_watchdog {
            wdt.stop();
        }

        // No interrupt may fetch from flash while the timing generator runs.
        let result = msp430::support::atomic(|| {
            // Keep the emergency-exit configuration, select the operation.
            self.fctl1.modify(
                FCTL1::FWKEY.val(FWKEY)
                    + FCTL1::BLKWRT::CLEAR
                    + FCTL1::WRT::CLEAR
                    + FCTL1::MERAS::CLEAR
                    + FCTL1::ERASE::CLEAR
                    + mode,
            );
            // Unlock, clearing stale violation flags.
            self.fctl3.write(FCTL3::FWKEY.val(FWKEY));

            access();

            let result = self.status();
            self.fctl3.write(FCTL3::FWKEY.val(FWKEY) + FCTL3::LOCK::SET);
            self.fctl1.modify(
                FCTL1::FWKEY.val(FWKEY)
                    + FCTL1::WRT::CLEAR
                    + FCTL1::MERAS::CLEAR
                    + FCTL1::ERASE::CLEAR,
            );
            result
        });

        if let Some(wdt) = held_watchdog {
            wdt.start();
        }
        if result.is_err() {
            log::error!("flash: access violation or failed operation");
        }
        result
    }

    /// Erase the segment containing `address`.
    ///
    /// A running `watchdog` is held for the duration of the erase.
    ///
    /// ## Safety
    ///
    /// `address` must lie in flash and no code or data still in use may live
    /// in that segment.
    pub unsafe fn erase_segment(
        &self,
        address: usize,
        watchdog: Option<&Watchdog>,
    ) -> Result<(), ErrorCode> {
        self.operate(FCTL1::ERASE::SET, watchdog, || {
            // Dummy write starts the erase cycle.
            ptr::write_volatile(address as *mut u16, 0);
        })
    }

    /// ## Safety
    ///
    /// `address` must lie in erased flash.
    pub unsafe fn write_byte(
        &self,
        address: usize,
        value: u8,
        watchdog: Option<&Watchdog>,
    ) -> Result<(), ErrorCode> {
        self.operate(FCTL1::WRT::SET, watchdog, || {
            ptr::write_volatile(address as *mut u8, value);
        })
    }

    /// ## Safety
    ///
    /// `address` must be even and lie in erased flash.
    pub unsafe fn write_word(
        &self,
        address: usize,
        value: u16,
        watchdog: Option<&Watchdog>,
    ) -> Result<(), ErrorCode> {
        if address % 2 != 0 {
            return Err(ErrorCode::INVAL);
        }
        self.operate(FCTL1::WRT::SET, watchdog, || {
            ptr::write_volatile(address as *mut u16, value);
        })
    }

    /// Program `data` starting at `address` in a single unlock.
    ///
    /// ## Safety
    ///
    /// The whole range must lie in erased flash.
    pub unsafe fn write_bytes(
        &self,
        address: usize,
        data: &[u8],
        watchdog: Option<&Watchdog>,
    ) -> Result<(), ErrorCode> {
        self.operate(FCTL1::WRT::SET, watchdog, || {
            for (offset, byte) in data.iter().enumerate() {
                ptr::write_volatile((address + offset) as *mut u8, *byte);
            }
        })
    }
}

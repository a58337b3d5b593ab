// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Watchdog Timer+ (WDT+)

use kernel::utilities::registers::interfaces::{ReadWriteable, Readable};
use kernel::utilities::registers::{register_bitfields, ReadWrite};
use kernel::utilities::StaticRef;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};

/// every write access has to set this 'password' in the upper 8 bit of the
/// register, otherwise the watchdog resets the whole system
const PASSWORD: u16 = 0x5A;

register_bitfields! [u16,
    WDTCTL [
        /// Watchdog timer interval select
        WDTIS OFFSET(0) NUMBITS(2) [
            Div32768 = 0,
            Div8192 = 1,
            Div512 = 2,
            Div64 = 3
        ],
        /// Watchdog timer clock source select
        WDTSSEL OFFSET(2) NUMBITS(1) [
            SMCLK = 0,
            ACLK = 1
        ],
        /// Watchdog timer counter clear
        WDTCNTCL OFFSET(3) NUMBITS(1) [],
        /// Watchdog timer mode select
        WDTTMSEL OFFSET(4) NUMBITS(1) [
            Watchdog = 0,
            Interval = 1
        ],
        /// RST/NMI pin function select
        WDTNMI OFFSET(5) NUMBITS(1) [
            Reset = 0,
            Nmi = 1
        ],
        /// NMI edge select
        WDTNMIES OFFSET(6) NUMBITS(1) [
            Rising = 0,
            Falling = 1
        ],
        /// Watchdog timer hold
        WDTHOLD OFFSET(7) NUMBITS(1) [],
        /// Watchdog timer password
        WDTPW OFFSET(8) NUMBITS(8) []
    ]
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogClock {
    Smclk,
    Aclk,
}

/// Number of clock cycles after which the watchdog fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogInterval {
    Cycles32768,
    Cycles8192,
    Cycles512,
    Cycles64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchdogMode {
    /// Expiry resets the device.
    Watchdog,
    /// Expiry only raises WDTIFG.
    Interval,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NmiEdge {
    Rising,
    Falling,
}

pub struct Watchdog {
    ctl: StaticRef<ReadWrite<u16, WDTCTL::Register>>,
}

impl Watchdog {
    pub fn new(table: &'static RegisterTable) -> Watchdog {
        Watchdog {
            ctl: table.required(RegisterDescriptor::new(
                PeripheralKind::Watchdog,
                0,
                Role::WatchdogControl,
            )),
        }
    }

    pub fn stop(&self) {
        self.ctl
            .modify(WDTCTL::WDTPW.val(PASSWORD) + WDTCTL::WDTHOLD::SET);
    }

    /// Clear the counter and let it run.
    pub fn start(&self) {
        self.ctl.modify(
            WDTCTL::WDTPW.val(PASSWORD) + WDTCTL::WDTHOLD::CLEAR + WDTCTL::WDTCNTCL::SET,
        );
    }

    pub fn is_stopped(&self) -> bool {
        self.ctl.is_set(WDTCTL::WDTHOLD)
    }

    /// Restart the count without changing the configuration.
    pub fn tickle(&self) {
        self.ctl
            .modify(WDTCTL::WDTPW.val(PASSWORD) + WDTCTL::WDTCNTCL::SET);
    }

    pub fn set_mode(&self, mode: WatchdogMode) {
        self.ctl.modify(
            WDTCTL::WDTPW.val(PASSWORD)
                + match mode {
                    WatchdogMode::Watchdog => WDTCTL::WDTTMSEL::Watchdog,
                    WatchdogMode::Interval => WDTCTL::WDTTMSEL::Interval,
                },
        );
    }

    pub fn select_clock(&self, clock: WatchdogClock) {
        self.ctl.modify(
            WDTCTL::WDTPW.val(PASSWORD)
                + match clock {
                    WatchdogClock::Smclk => WDTCTL::WDTSSEL::SMCLK,
                    WatchdogClock::Aclk => WDTCTL::WDTSSEL::ACLK,
                },
        );
    }

    pub fn set_interval(&self, interval: WatchdogInterval) {
        self.ctl.modify(
            WDTCTL::WDTPW.val(PASSWORD)
                + match interval {
                    WatchdogInterval::Cycles32768 => WDTCTL::WDTIS::Div32768,
                    WatchdogInterval::Cycles8192 => WDTCTL::WDTIS::Div8192,
                    WatchdogInterval::Cycles512 => WDTCTL::WDTIS::Div512,
                    WatchdogInterval::Cycles64 => WDTCTL::WDTIS::Div64,
                },
        );
    }

    /// Turn the RST/NMI pin into an NMI input triggered on `edge`.
    pub fn enable_nmi_pin(&self, edge: NmiEdge) {
        self.ctl.modify(
            WDTCTL::WDTPW.val(PASSWORD)
                + WDTCTL::WDTNMI::Nmi
                + match edge {
                    NmiEdge::Rising => WDTCTL::WDTNMIES::Rising,
                    NmiEdge::Falling => WDTCTL::WDTNMIES::Falling,
                },
        );
    }

    /// Give the RST/NMI pin back its reset function.
    pub fn disable_nmi_pin(&self) {
        self.ctl
            .modify(WDTCTL::WDTPW.val(PASSWORD) + WDTCTL::WDTNMI::Reset);
    }
}

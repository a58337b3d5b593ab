// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register map and peripherals of the MSP430G2553.
//!
//! 16 KB flash, 512 B RAM, ports P1-P3 (interrupts on P1 and P2, SEL2 on all
//! three), Timer0_A3, Timer1_A3, one USCI_A0/USCI_B0 pair and DCO calibration
//! constants for 1, 8, 12 and 16 MHz.

#![no_std]

#[cfg(test)]
extern crate std;

use msp430x2xx::cs::CalibratedFrequency::{Mhz1, Mhz12, Mhz16, Mhz8};
use msp430x2xx::register_table::PeripheralKind::{
    Calibration, Clock, Flash, Port, TimerA, UsciA, UsciB, UsciInterrupt, Watchdog,
};
use msp430x2xx::register_table::Role::*;
use msp430x2xx::register_table::{PeripheralKind, RegisterEntry, RegisterTable, Role};

const fn b(kind: PeripheralKind, instance: u8, role: Role, address: usize) -> RegisterEntry {
    RegisterEntry::byte(kind, instance, role, address)
}

const fn w(kind: PeripheralKind, instance: u8, role: Role, address: usize) -> RegisterEntry {
    RegisterEntry::word(kind, instance, role, address)
}

#[rustfmt::skip]
static ENTRIES: [RegisterEntry; 78] = [
    // Special function registers
    b(UsciInterrupt, 0, InterruptEnable, 0x0001),
    b(UsciInterrupt, 0, InterruptFlag, 0x0003),

    // Digital I/O
    b(Port, 1, Input, 0x0020),
    b(Port, 1, Output, 0x0021),
    b(Port, 1, Direction, 0x0022),
    b(Port, 1, InterruptFlag, 0x0023),
    b(Port, 1, InterruptEdge, 0x0024),
    b(Port, 1, InterruptEnable, 0x0025),
    b(Port, 1, Select, 0x0026),
    b(Port, 1, ResistorEnable, 0x0027),
    b(Port, 1, Select2, 0x0041),

    b(Port, 2, Input, 0x0028),
    b(Port, 2, Output, 0x0029),
    b(Port, 2, Direction, 0x002A),
    b(Port, 2, InterruptFlag, 0x002B),
    b(Port, 2, InterruptEdge, 0x002C),
    b(Port, 2, InterruptEnable, 0x002D),
    b(Port, 2, Select, 0x002E),
    b(Port, 2, ResistorEnable, 0x002F),
    b(Port, 2, Select2, 0x0042),

    b(Port, 3, ResistorEnable, 0x0010),
    b(Port, 3, Input, 0x0018),
    b(Port, 3, Output, 0x0019),
    b(Port, 3, Direction, 0x001A),
    b(Port, 3, Select, 0x001B),
    b(Port, 3, Select2, 0x0043),

    // Basic clock module+
    b(Clock, 0, BasicClockControl3, 0x0053),
    b(Clock, 0, DcoControl, 0x0056),
    b(Clock, 0, BasicClockControl1, 0x0057),
    b(Clock, 0, BasicClockControl2, 0x0058),

    // USCI_A0
    b(UsciA, 0, Control0, 0x0060),
    b(UsciA, 0, Control1, 0x0061),
    b(UsciA, 0, BaudLow, 0x0062),
    b(UsciA, 0, BaudHigh, 0x0063),
    b(UsciA, 0, Modulation, 0x0064),
    b(UsciA, 0, Status, 0x0065),
    b(UsciA, 0, RxData, 0x0066),
    b(UsciA, 0, TxData, 0x0067),

    // USCI_B0
    b(UsciB, 0, Control0, 0x0068),
    b(UsciB, 0, Control1, 0x0069),
    b(UsciB, 0, BaudLow, 0x006A),
    b(UsciB, 0, BaudHigh, 0x006B),
    b(UsciB, 0, I2cInterruptEnable, 0x006C),
    b(UsciB, 0, Status, 0x006D),
    b(UsciB, 0, RxData, 0x006E),
    b(UsciB, 0, TxData, 0x006F),
    w(UsciB, 0, I2cOwnAddress, 0x0118),
    w(UsciB, 0, I2cSlaveAddress, 0x011A),

    // Timer1_A3
    w(TimerA, 1, InterruptVector, 0x011E),
    w(TimerA, 1, TimerControl, 0x0180),
    w(TimerA, 1, CaptureCompareControl(0), 0x0182),
    w(TimerA, 1, CaptureCompareControl(1), 0x0184),
    w(TimerA, 1, CaptureCompareControl(2), 0x0186),
    w(TimerA, 1, Counter, 0x0190),
    w(TimerA, 1, CaptureCompareValue(0), 0x0192),
    w(TimerA, 1, CaptureCompareValue(1), 0x0194),
    w(TimerA, 1, CaptureCompareValue(2), 0x0196),

    // Watchdog timer+
    w(Watchdog, 0, WatchdogControl, 0x0120),

    // Flash controller
    w(Flash, 0, FlashControl1, 0x0128),
    w(Flash, 0, FlashControl2, 0x012A),
    w(Flash, 0, FlashControl3, 0x012C),

    // Timer0_A3
    w(TimerA, 0, InterruptVector, 0x012E),
    w(TimerA, 0, TimerControl, 0x0160),
    w(TimerA, 0, CaptureCompareControl(0), 0x0162),
    w(TimerA, 0, CaptureCompareControl(1), 0x0164),
    w(TimerA, 0, CaptureCompareControl(2), 0x0166),
    w(TimerA, 0, Counter, 0x0170),
    w(TimerA, 0, CaptureCompareValue(0), 0x0172),
    w(TimerA, 0, CaptureCompareValue(1), 0x0174),
    w(TimerA, 0, CaptureCompareValue(2), 0x0176),

    // Calibration data, information memory segment A
    b(Calibration, 0, CalibrationDco(Mhz16), 0x10F8),
    b(Calibration, 0, CalibrationBc1(Mhz16), 0x10F9),
    b(Calibration, 0, CalibrationDco(Mhz12), 0x10FA),
    b(Calibration, 0, CalibrationBc1(Mhz12), 0x10FB),
    b(Calibration, 0, CalibrationDco(Mhz8), 0x10FC),
    b(Calibration, 0, CalibrationBc1(Mhz8), 0x10FD),
    b(Calibration, 0, CalibrationDco(Mhz1), 0x10FE),
    b(Calibration, 0, CalibrationBc1(Mhz1), 0x10FF),
];

/// Every memory-mapped register of the G2553 known to the drivers.
pub static REGISTER_TABLE: RegisterTable = unsafe { RegisterTable::new(&ENTRIES) };

pub struct Msp430g2553DefaultPeripherals {
    pub port1: msp430x2xx::gpio::Port,
    pub port2: msp430x2xx::gpio::Port,
    pub port3: msp430x2xx::gpio::Port,
    pub timer_a0: msp430x2xx::timer::Timer,
    pub timer_a1: msp430x2xx::timer::Timer,
    pub usci_a0: msp430x2xx::usci::Usci,
    pub usci_b0: msp430x2xx::usci::Usci,
    pub clock: msp430x2xx::cs::ClockModule,
    pub flash: msp430x2xx::flash::FlashController,
    pub watchdog: msp430x2xx::wdt::Watchdog,
}

impl Msp430g2553DefaultPeripherals {
    /// ## Safety
    ///
    /// The handles own their registers. Only one set may exist at a time.
    pub unsafe fn new() -> Self {
        use msp430x2xx::timer::{Timer, TimerModule};
        use msp430x2xx::usci::{Usci, UsciModule};

        let table = &REGISTER_TABLE;
        Self {
            port1: msp430x2xx::gpio::Port::new(table, 1),
            port2: msp430x2xx::gpio::Port::new(table, 2),
            port3: msp430x2xx::gpio::Port::new(table, 3),
            timer_a0: Timer::new(table, TimerModule::A, 0),
            timer_a1: Timer::new(table, TimerModule::A, 1),
            usci_a0: Usci::new(table, UsciModule::A, 0),
            usci_b0: Usci::new(table, UsciModule::B, 0),
            clock: msp430x2xx::cs::ClockModule::new(table),
            flash: msp430x2xx::flash::FlashController::new(table),
            watchdog: msp430x2xx::wdt::Watchdog::new(table),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msp430x2xx::register_table::RegisterDescriptor;

    fn address(kind: PeripheralKind, instance: u8, role: Role) -> Option<usize> {
        REGISTER_TABLE.address(RegisterDescriptor::new(kind, instance, role))
    }

    #[test]
    fn datasheet_addresses() {
        assert_eq!(address(Port, 1, Output), Some(0x21));
        assert_eq!(address(Port, 2, Select2), Some(0x42));
        assert_eq!(address(UsciA, 0, Control0), Some(0x60));
        assert_eq!(address(UsciB, 0, I2cSlaveAddress), Some(0x11A));
        assert_eq!(address(TimerA, 1, CaptureCompareValue(2)), Some(0x196));
        assert_eq!(address(Watchdog, 0, WatchdogControl), Some(0x120));
        assert_eq!(address(Calibration, 0, CalibrationBc1(Mhz1)), Some(0x10FF));
    }

    #[test]
    fn absent_hardware() {
        assert_eq!(address(Port, 3, InterruptFlag), None);
        assert_eq!(address(Port, 4, Output), None);
        assert_eq!(address(UsciA, 1, Control0), None);
        assert_eq!(address(TimerA, 0, CaptureCompareControl(3)), None);
        assert_eq!(address(UsciInterrupt, 1, InterruptFlag), None);
    }

    #[test]
    fn descriptors_are_unique() {
        for (i, first) in ENTRIES.iter().enumerate() {
            for second in &ENTRIES[i + 1..] {
                assert_ne!(first.descriptor(), second.descriptor());
                assert_ne!(first.address(), second.address());
            }
        }
    }
}

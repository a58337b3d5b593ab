// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Register map and peripherals of the MSP430F2618.
//!
//! 116 KB flash, 8 KB RAM, ports P1-P8 (interrupts on P1 and P2 only, no
//! SEL2 registers), Timer_A3, Timer_B7 and two USCI_A/USCI_B pairs. The
//! second pair reports its RX/TX interrupts through UC1IE/UC1IFG.

#![no_std]

#[cfg(test)]
extern crate std;

use msp430x2xx::cs::CalibratedFrequency::{Mhz1, Mhz12, Mhz16, Mhz8};
use msp430x2xx::register_table::PeripheralKind::{
    Calibration, Clock, Flash, Port, TimerA, TimerB, UsciA, UsciB, UsciInterrupt, Watchdog,
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
static ENTRIES: [RegisterEntry; 128] = [
    // Special function registers
    b(UsciInterrupt, 0, InterruptEnable, 0x0001),
    b(UsciInterrupt, 0, InterruptFlag, 0x0003),
    b(UsciInterrupt, 1, InterruptEnable, 0x0006),
    b(UsciInterrupt, 1, InterruptFlag, 0x0007),

    // Digital I/O, interrupt capable
    b(Port, 1, Input, 0x0020),
    b(Port, 1, Output, 0x0021),
    b(Port, 1, Direction, 0x0022),
    b(Port, 1, InterruptFlag, 0x0023),
    b(Port, 1, InterruptEdge, 0x0024),
    b(Port, 1, InterruptEnable, 0x0025),
    b(Port, 1, Select, 0x0026),
    b(Port, 1, ResistorEnable, 0x0027),

    b(Port, 2, Input, 0x0028),
    b(Port, 2, Output, 0x0029),
    b(Port, 2, Direction, 0x002A),
    b(Port, 2, InterruptFlag, 0x002B),
    b(Port, 2, InterruptEdge, 0x002C),
    b(Port, 2, InterruptEnable, 0x002D),
    b(Port, 2, Select, 0x002E),
    b(Port, 2, ResistorEnable, 0x002F),

    // Digital I/O
    b(Port, 3, Input, 0x0018),
    b(Port, 3, Output, 0x0019),
    b(Port, 3, Direction, 0x001A),
    b(Port, 3, Select, 0x001B),
    b(Port, 3, ResistorEnable, 0x0010),

    b(Port, 4, Input, 0x001C),
    b(Port, 4, Output, 0x001D),
    b(Port, 4, Direction, 0x001E),
    b(Port, 4, Select, 0x001F),
    b(Port, 4, ResistorEnable, 0x0011),

    b(Port, 5, Input, 0x0030),
    b(Port, 5, Output, 0x0031),
    b(Port, 5, Direction, 0x0032),
    b(Port, 5, Select, 0x0033),
    b(Port, 5, ResistorEnable, 0x0012),

    b(Port, 6, Input, 0x0034),
    b(Port, 6, Output, 0x0035),
    b(Port, 6, Direction, 0x0036),
    b(Port, 6, Select, 0x0037),
    b(Port, 6, ResistorEnable, 0x0013),

    b(Port, 7, Input, 0x0038),
    b(Port, 7, Output, 0x003A),
    b(Port, 7, Direction, 0x003C),
    b(Port, 7, Select, 0x003E),
    b(Port, 7, ResistorEnable, 0x0014),

    b(Port, 8, Input, 0x0039),
    b(Port, 8, Output, 0x003B),
    b(Port, 8, Direction, 0x003D),
    b(Port, 8, Select, 0x003F),
    b(Port, 8, ResistorEnable, 0x0015),

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

    // USCI_A1
    b(UsciA, 1, Control0, 0x00D0),
    b(UsciA, 1, Control1, 0x00D1),
    b(UsciA, 1, BaudLow, 0x00D2),
    b(UsciA, 1, BaudHigh, 0x00D3),
    b(UsciA, 1, Modulation, 0x00D4),
    b(UsciA, 1, Status, 0x00D5),
    b(UsciA, 1, RxData, 0x00D6),
    b(UsciA, 1, TxData, 0x00D7),

    // USCI_B1
    b(UsciB, 1, Control0, 0x00D8),
    b(UsciB, 1, Control1, 0x00D9),
    b(UsciB, 1, BaudLow, 0x00DA),
    b(UsciB, 1, BaudHigh, 0x00DB),
    b(UsciB, 1, I2cInterruptEnable, 0x00DC),
    b(UsciB, 1, Status, 0x00DD),
    b(UsciB, 1, RxData, 0x00DE),
    b(UsciB, 1, TxData, 0x00DF),
    w(UsciB, 1, I2cOwnAddress, 0x017C),
    w(UsciB, 1, I2cSlaveAddress, 0x017E),

    // Timer_B7
    w(TimerB, 0, InterruptVector, 0x011E),
    w(TimerB, 0, TimerControl, 0x0180),
    w(TimerB, 0, CaptureCompareControl(0), 0x0182),
    w(TimerB, 0, CaptureCompareControl(1), 0x0184),
    w(TimerB, 0, CaptureCompareControl(2), 0x0186),
    w(TimerB, 0, CaptureCompareControl(3), 0x0188),
    w(TimerB, 0, CaptureCompareControl(4), 0x018A),
    w(TimerB, 0, CaptureCompareControl(5), 0x018C),
    w(TimerB, 0, CaptureCompareControl(6), 0x018E),
    w(TimerB, 0, Counter, 0x0190),
    w(TimerB, 0, CaptureCompareValue(0), 0x0192),
    w(TimerB, 0, CaptureCompareValue(1), 0x0194),
    w(TimerB, 0, CaptureCompareValue(2), 0x0196),
    w(TimerB, 0, CaptureCompareValue(3), 0x0198),
    w(TimerB, 0, CaptureCompareValue(4), 0x019A),
    w(TimerB, 0, CaptureCompareValue(5), 0x019C),
    w(TimerB, 0, CaptureCompareValue(6), 0x019E),

    // Watchdog timer+
    w(Watchdog, 0, WatchdogControl, 0x0120),

    // Flash controller
    w(Flash, 0, FlashControl1, 0x0128),
    w(Flash, 0, FlashControl2, 0x012A),
    w(Flash, 0, FlashControl3, 0x012C),

    // Timer_A3
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

/// Every memory-mapped register of the F2618 known to the drivers.
pub static REGISTER_TABLE: RegisterTable = unsafe { RegisterTable::new(&ENTRIES) };

pub struct Msp430f2618DefaultPeripherals {
    pub ports: [msp430x2xx::gpio::Port; 8],
    pub timer_a0: msp430x2xx::timer::Timer,
    pub timer_b0: msp430x2xx::timer::Timer,
    pub usci_a0: msp430x2xx::usci::Usci,
    pub usci_b0: msp430x2xx::usci::Usci,
    pub usci_a1: msp430x2xx::usci::Usci,
    pub usci_b1: msp430x2xx::usci::Usci,
    pub clock: msp430x2xx::cs::ClockModule,
    pub flash: msp430x2xx::flash::FlashController,
    pub watchdog: msp430x2xx::wdt::Watchdog,
}

impl Msp430f2618DefaultPeripherals {
    /// ## Safety
    ///
    /// The handles own their registers. Only one set may exist at a time.
    pub unsafe fn new() -> Self {
        use msp430x2xx::gpio::Port;
        use msp430x2xx::timer::{Timer, TimerModule};
        use msp430x2xx::usci::{Usci, UsciModule};

        let table = &REGISTER_TABLE;
        Self {
            // P1 is ports[0]
            ports: core::array::from_fn(|index| Port::new(table, index as u8 + 1)),
            timer_a0: Timer::new(table, TimerModule::A, 0),
            timer_b0: Timer::new(table, TimerModule::B, 0),
            usci_a0: Usci::new(table, UsciModule::A, 0),
            usci_b0: Usci::new(table, UsciModule::B, 0),
            usci_a1: Usci::new(table, UsciModule::A, 1),
            usci_b1: Usci::new(table, UsciModule::B, 1),
            clock: msp430x2xx::cs::ClockModule::new(table),
            flash: msp430x2xx::flash::FlashController::new(table),
            watchdog: msp430x2xx::wdt::Watchdog::new(table),
        }
    }
}

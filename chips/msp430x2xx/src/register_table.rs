// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Per-variant register address tables.
//!
//! The x2xx parts share peripheral designs but scatter their registers across
//! the 16-bit address space differently (USCI_B0's I2C address registers sit
//! at 0x118 while its control registers are at 0x68, ports 3 and 4 have no
//! interrupt registers, a given part may have Timer_A or Timer_B at 0x180).
//! Instead of `register_structs!` overlays at a base address, every driver
//! therefore looks its registers up by [`RegisterDescriptor`] in a
//! [`RegisterTable`] once, when its handle is built.
//!
//! A lookup that finds no entry means the variant does not implement that
//! register. Drivers treat this as "no such hardware" for optional registers
//! and as a board configuration bug for mandatory ones.

use core::fmt;
use core::mem;

use kernel::utilities::StaticRef;

use crate::cs::CalibratedFrequency;

/// Peripheral block a register belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralKind {
    /// Digital I/O port. Instances are numbered like the datasheet (P1 = 1).
    Port,
    TimerA,
    TimerB,
    UsciA,
    UsciB,
    /// Special-function interrupt enable/flag pair serving one USCI_A/USCI_B
    /// instance pair (IE2/IFG2 for instance 0, UC1IE/UC1IFG for instance 1).
    UsciInterrupt,
    Flash,
    /// Basic clock module+.
    Clock,
    /// Factory calibration constants in information memory segment A.
    Calibration,
    Watchdog,
}

/// Function of a register inside its peripheral block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    // Ports
    Input,
    Output,
    Direction,
    InterruptFlag,
    InterruptEdge,
    InterruptEnable,
    Select,
    Select2,
    ResistorEnable,

    // Timers
    TimerControl,
    Counter,
    InterruptVector,
    CaptureCompareControl(u8),
    CaptureCompareValue(u8),

    // USCI
    Control0,
    Control1,
    BaudLow,
    BaudHigh,
    Modulation,
    Status,
    RxData,
    TxData,
    I2cInterruptEnable,
    I2cOwnAddress,
    I2cSlaveAddress,

    // Flash controller
    FlashControl1,
    FlashControl2,
    FlashControl3,

    // Clock system
    DcoControl,
    BasicClockControl1,
    BasicClockControl2,
    BasicClockControl3,
    CalibrationDco(CalibratedFrequency),
    CalibrationBc1(CalibratedFrequency),

    WatchdogControl,
}

/// Identifies one register of one peripheral instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegisterDescriptor {
    pub kind: PeripheralKind,
    pub instance: u8,
    pub role: Role,
}

impl RegisterDescriptor {
    pub const fn new(kind: PeripheralKind, instance: u8, role: Role) -> RegisterDescriptor {
        RegisterDescriptor {
            kind,
            instance,
            role,
        }
    }
}

impl fmt::Display for RegisterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{} {:?}", self.kind, self.instance, self.role)
    }
}

/// Access width of a register cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    const fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Word => 2,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RegisterEntry {
    descriptor: RegisterDescriptor,
    width: Width,
    address: usize,
}

impl RegisterEntry {
    /// An 8-bit register.
    pub const fn byte(kind: PeripheralKind, instance: u8, role: Role, address: usize) -> Self {
        RegisterEntry {
            descriptor: RegisterDescriptor::new(kind, instance, role),
            width: Width::Byte,
            address,
        }
    }

    /// A 16-bit register. The address must be even.
    pub const fn word(kind: PeripheralKind, instance: u8, role: Role, address: usize) -> Self {
        assert!(address % 2 == 0, "word registers must be aligned");
        RegisterEntry {
            descriptor: RegisterDescriptor::new(kind, instance, role),
            width: Width::Word,
            address,
        }
    }

    pub fn descriptor(&self) -> RegisterDescriptor {
        self.descriptor
    }

    pub fn width(&self) -> Width {
        self.width
    }

    pub fn address(&self) -> usize {
        self.address
    }
}

/// Immutable map from [`RegisterDescriptor`] to register address.
pub struct RegisterTable {
    entries: &'static [RegisterEntry],
}

impl RegisterTable {
    /// ## Safety
    ///
    /// Every entry must name a memory-mapped register of the stated width at
    /// the stated address, and no two descriptors may share an address unless
    /// the hardware itself aliases them.
    pub const unsafe fn new(entries: &'static [RegisterEntry]) -> RegisterTable {
        RegisterTable { entries }
    }

    pub fn entries(&self) -> &'static [RegisterEntry] {
        self.entries
    }

    fn entry(&self, descriptor: RegisterDescriptor) -> Option<&'static RegisterEntry> {
        self.entries.iter().find(|e| e.descriptor == descriptor)
    }

    /// Address of the register, if the variant has it.
    pub fn address(&self, descriptor: RegisterDescriptor) -> Option<usize> {
        self.entry(descriptor).map(|e| e.address)
    }

    pub fn contains(&self, descriptor: RegisterDescriptor) -> bool {
        self.entry(descriptor).is_some()
    }

    /// Typed view of an optional register.
    ///
    /// `R` is one of the `tock-registers` cell types (`ReadWrite<u8, ..>`,
    /// `ReadOnly<u16, ..>`, ...). Returns `None` if the variant does not have
    /// the register or if the cell width does not match `R`.
    pub fn register<R>(&self, descriptor: RegisterDescriptor) -> Option<StaticRef<R>> {
        let entry = self.entry(descriptor)?;
        if entry.width.bytes() != mem::size_of::<R>() {
            return None;
        }
        // The table constructor guarantees a register of this width lives at
        // this address.
        Some(unsafe { StaticRef::new(entry.address as *const R) })
    }

    /// Typed view of a register the calling driver cannot work without.
    ///
    /// Panics if the variant table lacks the register or declares a different
    /// width, which is a mistake in the board or variant definition.
    pub fn required<R>(&self, descriptor: RegisterDescriptor) -> StaticRef<R> {
        match self.register(descriptor) {
            Some(register) => register,
            None => panic!(
                "register table: no {}-byte cell for {}",
                mem::size_of::<R>(),
                descriptor
            ),
        }
    }
}

// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! General Purpose Input/Output (GPIO)
//!
//! A [`Port`] owns the registers of one digital I/O port. Pins are handled in
//! groups: a [`PinGroup`] is a non-empty mask of pins on one port that are
//! configured and driven together, so a single register access sets, clears
//! or samples all of them.
//!
//! Only ports 1 and 2 can raise interrupts. On the other ports the interrupt
//! operations do nothing and no flag is ever reported.
//!
//! Operations are read-modify-write sequences on shared port registers. Two
//! groups on the same port must not be modified concurrently from thread and
//! interrupt context without masking interrupts.

use kernel::utilities::registers::interfaces::{Readable, Writeable};
use kernel::utilities::registers::{ReadOnly, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};

const PINS_PER_PORT: u8 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinResistors {
    InternalPullUp,
    InternalPullDown,
    ExternalPullUp,
    ExternalPullDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Output,
    Input(PinResistors),
}

/// Pin function selected through PxSEL/PxSEL2.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinFunction {
    /// SEL = 0, SEL2 = 0
    Io,
    /// SEL = 1, SEL2 = 0
    PrimaryPeripheral,
    /// SEL = 0, SEL2 = 1
    DeviceSpecific,
    /// SEL = 1, SEL2 = 1
    SecondaryPeripheral,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InterruptEdge {
    Rising,
    Falling,
}

struct PortInterruptRegisters {
    flag: StaticRef<ReadWrite<u8>>,
    edge: StaticRef<ReadWrite<u8>>,
    enable: StaticRef<ReadWrite<u8>>,
}

pub struct Port {
    number: u8,
    input: StaticRef<ReadOnly<u8>>,
    output: StaticRef<ReadWrite<u8>>,
    direction: StaticRef<ReadWrite<u8>>,
    select: StaticRef<ReadWrite<u8>>,
    select2: Option<StaticRef<ReadWrite<u8>>>,
    resistor_enable: Option<StaticRef<ReadWrite<u8>>>,
    interrupts: Option<PortInterruptRegisters>,
}

fn set_bits(register: &ReadWrite<u8>, mask: u8) {
    register.set(register.get() | mask);
}

fn clear_bits(register: &ReadWrite<u8>, mask: u8) {
    register.set(register.get() & !mask);
}

impl Port {
    /// Resolve the registers of port `number` (1 for P1, ...).
    pub fn new(table: &'static RegisterTable, number: u8) -> Port {
        let reg = |role| RegisterDescriptor::new(PeripheralKind::Port, number, role);

        let interrupts = match (
            table.register(reg(Role::InterruptFlag)),
            table.register(reg(Role::InterruptEdge)),
            table.register(reg(Role::InterruptEnable)),
        ) {
            (Some(flag), Some(edge), Some(enable)) => {
                Some(PortInterruptRegisters { flag, edge, enable })
            }
            _ => None,
        };

        Port {
            number,
            input: table.required(reg(Role::Input)),
            output: table.required(reg(Role::Output)),
            direction: table.required(reg(Role::Direction)),
            select: table.required(reg(Role::Select)),
            select2: table.register(reg(Role::Select2)),
            resistor_enable: table.register(reg(Role::ResistorEnable)),
            interrupts,
        }
    }

    pub fn number(&self) -> u8 {
        self.number
    }

    pub fn has_interrupts(&self) -> bool {
        self.interrupts.is_some()
    }

    /// Group the pins in `mask`. An empty mask is rejected with `INVAL`.
    pub fn pins(&self, mask: u8, mode: Mode) -> Result<PinGroup<'_>, ErrorCode> {
        if mask == 0 {
            return Err(ErrorCode::INVAL);
        }
        Ok(PinGroup {
            port: self,
            pins: mask,
            mode,
        })
    }

    /// A group made of the single pin `pin` (0 to 7).
    pub fn pin(&self, pin: u8, mode: Mode) -> Result<PinGroup<'_>, ErrorCode> {
        if pin >= PINS_PER_PORT {
            return Err(ErrorCode::INVAL);
        }
        self.pins(1 << pin, mode)
    }
}

pub struct PinGroup<'a> {
    port: &'a Port,
    pins: u8,
    mode: Mode,
}

impl PinGroup<'_> {
    pub fn mask(&self) -> u8 {
        self.pins
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Apply the direction and, for inputs, the pull resistor configuration.
    ///
    /// For pull resistors PxOUT selects the direction of the pull. Internal
    /// resistors are switched on with PxREN, external ones leave it clear.
    pub fn init(&self) {
        let port = self.port;
        match self.mode {
            Mode::Output => set_bits(&port.direction, self.pins),
            Mode::Input(resistors) => {
                clear_bits(&port.direction, self.pins);
                match resistors {
                    PinResistors::InternalPullUp | PinResistors::ExternalPullUp => {
                        set_bits(&port.output, self.pins)
                    }
                    PinResistors::InternalPullDown | PinResistors::ExternalPullDown => {
                        clear_bits(&port.output, self.pins)
                    }
                }
                if let Some(ren) = port.resistor_enable {
                    match resistors {
                        PinResistors::InternalPullUp | PinResistors::InternalPullDown => {
                            set_bits(&ren, self.pins)
                        }
                        PinResistors::ExternalPullUp | PinResistors::ExternalPullDown => {
                            clear_bits(&ren, self.pins)
                        }
                    }
                }
            }
        }
    }

    /// `init()` followed by routing the pins to `function`.
    ///
    /// Returns `NOSUPPORT` if `function` needs PxSEL2 and the port has none;
    /// direction and resistors are configured anyway.
    pub fn init_with_function(&self, function: PinFunction) -> Result<(), ErrorCode> {
        self.init();
        let port = self.port;
        let (sel, sel2) = match function {
            PinFunction::Io => (false, false),
            PinFunction::PrimaryPeripheral => (true, false),
            PinFunction::DeviceSpecific => (false, true),
            PinFunction::SecondaryPeripheral => (true, true),
        };
        match (port.select2, sel2) {
            (Some(select2), true) => set_bits(&select2, self.pins),
            (Some(select2), false) => clear_bits(&select2, self.pins),
            (None, true) => return Err(ErrorCode::NOSUPPORT),
            (None, false) => (),
        }
        if sel {
            set_bits(&port.select, self.pins);
        } else {
            clear_bits(&port.select, self.pins);
        }
        Ok(())
    }

    pub fn set(&self) {
        set_bits(&self.port.output, self.pins);
    }

    pub fn clear(&self) {
        clear_bits(&self.port.output, self.pins);
    }

    pub fn toggle(&self) {
        let out = &self.port.output;
        out.set(out.get() ^ self.pins);
    }

    /// Raw PxIN bits of the group.
    pub fn input_level(&self) -> u8 {
        self.port.input.get() & self.pins
    }

    /// Logical input state.
    ///
    /// Pins whose PxOUT bits are set (pulled up) are active low: the group
    /// reads `true` when all of them are low. Otherwise the group reads `true`
    /// when any pin is high.
    pub fn input(&self) -> bool {
        if self.port.output.get() & self.pins != 0 {
            self.input_level() == 0
        } else {
            self.input_level() != 0
        }
    }

    pub fn enable_interrupt(&self) {
        if let Some(irq) = &self.port.interrupts {
            set_bits(&irq.enable, self.pins);
        }
    }

    pub fn disable_interrupt(&self) {
        if let Some(irq) = &self.port.interrupts {
            clear_bits(&irq.enable, self.pins);
        }
    }

    pub fn set_interrupt_edge(&self, edge: InterruptEdge) {
        if let Some(irq) = &self.port.interrupts {
            match edge {
                InterruptEdge::Rising => clear_bits(&irq.edge, self.pins),
                InterruptEdge::Falling => set_bits(&irq.edge, self.pins),
            }
        }
    }

    /// Pending PxIFG bits of the group, 0 on ports without interrupts.
    pub fn interrupt_flag(&self) -> u8 {
        self.port
            .interrupts
            .as_ref()
            .map_or(0, |irq| irq.flag.get() & self.pins)
    }

    pub fn clear_interrupt_flag(&self) {
        if let Some(irq) = &self.port.interrupts {
            clear_bits(&irq.flag, self.pins);
        }
    }

    /// Raise the interrupt from software.
    pub fn set_interrupt_flag(&self) {
        if let Some(irq) = &self.port.interrupts {
            set_bits(&irq.flag, self.pins);
        }
    }
}

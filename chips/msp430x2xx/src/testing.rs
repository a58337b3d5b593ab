// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Host-memory register file for driver unit tests.
//!
//! Every register of an imaginary x2xx part (two ports with interrupts, one
//! without, Timer_A0 with three channels, Timer_A1 with only two wired up,
//! Timer_B0, two USCI pairs, flash, clock, watchdog and 1/16 MHz calibration
//! data) gets its own 16-bit slot in leaked heap memory. Tests inspect or
//! fake hardware state with `peek`/`poke`.

use std::boxed::Box;
use std::vec::Vec;

use crate::cs::CalibratedFrequency;
use crate::register_table::{
    PeripheralKind, RegisterDescriptor, RegisterEntry, RegisterTable, Role, Width,
};

pub(crate) struct FakeChip {
    pub(crate) table: &'static RegisterTable,
}

fn push_all(
    list: &mut Vec<(PeripheralKind, u8, Role, Width)>,
    kind: PeripheralKind,
    instance: u8,
    roles: &[Role],
    width: Width,
) {
    for &role in roles {
        list.push((kind, instance, role, width));
    }
}

impl FakeChip {
    pub(crate) fn new() -> FakeChip {
        use PeripheralKind::*;
        use Role::*;

        let mut list = Vec::new();

        let port_io = [Input, Output, Direction, Select, Select2, ResistorEnable];
        let port_irq = [InterruptFlag, InterruptEdge, InterruptEnable];
        for port in 1..=2 {
            push_all(&mut list, Port, port, &port_io, Width::Byte);
            push_all(&mut list, Port, port, &port_irq, Width::Byte);
        }
        push_all(&mut list, Port, 3, &port_io, Width::Byte);

        for (kind, instance, channels) in [(TimerA, 0, 3), (TimerA, 1, 2), (TimerB, 0, 7)] {
            push_all(
                &mut list,
                kind,
                instance,
                &[TimerControl, Counter, InterruptVector],
                Width::Word,
            );
            for n in 0..channels {
                push_all(
                    &mut list,
                    kind,
                    instance,
                    &[CaptureCompareControl(n), CaptureCompareValue(n)],
                    Width::Word,
                );
            }
        }

        let usci_common = [Control0, Control1, BaudLow, BaudHigh, Status, RxData, TxData];
        for instance in 0..=1 {
            push_all(&mut list, UsciA, instance, &usci_common, Width::Byte);
            push_all(&mut list, UsciA, instance, &[Modulation], Width::Byte);
            push_all(&mut list, UsciB, instance, &usci_common, Width::Byte);
            push_all(&mut list, UsciB, instance, &[I2cInterruptEnable], Width::Byte);
            push_all(&mut list, UsciB, instance, &[I2cOwnAddress, I2cSlaveAddress], Width::Word);
            push_all(
                &mut list,
                UsciInterrupt,
                instance,
                &[InterruptEnable, InterruptFlag],
                Width::Byte,
            );
        }

        push_all(&mut list, Flash, 0, &[FlashControl1, FlashControl2, FlashControl3], Width::Word);
        push_all(
            &mut list,
            Clock,
            0,
            &[DcoControl, BasicClockControl1, BasicClockControl2, BasicClockControl3],
            Width::Byte,
        );
        for freq in [CalibratedFrequency::Mhz1, CalibratedFrequency::Mhz16] {
            push_all(
                &mut list,
                Calibration,
                0,
                &[CalibrationDco(freq), CalibrationBc1(freq)],
                Width::Byte,
            );
        }
        push_all(&mut list, Watchdog, 0, &[WatchdogControl], Width::Word);

        let memory: &'static mut [u16] = Box::leak(std::vec![0u16; list.len()].into_boxed_slice());
        let base = memory.as_mut_ptr() as usize;

        let entries: Vec<RegisterEntry> = list
            .iter()
            .enumerate()
            .map(|(slot, &(kind, instance, role, width))| {
                let address = base + 2 * slot;
                match width {
                    Width::Byte => RegisterEntry::byte(kind, instance, role, address),
                    Width::Word => RegisterEntry::word(kind, instance, role, address),
                }
            })
            .collect();
        let entries: &'static [RegisterEntry] = Box::leak(entries.into_boxed_slice());

        FakeChip {
            table: Box::leak(Box::new(unsafe { RegisterTable::new(entries) })),
        }
    }

    fn entry(&self, kind: PeripheralKind, instance: u8, role: Role) -> &'static RegisterEntry {
        let descriptor = RegisterDescriptor::new(kind, instance, role);
        match self.table.entries().iter().find(|e| e.descriptor() == descriptor) {
            Some(entry) => entry,
            None => panic!("fake chip has no {}", descriptor),
        }
    }

    /// Current content of a register, zero-extended for byte registers.
    pub(crate) fn peek(&self, kind: PeripheralKind, instance: u8, role: Role) -> u16 {
        let entry = self.entry(kind, instance, role);
        unsafe {
            match entry.width() {
                Width::Byte => u16::from(core::ptr::read_volatile(entry.address() as *const u8)),
                Width::Word => core::ptr::read_volatile(entry.address() as *const u16),
            }
        }
    }

    /// Overwrite a register the way the hardware would.
    pub(crate) fn poke(&self, kind: PeripheralKind, instance: u8, role: Role, value: u16) {
        let entry = self.entry(kind, instance, role);
        unsafe {
            match entry.width() {
                Width::Byte => core::ptr::write_volatile(entry.address() as *mut u8, value as u8),
                Width::Word => core::ptr::write_volatile(entry.address() as *mut u16, value),
            }
        }
    }
}

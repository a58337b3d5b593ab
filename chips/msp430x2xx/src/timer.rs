// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Timer (Timer_A3 / Timer_B7)
//!
//! A [`Timer`] drives the 16-bit counter of one timer instance: counting
//! mode, clock source, input divider and the overflow interrupt. Each
//! capture/compare channel is handled through a [`CaptureCompare`] obtained
//! from [`Timer::channel`].
//!
//! In up and up/down mode CCR0 holds the period, so output modes that depend
//! on EQU0 are meaningless on channel 0. This is not checked.

use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, FieldValue, ReadOnly, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};

register_bitfields! [u16,
    /// Timer_A/Timer_B Control Register
    TxCTL [
        /// Timer interrupt flag
        TAIFG OFFSET(0) NUMBITS(1) [],
        /// Timer interrupt enable
        TAIE OFFSET(1) NUMBITS(1) [],
        /// Timer clear. Setting this bit resets TxR, the clock divider logic
        /// and the count direction.
        TACLR OFFSET(2) NUMBITS(1) [],
        /// Mode control. Setting MCx=0x00 when the timer is not in use conserves power.
        MC OFFSET(4) NUMBITS(2) [
            /// Stop mode: Timer is halted
            StopMode = 0,
            /// Up mode: Timer counts up to TxCCR0
            UpMode = 1,
            /// Continuous mode: Timer counts up to 0xFFFF
            ContinuousMode = 2,
            /// Up/Down mode: Timer counts up to TxCCR0 then down to 0x0000
            UpDownMode = 3
        ],
        /// Input divider
        ID OFFSET(6) NUMBITS(2) [
            DividedBy1 = 0,
            DividedBy2 = 1,
            DividedBy4 = 2,
            DividedBy8 = 3
        ],
        /// Clock source select
        TASSEL OFFSET(8) NUMBITS(2) [
            TxCLK = 0,
            ACLK = 1,
            SMCLK = 2,
            INCLK = 3
        ]
    ],
    /// Timer_A/Timer_B Capture/Compare Control Register
    TxCCTLx [
        /// Capture/compare interrupt flag
        CCIFG OFFSET(0) NUMBITS(1) [],
        /// Capture overflow. COV must be reset with software.
        COV OFFSET(1) NUMBITS(1) [],
        /// Output. For output mode 0, this bit directly controls the state of the output
        OUT OFFSET(2) NUMBITS(1) [],
        /// Capture/compare input. The selected input signal can be read by this bit.
        CCI OFFSET(3) NUMBITS(1) [],
        /// Capture/compare interrupt enable
        CCIE OFFSET(4) NUMBITS(1) [],
        /// Output mode
        OUTMOD OFFSET(5) NUMBITS(3) [
            OutBit = 0,
            Set = 1,
            ToggleReset = 2,
            SetReset = 3,
            Toggle = 4,
            Reset = 5,
            ToggleSet = 6,
            ResetSet = 7
        ],
        /// Capture mode
        CAP OFFSET(8) NUMBITS(1) [],
        /// Synchronized capture/compare input
        SCCI OFFSET(10) NUMBITS(1) [],
        /// Synchronize capture source with the timer clock
        SCS OFFSET(11) NUMBITS(1) [
            Asynchronous = 0,
            Synchronous = 1
        ],
        /// Capture/compare input select
        CCIS OFFSET(12) NUMBITS(2) [
            CCIxA = 0,
            CCIxB = 1,
            GND = 2,
            VCC = 3
        ],
        /// Capture mode
        CM OFFSET(14) NUMBITS(2) [
            NoCapture = 0,
            CaptureRisingEdge = 1,
            CaptureFallingEdge = 2,
            CaptureBothEdges = 3
        ]
    ],
    /// Timer_A/Timer_B Interrupt Vector Register
    TxIV [
        IV OFFSET(0) NUMBITS(16) []
    ]
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerModule {
    /// Timer_A3
    A,
    /// Timer_B7
    B,
}

impl TimerModule {
    pub fn channels(self) -> u8 {
        match self {
            TimerModule::A => 3,
            TimerModule::B => 7,
        }
    }

    fn kind(self) -> PeripheralKind {
        match self {
            TimerModule::A => PeripheralKind::TimerA,
            TimerModule::B => PeripheralKind::TimerB,
        }
    }

    /// TxIV value reporting a counter overflow.
    fn overflow_vector(self) -> u16 {
        match self {
            TimerModule::A => 0x0A,
            TimerModule::B => 0x0E,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerMode {
    Stop,
    Up,
    Continuous,
    UpDown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockSource {
    /// External TxCLK pin
    TxClk,
    Aclk,
    Smclk,
    /// Inverted TxCLK on most parts, see the device datasheet
    InClk,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputDivider {
    DividedBy1,
    DividedBy2,
    DividedBy4,
    DividedBy8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureMode {
    None,
    Rising,
    Falling,
    Both,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureInput {
    CciA,
    CciB,
    Gnd,
    Vcc,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    OutBit,
    Set,
    ToggleReset,
    SetReset,
    Toggle,
    Reset,
    ToggleSet,
    ResetSet,
}

/// Highest-priority pending interrupt as reported by TxIV.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingInterrupt {
    None,
    /// CCIFG of the given channel (1 or above, channel 0 has its own vector)
    CaptureCompare(u8),
    Overflow,
}

fn mode_field(mode: TimerMode) -> FieldValue<u16, TxCTL::Register> {
    match mode {
        TimerMode::Stop => TxCTL::MC::StopMode,
        TimerMode::Up => TxCTL::MC::UpMode,
        TimerMode::Continuous => TxCTL::MC::ContinuousMode,
        TimerMode::UpDown => TxCTL::MC::UpDownMode,
    }
}

fn source_field(source: ClockSource) -> FieldValue<u16, TxCTL::Register> {
    match source {
        ClockSource::TxClk => TxCTL::TASSEL::TxCLK,
        ClockSource::Aclk => TxCTL::TASSEL::ACLK,
        ClockSource::Smclk => TxCTL::TASSEL::SMCLK,
        ClockSource::InClk => TxCTL::TASSEL::INCLK,
    }
}

fn divider_field(divider: InputDivider) -> FieldValue<u16, TxCTL::Register> {
    match divider {
        InputDivider::DividedBy1 => TxCTL::ID::DividedBy1,
        InputDivider::DividedBy2 => TxCTL::ID::DividedBy2,
        InputDivider::DividedBy4 => TxCTL::ID::DividedBy4,
        InputDivider::DividedBy8 => TxCTL::ID::DividedBy8,
    }
}

pub struct Timer {
    module: TimerModule,
    instance: u8,
    ctl: StaticRef<ReadWrite<u16, TxCTL::Register>>,
    counter: StaticRef<ReadWrite<u16>>,
    iv: StaticRef<ReadOnly<u16, TxIV::Register>>,
    table: &'static RegisterTable,
}

impl Timer {
    pub fn new(table: &'static RegisterTable, module: TimerModule, instance: u8) -> Timer {
        let reg = |role| RegisterDescriptor::new(module.kind(), instance, role);
        Timer {
            module,
            instance,
            ctl: table.required(reg(Role::TimerControl)),
            counter: table.required(reg(Role::Counter)),
            iv: table.required(reg(Role::InterruptVector)),
            table,
        }
    }

    pub fn module(&self) -> TimerModule {
        self.module
    }

    /// Configure mode, clock source and divider with a single write.
    ///
    /// Also disables and clears the overflow interrupt.
    pub fn init(&self, mode: TimerMode, source: ClockSource, divider: InputDivider) {
        self.ctl
            .write(mode_field(mode) + divider_field(divider) + source_field(source));
    }

    pub fn set_mode(&self, mode: TimerMode) {
        self.ctl.modify(mode_field(mode));
    }

    pub fn mode(&self) -> TimerMode {
        match self.ctl.read_as_enum(TxCTL::MC) {
            Some(TxCTL::MC::Value::UpMode) => TimerMode::Up,
            Some(TxCTL::MC::Value::ContinuousMode) => TimerMode::Continuous,
            Some(TxCTL::MC::Value::UpDownMode) => TimerMode::UpDown,
            _ => TimerMode::Stop,
        }
    }

    pub fn set_input_divider(&self, divider: InputDivider) {
        self.ctl.modify(divider_field(divider));
    }

    pub fn select_clock_source(&self, source: ClockSource) {
        self.ctl.modify(source_field(source));
    }

    /// Reset the counter, the divider logic and the count direction.
    /// The counting mode is kept.
    pub fn reset(&self) {
        self.ctl.modify(TxCTL::TACLR::SET);
    }

    pub fn counter(&self) -> u16 {
        self.counter.get()
    }

    pub fn set_counter(&self, value: u16) {
        self.counter.set(value);
    }

    pub fn enable_interrupt(&self) {
        self.ctl.modify(TxCTL::TAIE::SET);
    }

    pub fn disable_interrupt(&self) {
        self.ctl.modify(TxCTL::TAIE::CLEAR);
    }

    pub fn is_interrupt_pending(&self) -> bool {
        self.ctl.is_set(TxCTL::TAIFG)
    }

    pub fn clear_interrupt_flag(&self) {
        self.ctl.modify(TxCTL::TAIFG::CLEAR);
    }

    /// Read TxIV. On hardware the read also clears the reported flag.
    pub fn pending_interrupt(&self) -> PendingInterrupt {
        let vector = self.iv.read(TxIV::IV);
        if vector == 0 {
            PendingInterrupt::None
        } else if vector == self.module.overflow_vector() {
            PendingInterrupt::Overflow
        } else {
            PendingInterrupt::CaptureCompare((vector / 2) as u8)
        }
    }

    /// Capture/compare channel `index`.
    ///
    /// Returns `INVAL` if the module has no such channel and `NOSUPPORT` if
    /// the variant does not map its registers.
    pub fn channel(&self, index: u8) -> Result<CaptureCompare, ErrorCode> {
        if index >= self.module.channels() {
            return Err(ErrorCode::INVAL);
        }
        let reg = |role| RegisterDescriptor::new(self.module.kind(), self.instance, role);
        match (
            self.table.register(reg(Role::CaptureCompareControl(index))),
            self.table.register(reg(Role::CaptureCompareValue(index))),
        ) {
            (Some(cctl), Some(ccr)) => Ok(CaptureCompare { index, cctl, ccr }),
            _ => Err(ErrorCode::NOSUPPORT),
        }
    }
}

pub struct CaptureCompare {
    index: u8,
    cctl: StaticRef<ReadWrite<u16, TxCCTLx::Register>>,
    ccr: StaticRef<ReadWrite<u16>>,
}

impl CaptureCompare {
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn set_capture_mode(&self, mode: CaptureMode) {
        self.cctl.modify(match mode {
            CaptureMode::None => TxCCTLx::CM::NoCapture,
            CaptureMode::Rising => TxCCTLx::CM::CaptureRisingEdge,
            CaptureMode::Falling => TxCCTLx::CM::CaptureFallingEdge,
            CaptureMode::Both => TxCCTLx::CM::CaptureBothEdges,
        });
    }

    pub fn select_input(&self, input: CaptureInput) {
        self.cctl.modify(match input {
            CaptureInput::CciA => TxCCTLx::CCIS::CCIxA,
            CaptureInput::CciB => TxCCTLx::CCIS::CCIxB,
            CaptureInput::Gnd => TxCCTLx::CCIS::GND,
            CaptureInput::Vcc => TxCCTLx::CCIS::VCC,
        });
    }

    pub fn synchronous_capture(&self) {
        self.cctl.modify(TxCCTLx::SCS::Synchronous);
    }

    pub fn asynchronous_capture(&self) {
        self.cctl.modify(TxCCTLx::SCS::Asynchronous);
    }

    pub fn capture_mode(&self) {
        self.cctl.modify(TxCCTLx::CAP::SET);
    }

    pub fn compare_mode(&self) {
        self.cctl.modify(TxCCTLx::CAP::CLEAR);
    }

    pub fn set_output_mode(&self, mode: OutputMode) {
        self.cctl.modify(match mode {
            OutputMode::OutBit => TxCCTLx::OUTMOD::OutBit,
            OutputMode::Set => TxCCTLx::OUTMOD::Set,
            OutputMode::ToggleReset => TxCCTLx::OUTMOD::ToggleReset,
            OutputMode::SetReset => TxCCTLx::OUTMOD::SetReset,
            OutputMode::Toggle => TxCCTLx::OUTMOD::Toggle,
            OutputMode::Reset => TxCCTLx::OUTMOD::Reset,
            OutputMode::ToggleSet => TxCCTLx::OUTMOD::ToggleSet,
            OutputMode::ResetSet => TxCCTLx::OUTMOD::ResetSet,
        });
    }

    pub fn set_compare_value(&self, value: u16) {
        self.ccr.set(value);
    }

    /// Last captured counter value (or the compare value in compare mode).
    pub fn capture_value(&self) -> u16 {
        self.ccr.get()
    }

    pub fn enable_interrupt(&self) {
        self.cctl.modify(TxCCTLx::CCIE::SET);
    }

    pub fn disable_interrupt(&self) {
        self.cctl.modify(TxCCTLx::CCIE::CLEAR);
    }

    pub fn is_interrupt_pending(&self) -> bool {
        self.cctl.is_set(TxCCTLx::CCIFG)
    }

    pub fn clear_interrupt_flag(&self) {
        self.cctl.modify(TxCCTLx::CCIFG::CLEAR);
    }

    /// Drive the output high in output mode 0.
    pub fn set_output(&self) {
        self.cctl.modify(TxCCTLx::OUT::SET);
    }

    pub fn clear_output(&self) {
        self.cctl.modify(TxCCTLx::OUT::CLEAR);
    }

    pub fn capture_overflow_occurred(&self) -> bool {
        self.cctl.is_set(TxCCTLx::COV)
    }

    pub fn clear_capture_overflow(&self) {
        self.cctl.modify(TxCCTLx::COV::CLEAR);
    }

    /// Current level of the selected capture input.
    pub fn input_level(&self) -> bool {
        self.cctl.is_set(TxCCTLx::CCI)
    }

    /// Input level latched at the last EQUx event.
    pub fn synchronized_input_level(&self) -> bool {
        self.cctl.is_set(TxCCTLx::SCCI)
    }
}

// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Universal Serial Communication Interface (USCI)
//!
//! [`Usci`] is the part shared by every protocol: the software reset bit
//! (UCSWRST), clock source and baud-rate prescaler, the data buffers and the
//! receive/transmit interrupt bits. The protocol drivers in [`uart`], [`spi`]
//! and [`i2c`] take ownership of a `Usci` and add their own view of the
//! mode-specific control and status bits.
//!
//! The baud, mode, format and address registers may only change while the
//! engine is held in reset. They are therefore only reachable through the
//! [`ResetHold`] token returned by [`Usci::hold`].
//!
//! The receive/transmit interrupt bits of USCI_A*n* and USCI_B*n* share one
//! enable and one flag register per instance (IE2/IFG2 for instance 0,
//! UC1IE/UC1IFG for instance 1). TX flags double as "transmit buffer empty"
//! and RX flags as "receive buffer full", which is what the blocking drivers
//! poll.

use kernel::utilities::poll::PollBudget;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, Field, ReadOnly, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};

pub mod i2c;
pub mod spi;
pub mod uart;

register_bitfields! [u8,
    /// Bits of UCxCTL1 common to all modes
    UCxCTL1 [
        /// Clock source select
        UCSSEL OFFSET(6) NUMBITS(2) [
            UCLK = 0,
            ACLK = 1,
            SMCLK = 2
        ],
        /// Software reset enable
        UCSWRST OFFSET(0) NUMBITS(1) []
    ],
    /// IE2/IFG2 and UC1IE/UC1IFG
    UCxIFG [
        UCAxRXIFG OFFSET(0) NUMBITS(1) [],
        UCAxTXIFG OFFSET(1) NUMBITS(1) [],
        UCBxRXIFG OFFSET(2) NUMBITS(1) [],
        UCBxTXIFG OFFSET(3) NUMBITS(1) []
    ]
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsciModule {
    /// USCI_A: UART, IrDA and SPI
    A,
    /// USCI_B: SPI and I2C
    B,
}

impl UsciModule {
    fn kind(self) -> PeripheralKind {
        match self {
            UsciModule::A => PeripheralKind::UsciA,
            UsciModule::B => PeripheralKind::UsciB,
        }
    }
}

/// Source of BRCLK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UsciClockSource {
    /// External UCLK pin (UART/SPI slave), UCLKI in I2C mode
    Uclk,
    Aclk,
    Smclk,
}

/// RX and TX bits of this engine in the shared enable/flag registers.
fn interrupt_bits(
    module: UsciModule,
) -> (Field<u8, UCxIFG::Register>, Field<u8, UCxIFG::Register>) {
    match module {
        UsciModule::A => (UCxIFG::UCAxRXIFG, UCxIFG::UCAxTXIFG),
        UsciModule::B => (UCxIFG::UCBxRXIFG, UCxIFG::UCBxTXIFG),
    }
}

pub struct Usci {
    module: UsciModule,
    instance: u8,
    ctl0: StaticRef<ReadWrite<u8>>,
    ctl1: StaticRef<ReadWrite<u8, UCxCTL1::Register>>,
    br0: StaticRef<ReadWrite<u8>>,
    br1: StaticRef<ReadWrite<u8>>,
    rxbuf: StaticRef<ReadOnly<u8>>,
    txbuf: StaticRef<ReadWrite<u8>>,
    ie: StaticRef<ReadWrite<u8, UCxIFG::Register>>,
    ifg: StaticRef<ReadWrite<u8, UCxIFG::Register>>,
    rx_irq: Field<u8, UCxIFG::Register>,
    tx_irq: Field<u8, UCxIFG::Register>,
    table: &'static RegisterTable,
}

impl Usci {
    pub fn new(table: &'static RegisterTable, module: UsciModule, instance: u8) -> Usci {
        let reg = |role| RegisterDescriptor::new(module.kind(), instance, role);
        let irq = |role| RegisterDescriptor::new(PeripheralKind::UsciInterrupt, instance, role);
        let (rx_irq, tx_irq) = interrupt_bits(module);
        Usci {
            module,
            instance,
            ctl0: table.required(reg(Role::Control0)),
            ctl1: table.required(reg(Role::Control1)),
            br0: table.required(reg(Role::BaudLow)),
            br1: table.required(reg(Role::BaudHigh)),
            rxbuf: table.required(reg(Role::RxData)),
            txbuf: table.required(reg(Role::TxData)),
            ie: table.required(irq(Role::InterruptEnable)),
            ifg: table.required(irq(Role::InterruptFlag)),
            rx_irq,
            tx_irq,
            table,
        }
    }

    pub fn module(&self) -> UsciModule {
        self.module
    }

    pub fn instance(&self) -> u8 {
        self.instance
    }

    /// Typed view of a mode-specific register of this engine.
    fn register<R>(&self, role: Role) -> Option<StaticRef<R>> {
        self.table
            .register(RegisterDescriptor::new(self.module.kind(), self.instance, role))
    }

    fn required<R>(&self, role: Role) -> StaticRef<R> {
        self.table
            .required(RegisterDescriptor::new(self.module.kind(), self.instance, role))
    }

    /// Release the engine from reset. Configuration registers are frozen
    /// from now on.
    pub fn enable_module(&self) {
        self.ctl1.modify(UCxCTL1::UCSWRST::CLEAR);
    }

    /// Put the engine into reset. Also clears the RX/TX interrupt enables and
    /// flags on hardware.
    pub fn disable_module(&self) {
        self.ctl1.modify(UCxCTL1::UCSWRST::SET);
    }

    pub fn is_held(&self) -> bool {
        self.ctl1.is_set(UCxCTL1::UCSWRST)
    }

    /// Put the engine into reset and hand out access to the configuration
    /// registers.
    pub fn hold(&self) -> ResetHold<'_> {
        self.disable_module();
        ResetHold { usci: self }
    }

    pub fn enable_rx_interrupt(&self) {
        self.ie.modify(self.rx_irq.val(1));
    }

    pub fn disable_rx_interrupt(&self) {
        self.ie.modify(self.rx_irq.val(0));
    }

    pub fn enable_tx_interrupt(&self) {
        self.ie.modify(self.tx_irq.val(1));
    }

    pub fn disable_tx_interrupt(&self) {
        self.ie.modify(self.tx_irq.val(0));
    }

    /// RX flag: a received character is waiting in the receive buffer.
    pub fn is_rx_interrupt_pending(&self) -> bool {
        self.ifg.is_set(self.rx_irq)
    }

    /// TX flag: the transmit buffer can take the next character.
    pub fn is_tx_interrupt_pending(&self) -> bool {
        self.ifg.is_set(self.tx_irq)
    }

    /// Read the receive buffer, clearing the RX flag on hardware.
    pub fn read_rx_buffer(&self) -> u8 {
        self.rxbuf.get()
    }

    /// Write the transmit buffer, clearing the TX flag on hardware.
    pub fn write_tx_buffer(&self, byte: u8) {
        self.txbuf.set(byte);
    }

    pub fn wait_tx_ready(&self, budget: PollBudget) -> Result<(), ErrorCode> {
        budget.poll_until(|| self.is_tx_interrupt_pending())
    }

    pub fn wait_rx_ready(&self, budget: PollBudget) -> Result<(), ErrorCode> {
        budget.poll_until(|| self.is_rx_interrupt_pending())
    }
}

/// Proof that a [`Usci`] is held in reset.
///
/// Dropping the token leaves the engine held; call [`ResetHold::release`] to
/// start it.
#[must_use]
pub struct ResetHold<'a> {
    usci: &'a Usci,
}

impl ResetHold<'_> {
    /// Write the raw UCxCTL0 mode byte.
    pub fn set_control0(&self, value: u8) {
        self.usci.ctl0.set(value);
    }

    pub fn set_clock_source(&self, source: UsciClockSource) {
        self.usci.ctl1.modify(match source {
            UsciClockSource::Uclk => UCxCTL1::UCSSEL::UCLK,
            UsciClockSource::Aclk => UCxCTL1::UCSSEL::ACLK,
            UsciClockSource::Smclk => UCxCTL1::UCSSEL::SMCLK,
        });
    }

    /// Write the 16-bit prescaler, low byte first.
    pub fn set_baud_divisor(&self, divisor: u16) {
        let [low, high] = divisor.to_le_bytes();
        self.usci.br0.set(low);
        self.usci.br1.set(high);
    }

    /// Write UCAxMCTL. Returns `NOSUPPORT` on USCI_B, which has none.
    pub fn set_modulation(&self, modulation: u8) -> Result<(), ErrorCode> {
        let mctl: StaticRef<ReadWrite<u8>> = self
            .usci
            .register(Role::Modulation)
            .ok_or(ErrorCode::NOSUPPORT)?;
        mctl.set(modulation);
        Ok(())
    }

    /// Write UCBxI2COA, keeping only the address and general-call bits.
    /// Returns `NOSUPPORT` on USCI_A.
    pub fn set_i2c_own_address(&self, address: u16) -> Result<(), ErrorCode> {
        let oa: StaticRef<ReadWrite<u16>> = self
            .usci
            .register(Role::I2cOwnAddress)
            .ok_or(ErrorCode::NOSUPPORT)?;
        oa.set(address & 0x83FF);
        Ok(())
    }

    /// Write UCBxI2CSA. Returns `NOSUPPORT` on USCI_A.
    pub fn set_i2c_slave_address(&self, address: u16) -> Result<(), ErrorCode> {
        let sa: StaticRef<ReadWrite<u16>> = self
            .usci
            .register(Role::I2cSlaveAddress)
            .ok_or(ErrorCode::NOSUPPORT)?;
        sa.set(address & 0x03FF);
        Ok(())
    }

    pub fn release(self) {
        self.usci.enable_module();
    }
}

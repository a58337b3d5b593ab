// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! SPI mode of USCI_A or USCI_B.
//!
//! The mode, character format and clock encodings are the UCxCTL0 bit
//! patterns and are written unchanged. Chip select handling is up to the
//! caller, through a GPIO [`PinGroup`](crate::gpio::PinGroup) in 3-pin mode.

use kernel::utilities::poll::PollBudget;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable};
use kernel::utilities::registers::{register_bitfields, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use super::{Usci, UsciClockSource};
use crate::register_table::Role;

/// UCSYNC, selects the synchronous (SPI) mode.
const UCSYNC: u8 = 0x01;

register_bitfields! [u8,
    UCxSTAT [
        /// Loopback, TX is fed back into RX
        UCLISTEN OFFSET(7) NUMBITS(1) [],
        /// Framing error, bus conflict in 4-pin master mode
        UCFE OFFSET(6) NUMBITS(1) [],
        /// Overrun error
        UCOE OFFSET(5) NUMBITS(1) [],
        UCBUSY OFFSET(0) NUMBITS(1) []
    ]
];

/// Master/slave and STE pin configuration (UCMST and UCMODEx).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SpiMode {
    Master3Pin = 0x08,
    Slave3Pin = 0x00,
    Master4PinActiveLow = 0x0C,
    Master4PinActiveHigh = 0x0A,
    Slave4PinActiveLow = 0x04,
    Slave4PinActiveHigh = 0x02,
}

/// Bit order and character length (UCMSB and UC7BIT).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SpiCharacterFormat {
    Lsb8Bit = 0x00,
    Lsb7Bit = 0x10,
    Msb8Bit = 0x20,
    Msb7Bit = 0x30,
}

/// Clock phase and polarity (UCCKPH and UCCKPL).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SpiClockMode {
    ActiveHighLeadingEdge = 0x00,
    ActiveHighTrailingEdge = 0x80,
    ActiveLowLeadingEdge = 0x40,
    ActiveLowTrailingEdge = 0xC0,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpiConfig {
    pub mode: SpiMode,
    pub format: SpiCharacterFormat,
    pub clock_mode: SpiClockMode,
    pub clock_source: UsciClockSource,
    /// BRCLK divider, 0 and 1 both mean no division
    pub prescaler: u16,
}

impl Default for SpiConfig {
    fn default() -> Self {
        SpiConfig {
            mode: SpiMode::Master3Pin,
            format: SpiCharacterFormat::Msb8Bit,
            clock_mode: SpiClockMode::ActiveHighLeadingEdge,
            clock_source: UsciClockSource::Uclk,
            prescaler: 1,
        }
    }
}

pub struct Spi {
    usci: Usci,
    stat: StaticRef<ReadWrite<u8, UCxSTAT::Register>>,
    budget: PollBudget,
}

impl Spi {
    pub fn new(usci: Usci) -> Spi {
        Spi {
            stat: usci.required(Role::Status),
            usci,
            budget: PollBudget::default(),
        }
    }

    pub fn usci(&self) -> &Usci {
        &self.usci
    }

    pub fn set_poll_budget(&mut self, budget: PollBudget) {
        self.budget = budget;
    }

    /// Configure and start the engine.
    pub fn init(&self, config: &SpiConfig) {
        let hold = self.usci.hold();
        hold.set_control0(
            config.clock_mode as u8 | config.format as u8 | config.mode as u8 | UCSYNC,
        );
        hold.set_clock_source(config.clock_source);
        hold.set_baud_divisor(config.prescaler);
        hold.release();
    }

    pub fn enable(&self) {
        self.usci.enable_module();
    }

    pub fn disable(&self) {
        self.usci.disable_module();
    }

    /// Wait for room in the transmit buffer, then queue `byte`.
    pub fn send_byte(&self, byte: u8) -> Result<(), ErrorCode> {
        self.usci.wait_tx_ready(self.budget)?;
        self.usci.write_tx_buffer(byte);
        Ok(())
    }

    /// Wait for a received character and return it.
    pub fn read_byte(&self) -> Result<u8, ErrorCode> {
        self.usci.wait_rx_ready(self.budget)?;
        Ok(self.usci.read_rx_buffer())
    }

    /// Clock `byte` out and return the byte clocked in at the same time.
    pub fn transfer_byte(&self, byte: u8) -> Result<u8, ErrorCode> {
        self.send_byte(byte)?;
        self.read_byte()
    }

    /// Send `data`, discarding whatever is clocked in.
    pub fn write(&self, data: &[u8]) -> Result<(), ErrorCode> {
        data.iter().try_for_each(|&byte| self.send_byte(byte))
    }

    /// Full-duplex transfer of `tx.len().min(rx.len())` bytes.
    pub fn transfer(&self, tx: &[u8], rx: &mut [u8]) -> Result<(), ErrorCode> {
        for (out, inp) in tx.iter().zip(rx.iter_mut()) {
            *inp = self.transfer_byte(*out)?;
        }
        Ok(())
    }

    pub fn enable_loopback(&self) {
        self.stat.modify(UCxSTAT::UCLISTEN::SET);
    }

    pub fn disable_loopback(&self) {
        self.stat.modify(UCxSTAT::UCLISTEN::CLEAR);
    }

    pub fn loopback(&self) -> bool {
        self.stat.is_set(UCxSTAT::UCLISTEN)
    }

    pub fn read_framing_error(&self) -> bool {
        self.stat.is_set(UCxSTAT::UCFE)
    }

    /// Read and clear the framing error flag.
    pub fn framing_error(&self) -> bool {
        let error = self.read_framing_error();
        self.stat.modify(UCxSTAT::UCFE::CLEAR);
        error
    }

    pub fn read_overrun_error(&self) -> bool {
        self.stat.is_set(UCxSTAT::UCOE)
    }

    /// Cleared by hardware when RXBUF is read.
    pub fn overrun_error(&self) -> bool {
        self.read_overrun_error()
    }

    pub fn busy(&self) -> bool {
        self.stat.is_set(UCxSTAT::UCBUSY)
    }
}

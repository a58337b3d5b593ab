// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! UART mode of USCI_A.
//!
//! Configuration computes the baud divisor and modulation byte, writes the
//! frame format and leaves the engine held; [`Uart::enable`] starts it. Data
//! can either be moved with the blocking `transmit`/`receive_byte` calls or,
//! for reception, from the RX interrupt handler into a [`ByteRingBuffer`].

use kernel::collections::ring_buffer::ByteRingBuffer;
use kernel::utilities::poll::PollBudget;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use super::{Usci, UsciClockSource, UsciModule};
use crate::register_table::Role;

register_bitfields! [u8,
    UCAxCTL0 [
        /// Parity enable
        UCPEN OFFSET(7) NUMBITS(1) [],
        /// Parity select
        UCPAR OFFSET(6) NUMBITS(1) [
            Odd = 0,
            Even = 1
        ],
        /// MSB first
        UCMSB OFFSET(5) NUMBITS(1) [],
        /// 7-bit character length
        UC7BIT OFFSET(4) NUMBITS(1) [],
        /// Two stop bits
        UCSPB OFFSET(3) NUMBITS(1) [],
        UCMODE OFFSET(1) NUMBITS(2) [
            Uart = 0,
            IdleLineMultiprocessor = 1,
            AddressBitMultiprocessor = 2,
            AutomaticBaudRateDetection = 3
        ],
        /// Synchronous mode, always clear for UART
        UCSYNC OFFSET(0) NUMBITS(1) []
    ],
    UCAxCTL1 [
        /// Receive erroneous-character interrupt enable
        UCRXEIE OFFSET(5) NUMBITS(1) [],
        /// Receive break character interrupt enable
        UCBRKIE OFFSET(4) NUMBITS(1) []
    ],
    UCAxSTAT [
        /// Loopback enable
        UCLISTEN OFFSET(7) NUMBITS(1) [],
        /// Framing error
        UCFE OFFSET(6) NUMBITS(1) [],
        /// Overrun error
        UCOE OFFSET(5) NUMBITS(1) [],
        /// Parity error
        UCPE OFFSET(4) NUMBITS(1) [],
        /// Break detect
        UCBRK OFFSET(3) NUMBITS(1) [],
        /// Receive error
        UCRXERR OFFSET(2) NUMBITS(1) [],
        /// Address received / idle line detected
        UCADDR OFFSET(1) NUMBITS(1) [],
        UCBUSY OFFSET(0) NUMBITS(1) []
    ]
];

/// Integer divisor and modulation settings for one clock/baud pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaudDescriptor {
    pub divisor: u16,
    /// Second modulation stage, 0-7
    pub brs: u8,
    /// First modulation stage, 0-15, only used with oversampling
    pub brf: u8,
    pub oversampling: bool,
}

/// `round(numerator / denominator)` with ties away from zero.
fn div_round(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

impl BaudDescriptor {
    /// Derive the settings for `baud` from a BRCLK of `clock_hz`.
    ///
    /// Oversampling is only used if requested and BRCLK is at least 16
    /// times the baud rate. Fails with `INVAL` for a zero baud rate or a
    /// clock slower than the baud rate, and with `SIZE` if the divisor does
    /// not fit in UCAxBR0/UCAxBR1.
    pub fn compute(
        clock_hz: u32,
        baud: u32,
        oversampling: bool,
    ) -> Result<BaudDescriptor, ErrorCode> {
        if baud == 0 {
            return Err(ErrorCode::INVAL);
        }
        let clock = u64::from(clock_hz);
        let baud = u64::from(baud);

        let brs = div_round(8 * (clock % baud), baud).min(7) as u8;
        let oversampling = oversampling && clock >= 16 * baud;
        let (divisor, brf) = if oversampling {
            let divisor = clock / (16 * baud);
            let brf = div_round(clock % (16 * baud), baud).min(15) as u8;
            (divisor, brf)
        } else {
            (clock / baud, 0)
        };

        if divisor == 0 {
            return Err(ErrorCode::INVAL);
        }
        let divisor = u16::try_from(divisor).map_err(|_| ErrorCode::SIZE)?;

        Ok(BaudDescriptor {
            divisor,
            brs,
            brf,
            oversampling,
        })
    }

    /// UCAxMCTL content: `brf << 4 | brs << 3 | oversampling`.
    pub fn modulation_byte(&self) -> u8 {
        (self.brf << 4) | (self.brs << 3) | u8::from(self.oversampling)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BitOrder {
    LsbFirst,
    MsbFirst,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UartMode {
    Uart,
    IdleLineMultiprocessor,
    AddressBitMultiprocessor,
    AutomaticBaudRateDetection,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartConfig {
    pub baud_rate: u32,
    /// Frequency of the selected BRCLK source
    pub clock_hz: u32,
    pub clock_source: UsciClockSource,
    pub oversampling: bool,
    pub parity: Parity,
    pub bit_order: BitOrder,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub mode: UartMode,
}

impl UartConfig {
    /// 8N1, LSB first, no oversampling.
    pub const fn new(baud_rate: u32, clock_hz: u32, clock_source: UsciClockSource) -> UartConfig {
        UartConfig {
            baud_rate,
            clock_hz,
            clock_source,
            oversampling: false,
            parity: Parity::None,
            bit_order: BitOrder::LsbFirst,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            mode: UartMode::Uart,
        }
    }
}

pub struct Uart {
    usci: Usci,
    ctl0: StaticRef<ReadWrite<u8, UCAxCTL0::Register>>,
    ctl1: StaticRef<ReadWrite<u8, UCAxCTL1::Register>>,
    stat: StaticRef<ReadWrite<u8, UCAxSTAT::Register>>,
    budget: PollBudget,
}

impl Uart {
    /// UART mode exists on USCI_A only; other engines give `INVAL`.
    pub fn new(usci: Usci) -> Result<Uart, ErrorCode> {
        if usci.module() != UsciModule::A {
            return Err(ErrorCode::INVAL);
        }
        Ok(Uart {
            ctl0: usci.required(Role::Control0),
            ctl1: usci.required(Role::Control1),
            stat: usci.required(Role::Status),
            usci,
            budget: PollBudget::default(),
        })
    }

    pub fn usci(&self) -> &Usci {
        &self.usci
    }

    /// Budget used by the blocking transfer calls.
    pub fn set_poll_budget(&mut self, budget: PollBudget) {
        self.budget = budget;
    }

    /// Hold the engine and write frame format, clock source, divisor and
    /// modulation. The engine stays held until [`Uart::enable`].
    pub fn configure(&self, config: &UartConfig) -> Result<(), ErrorCode> {
        let baud = BaudDescriptor::compute(config.clock_hz, config.baud_rate, config.oversampling)?;

        let hold = self.usci.hold();
        self.ctl0.write(
            match config.parity {
                Parity::None => UCAxCTL0::UCPEN::CLEAR,
                Parity::Odd => UCAxCTL0::UCPEN::SET + UCAxCTL0::UCPAR::Odd,
                Parity::Even => UCAxCTL0::UCPEN::SET + UCAxCTL0::UCPAR::Even,
            } + match config.bit_order {
                BitOrder::LsbFirst => UCAxCTL0::UCMSB::CLEAR,
                BitOrder::MsbFirst => UCAxCTL0::UCMSB::SET,
            } + match config.data_bits {
                DataBits::Seven => UCAxCTL0::UC7BIT::SET,
                DataBits::Eight => UCAxCTL0::UC7BIT::CLEAR,
            } + match config.stop_bits {
                StopBits::One => UCAxCTL0::UCSPB::CLEAR,
                StopBits::Two => UCAxCTL0::UCSPB::SET,
            } + match config.mode {
                UartMode::Uart => UCAxCTL0::UCMODE::Uart,
                UartMode::IdleLineMultiprocessor => UCAxCTL0::UCMODE::IdleLineMultiprocessor,
                UartMode::AddressBitMultiprocessor => UCAxCTL0::UCMODE::AddressBitMultiprocessor,
                UartMode::AutomaticBaudRateDetection => {
                    UCAxCTL0::UCMODE::AutomaticBaudRateDetection
                }
            } + UCAxCTL0::UCSYNC::CLEAR,
        );
        hold.set_clock_source(config.clock_source);
        hold.set_baud_divisor(baud.divisor);
        hold.set_modulation(baud.modulation_byte())?;

        log::debug!(
            "uart{}: {} baud, divisor {}, modulation {:#04x}",
            self.usci.instance(),
            config.baud_rate,
            baud.divisor,
            baud.modulation_byte()
        );
        Ok(())
    }

    pub fn enable(&self) {
        self.usci.enable_module();
    }

    pub fn disable(&self) {
        self.usci.disable_module();
    }

    pub fn enable_erroneous_character_interrupt(&self) {
        self.ctl1.modify(UCAxCTL1::UCRXEIE::SET);
    }

    pub fn disable_erroneous_character_interrupt(&self) {
        self.ctl1.modify(UCAxCTL1::UCRXEIE::CLEAR);
    }

    pub fn enable_break_character_interrupt(&self) {
        self.ctl1.modify(UCAxCTL1::UCBRKIE::SET);
    }

    pub fn disable_break_character_interrupt(&self) {
        self.ctl1.modify(UCAxCTL1::UCBRKIE::CLEAR);
    }

    pub fn read_framing_error(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCFE)
    }

    /// Read and clear the framing error flag.
    pub fn framing_error(&self) -> bool {
        let error = self.read_framing_error();
        self.stat.modify(UCAxSTAT::UCFE::CLEAR);
        error
    }

    pub fn read_overrun_error(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCOE)
    }

    /// The overrun flag cannot be cleared by software, reading RXBUF does.
    pub fn overrun_error(&self) -> bool {
        self.read_overrun_error()
    }

    pub fn read_parity_error(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCPE)
    }

    /// Read and clear the parity error flag.
    pub fn parity_error(&self) -> bool {
        let error = self.read_parity_error();
        self.stat.modify(UCAxSTAT::UCPE::CLEAR);
        error
    }

    pub fn receive_error(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCRXERR)
    }

    pub fn break_detected(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCBRK)
    }

    pub fn busy(&self) -> bool {
        self.stat.is_set(UCAxSTAT::UCBUSY)
    }

    pub fn transmit_byte(&self, byte: u8) -> Result<(), ErrorCode> {
        self.usci.wait_tx_ready(self.budget)?;
        self.usci.write_tx_buffer(byte);
        Ok(())
    }

    pub fn transmit(&self, data: &[u8]) -> Result<(), ErrorCode> {
        data.iter().try_for_each(|&byte| self.transmit_byte(byte))
    }

    pub fn receive_byte(&self) -> Result<u8, ErrorCode> {
        self.usci.wait_rx_ready(self.budget)?;
        Ok(self.usci.read_rx_buffer())
    }

    /// Move the received character into `buffer`. Call from the RX
    /// interrupt handler.
    pub fn handle_receive_interrupt<const N: usize>(&self, buffer: &mut ByteRingBuffer<N>) {
        buffer.insert(self.usci.read_rx_buffer());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_table::PeripheralKind::{UsciA, UsciInterrupt};
    use crate::testing::FakeChip;

    #[test]
    fn baud_1mhz_9600() {
        let baud = BaudDescriptor::compute(1_000_000, 9600, false).unwrap();
        assert_eq!(
            baud,
            BaudDescriptor {
                divisor: 104,
                brs: 1,
                brf: 0,
                oversampling: false
            }
        );
        assert_eq!(baud.modulation_byte(), 0x08);
    }

    #[test]
    fn baud_16mhz_115200_oversampled() {
        let baud = BaudDescriptor::compute(16_000_000, 115_200, true).unwrap();
        assert_eq!(baud.divisor, 8);
        assert_eq!(baud.brf, 11);
        assert_eq!(baud.brs, 7);
        assert!(baud.oversampling);
        assert_eq!(baud.modulation_byte(), 0xB9);
    }

    #[test]
    fn oversampling_needs_factor_of_sixteen() {
        let baud = BaudDescriptor::compute(1_000_000, 115_200, true).unwrap();
        assert_eq!(baud.divisor, 8);
        assert_eq!(baud.brs, 5);
        assert_eq!(baud.brf, 0);
        assert!(!baud.oversampling);
    }

    #[test]
    fn exact_division_has_no_modulation() {
        let baud = BaudDescriptor::compute(32_768, 4096, false).unwrap();
        assert_eq!(baud.divisor, 8);
        assert_eq!(baud.modulation_byte(), 0);
    }

    #[test]
    fn unusable_rates_are_rejected() {
        assert_eq!(BaudDescriptor::compute(1_000_000, 0, false), Err(ErrorCode::INVAL));
        assert_eq!(BaudDescriptor::compute(9600, 115_200, false), Err(ErrorCode::INVAL));
        assert_eq!(BaudDescriptor::compute(16_000_000, 100, false), Err(ErrorCode::SIZE));
    }

    #[test]
    fn uart_needs_usci_a() {
        let chip = FakeChip::new();
        assert!(Uart::new(Usci::new(chip.table, UsciModule::B, 0)).is_err());
    }

    #[test]
    fn configure_8n1() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();

        let config = UartConfig::new(9600, 1_000_000, UsciClockSource::Smclk);
        assert_eq!(uart.configure(&config), Ok(()));
        assert_eq!(chip.peek(UsciA, 0, Role::Control0), 0x00);
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x81);
        assert_eq!(chip.peek(UsciA, 0, Role::BaudLow), 104);
        assert_eq!(chip.peek(UsciA, 0, Role::BaudHigh), 0);
        assert_eq!(chip.peek(UsciA, 0, Role::Modulation), 0x08);
        assert!(uart.usci().is_held());

        uart.enable();
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x80);
    }

    #[test]
    fn configure_frame_format() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 1)).unwrap();

        let config = UartConfig {
            parity: Parity::Even,
            bit_order: BitOrder::MsbFirst,
            data_bits: DataBits::Seven,
            stop_bits: StopBits::Two,
            ..UartConfig::new(2400, 32_768, UsciClockSource::Aclk)
        };
        assert_eq!(uart.configure(&config), Ok(()));
        assert_eq!(chip.peek(UsciA, 1, Role::Control0), 0xF8);
        assert_eq!(chip.peek(UsciA, 1, Role::Control1), 0x41);
        assert_eq!(chip.peek(UsciA, 1, Role::BaudLow), 13);

        let config = UartConfig {
            parity: Parity::Odd,
            mode: UartMode::AddressBitMultiprocessor,
            ..config
        };
        assert_eq!(uart.configure(&config), Ok(()));
        assert_eq!(chip.peek(UsciA, 1, Role::Control0), 0xBC);
    }

    #[test]
    fn bad_rate_leaves_registers_alone() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();

        let config = UartConfig::new(0, 1_000_000, UsciClockSource::Smclk);
        assert_eq!(uart.configure(&config), Err(ErrorCode::INVAL));
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x00);
    }

    #[test]
    fn uart_interrupt_enables() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();

        uart.enable_erroneous_character_interrupt();
        uart.enable_break_character_interrupt();
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x30);
        uart.disable_erroneous_character_interrupt();
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x10);
        uart.disable_break_character_interrupt();
        assert_eq!(chip.peek(UsciA, 0, Role::Control1), 0x00);
    }

    #[test]
    fn error_flags() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();

        chip.poke(UsciA, 0, Role::Status, 0x75);
        assert!(uart.read_framing_error());
        assert!(uart.read_parity_error());
        assert!(uart.receive_error());
        assert!(uart.busy());
        assert!(!uart.break_detected());

        assert!(uart.framing_error());
        assert!(uart.parity_error());
        assert!(uart.overrun_error());
        assert!(!uart.read_framing_error());
        assert!(!uart.read_parity_error());
        // Overrun is left for the hardware to clear.
        assert_eq!(chip.peek(UsciA, 0, Role::Status), 0x25);
    }

    #[test]
    fn blocking_transfers() {
        let chip = FakeChip::new();
        let mut uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();
        uart.set_poll_budget(PollBudget::Retries(4));

        assert_eq!(uart.transmit_byte(0x41), Err(ErrorCode::BUSY));
        assert_eq!(uart.receive_byte(), Err(ErrorCode::BUSY));

        chip.poke(UsciInterrupt, 0, Role::InterruptFlag, 0x03);
        assert_eq!(uart.transmit(b"ok"), Ok(()));
        assert_eq!(chip.peek(UsciA, 0, Role::TxData), u16::from(b'k'));

        chip.poke(UsciA, 0, Role::RxData, 0x5A);
        assert_eq!(uart.receive_byte(), Ok(0x5A));
    }

    #[test]
    fn receive_interrupt_fills_buffer() {
        let chip = FakeChip::new();
        let uart = Uart::new(Usci::new(chip.table, UsciModule::A, 0)).unwrap();
        let mut buffer = ByteRingBuffer::<2>::new();

        for byte in [1u8, 2, 3] {
            chip.poke(UsciA, 0, Role::RxData, u16::from(byte));
            uart.handle_receive_interrupt(&mut buffer);
        }
        assert!(buffer.overflow());
        assert_eq!(buffer.get(), 2);
        assert_eq!(buffer.get(), 3);
        assert!(buffer.is_empty());
    }
}

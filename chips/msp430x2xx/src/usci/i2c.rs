// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! I2C mode of USCI_B.
//!
//! Two layers:
//!
//! - [`I2c`] is the register-level driver: addressing, direction, start and
//!   stop conditions and the data flags. Its operations make up the
//!   [`I2cHardware`] trait.
//! - [`BlockingI2cMaster`] runs complete master transactions on top of any
//!   `I2cHardware`, busy-waiting on the flags and staging received bytes in a
//!   [`ByteRingBuffer`].
//!
//! Reading a single byte needs special care: the stop condition has to be
//! requested while that byte is still being received, so the master issues
//! it as soon as the (repeated) start has gone out and only then waits for
//! the data.
//!
//! Usage
//! -----
//!
//! ```rust,ignore
//! let i2c = I2c::new(Usci::new(&REGISTER_TABLE, UsciModule::B, 0))?;
//! i2c.init(&I2cConfig {
//!     clock_source: UsciClockSource::Smclk,
//!     prescaler: 10,
//!     ..Default::default()
//! })?;
//! let mut master: BlockingI2cMaster<_, 16> = BlockingI2cMaster::new(i2c);
//! master.read_register(I2cAddress::SevenBit(0x1E), 0x03, 6)?;
//! let x_high = master.buffer_mut().get();
//! ```

use kernel::collections::ring_buffer::ByteRingBuffer;
use kernel::utilities::poll::PollBudget;
use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use super::{Usci, UsciClockSource, UsciModule};
use crate::register_table::Role;

register_bitfields! [u8,
    UCBxCTL0 [
        /// Own address is 10 bits
        UCA10 OFFSET(7) NUMBITS(1) [],
        /// Slave address is 10 bits
        UCSLA10 OFFSET(6) NUMBITS(1) [],
        /// Multi-master environment
        UCMM OFFSET(5) NUMBITS(1) [],
        /// Master mode
        UCMST OFFSET(3) NUMBITS(1) [],
        UCMODE OFFSET(1) NUMBITS(2) [
            I2c = 3
        ],
        UCSYNC OFFSET(0) NUMBITS(1) []
    ],
    UCBxCTL1 [
        /// Transmitter/receiver
        UCTR OFFSET(4) NUMBITS(1) [],
        /// Transmit a NACK
        UCTXNACK OFFSET(3) NUMBITS(1) [],
        /// Transmit a stop condition
        UCTXSTP OFFSET(2) NUMBITS(1) [],
        /// Transmit a start condition
        UCTXSTT OFFSET(1) NUMBITS(1) [],
        UCSWRST OFFSET(0) NUMBITS(1) []
    ],
    UCBxSTAT [
        /// SCL held low
        UCSCLLOW OFFSET(6) NUMBITS(1) [],
        /// General call address received
        UCGC OFFSET(5) NUMBITS(1) [],
        /// Bus busy
        UCBBUSY OFFSET(4) NUMBITS(1) [],
        UCNACKIFG OFFSET(3) NUMBITS(1) [],
        UCSTPIFG OFFSET(2) NUMBITS(1) [],
        UCSTTIFG OFFSET(1) NUMBITS(1) [],
        /// Arbitration lost
        UCALIFG OFFSET(0) NUMBITS(1) []
    ],
    UCBxI2CIE [
        UCNACKIE OFFSET(3) NUMBITS(1) [],
        UCSTPIE OFFSET(2) NUMBITS(1) [],
        UCSTTIE OFFSET(1) NUMBITS(1) [],
        UCALIE OFFSET(0) NUMBITS(1) []
    ]
];

/// General call response enable in UCBxI2COA.
const UCGCEN: u16 = 1 << 15;

/// A 7-bit or 10-bit bus address. Excess high bits are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum I2cAddress {
    SevenBit(u8),
    TenBit(u16),
}

impl I2cAddress {
    fn masked(self) -> u16 {
        match self {
            I2cAddress::SevenBit(address) => u16::from(address) & 0x7F,
            I2cAddress::TenBit(address) => address & 0x3FF,
        }
    }

    fn is_ten_bit(self) -> bool {
        matches!(self, I2cAddress::TenBit(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Transmit,
    Receive,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct I2cConfig {
    pub clock_source: UsciClockSource,
    /// SCL = BRCLK / prescaler
    pub prescaler: u16,
    pub master: bool,
    pub multi_master: bool,
    pub own_address: I2cAddress,
    /// Respond to the general call address in slave mode
    pub general_call: bool,
}

impl Default for I2cConfig {
    fn default() -> Self {
        I2cConfig {
            clock_source: UsciClockSource::Uclk,
            prescaler: 1,
            master: true,
            multi_master: false,
            own_address: I2cAddress::SevenBit(0),
            general_call: false,
        }
    }
}

/// Register-level operations a blocking master transaction is built from.
pub trait I2cHardware {
    /// Address `address` and switch to transmitter. Leaves the engine
    /// running.
    fn prepare_transmit(&self, address: I2cAddress) -> Result<(), ErrorCode>;

    /// Address `address` and switch to receiver. Leaves the engine running.
    fn prepare_receive(&self, address: I2cAddress) -> Result<(), ErrorCode>;

    /// Change direction without touching the address, before a repeated
    /// start.
    fn set_direction(&self, direction: Direction);

    fn generate_start_condition(&self);

    /// The start condition and address have not been sent yet.
    fn start_condition_pending(&self) -> bool;

    fn generate_stop_condition(&self);

    fn stop_condition_pending(&self) -> bool;

    /// The transmit buffer can take the next byte.
    fn transmit_ready(&self) -> bool;

    /// A received byte is waiting.
    fn receive_ready(&self) -> bool;

    fn write_byte(&self, byte: u8);

    fn read_byte(&self) -> u8;

    fn nack_received(&self) -> bool;

    fn arbitration_lost(&self) -> bool;
}

pub struct I2c {
    usci: Usci,
    ctl0: StaticRef<ReadWrite<u8, UCBxCTL0::Register>>,
    ctl1: StaticRef<ReadWrite<u8, UCBxCTL1::Register>>,
    stat: StaticRef<ReadWrite<u8, UCBxSTAT::Register>>,
    i2cie: StaticRef<ReadWrite<u8, UCBxI2CIE::Register>>,
}

impl I2c {
    /// I2C mode exists on USCI_B only; other engines give `INVAL`.
    pub fn new(usci: Usci) -> Result<I2c, ErrorCode> {
        if usci.module() != UsciModule::B {
            return Err(ErrorCode::INVAL);
        }
        Ok(I2c {
            ctl0: usci.required(Role::Control0),
            ctl1: usci.required(Role::Control1),
            stat: usci.required(Role::Status),
            i2cie: usci.required(Role::I2cInterruptEnable),
            usci,
        })
    }

    pub fn usci(&self) -> &Usci {
        &self.usci
    }

    /// Write mode, clock, prescaler and own address. The engine stays held
    /// until the first `prepare_transmit`/`prepare_receive` or
    /// [`I2c::enable`].
    pub fn init(&self, config: &I2cConfig) -> Result<(), ErrorCode> {
        let hold = self.usci.hold();
        self.ctl0.write(
            UCBxCTL0::UCA10.val(u8::from(config.own_address.is_ten_bit()))
                + UCBxCTL0::UCMM.val(u8::from(config.multi_master))
                + UCBxCTL0::UCMST.val(u8::from(config.master))
                + UCBxCTL0::UCMODE::I2c
                + UCBxCTL0::UCSYNC::SET,
        );
        self.ctl1.write(UCBxCTL1::UCSWRST::SET);
        hold.set_clock_source(config.clock_source);

        let general_call = if config.general_call { UCGCEN } else { 0 };
        hold.set_i2c_own_address(config.own_address.masked() | general_call)?;
        hold.set_baud_divisor(config.prescaler);
        Ok(())
    }

    pub fn enable(&self) {
        self.usci.enable_module();
    }

    pub fn disable(&self) {
        self.usci.disable_module();
    }

    fn prepare(&self, address: I2cAddress, direction: Direction) -> Result<(), ErrorCode> {
        let hold = self.usci.hold();
        self.ctl0
            .modify(UCBxCTL0::UCSLA10.val(u8::from(address.is_ten_bit())));
        hold.set_i2c_slave_address(address.masked())?;
        self.set_direction(direction);
        hold.release();
        Ok(())
    }

    pub fn bus_busy(&self) -> bool {
        self.stat.is_set(UCBxSTAT::UCBBUSY)
    }

    pub fn clear_nack(&self) {
        self.stat.modify(UCBxSTAT::UCNACKIFG::CLEAR);
    }

    pub fn clear_arbitration_lost(&self) {
        self.stat.modify(UCBxSTAT::UCALIFG::CLEAR);
    }

    pub fn enable_nack_interrupt(&self) {
        self.i2cie.modify(UCBxI2CIE::UCNACKIE::SET);
    }

    pub fn disable_nack_interrupt(&self) {
        self.i2cie.modify(UCBxI2CIE::UCNACKIE::CLEAR);
    }

    pub fn enable_arbitration_lost_interrupt(&self) {
        self.i2cie.modify(UCBxI2CIE::UCALIE::SET);
    }

    pub fn disable_arbitration_lost_interrupt(&self) {
        self.i2cie.modify(UCBxI2CIE::UCALIE::CLEAR);
    }
}

impl I2cHardware for I2c {
    fn prepare_transmit(&self, address: I2cAddress) -> Result<(), ErrorCode> {
        self.prepare(address, Direction::Transmit)
    }

    fn prepare_receive(&self, address: I2cAddress) -> Result<(), ErrorCode> {
        self.prepare(address, Direction::Receive)
    }

    fn set_direction(&self, direction: Direction) {
        self.ctl1.modify(match direction {
            Direction::Transmit => UCBxCTL1::UCTR::SET,
            Direction::Receive => UCBxCTL1::UCTR::CLEAR,
        });
    }

    fn generate_start_condition(&self) {
        self.ctl1.modify(UCBxCTL1::UCTXSTT::SET);
    }

    fn start_condition_pending(&self) -> bool {
        self.ctl1.is_set(UCBxCTL1::UCTXSTT)
    }

    fn generate_stop_condition(&self) {
        self.ctl1.modify(UCBxCTL1::UCTXSTP::SET);
    }

    fn stop_condition_pending(&self) -> bool {
        self.ctl1.is_set(UCBxCTL1::UCTXSTP)
    }

    fn transmit_ready(&self) -> bool {
        self.usci.is_tx_interrupt_pending()
    }

    fn receive_ready(&self) -> bool {
        self.usci.is_rx_interrupt_pending()
    }

    fn write_byte(&self, byte: u8) {
        self.usci.write_tx_buffer(byte);
    }

    fn read_byte(&self) -> u8 {
        self.usci.read_rx_buffer()
    }

    fn nack_received(&self) -> bool {
        self.stat.is_set(UCBxSTAT::UCNACKIFG)
    }

    fn arbitration_lost(&self) -> bool {
        self.stat.is_set(UCBxSTAT::UCALIFG)
    }
}

/// Master transactions that busy-wait on the hardware flags.
///
/// Received bytes are appended to an internal buffer of `N` bytes; callers
/// drain it through [`BlockingI2cMaster::buffer_mut`]. If more than `N`
/// unread bytes arrive, the oldest are dropped and the buffer's overflow
/// flag is set.
pub struct BlockingI2cMaster<H: I2cHardware, const N: usize> {
    hardware: H,
    buffer: ByteRingBuffer<N>,
    budget: PollBudget,
}

impl<H: I2cHardware, const N: usize> BlockingI2cMaster<H, N> {
    pub fn new(hardware: H) -> Self {
        BlockingI2cMaster {
            hardware,
            buffer: ByteRingBuffer::new(),
            budget: PollBudget::default(),
        }
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn set_poll_budget(&mut self, budget: PollBudget) {
        self.budget = budget;
    }

    pub fn buffer(&self) -> &ByteRingBuffer<N> {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ByteRingBuffer<N> {
        &mut self.buffer
    }

    fn check_nack(&self) -> Result<(), ErrorCode> {
        if self.hardware.nack_received() {
            log::warn!("i2c: transfer not acknowledged");
            return Err(ErrorCode::NOACK);
        }
        Ok(())
    }

    /// Release the bus with a stop condition if `result` is an error.
    ///
    /// Every failure after the start condition has been requested goes
    /// through here, so a NACK and a poll timeout leave the bus alike.
    fn stop_on_error<T>(&self, result: Result<T, ErrorCode>) -> Result<T, ErrorCode> {
        if result.is_err() {
            self.hardware.generate_stop_condition();
        }
        result
    }

    fn wait_transmit_ready(&self) -> Result<(), ErrorCode> {
        let hw = &self.hardware;
        self.budget.poll_until(|| hw.transmit_ready() || hw.nack_received())?;
        self.check_nack()
    }

    fn send(&self, byte: u8) -> Result<(), ErrorCode> {
        self.wait_transmit_ready()?;
        self.hardware.write_byte(byte);
        Ok(())
    }

    fn send_all(&self, data: &[u8]) -> Result<(), ErrorCode> {
        data.iter().try_for_each(|&byte| self.send(byte))
    }

    fn receive(&mut self) -> Result<(), ErrorCode> {
        let hw = &self.hardware;
        self.budget.poll_until(|| hw.receive_ready() || hw.nack_received())?;
        self.check_nack()?;
        self.buffer.insert(self.hardware.read_byte());
        Ok(())
    }

    /// Receive `count` bytes after the start condition has been requested.
    fn receive_sequence(&mut self, count: usize) -> Result<(), ErrorCode> {
        match count {
            0 => {
                self.hardware.generate_stop_condition();
                Ok(())
            }
            1 => {
                let hw = &self.hardware;
                self.budget.poll_until(|| !hw.start_condition_pending())?;
                self.hardware.generate_stop_condition();
                self.receive()
            }
            _ => {
                for index in 0..count {
                    if index == count - 1 {
                        self.hardware.generate_stop_condition();
                    }
                    self.receive()?;
                }
                Ok(())
            }
        }
    }

    /// Send the register index, then turn the bus around with a repeated
    /// start.
    fn select_register_for_read(&self, register: u8) -> Result<(), ErrorCode> {
        self.send(register)?;
        self.wait_transmit_ready()?;
        self.hardware.set_direction(Direction::Receive);
        self.hardware.generate_start_condition();
        Ok(())
    }

    fn start_transmit(&self, address: I2cAddress) -> Result<(), ErrorCode> {
        self.hardware.prepare_transmit(address)?;
        self.hardware.generate_start_condition();
        Ok(())
    }

    pub fn write_byte(&mut self, address: I2cAddress, byte: u8) -> Result<(), ErrorCode> {
        self.write_bytes(address, &[byte])
    }

    pub fn write_bytes(&mut self, address: I2cAddress, data: &[u8]) -> Result<(), ErrorCode> {
        self.start_transmit(address)?;
        let result = self.send_all(data);
        self.hardware.generate_stop_condition();
        result
    }

    /// Send `word` low byte first.
    pub fn write_word(&mut self, address: I2cAddress, word: u16) -> Result<(), ErrorCode> {
        self.write_bytes(address, &word.to_le_bytes())
    }

    /// Address the slave and send the start condition. Follow with
    /// [`burst_write`](Self::burst_write) calls and finish with
    /// [`stop_burst_write`](Self::stop_burst_write).
    pub fn start_burst_write(&mut self, address: I2cAddress) -> Result<(), ErrorCode> {
        self.start_transmit(address)
    }

    /// A failed byte ends the burst with a stop condition.
    pub fn burst_write(&mut self, byte: u8) -> Result<(), ErrorCode> {
        let result = self.send(byte);
        self.stop_on_error(result)
    }

    pub fn stop_burst_write(&mut self) -> Result<(), ErrorCode> {
        self.hardware.generate_stop_condition();
        Ok(())
    }

    /// Write `data` to the slave's register `register`.
    pub fn write_register(
        &mut self,
        address: I2cAddress,
        register: u8,
        data: &[u8],
    ) -> Result<(), ErrorCode> {
        self.start_transmit(address)?;
        let result = self.send(register).and_then(|()| self.send_all(data));
        self.hardware.generate_stop_condition();
        result
    }

    /// Read `count` bytes starting at the slave's register `register` into
    /// the buffer, using a repeated start after the register byte.
    pub fn read_register(
        &mut self,
        address: I2cAddress,
        register: u8,
        count: usize,
    ) -> Result<(), ErrorCode> {
        self.start_transmit(address)?;
        let result = self
            .select_register_for_read(register)
            .and_then(|()| self.receive_sequence(count));
        self.stop_on_error(result)
    }

    /// Read `count` bytes from the slave into the buffer.
    pub fn read_bytes(&mut self, address: I2cAddress, count: usize) -> Result<(), ErrorCode> {
        self.hardware.prepare_receive(address)?;
        self.hardware.generate_start_condition();
        let result = self.receive_sequence(count);
        self.stop_on_error(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register_table::PeripheralKind::{UsciB, UsciInterrupt};
    use crate::testing::FakeChip;
    use core::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Event {
        PrepareTransmit(I2cAddress),
        PrepareReceive(I2cAddress),
        Direction(Direction),
        Start,
        StartPending,
        Stop,
        TxReady,
        RxReady,
        Write(u8),
        Read,
    }

    /// Records the operations a master performs. NACK queries are not
    /// recorded.
    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<Event>>,
        start_polls: Cell<u32>,
        tx_stuck: Cell<bool>,
        nack: Cell<bool>,
        rx: RefCell<VecDeque<u8>>,
    }

    impl Recorder {
        fn record(&self, event: Event) {
            self.events.borrow_mut().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.events.borrow().clone()
        }
    }

    impl I2cHardware for Recorder {
        fn prepare_transmit(&self, address: I2cAddress) -> Result<(), ErrorCode> {
            self.record(Event::PrepareTransmit(address));
            Ok(())
        }

        fn prepare_receive(&self, address: I2cAddress) -> Result<(), ErrorCode> {
            self.record(Event::PrepareReceive(address));
            Ok(())
        }

        fn set_direction(&self, direction: Direction) {
            self.record(Event::Direction(direction));
        }

        fn generate_start_condition(&self) {
            self.record(Event::Start);
        }

        fn start_condition_pending(&self) -> bool {
            self.record(Event::StartPending);
            let polls = self.start_polls.get();
            self.start_polls.set(polls.saturating_sub(1));
            polls > 0
        }

        fn generate_stop_condition(&self) {
            self.record(Event::Stop);
        }

        fn stop_condition_pending(&self) -> bool {
            false
        }

        fn transmit_ready(&self) -> bool {
            self.record(Event::TxReady);
            !self.tx_stuck.get()
        }

        fn receive_ready(&self) -> bool {
            self.record(Event::RxReady);
            !self.rx.borrow().is_empty()
        }

        fn write_byte(&self, byte: u8) {
            self.record(Event::Write(byte));
        }

        fn read_byte(&self) -> u8 {
            self.record(Event::Read);
            self.rx.borrow_mut().pop_front().unwrap_or(0)
        }

        fn nack_received(&self) -> bool {
            self.nack.get()
        }

        fn arbitration_lost(&self) -> bool {
            false
        }
    }

    const SLAVE: I2cAddress = I2cAddress::SevenBit(0x50);

    fn master_with_rx(data: &[u8]) -> BlockingI2cMaster<Recorder, 8> {
        let recorder = Recorder::default();
        recorder.rx.borrow_mut().extend(data.iter().copied());
        BlockingI2cMaster::new(recorder)
    }

    #[test]
    fn single_byte_read_stops_before_receiving() {
        let mut master = master_with_rx(&[0x42]);
        master.hardware().start_polls.set(1);

        assert_eq!(master.read_register(SLAVE, 0x0F, 1), Ok(()));
        assert_eq!(
            master.hardware().events(),
            vec![
                Event::PrepareTransmit(SLAVE),
                Event::Start,
                Event::TxReady,
                Event::Write(0x0F),
                Event::TxReady,
                Event::Direction(Direction::Receive),
                Event::Start,
                Event::StartPending,
                Event::StartPending,
                Event::Stop,
                Event::RxReady,
                Event::Read,
            ]
        );
        assert_eq!(master.buffer_mut().get(), 0x42);
        assert!(master.buffer().is_empty());
    }

    #[test]
    fn multi_byte_read_stops_before_last_byte() {
        let mut master = master_with_rx(&[1, 2, 3]);

        assert_eq!(master.read_register(SLAVE, 0x28, 3), Ok(()));
        let events = master.hardware().events();
        assert_eq!(
            events[5..],
            [
                Event::Direction(Direction::Receive),
                Event::Start,
                Event::RxReady,
                Event::Read,
                Event::RxReady,
                Event::Read,
                Event::Stop,
                Event::RxReady,
                Event::Read,
            ]
        );
        let buffer = master.buffer_mut();
        assert_eq!([buffer.get(), buffer.get(), buffer.get()], [1, 2, 3]);
    }

    #[test]
    fn read_bytes_addresses_for_receive() {
        let address = I2cAddress::TenBit(0x2AB);
        let mut master = master_with_rx(&[9, 8]);

        assert_eq!(master.read_bytes(address, 2), Ok(()));
        assert_eq!(
            master.hardware().events(),
            vec![
                Event::PrepareReceive(address),
                Event::Start,
                Event::RxReady,
                Event::Read,
                Event::Stop,
                Event::RxReady,
                Event::Read,
            ]
        );
    }

    #[test]
    fn write_register_ends_with_stop() {
        let mut master = master_with_rx(&[]);

        assert_eq!(master.write_register(SLAVE, 0x20, &[0xAA, 0xBB]), Ok(()));
        assert_eq!(
            master.hardware().events(),
            vec![
                Event::PrepareTransmit(SLAVE),
                Event::Start,
                Event::TxReady,
                Event::Write(0x20),
                Event::TxReady,
                Event::Write(0xAA),
                Event::TxReady,
                Event::Write(0xBB),
                Event::Stop,
            ]
        );
    }

    #[test]
    fn word_is_sent_low_byte_first() {
        let mut master = master_with_rx(&[]);

        assert_eq!(master.write_word(SLAVE, 0x1234), Ok(()));
        let writes: Vec<Event> = master
            .hardware()
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Write(_)))
            .collect();
        assert_eq!(writes, vec![Event::Write(0x34), Event::Write(0x12)]);
    }

    #[test]
    fn burst_write() {
        let mut master = master_with_rx(&[]);

        assert_eq!(master.start_burst_write(SLAVE), Ok(()));
        assert_eq!(master.burst_write(7), Ok(()));
        assert_eq!(master.burst_write(8), Ok(()));
        assert_eq!(master.stop_burst_write(), Ok(()));
        assert_eq!(
            master.hardware().events(),
            vec![
                Event::PrepareTransmit(SLAVE),
                Event::Start,
                Event::TxReady,
                Event::Write(7),
                Event::TxReady,
                Event::Write(8),
                Event::Stop,
            ]
        );
    }

    #[test]
    fn nack_aborts_with_stop() {
        let mut master = master_with_rx(&[]);
        master.hardware().tx_stuck.set(true);
        master.hardware().nack.set(true);

        assert_eq!(master.write_byte(SLAVE, 1), Err(ErrorCode::NOACK));
        let events = master.hardware().events();
        assert_eq!(events.last(), Some(&Event::Stop));
        assert!(!events.contains(&Event::Write(1)));
    }

    #[test]
    fn silent_bus_times_out() {
        let mut master = master_with_rx(&[]);
        master.set_poll_budget(PollBudget::Retries(3));
        master.hardware().tx_stuck.set(true);

        assert_eq!(master.write_byte(SLAVE, 1), Err(ErrorCode::BUSY));
        assert_eq!(master.read_bytes(SLAVE, 2), Err(ErrorCode::BUSY));
        assert!(master.buffer().is_empty());
    }

    #[test]
    fn transmit_timeout_releases_bus() {
        let mut master = master_with_rx(&[]);
        master.set_poll_budget(PollBudget::Retries(3));
        master.hardware().tx_stuck.set(true);

        assert_eq!(master.write_bytes(SLAVE, &[1, 2]), Err(ErrorCode::BUSY));
        let events = master.hardware().events();
        assert_eq!(events.last(), Some(&Event::Stop));
        assert_eq!(events.iter().filter(|e| **e == Event::Stop).count(), 1);
        assert!(!events.contains(&Event::Write(1)));
    }

    #[test]
    fn start_wait_timeout_releases_bus() {
        let mut master = master_with_rx(&[0x42]);
        master.set_poll_budget(PollBudget::Retries(3));
        master.hardware().start_polls.set(100);

        assert_eq!(master.read_bytes(SLAVE, 1), Err(ErrorCode::BUSY));
        let events = master.hardware().events();
        assert_eq!(events.last(), Some(&Event::Stop));
        assert!(!events.contains(&Event::Read));
        assert!(master.buffer().is_empty());
    }

    #[test]
    fn register_select_timeout_releases_bus() {
        let mut master = master_with_rx(&[]);
        master.set_poll_budget(PollBudget::Retries(3));
        master.hardware().tx_stuck.set(true);

        assert_eq!(master.read_register(SLAVE, 0x0F, 2), Err(ErrorCode::BUSY));
        let events = master.hardware().events();
        assert_eq!(events.last(), Some(&Event::Stop));
        assert!(!events.contains(&Event::Direction(Direction::Receive)));
    }

    #[test]
    fn failed_burst_byte_releases_bus() {
        let mut master = master_with_rx(&[]);
        master.set_poll_budget(PollBudget::Retries(3));

        assert_eq!(master.start_burst_write(SLAVE), Ok(()));
        assert_eq!(master.burst_write(7), Ok(()));
        master.hardware().tx_stuck.set(true);
        assert_eq!(master.burst_write(8), Err(ErrorCode::BUSY));
        assert_eq!(master.hardware().events().last(), Some(&Event::Stop));
    }

    #[test]
    fn register_level_init() {
        let chip = FakeChip::new();
        let i2c = I2c::new(Usci::new(chip.table, UsciModule::B, 0)).unwrap();

        let config = I2cConfig {
            clock_source: UsciClockSource::Smclk,
            prescaler: 10,
            own_address: I2cAddress::SevenBit(0xC8),
            ..I2cConfig::default()
        };
        assert_eq!(i2c.init(&config), Ok(()));
        assert_eq!(chip.peek(UsciB, 0, Role::Control0), 0x0F);
        assert_eq!(chip.peek(UsciB, 0, Role::Control1), 0x81);
        assert_eq!(chip.peek(UsciB, 0, Role::I2cOwnAddress), 0x48);
        assert_eq!(chip.peek(UsciB, 0, Role::BaudLow), 10);
        assert!(i2c.usci().is_held());

        let config = I2cConfig {
            multi_master: true,
            own_address: I2cAddress::TenBit(0x7FF),
            general_call: true,
            ..config
        };
        assert_eq!(i2c.init(&config), Ok(()));
        assert_eq!(chip.peek(UsciB, 0, Role::Control0), 0xAF);
        assert_eq!(chip.peek(UsciB, 0, Role::I2cOwnAddress), 0x83FF);
    }

    #[test]
    fn i2c_needs_usci_b() {
        let chip = FakeChip::new();
        assert!(I2c::new(Usci::new(chip.table, UsciModule::A, 0)).is_err());
    }

    #[test]
    fn prepare_sets_address_mode_and_direction() {
        let chip = FakeChip::new();
        let i2c = I2c::new(Usci::new(chip.table, UsciModule::B, 1)).unwrap();
        i2c.init(&I2cConfig::default()).unwrap();

        assert_eq!(i2c.prepare_receive(I2cAddress::TenBit(0x2AB)), Ok(()));
        assert_eq!(chip.peek(UsciB, 1, Role::Control0) & 0x40, 0x40);
        assert_eq!(chip.peek(UsciB, 1, Role::I2cSlaveAddress), 0x2AB);
        assert_eq!(chip.peek(UsciB, 1, Role::Control1), 0x00);

        // The previous address must not leak into the new one.
        assert_eq!(i2c.prepare_transmit(I2cAddress::SevenBit(0x1E)), Ok(()));
        assert_eq!(chip.peek(UsciB, 1, Role::Control0) & 0x40, 0);
        assert_eq!(chip.peek(UsciB, 1, Role::I2cSlaveAddress), 0x1E);
        assert_eq!(chip.peek(UsciB, 1, Role::Control1), 0x10);
    }

    #[test]
    fn conditions_and_flags() {
        let chip = FakeChip::new();
        let i2c = I2c::new(Usci::new(chip.table, UsciModule::B, 0)).unwrap();

        i2c.generate_start_condition();
        assert!(i2c.start_condition_pending());
        assert!(!i2c.stop_condition_pending());
        i2c.generate_stop_condition();
        assert!(i2c.stop_condition_pending());
        assert_eq!(chip.peek(UsciB, 0, Role::Control1), 0x06);

        chip.poke(UsciB, 0, Role::Status, 0x19);
        assert!(i2c.bus_busy());
        assert!(i2c.nack_received());
        assert!(i2c.arbitration_lost());
        i2c.clear_nack();
        i2c.clear_arbitration_lost();
        assert_eq!(chip.peek(UsciB, 0, Role::Status), 0x10);

        chip.poke(UsciInterrupt, 0, Role::InterruptFlag, 0x04);
        assert!(i2c.receive_ready());
        assert!(!i2c.transmit_ready());

        i2c.enable_nack_interrupt();
        i2c.enable_arbitration_lost_interrupt();
        assert_eq!(chip.peek(UsciB, 0, Role::I2cInterruptEnable), 0x09);
        i2c.disable_nack_interrupt();
        i2c.disable_arbitration_lost_interrupt();
        assert_eq!(chip.peek(UsciB, 0, Role::I2cInterruptEnable), 0x00);
    }
}

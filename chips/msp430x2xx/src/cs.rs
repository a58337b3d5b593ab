// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Basic Clock Module+ (BCS+)
//!
//! Selects the sources and dividers of MCLK, SMCLK and ACLK, switches the
//! crystal oscillators and loads the factory DCO calibration constants.

use kernel::utilities::registers::interfaces::{ReadWriteable, Readable, Writeable};
use kernel::utilities::registers::{register_bitfields, ReadOnly, ReadWrite};
use kernel::utilities::StaticRef;
use kernel::ErrorCode;

use crate::register_table::{PeripheralKind, RegisterDescriptor, RegisterTable, Role};

register_bitfields! [u8,
    DCOCTL [
        /// DCO frequency select
        DCO OFFSET(5) NUMBITS(3) [],
        /// Modulator selection
        MOD OFFSET(0) NUMBITS(5) []
    ],
    BCSCTL1 [
        /// XT2 off. Set to turn the XT2 oscillator off.
        XT2OFF OFFSET(7) NUMBITS(1) [],
        /// LFXT1 mode select: low-frequency or high-frequency crystal
        XTS OFFSET(6) NUMBITS(1) [],
        /// ACLK divider
        DIVA OFFSET(4) NUMBITS(2) [],
        /// DCO range select
        RSEL OFFSET(0) NUMBITS(4) []
    ],
    BCSCTL2 [
        /// MCLK source select
        SELM OFFSET(6) NUMBITS(2) [
            DCOCLK = 0,
            XT2CLK = 2,
            LFXT1CLK = 3
        ],
        /// MCLK divider
        DIVM OFFSET(4) NUMBITS(2) [],
        /// SMCLK source select
        SELS OFFSET(3) NUMBITS(1) [
            DCOCLK = 0,
            XT2CLK = 1
        ],
        /// SMCLK divider
        DIVS OFFSET(1) NUMBITS(2) [],
        /// DCO resistor select
        DCOR OFFSET(0) NUMBITS(1) []
    ],
    BCSCTL3 [
        /// XT2 range select
        XT2S OFFSET(6) NUMBITS(2) [],
        /// Low-frequency clock select and LFXT1 range select
        LFXT1S OFFSET(4) NUMBITS(2) [],
        /// Oscillator capacitor selection
        XCAP OFFSET(2) NUMBITS(2) [],
        /// XT2 oscillator fault
        XT2OF OFFSET(1) NUMBITS(1) [],
        /// LFXT1 oscillator fault
        LFXT1OF OFFSET(0) NUMBITS(1) []
    ]
];

/// DCO frequencies the factory may have calibrated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibratedFrequency {
    Mhz1,
    Mhz8,
    Mhz12,
    Mhz16,
}

impl CalibratedFrequency {
    pub fn hz(self) -> u32 {
        match self {
            CalibratedFrequency::Mhz1 => 1_000_000,
            CalibratedFrequency::Mhz8 => 8_000_000,
            CalibratedFrequency::Mhz12 => 12_000_000,
            CalibratedFrequency::Mhz16 => 16_000_000,
        }
    }
}

/// Divider shared by MCLK, SMCLK and ACLK.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ClockDivider {
    DividedBy1 = 0,
    DividedBy2 = 1,
    DividedBy4 = 2,
    DividedBy8 = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MclkSource {
    Dco,
    Xt2,
    /// LFXT1 or VLO, depending on `Lfxt1Source`
    Lfxt1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SmclkSource {
    Dco,
    /// XT2 if present, LFXT1/VLO otherwise
    Xt2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Lfxt1Source {
    /// 32768 Hz crystal in low-frequency mode
    Crystal32k = 0,
    /// VLOCLK
    Vlo = 2,
    /// External digital clock
    External = 3,
}

/// Effective load capacitance for a low-frequency crystal on LFXT1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CrystalCapacitance {
    Pf1 = 0,
    Pf6 = 1,
    Pf10 = 2,
    Pf12_5 = 3,
}

/// Frequency range of a crystal on XT2 (or on LFXT1 in high-frequency mode).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CrystalRange {
    Mhz0_4To1 = 0,
    Mhz1To3 = 1,
    Mhz3To16 = 2,
    ExternalDigital = 3,
}

struct DcoCalibration {
    dco: Option<StaticRef<ReadOnly<u8>>>,
    bc1: Option<StaticRef<ReadOnly<u8>>>,
}

pub struct ClockModule {
    dcoctl: StaticRef<ReadWrite<u8, DCOCTL::Register>>,
    bcsctl1: StaticRef<ReadWrite<u8, BCSCTL1::Register>>,
    bcsctl2: StaticRef<ReadWrite<u8, BCSCTL2::Register>>,
    bcsctl3: StaticRef<ReadWrite<u8, BCSCTL3::Register>>,
    table: &'static RegisterTable,
}

impl ClockModule {
    pub fn new(table: &'static RegisterTable) -> ClockModule {
        let reg = |role| RegisterDescriptor::new(PeripheralKind::Clock, 0, role);
        ClockModule {
            dcoctl: table.required(reg(Role::DcoControl)),
            bcsctl1: table.required(reg(Role::BasicClockControl1)),
            bcsctl2: table.required(reg(Role::BasicClockControl2)),
            bcsctl3: table.required(reg(Role::BasicClockControl3)),
            table,
        }
    }

    fn calibration(&self, frequency: CalibratedFrequency) -> DcoCalibration {
        let reg = |role| RegisterDescriptor::new(PeripheralKind::Calibration, 0, role);
        DcoCalibration {
            dco: self.table.register(reg(Role::CalibrationDco(frequency))),
            bc1: self.table.register(reg(Role::CalibrationBc1(frequency))),
        }
    }

    /// Run the DCO at a factory-calibrated frequency.
    ///
    /// Loads the calibrated RSEL range into BCSCTL1 (clearing XT2OFF, XTS and
    /// DIVA as a side effect) and the DCO/MOD taps into DCOCTL.
    ///
    /// Returns `NOSUPPORT` if the variant has no calibration cell for
    /// `frequency` and `FAIL` if the cell has been erased.
    pub fn use_calibrated_dco(&self, frequency: CalibratedFrequency) -> Result<(), ErrorCode> {
        let calibration = self.calibration(frequency);
        let (dco, bc1) = match (calibration.dco, calibration.bc1) {
            (Some(dco), Some(bc1)) => (dco.get(), bc1.get()),
            _ => return Err(ErrorCode::NOSUPPORT),
        };
        if dco == 0xFF && bc1 == 0xFF {
            log::error!("cs: DCO calibration for {:?} is erased", frequency);
            return Err(ErrorCode::FAIL);
        }

        // Lowest tap first so the DCO never overshoots while RSEL changes.
        self.dcoctl.set(0);
        self.bcsctl1.set(bc1);
        self.dcoctl.set(dco);
        log::debug!("cs: DCO calibrated to {} Hz", frequency.hz());
        Ok(())
    }

    /// Select DCO range and taps by hand.
    pub fn set_dco(&self, range: u8, dco: u8, modulation: u8) {
        self.bcsctl1.modify(BCSCTL1::RSEL.val(range & 0x0f));
        self.dcoctl
            .write(DCOCTL::DCO.val(dco & 0x07) + DCOCTL::MOD.val(modulation & 0x1f));
    }

    pub fn select_mclk_source(&self, source: MclkSource) {
        self.bcsctl2.modify(match source {
            MclkSource::Dco => BCSCTL2::SELM::DCOCLK,
            MclkSource::Xt2 => BCSCTL2::SELM::XT2CLK,
            MclkSource::Lfxt1 => BCSCTL2::SELM::LFXT1CLK,
        });
    }

    pub fn set_mclk_divider(&self, divider: ClockDivider) {
        self.bcsctl2.modify(BCSCTL2::DIVM.val(divider as u8));
    }

    pub fn select_smclk_source(&self, source: SmclkSource) {
        self.bcsctl2.modify(match source {
            SmclkSource::Dco => BCSCTL2::SELS::DCOCLK,
            SmclkSource::Xt2 => BCSCTL2::SELS::XT2CLK,
        });
    }

    pub fn set_smclk_divider(&self, divider: ClockDivider) {
        self.bcsctl2.modify(BCSCTL2::DIVS.val(divider as u8));
    }

    pub fn set_aclk_divider(&self, divider: ClockDivider) {
        self.bcsctl1.modify(BCSCTL1::DIVA.val(divider as u8));
    }

    pub fn enable_xt2(&self) {
        self.bcsctl1.modify(BCSCTL1::XT2OFF::CLEAR);
    }

    pub fn disable_xt2(&self) {
        self.bcsctl1.modify(BCSCTL1::XT2OFF::SET);
    }

    pub fn set_xt2_range(&self, range: CrystalRange) {
        self.bcsctl3.modify(BCSCTL3::XT2S.val(range as u8));
    }

    /// Run LFXT1 as a low-frequency oscillator fed by `source`.
    pub fn set_lfxt1_low_frequency(&self, source: Lfxt1Source) {
        self.bcsctl1.modify(BCSCTL1::XTS::CLEAR);
        self.bcsctl3.modify(BCSCTL3::LFXT1S.val(source as u8));
    }

    /// Run LFXT1 with a high-frequency crystal or resonator.
    pub fn set_lfxt1_high_frequency(&self, range: CrystalRange) {
        self.bcsctl1.modify(BCSCTL1::XTS::SET);
        self.bcsctl3.modify(BCSCTL3::LFXT1S.val(range as u8));
    }

    pub fn set_lfxt1_capacitance(&self, capacitance: CrystalCapacitance) {
        self.bcsctl3.modify(BCSCTL3::XCAP.val(capacitance as u8));
    }

    pub fn lfxt1_fault(&self) -> bool {
        self.bcsctl3.is_set(BCSCTL3::LFXT1OF)
    }

    pub fn xt2_fault(&self) -> bool {
        self.bcsctl3.is_set(BCSCTL3::XT2OF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChip;
    use PeripheralKind::{Calibration, Clock};

    #[test]
    fn dividers_and_sources_touch_only_their_fields() {
        let chip = FakeChip::new();
        let cs = ClockModule::new(chip.table);

        cs.select_mclk_source(MclkSource::Lfxt1);
        cs.set_mclk_divider(ClockDivider::DividedBy2);
        cs.select_smclk_source(SmclkSource::Xt2);
        cs.set_smclk_divider(ClockDivider::DividedBy8);
        assert_eq!(chip.peek(Clock, 0, Role::BasicClockControl2), 0xC0 | 0x10 | 0x08 | 0x06);

        cs.select_mclk_source(MclkSource::Dco);
        assert_eq!(chip.peek(Clock, 0, Role::BasicClockControl2), 0x10 | 0x08 | 0x06);
    }

    #[test]
    fn aclk_and_crystals() {
        let chip = FakeChip::new();
        let cs = ClockModule::new(chip.table);

        cs.disable_xt2();
        cs.set_aclk_divider(ClockDivider::DividedBy4);
        assert_eq!(chip.peek(Clock, 0, Role::BasicClockControl1), 0x80 | 0x20);

        cs.set_lfxt1_low_frequency(Lfxt1Source::Vlo);
        cs.set_lfxt1_capacitance(CrystalCapacitance::Pf12_5);
        assert_eq!(chip.peek(Clock, 0, Role::BasicClockControl3), 0x20 | 0x0C);

        chip.poke(Clock, 0, Role::BasicClockControl3, 0x01);
        assert!(cs.lfxt1_fault());
        assert!(!cs.xt2_fault());
    }

    #[test]
    fn calibrated_dco_loads_factory_values() {
        let chip = FakeChip::new();
        let cs = ClockModule::new(chip.table);
        let mhz1 = CalibratedFrequency::Mhz1;
        chip.poke(Calibration, 0, Role::CalibrationBc1(mhz1), 0x86);
        chip.poke(Calibration, 0, Role::CalibrationDco(mhz1), 0xB4);

        assert_eq!(cs.use_calibrated_dco(mhz1), Ok(()));
        assert_eq!(chip.peek(Clock, 0, Role::BasicClockControl1), 0x86);
        assert_eq!(chip.peek(Clock, 0, Role::DcoControl), 0xB4);
    }

    #[test]
    fn calibrated_dco_missing_or_erased() {
        let chip = FakeChip::new();
        let cs = ClockModule::new(chip.table);

        assert_eq!(
            cs.use_calibrated_dco(CalibratedFrequency::Mhz8),
            Err(ErrorCode::NOSUPPORT)
        );

        let mhz16 = CalibratedFrequency::Mhz16;
        chip.poke(Calibration, 0, Role::CalibrationBc1(mhz16), 0xFF);
        chip.poke(Calibration, 0, Role::CalibrationDco(mhz16), 0xFF);
        chip.poke(Clock, 0, Role::DcoControl, 0x60);
        assert_eq!(cs.use_calibrated_dco(mhz16), Err(ErrorCode::FAIL));
        assert_eq!(chip.peek(Clock, 0, Role::DcoControl), 0x60);
    }
}

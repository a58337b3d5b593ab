// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Peripheral drivers for the MSP430x2xx family.
//!
//! The drivers in this crate are shared by every x2xx variant. They never
//! hard-code register addresses: each handle resolves its registers from a
//! [`RegisterTable`](register_table::RegisterTable) supplied by a variant
//! crate such as `msp430g2553`, and keeps the resolved references for the rest
//! of its life.

#![no_std]

#[cfg(test)]
extern crate std;

pub mod cs;
pub mod flash;
pub mod gpio;
pub mod register_table;
pub mod timer;
pub mod usci;
pub mod wdt;

#[cfg(test)]
mod testing;

// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Generic support for the MSP430 CPU core.

#![cfg_attr(target_arch = "msp430", feature(asm_experimental_arch))]
#![no_std]

#[cfg(all(test, not(target_arch = "msp430")))]
extern crate std;

pub mod interrupt;
pub mod support;

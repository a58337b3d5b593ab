// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Core types shared by the MSP430 architecture and chip crates.
//!
//! This crate holds the pieces that do not depend on a particular MSP430
//! variant: the common [`ErrorCode`] type, the register interface re-exports
//! and [`utilities::StaticRef`], the bounded busy-wait helper used by the
//! blocking serial drivers, and the byte ring buffer that stages data between
//! interrupt handlers and application code.
//!
//! Compile-time configuration is described in [`config`](crate::config).

#![no_std]
#![warn(unreachable_pub)]

pub mod collections;
pub mod errorcode;
pub mod utilities;

mod config;

pub use crate::errorcode::ErrorCode;

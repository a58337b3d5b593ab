// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Bounded busy-waiting on peripheral status flags.
//!
//! The blocking serial drivers spin on flags such as "transmit buffer ready"
//! or "start condition sent". A [`PollBudget`] decides how long such a spin
//! may last. With [`PollBudget::Unlimited`] a silent peripheral stalls the
//! caller forever; with [`PollBudget::Retries`] the wait ends in
//! `ErrorCode::BUSY`.

use crate::config::CONFIG;
use crate::ErrorCode;

/// How many times a status flag is re-checked before giving up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollBudget {
    /// Spin until the condition holds.
    Unlimited,
    /// Check once, then re-check at most this many times.
    Retries(u32),
}

impl Default for PollBudget {
    fn default() -> Self {
        CONFIG.default_poll_budget
    }
}

impl PollBudget {
    /// Spin until `ready` returns `true`.
    ///
    /// Returns `Err(ErrorCode::BUSY)` when a `Retries` budget runs out before
    /// the condition holds.
    pub fn poll_until<F: FnMut() -> bool>(self, mut ready: F) -> Result<(), ErrorCode> {
        match self {
            PollBudget::Unlimited => {
                while !ready() {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            PollBudget::Retries(retries) => {
                if ready() {
                    return Ok(());
                }
                for _ in 0..retries {
                    core::hint::spin_loop();
                    if ready() {
                        return Ok(());
                    }
                }
                if CONFIG.debug_poll_timeouts {
                    log::warn!("poll: condition not met after {} retries", retries);
                }
                Err(ErrorCode::BUSY)
            }
        }
    }
}

// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Data structure for storing compile-time configuration options.
//!
//! Options live in a typed `const` object rather than behind `#[cfg]` gates so
//! that every code path is type-checked regardless of the selected features.
//! After type-checking the compiler folds the constants, so a disabled option
//! costs nothing in the final image.
//!
//! The only place where Cargo features are consulted is the definition of
//! [`CONFIG`] at the end of this file.

use crate::utilities::poll::PollBudget;

/// Number of status polls allowed by the `bounded_polling` feature before a
/// blocking transfer gives up with `ErrorCode::BUSY`.
pub(crate) const BOUNDED_POLL_RETRIES: u32 = 50_000;

/// Data structure holding compile-time configuration options.
///
/// To change the configuration, enable the matching Cargo features on the
/// `kernel` dependency of the firmware crate.
pub(crate) struct Config {
    /// Whether an exhausted poll budget should be reported on the `log`
    /// facade.
    ///
    /// If enabled, every busy-wait that gives up emits a `warn!` record with
    /// the budget that was exhausted. Has no effect with an unlimited budget.
    pub(crate) debug_poll_timeouts: bool,

    /// Budget used by drivers that were not given one explicitly.
    // Unlimited polling reproduces the plain hardware behavior: a bus that
    // never answers stalls the caller.
    pub(crate) default_poll_budget: PollBudget,
}

/// A unique instance of `Config` where compile-time configuration options are
/// defined.
pub(crate) const CONFIG: Config = Config {
    debug_poll_timeouts: !cfg!(feature = "no_debug_poll_timeouts"),
    default_poll_budget: if cfg!(feature = "bounded_polling") {
        PollBudget::Retries(BOUNDED_POLL_RETRIES)
    } else {
        PollBudget::Unlimited
    },
};

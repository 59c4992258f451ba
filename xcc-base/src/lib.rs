// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Base types shared by contracts and by the host runtime executing them.
//!
//! Everything that crosses the boundary between a contract and the host lives here: amounts of
//! the native asset, account identifiers, requests to schedule calls on other contracts, the
//! outcome of a settled call, and the codec used to turn structured values into bytes.

#![deny(missing_docs)]

pub mod codec;
pub mod data_types;
pub mod identifiers;
pub mod promise;

#[doc(hidden)]
pub use bcs;
#[doc(hidden)]
pub use serde_json;

/// Returns early with the given error if the condition does not hold.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            return Err($e.into());
        }
    };
}

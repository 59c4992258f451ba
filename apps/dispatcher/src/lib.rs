// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Dispatcher Contract

The dispatcher relays calls to other contracts. Every dispatched call is answered by the result
of the relayed call, once the `dispatch_callback` scheduled after it has run. */

pub mod contract;
mod state;

use serde::{Deserialize, Serialize};
use xcc_base::data_types::Gas;

pub use self::{contract::Error, state::Dispatcher};

/// The gas reserved for a relayed call.
pub const INNER_GAS: Gas = Gas::new(500_000_000_000);

/// The gas reserved for the callback observing the result of a relayed call.
pub const CALLBACK_GAS: Gas = Gas::new(500_000_000_000);

/// The method the dispatcher schedules on itself after every relayed call.
pub const CALLBACK_METHOD: &str = "dispatch_callback";

/// The reason reported when a relayed call fails.
pub const DISPATCH_FAILED: &str = "dispatched call failed";

/// The arguments of the `dispatch_call` method.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DispatchCallArgs {
    /// The account of the called contract.
    pub account: String,
    /// The called method.
    pub method: String,
    /// The serialized arguments, passed on verbatim.
    pub args: String,
}

/// The arguments of the `deposit_call` method.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DepositCallArgs {
    /// The account of the called contract.
    pub account: String,
    /// The message passed to its `deposit` method.
    pub msg: String,
}

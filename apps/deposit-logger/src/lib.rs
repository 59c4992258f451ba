// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Deposit Logger Contract */

pub mod contract;
mod state;

use serde::{Deserialize, Serialize};

pub use self::{contract::Error, state::DepositLogger};

/// The arguments of the `deposit` method.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DepositArgs {
    /// A message to log along with the deposit.
    pub msg: String,
}

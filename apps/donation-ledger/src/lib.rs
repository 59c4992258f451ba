// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*! ABI of the Donation Ledger Contract

Two versions of the contract share this crate. [`DonationLedgerV1`] is the layout deployed first.
[`DonationLedger`] adds the largest single donation, and its `migrate` method reshapes the state
left by the first version after the code of an account has been replaced. */

pub mod contract;
mod state;
pub mod v1;

use serde::{Deserialize, Serialize};
use xcc_base::{data_types::Amount, identifiers::AccountId};

pub use self::{
    contract::Error,
    state::{DonationLedger, DonationLedgerV1},
};

/// The share of every donation forwarded to the owner, in percent.
pub const OWNER_SHARE_PERCENT: u128 = 95;

/// The storage prefix of the donations per account.
pub const DONATIONS_PREFIX: &[u8] = b"m";

/// The storage key of the account with the largest total.
pub const TOP_DONOR_KEY: &[u8] = b"o";

/// The storage key of the largest single donation.
pub const TOP_SINGLE_DONATION_KEY: &[u8] = b"o2";

/// An account leading one of the rankings, and the amount it leads with.
///
/// Encoded in JSON as `{"account": ..., "amount": ...}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Leader {
    pub account: AccountId,
    pub amount: Amount,
}

/// The arguments of the `initialize` method.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InitializeArgs {
    /// The account receiving the donations.
    pub owner: AccountId,
}

/// The arguments of the `read_total` method.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReadTotalArgs {
    pub account: AccountId,
}

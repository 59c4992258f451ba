// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use xcc_base::{data_types::Amount, identifiers::AccountId};
use xcc_sdk::{
    collections::{StorageCell, StorageMap},
    ContractRuntime, RuntimeError,
};

use crate::{Leader, DONATIONS_PREFIX, TOP_DONOR_KEY, TOP_SINGLE_DONATION_KEY};

/// The state of the first version of the contract.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct DonationLedgerV1 {
    /// The account receiving the donations.
    pub owner: AccountId,
    /// The total donated by each account.
    pub donations: StorageMap<AccountId, Amount>,
    /// The account with the largest total.
    pub top_donor: StorageCell<Leader>,
}

/// The state of the current version of the contract.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct DonationLedger {
    /// The account receiving the donations.
    pub owner: AccountId,
    /// The total donated by each account.
    pub donations: StorageMap<AccountId, Amount>,
    /// The account with the largest total.
    pub top_donor: StorageCell<Leader>,
    /// The account behind the largest single donation.
    pub top_single_donation: StorageCell<Leader>,
}

impl DonationLedgerV1 {
    pub(crate) fn new(owner: AccountId) -> Self {
        DonationLedgerV1 {
            owner,
            donations: StorageMap::new(DONATIONS_PREFIX),
            top_donor: StorageCell::new(TOP_DONOR_KEY),
        }
    }
}

impl DonationLedger {
    pub(crate) fn new(owner: AccountId) -> Self {
        DonationLedgerV1::new(owner).into()
    }
}

/// Keeps every entry of the first version in place. The largest single donation was never
/// tracked, so it starts empty.
impl From<DonationLedgerV1> for DonationLedger {
    fn from(state: DonationLedgerV1) -> Self {
        let DonationLedgerV1 {
            owner,
            donations,
            top_donor,
        } = state;
        DonationLedger {
            owner,
            donations,
            top_donor,
            top_single_donation: StorageCell::new(TOP_SINGLE_DONATION_KEY),
        }
    }
}

/// Adds `value` to the total of `account`, returning the new total.
pub(crate) fn add_donation(
    donations: &StorageMap<AccountId, Amount>,
    runtime: &mut ContractRuntime,
    account: &AccountId,
    value: Amount,
) -> Result<Amount, crate::Error> {
    let total = donations
        .get(runtime, account)?
        .unwrap_or_default()
        .try_add(value)?;
    donations.insert(runtime, account, &total)?;
    Ok(total)
}

/// Replaces the leader stored in `cell` if `candidate` leads with a strictly greater amount.
/// Returns whether the candidate took the lead.
pub(crate) fn challenge(
    cell: &StorageCell<Leader>,
    runtime: &mut ContractRuntime,
    candidate: Leader,
) -> Result<bool, RuntimeError> {
    if let Some(leader) = cell.get(runtime)? {
        if candidate.amount <= leader.amount {
            return Ok(false);
        }
    }
    cell.set(runtime, &candidate)?;
    Ok(true)
}

// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The promise scheduler: tracks scheduled receipts until they settle.
//!
//! Every receipt is a promise in the [`PromiseState::Scheduled`] state until it settles. A receipt
//! becomes ready to execute once all the receipts it depends on have settled, and it then receives
//! their outcomes, in order. A receipt that answered with one of its own promises is forwarded:
//! it stays scheduled until that promise settles, and then settles with the same outcome.
//!
//! A settled promise is only kept while receipts still wait to read its outcome.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
};

use serde::{Deserialize, Serialize};
use xcc_base::{
    data_types::{Amount, Gas},
    identifiers::AccountId,
    promise::{CallOutcome, CallRequest},
};

/// The identifier of a receipt, unique on the ledger.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct ReceiptId(pub u64);

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "receipt #{}", self.0)
    }
}

/// The identifier of a transaction, unique on the ledger.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transaction #{}", self.0)
    }
}

/// What a receipt does when executed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Call a contract method.
    Call(CallRequest),
    /// Move value to an account, without running any code.
    Transfer { receiver: AccountId, amount: Amount },
}

impl Action {
    /// The account the action applies to.
    pub fn receiver(&self) -> &AccountId {
        match self {
            Action::Call(request) => &request.receiver,
            Action::Transfer { receiver, .. } => receiver,
        }
    }

    /// The value moved to the receiver.
    pub fn attached_value(&self) -> Amount {
        match self {
            Action::Call(request) => request.attached_value,
            Action::Transfer { amount, .. } => *amount,
        }
    }

    /// The called method, if this is a call.
    pub fn method(&self) -> Option<&str> {
        match self {
            Action::Call(request) => Some(&request.method),
            Action::Transfer { .. } => None,
        }
    }

    /// The gas reserved for the action.
    pub fn gas(&self) -> Gas {
        match self {
            Action::Call(request) => request.gas,
            Action::Transfer { .. } => Gas::ZERO,
        }
    }
}

/// A unit of execution: one action, run by the ledger in a single step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Receipt {
    pub id: ReceiptId,
    pub transaction: TransactionId,
    /// The account that caused the receipt.
    pub predecessor: AccountId,
    /// The account that signed the transaction.
    pub signer: AccountId,
    pub action: Action,
    /// The receipts that must settle before this one runs.
    pub dependencies: Vec<ReceiptId>,
}

/// The state of a promise, i.e. of the receipt backing it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PromiseState {
    Scheduled,
    Settled(CallOutcome),
}

/// Orders the execution of receipts and settles their promises.
#[derive(Debug, Default)]
pub struct PromiseScheduler {
    next_receipt_id: u64,
    states: BTreeMap<ReceiptId, PromiseState>,
    ready: VecDeque<Receipt>,
    waiting: Vec<Receipt>,
    /// Receipts waiting on the promise they were forwarded to.
    forwards: BTreeMap<ReceiptId, Vec<ReceiptId>>,
    /// The number of scheduled receipts that have yet to read the outcome of a promise.
    dependents: BTreeMap<ReceiptId, usize>,
}

impl PromiseScheduler {
    /// Reserves the identifier of a new receipt.
    pub fn next_receipt_id(&mut self) -> ReceiptId {
        let id = ReceiptId(self.next_receipt_id);
        self.next_receipt_id += 1;
        id
    }

    /// Returns the state of the promise backed by receipt `id`, unless it settled and nothing
    /// waits for its outcome anymore.
    pub fn state(&self, id: ReceiptId) -> Option<&PromiseState> {
        self.states.get(&id)
    }

    /// Returns the outcome of receipt `id`, if it has settled.
    pub fn outcome(&self, id: ReceiptId) -> Option<&CallOutcome> {
        match self.states.get(&id)? {
            PromiseState::Settled(outcome) => Some(outcome),
            PromiseState::Scheduled => None,
        }
    }

    /// Returns `true` if no receipt can run.
    pub fn is_idle(&self) -> bool {
        self.ready.is_empty()
    }

    /// Schedules a receipt, which runs once all its dependencies have settled.
    pub fn schedule(&mut self, receipt: Receipt) {
        self.states.insert(receipt.id, PromiseState::Scheduled);
        for dependency in &receipt.dependencies {
            *self.dependents.entry(*dependency).or_default() += 1;
        }
        if self.dependencies_settled(&receipt) {
            self.ready.push_back(receipt);
        } else {
            self.waiting.push(receipt);
        }
    }

    /// Takes the next receipt to run, along with the outcomes of its dependencies.
    pub fn pop_ready(&mut self) -> Option<(Receipt, Vec<CallOutcome>)> {
        let receipt = self.ready.pop_front()?;
        let results = receipt
            .dependencies
            .iter()
            .filter_map(|dependency| self.outcome(*dependency).cloned())
            .collect();
        for dependency in &receipt.dependencies {
            self.release(*dependency);
        }
        Some((receipt, results))
    }

    /// Settles receipt `id` with `outcome`, along with every receipt forwarded to it.
    ///
    /// Returns the settled receipts with their outcome, in settlement order.
    pub fn settle(
        &mut self,
        id: ReceiptId,
        outcome: CallOutcome,
    ) -> Vec<(ReceiptId, CallOutcome)> {
        let mut settled = Vec::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            if self.dependents.contains_key(&id) {
                self.states.insert(id, PromiseState::Settled(outcome.clone()));
            } else {
                self.states.remove(&id);
            }
            settled.push((id, outcome.clone()));
            if let Some(forwarded) = self.forwards.remove(&id) {
                pending.extend(forwarded);
            }
        }
        self.wake_waiting();
        settled
    }

    /// Makes receipt `id` settle with the outcome of `target`.
    ///
    /// Returns the settled receipts if `target` has already settled.
    pub fn forward(
        &mut self,
        id: ReceiptId,
        target: ReceiptId,
    ) -> Vec<(ReceiptId, CallOutcome)> {
        match self.outcome(target).cloned() {
            Some(outcome) => self.settle(id, outcome),
            None => {
                self.forwards.entry(target).or_default().push(id);
                Vec::new()
            }
        }
    }

    /// Records that one dependent of `id` has read its outcome.
    fn release(&mut self, id: ReceiptId) {
        let Some(count) = self.dependents.get_mut(&id) else {
            return;
        };
        *count -= 1;
        if *count > 0 {
            return;
        }
        self.dependents.remove(&id);
        if let Some(PromiseState::Settled(_)) = self.states.get(&id) {
            self.states.remove(&id);
        }
    }

    fn dependencies_settled(&self, receipt: &Receipt) -> bool {
        receipt
            .dependencies
            .iter()
            .all(|dependency| self.outcome(*dependency).is_some())
    }

    fn wake_waiting(&mut self) {
        let waiting = std::mem::take(&mut self.waiting);
        for receipt in waiting {
            if self.dependencies_settled(&receipt) {
                self.ready.push_back(receipt);
            } else {
                self.waiting.push(receipt);
            }
        }
    }
}

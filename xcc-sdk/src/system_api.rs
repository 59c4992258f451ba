// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The interface a host exposes to the contract it is executing.

use thiserror::Error;
use xcc_base::{
    data_types::{Amount, ArithmeticError, Gas},
    identifiers::AccountId,
    promise::{CallOutcome, CallRequest, PromiseIndex},
};

/// An error reported by the host to the executing contract.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum HostError {
    #[error("{0} is not allowed in a view call")]
    ProhibitedInView(&'static str),
    #[error("method name {0:?} is invalid")]
    InvalidMethodName(String),
    #[error("{0} does not exist")]
    InvalidPromiseIndex(PromiseIndex),
    #[error("balance {balance} is too low to attach {required}")]
    InsufficientBalance { balance: Amount, required: Amount },
    #[error("log line of {length} bytes exceeds the limit of {limit} bytes")]
    LogTooLong { length: usize, limit: usize },
    #[error("a single call cannot emit more than {0} log lines")]
    TooManyLogs(usize),
    #[error("arguments of {size} bytes exceed the limit of {limit} bytes")]
    ArgumentsTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

/// The raw system API offered by the host.
///
/// Every contract invocation gets its own instance, describing the call being executed. State
/// changes made through it only become visible to other invocations if the invocation succeeds.
pub trait SystemApi {
    /// The account whose contract is executing.
    fn current_account_id(&self) -> AccountId;

    /// The account that caused this invocation: the signer for a transaction, or the contract
    /// that scheduled this call.
    fn predecessor_account_id(&self) -> AccountId;

    /// The account that signed the transaction this invocation descends from.
    fn signer_account_id(&self) -> AccountId;

    /// The value attached to this invocation, already added to the account balance.
    fn attached_value(&self) -> Amount;

    /// The current balance of the executing account.
    fn account_balance(&self) -> Amount;

    /// The gas reserved for this invocation.
    fn prepaid_gas(&self) -> Gas;

    /// Whether this is a read-only view call.
    fn is_view(&self) -> bool;

    /// Emits a log line, observable in the outcome of the transaction.
    fn log(&mut self, message: &str) -> Result<(), HostError>;

    /// Reads the value stored under `key`.
    fn storage_read(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores `value` under `key`.
    fn storage_write(&mut self, key: &[u8], value: &[u8]) -> Result<(), HostError>;

    /// Removes the value stored under `key`.
    fn storage_remove(&mut self, key: &[u8]) -> Result<(), HostError>;

    /// Schedules a call on another contract, to be executed in a later step.
    ///
    /// The attached value is taken from the executing account's balance right away.
    fn promise_create(&mut self, request: CallRequest) -> Result<PromiseIndex, HostError>;

    /// Schedules a call to be executed once `promise` has settled. The call receives the outcome
    /// of `promise` as its only promise result.
    fn promise_then(
        &mut self,
        promise: PromiseIndex,
        request: CallRequest,
    ) -> Result<PromiseIndex, HostError>;

    /// Schedules a plain transfer of `amount` to `receiver`.
    fn promise_transfer(
        &mut self,
        receiver: AccountId,
        amount: Amount,
    ) -> Result<PromiseIndex, HostError>;

    /// The number of settled promises this invocation was scheduled after.
    fn promise_results_count(&self) -> usize;

    /// The outcome of the `index`-th promise this invocation was scheduled after.
    fn promise_result(&self, index: usize) -> Option<CallOutcome>;
}

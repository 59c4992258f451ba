// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime types to interface with the host executing the contract.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use xcc_base::{
    codec::{self, CodecError},
    data_types::{Amount, Gas},
    identifiers::AccountId,
    promise::{CallOutcome, CallRequest, PromiseIndex},
};

use crate::system_api::{HostError, SystemApi};

/// The storage key under which the root state of a contract is kept.
pub const STATE_KEY: &[u8] = b"STATE";

/// An error raised while interacting with the host.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The host refused the request.
    #[error(transparent)]
    Host(#[from] HostError),
    /// A value could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The runtime available to a contract while it handles one invocation.
///
/// Wraps the raw [`SystemApi`] with typed helpers.
pub struct ContractRuntime<'a> {
    api: &'a mut dyn SystemApi,
}

impl<'a> ContractRuntime<'a> {
    /// Creates a runtime for one invocation, on top of the host's system API.
    pub fn new(api: &'a mut dyn SystemApi) -> Self {
        ContractRuntime { api }
    }

    /// Returns the account whose contract is executing.
    pub fn current_account_id(&self) -> AccountId {
        self.api.current_account_id()
    }

    /// Returns the account that caused this invocation.
    pub fn predecessor_account_id(&self) -> AccountId {
        self.api.predecessor_account_id()
    }

    /// Returns the account that signed the originating transaction.
    pub fn signer_account_id(&self) -> AccountId {
        self.api.signer_account_id()
    }

    /// Returns the value attached to this invocation.
    pub fn attached_value(&self) -> Amount {
        self.api.attached_value()
    }

    /// Returns the balance of the executing account.
    pub fn account_balance(&self) -> Amount {
        self.api.account_balance()
    }

    /// Returns the gas reserved for this invocation.
    pub fn prepaid_gas(&self) -> Gas {
        self.api.prepaid_gas()
    }

    /// Returns `true` if this is a read-only view call.
    pub fn is_view(&self) -> bool {
        self.api.is_view()
    }

    /// Returns `true` if the contract scheduled this invocation on itself.
    ///
    /// Callbacks should only accept such invocations.
    pub fn is_self_call(&self) -> bool {
        self.predecessor_account_id() == self.current_account_id()
    }

    /// Emits a log line.
    pub fn log(&mut self, message: &str) -> Result<(), RuntimeError> {
        Ok(self.api.log(message)?)
    }

    /// Schedules a call on another contract.
    pub fn schedule(&mut self, request: CallRequest) -> Result<PromiseIndex, RuntimeError> {
        Ok(self.api.promise_create(request)?)
    }

    /// Schedules `request` to run once `promise` has settled.
    pub fn then(
        &mut self,
        promise: PromiseIndex,
        request: CallRequest,
    ) -> Result<PromiseIndex, RuntimeError> {
        Ok(self.api.promise_then(promise, request)?)
    }

    /// Schedules a transfer of `amount` from the executing account to `receiver`.
    pub fn transfer(
        &mut self,
        receiver: AccountId,
        amount: Amount,
    ) -> Result<PromiseIndex, RuntimeError> {
        Ok(self.api.promise_transfer(receiver, amount)?)
    }

    /// Returns the number of settled promises this invocation was scheduled after.
    pub fn promise_results_count(&self) -> usize {
        self.api.promise_results_count()
    }

    /// Returns the outcome of the `index`-th promise this invocation was scheduled after.
    pub fn promise_result(&self, index: usize) -> Option<CallOutcome> {
        self.api.promise_result(index)
    }

    /// Returns `true` if the contract has a root state.
    pub fn state_exists(&self) -> bool {
        self.api.storage_read(STATE_KEY).is_some()
    }

    /// Reads the root state of the contract, if there is one.
    pub fn read_state<T: DeserializeOwned>(&self) -> Result<Option<T>, RuntimeError> {
        self.read(STATE_KEY)
    }

    /// Replaces the root state of the contract.
    pub fn write_state<T: Serialize>(&mut self, state: &T) -> Result<(), RuntimeError> {
        self.write(STATE_KEY, state)
    }

    /// Reads and decodes the value stored under `key`.
    pub fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, RuntimeError> {
        self.api
            .storage_read(key)
            .map(|bytes| codec::from_bcs_bytes(&bytes))
            .transpose()
            .map_err(RuntimeError::from)
    }

    /// Encodes and stores `value` under `key`.
    pub fn write<T: Serialize + ?Sized>(
        &mut self,
        key: &[u8],
        value: &T,
    ) -> Result<(), RuntimeError> {
        let bytes = codec::to_bcs_bytes(value)?;
        Ok(self.api.storage_write(key, &bytes)?)
    }

    /// Removes the value stored under `key`.
    pub fn remove(&mut self, key: &[u8]) -> Result<(), RuntimeError> {
        Ok(self.api.storage_remove(key)?)
    }
}

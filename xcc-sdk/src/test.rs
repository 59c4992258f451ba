// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory host to unit-test contract handlers in isolation.
//!
//! Scheduled promises are recorded instead of executed. Callbacks are tested by configuring the
//! promise results they should observe with [`MockSystemApi::with_promise_results`].

use std::collections::BTreeMap;

use xcc_base::{
    data_types::{Amount, Gas},
    ensure,
    identifiers::{is_valid_method_name, AccountId},
    promise::{CallOutcome, CallRequest, PromiseIndex},
};

use crate::system_api::{HostError, SystemApi};

/// A promise recorded by the [`MockSystemApi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScheduledPromise {
    /// A call, to run after the promise `after` if set.
    Call {
        /// The promise the call was chained on.
        after: Option<PromiseIndex>,
        /// The scheduled call.
        request: CallRequest,
    },
    /// A plain transfer.
    Transfer {
        /// The account receiving the value.
        receiver: AccountId,
        /// The transferred value.
        amount: Amount,
    },
}

/// A mock host for a single contract.
#[derive(Clone, Debug)]
pub struct MockSystemApi {
    current_account: AccountId,
    predecessor: AccountId,
    signer: AccountId,
    attached_value: Amount,
    balance: Amount,
    prepaid_gas: Gas,
    is_view: bool,
    storage: BTreeMap<Vec<u8>, Vec<u8>>,
    logs: Vec<String>,
    promises: Vec<ScheduledPromise>,
    promise_results: Vec<CallOutcome>,
}

impl Default for MockSystemApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSystemApi {
    /// Creates a mock for the account `contract.test`, called by `alice.test`.
    pub fn new() -> Self {
        let caller = account("alice.test");
        MockSystemApi {
            current_account: account("contract.test"),
            predecessor: caller.clone(),
            signer: caller,
            attached_value: Amount::ZERO,
            balance: Amount::ZERO,
            prepaid_gas: Gas::new(300_000_000_000_000),
            is_view: false,
            storage: BTreeMap::new(),
            logs: Vec::new(),
            promises: Vec::new(),
            promise_results: Vec::new(),
        }
    }

    /// Sets the account executing the contract.
    pub fn with_current_account(mut self, account: AccountId) -> Self {
        self.current_account = account;
        self
    }

    /// Sets the account causing the invocation.
    pub fn with_predecessor(mut self, account: AccountId) -> Self {
        self.predecessor = account;
        self
    }

    /// Sets the account that signed the transaction.
    pub fn with_signer(mut self, account: AccountId) -> Self {
        self.signer = account;
        self
    }

    /// Attaches `value` to the invocation, crediting it to the balance like the host does.
    pub fn with_attached_value(mut self, value: Amount) -> Self {
        self.balance = self.balance.saturating_sub(self.attached_value).saturating_add(value);
        self.attached_value = value;
        self
    }

    /// Sets the outcomes of the promises the invocation runs after.
    pub fn with_promise_results(mut self, results: impl IntoIterator<Item = CallOutcome>) -> Self {
        self.promise_results = results.into_iter().collect();
        self
    }

    /// Turns the mock into a read-only view host with no attached value.
    pub fn into_view(self) -> Self {
        let mut api = self.with_attached_value(Amount::ZERO);
        api.is_view = true;
        api
    }

    /// Returns the log lines emitted so far.
    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Returns the promises scheduled so far, in creation order.
    pub fn promises(&self) -> &[ScheduledPromise] {
        &self.promises
    }

    /// Clears the recorded logs and promises, keeping the storage.
    pub fn reset_effects(&mut self) {
        self.logs.clear();
        self.promises.clear();
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), HostError> {
        ensure!(!self.is_view, HostError::ProhibitedInView(operation));
        Ok(())
    }

    fn push_promise(&mut self, promise: ScheduledPromise) -> PromiseIndex {
        self.promises.push(promise);
        PromiseIndex((self.promises.len() - 1) as u32)
    }

    fn debit(&mut self, amount: Amount) -> Result<(), HostError> {
        let balance = self.balance;
        self.balance = balance
            .try_sub(amount)
            .map_err(|_| HostError::InsufficientBalance {
                balance,
                required: amount,
            })?;
        Ok(())
    }

    fn check_request(&self, request: &CallRequest) -> Result<(), HostError> {
        ensure!(
            is_valid_method_name(&request.method),
            HostError::InvalidMethodName(request.method.clone())
        );
        Ok(())
    }
}

impl SystemApi for MockSystemApi {
    fn current_account_id(&self) -> AccountId {
        self.current_account.clone()
    }

    fn predecessor_account_id(&self) -> AccountId {
        self.predecessor.clone()
    }

    fn signer_account_id(&self) -> AccountId {
        self.signer.clone()
    }

    fn attached_value(&self) -> Amount {
        self.attached_value
    }

    fn account_balance(&self) -> Amount {
        self.balance
    }

    fn prepaid_gas(&self) -> Gas {
        self.prepaid_gas
    }

    fn is_view(&self) -> bool {
        self.is_view
    }

    fn log(&mut self, message: &str) -> Result<(), HostError> {
        self.logs.push(message.to_owned());
        Ok(())
    }

    fn storage_read(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.storage.get(key).cloned()
    }

    fn storage_write(&mut self, key: &[u8], value: &[u8]) -> Result<(), HostError> {
        self.ensure_mutable("storage_write")?;
        self.storage.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn storage_remove(&mut self, key: &[u8]) -> Result<(), HostError> {
        self.ensure_mutable("storage_remove")?;
        self.storage.remove(key);
        Ok(())
    }

    fn promise_create(&mut self, request: CallRequest) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_create")?;
        self.check_request(&request)?;
        self.debit(request.attached_value)?;
        Ok(self.push_promise(ScheduledPromise::Call {
            after: None,
            request,
        }))
    }

    fn promise_then(
        &mut self,
        promise: PromiseIndex,
        request: CallRequest,
    ) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_then")?;
        ensure!(
            (promise.0 as usize) < self.promises.len(),
            HostError::InvalidPromiseIndex(promise)
        );
        self.check_request(&request)?;
        self.debit(request.attached_value)?;
        Ok(self.push_promise(ScheduledPromise::Call {
            after: Some(promise),
            request,
        }))
    }

    fn promise_transfer(
        &mut self,
        receiver: AccountId,
        amount: Amount,
    ) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_transfer")?;
        self.debit(amount)?;
        Ok(self.push_promise(ScheduledPromise::Transfer { receiver, amount }))
    }

    fn promise_results_count(&self) -> usize {
        self.promise_results.len()
    }

    fn promise_result(&self, index: usize) -> Option<CallOutcome> {
        self.promise_results.get(index).cloned()
    }
}

fn account(name: &str) -> AccountId {
    AccountId::try_from(name.to_owned()).unwrap_or_else(|error| {
        unreachable!("built-in account name {name:?} is invalid: {error}")
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use xcc_base::{data_types::Amount, promise::CallRequest};

    use super::{MockSystemApi, ScheduledPromise};
    use crate::{system_api::HostError, SystemApi};

    #[test]
    fn scheduling_debits_the_attached_value() {
        let mut api = MockSystemApi::new().with_attached_value(Amount::from_units(5));
        let receiver = "inner.test".parse().unwrap();
        let request = CallRequest::new(receiver, "deposit").with_attached_value(Amount::from_units(3));

        let promise = api.promise_create(request.clone()).unwrap();
        assert_eq!(promise.0, 0);
        assert_eq!(api.account_balance(), Amount::from_units(2));
        assert_eq!(
            api.promises(),
            [ScheduledPromise::Call {
                after: None,
                request: request.clone()
            }]
        );
        assert_matches!(
            api.promise_create(request),
            Err(HostError::InsufficientBalance { .. })
        );
    }

    #[test]
    fn chaining_requires_an_existing_promise() {
        let mut api = MockSystemApi::new();
        let receiver: xcc_base::identifiers::AccountId = "contract.test".parse().unwrap();
        assert_matches!(
            api.promise_then(
                xcc_base::promise::PromiseIndex(0),
                CallRequest::new(receiver, "callback")
            ),
            Err(HostError::InvalidPromiseIndex(_))
        );
    }

    #[test]
    fn views_cannot_write() {
        let mut api = MockSystemApi::new().into_view();
        assert_eq!(
            api.storage_write(b"key", b"value"),
            Err(HostError::ProhibitedInView("storage_write"))
        );
    }
}

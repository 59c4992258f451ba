// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use xcc_base::{
    data_types::{Amount, Gas},
    ensure,
    identifiers::AccountId,
    promise::{CallOutcome, CallRequest, PromiseIndex},
};
use xcc_sdk::{HostError, SystemApi};

use crate::{policy::RuntimePolicy, scheduler::Action};

/// The accounts and value involved in a receipt.
#[derive(Clone, Debug)]
pub(crate) struct ReceiptContext {
    pub current: AccountId,
    pub predecessor: AccountId,
    pub signer: AccountId,
    pub attached_value: Amount,
    pub prepaid_gas: Gas,
    pub is_view: bool,
}

/// A promise created by a receipt, not yet given a receipt of its own.
#[derive(Clone, Debug)]
pub(crate) struct NewPromise {
    pub after: Option<PromiseIndex>,
    pub action: Action,
}

/// Everything a receipt changed, to commit if it succeeds.
#[derive(Debug, Default)]
pub(crate) struct ReceiptChanges {
    pub writes: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    pub balance: Amount,
    pub logs: Vec<String>,
    pub promises: Vec<NewPromise>,
}

/// The [`SystemApi`] given to a contract while one receipt executes.
///
/// Reads go through the pending writes to the committed storage of the account, which is never
/// modified directly.
pub(crate) struct ReceiptRuntime<'a> {
    context: ReceiptContext,
    policy: &'a RuntimePolicy,
    storage: &'a BTreeMap<Vec<u8>, Vec<u8>>,
    promise_results: Vec<CallOutcome>,
    changes: ReceiptChanges,
}

impl<'a> ReceiptRuntime<'a> {
    /// Creates the runtime of a receipt, for an account with the given storage and balance.
    ///
    /// The balance must already include the attached value.
    pub fn new(
        context: ReceiptContext,
        policy: &'a RuntimePolicy,
        storage: &'a BTreeMap<Vec<u8>, Vec<u8>>,
        balance: Amount,
        promise_results: Vec<CallOutcome>,
    ) -> Self {
        ReceiptRuntime {
            context,
            policy,
            storage,
            promise_results,
            changes: ReceiptChanges {
                balance,
                ..ReceiptChanges::default()
            },
        }
    }

    pub fn into_changes(self) -> ReceiptChanges {
        self.changes
    }

    fn ensure_mutable(&self, operation: &'static str) -> Result<(), HostError> {
        ensure!(!self.context.is_view, HostError::ProhibitedInView(operation));
        Ok(())
    }

    fn check_request(&self, request: &CallRequest) -> Result<(), HostError> {
        ensure!(
            self.policy.accepts_method_name(&request.method),
            HostError::InvalidMethodName(request.method.clone())
        );
        ensure!(
            request.args.len() <= self.policy.max_arguments_size,
            HostError::ArgumentsTooLarge {
                size: request.args.len(),
                limit: self.policy.max_arguments_size,
            }
        );
        Ok(())
    }

    fn debit(&mut self, amount: Amount) -> Result<(), HostError> {
        let balance = self.changes.balance;
        self.changes.balance =
            balance
                .try_sub(amount)
                .map_err(|_| HostError::InsufficientBalance {
                    balance,
                    required: amount,
                })?;
        Ok(())
    }

    fn push_promise(&mut self, after: Option<PromiseIndex>, action: Action) -> PromiseIndex {
        let index = PromiseIndex(self.changes.promises.len() as u32);
        self.changes.promises.push(NewPromise { after, action });
        index
    }
}

impl SystemApi for ReceiptRuntime<'_> {
    fn current_account_id(&self) -> AccountId {
        self.context.current.clone()
    }

    fn predecessor_account_id(&self) -> AccountId {
        self.context.predecessor.clone()
    }

    fn signer_account_id(&self) -> AccountId {
        self.context.signer.clone()
    }

    fn attached_value(&self) -> Amount {
        self.context.attached_value
    }

    fn account_balance(&self) -> Amount {
        self.changes.balance
    }

    fn prepaid_gas(&self) -> Gas {
        self.context.prepaid_gas
    }

    fn is_view(&self) -> bool {
        self.context.is_view
    }

    fn log(&mut self, message: &str) -> Result<(), HostError> {
        ensure!(
            message.len() <= self.policy.max_log_length,
            HostError::LogTooLong {
                length: message.len(),
                limit: self.policy.max_log_length,
            }
        );
        ensure!(
            self.changes.logs.len() < self.policy.max_logs_per_receipt,
            HostError::TooManyLogs(self.policy.max_logs_per_receipt)
        );
        self.changes.logs.push(message.to_owned());
        Ok(())
    }

    fn storage_read(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.changes.writes.get(key) {
            Some(pending) => pending.clone(),
            None => self.storage.get(key).cloned(),
        }
    }

    fn storage_write(&mut self, key: &[u8], value: &[u8]) -> Result<(), HostError> {
        self.ensure_mutable("storage_write")?;
        self.changes
            .writes
            .insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn storage_remove(&mut self, key: &[u8]) -> Result<(), HostError> {
        self.ensure_mutable("storage_remove")?;
        self.changes.writes.insert(key.to_vec(), None);
        Ok(())
    }

    fn promise_create(&mut self, request: CallRequest) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_create")?;
        self.check_request(&request)?;
        self.debit(request.attached_value)?;
        Ok(self.push_promise(None, Action::Call(request)))
    }

    fn promise_then(
        &mut self,
        promise: PromiseIndex,
        request: CallRequest,
    ) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_then")?;
        ensure!(
            (promise.0 as usize) < self.changes.promises.len(),
            HostError::InvalidPromiseIndex(promise)
        );
        self.check_request(&request)?;
        self.debit(request.attached_value)?;
        Ok(self.push_promise(Some(promise), Action::Call(request)))
    }

    fn promise_transfer(
        &mut self,
        receiver: AccountId,
        amount: Amount,
    ) -> Result<PromiseIndex, HostError> {
        self.ensure_mutable("promise_transfer")?;
        self.debit(amount)?;
        Ok(self.push_promise(None, Action::Transfer { receiver, amount }))
    }

    fn promise_results_count(&self) -> usize {
        self.promise_results.len()
    }

    fn promise_result(&self, index: usize) -> Option<CallOutcome> {
        self.promise_results.get(index).cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use xcc_base::{
        data_types::{Amount, Gas},
        promise::CallRequest,
    };
    use xcc_sdk::{HostError, SystemApi};

    use super::{ReceiptContext, ReceiptRuntime};
    use crate::policy::RuntimePolicy;

    fn context(is_view: bool) -> ReceiptContext {
        ReceiptContext {
            current: "outer.test".parse().unwrap(),
            predecessor: "alice.test".parse().unwrap(),
            signer: "alice.test".parse().unwrap(),
            attached_value: Amount::ZERO,
            prepaid_gas: Gas::ZERO,
            is_view,
        }
    }

    #[test]
    fn pending_writes_shadow_committed_storage() {
        let policy = RuntimePolicy::default();
        let storage = BTreeMap::from([(b"a".to_vec(), b"old".to_vec())]);
        let mut runtime =
            ReceiptRuntime::new(context(false), &policy, &storage, Amount::ZERO, vec![]);

        runtime.storage_write(b"a", b"new").unwrap();
        runtime.storage_remove(b"b").unwrap();
        assert_eq!(runtime.storage_read(b"a"), Some(b"new".to_vec()));

        runtime.storage_remove(b"a").unwrap();
        assert_eq!(runtime.storage_read(b"a"), None);
        assert_eq!(storage.get(b"a".as_slice()), Some(&b"old".to_vec()));
    }

    #[test]
    fn log_limits_are_enforced() {
        let policy = RuntimePolicy {
            max_log_length: 5,
            max_logs_per_receipt: 1,
            ..RuntimePolicy::default()
        };
        let storage = BTreeMap::new();
        let mut runtime =
            ReceiptRuntime::new(context(false), &policy, &storage, Amount::ZERO, vec![]);

        assert_eq!(
            runtime.log("too long"),
            Err(HostError::LogTooLong {
                length: 8,
                limit: 5
            })
        );
        runtime.log("fine").unwrap();
        assert_eq!(runtime.log("again"), Err(HostError::TooManyLogs(1)));
    }

    #[test]
    fn views_cannot_schedule() {
        let policy = RuntimePolicy::default();
        let storage = BTreeMap::new();
        let mut runtime =
            ReceiptRuntime::new(context(true), &policy, &storage, Amount::ONE, vec![]);
        let request = CallRequest::new("inner.test".parse().unwrap(), "deposit");

        assert_eq!(
            runtime.promise_create(request),
            Err(HostError::ProhibitedInView("promise_create"))
        );
        assert!(runtime.into_changes().promises.is_empty());
    }

    #[test]
    fn oversized_arguments_are_rejected() {
        let policy = RuntimePolicy {
            max_arguments_size: 4,
            ..RuntimePolicy::default()
        };
        let storage = BTreeMap::new();
        let mut runtime =
            ReceiptRuntime::new(context(false), &policy, &storage, Amount::ONE, vec![]);
        let request =
            CallRequest::new("inner.test".parse().unwrap(), "deposit").with_args("12345");

        assert_eq!(
            runtime.promise_create(request),
            Err(HostError::ArgumentsTooLarge { size: 5, limit: 4 })
        );
    }
}

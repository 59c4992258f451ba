// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{collections::BTreeMap, fmt, sync::Arc};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use xcc_base::{
    codec,
    data_types::{Amount, Gas},
    ensure,
    identifiers::AccountId,
    promise::{CallOutcome, CallRequest},
};
use xcc_sdk::Response;

use crate::{
    outcome::{ReceiptOutcome, ReceiptStatus, TransactionOutcome},
    policy::RuntimePolicy,
    runtime::{ReceiptChanges, ReceiptContext, ReceiptRuntime},
    scheduler::{Action, PromiseScheduler, Receipt, ReceiptId, TransactionId},
    ExecutionError, UserContractCode,
};

/// An account on the ledger.
#[derive(Clone, Default)]
pub struct Account {
    pub balance: Amount,
    /// The deployed contract, if any. Replacing it keeps the storage.
    pub code: Option<Arc<dyn UserContractCode>>,
    pub storage: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("balance", &self.balance)
            .field("has_code", &self.code.is_some())
            .field("storage_entries", &self.storage.len())
            .finish()
    }
}

#[derive(Debug)]
struct TransactionState {
    root: ReceiptId,
    receipt_count: u32,
    pending: usize,
    outcome: TransactionOutcome,
}

/// A ledger of accounts, executing the transactions submitted to it one receipt at a time.
#[derive(Debug, Default)]
pub struct Ledger {
    policy: RuntimePolicy,
    accounts: BTreeMap<AccountId, Account>,
    scheduler: PromiseScheduler,
    next_transaction_id: u64,
    transactions: BTreeMap<TransactionId, TransactionState>,
    roots: BTreeMap<ReceiptId, TransactionId>,
}

impl Ledger {
    /// Creates an empty ledger enforcing `policy`.
    pub fn new(policy: RuntimePolicy) -> Self {
        Ledger {
            policy,
            ..Ledger::default()
        }
    }

    /// Creates an account holding `balance`.
    pub fn create_account(
        &mut self,
        account: AccountId,
        balance: Amount,
    ) -> Result<(), ExecutionError> {
        ensure!(
            !self.accounts.contains_key(&account),
            ExecutionError::AccountAlreadyExists(account)
        );
        debug!(%account, %balance, "Creating account");
        self.accounts.insert(
            account,
            Account {
                balance,
                ..Account::default()
            },
        );
        Ok(())
    }

    /// Deploys `code` on an existing account, replacing any previous code but keeping the
    /// account's storage.
    pub fn deploy(
        &mut self,
        account: &AccountId,
        code: Arc<dyn UserContractCode>,
    ) -> Result<(), ExecutionError> {
        let entry = self.account_mut(account)?;
        if entry.code.is_some() {
            debug!(%account, "Replacing contract code");
        }
        entry.code = Some(code);
        Ok(())
    }

    /// Creates an account holding `balance`, and deploys `code` on it.
    pub fn create_and_deploy(
        &mut self,
        account: AccountId,
        balance: Amount,
        code: Arc<dyn UserContractCode>,
    ) -> Result<(), ExecutionError> {
        self.create_account(account.clone(), balance)?;
        self.deploy(&account, code)
    }

    pub fn account(&self, account: &AccountId) -> Result<&Account, ExecutionError> {
        self.accounts
            .get(account)
            .ok_or_else(|| ExecutionError::AccountNotFound(account.clone()))
    }

    fn account_mut(&mut self, account: &AccountId) -> Result<&mut Account, ExecutionError> {
        self.accounts
            .get_mut(account)
            .ok_or_else(|| ExecutionError::AccountNotFound(account.clone()))
    }

    /// Returns the balance of `account`.
    pub fn balance(&self, account: &AccountId) -> Result<Amount, ExecutionError> {
        Ok(self.account(account)?.balance)
    }

    /// Submits a call signed by `signer`. The attached value is debited from the signer right
    /// away. Nothing is executed until the ledger is stepped.
    ///
    /// The outcome of the transaction is kept until [`Ledger::take_outcome`] removes it.
    pub fn submit(
        &mut self,
        signer: &AccountId,
        request: CallRequest,
    ) -> Result<TransactionId, ExecutionError> {
        ensure!(
            self.policy.accepts_method_name(&request.method),
            ExecutionError::InvalidMethodName(request.method)
        );
        let account = self.account_mut(signer)?;
        let balance = account.balance;
        account.balance =
            balance
                .try_sub(request.attached_value)
                .map_err(|_| ExecutionError::InsufficientBalance {
                    account: signer.clone(),
                    balance,
                    required: request.attached_value,
                })?;

        let transaction = TransactionId(self.next_transaction_id);
        self.next_transaction_id += 1;
        let root = self.scheduler.next_receipt_id();
        debug!(
            %transaction,
            %signer,
            receiver = %request.receiver,
            method = %request.method,
            "Submitting transaction"
        );
        self.transactions.insert(
            transaction,
            TransactionState {
                root,
                receipt_count: 1,
                pending: 1,
                outcome: TransactionOutcome::default(),
            },
        );
        self.roots.insert(root, transaction);
        self.scheduler.schedule(Receipt {
            id: root,
            transaction,
            predecessor: signer.clone(),
            signer: signer.clone(),
            action: Action::Call(request),
            dependencies: Vec::new(),
        });
        Ok(transaction)
    }

    /// Executes the next ready receipt. Returns `false` if no receipt was ready.
    pub fn step(&mut self) -> bool {
        let Some((receipt, results)) = self.scheduler.pop_ready() else {
            return false;
        };
        self.execute_receipt(receipt, results);
        true
    }

    /// Executes receipts until none is ready. Returns the number of executed receipts.
    pub fn run_until_idle(&mut self) -> usize {
        let mut steps = 0;
        while self.step() {
            steps += 1;
        }
        steps
    }

    /// Submits a call, executes everything it causes, and returns its outcome.
    pub fn call(
        &mut self,
        signer: &AccountId,
        request: CallRequest,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let transaction = self.submit(signer, request)?;
        self.run_until_idle();
        self.take_outcome(transaction)
    }

    /// Returns the outcome of a transaction so far.
    pub fn outcome(
        &self,
        transaction: TransactionId,
    ) -> Result<&TransactionOutcome, ExecutionError> {
        self.transactions
            .get(&transaction)
            .map(|state| &state.outcome)
            .ok_or(ExecutionError::UnknownTransaction(transaction))
    }

    /// Removes the outcome of a transaction from the ledger and returns it.
    pub fn take_outcome(
        &mut self,
        transaction: TransactionId,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let state = self
            .transactions
            .remove(&transaction)
            .ok_or(ExecutionError::UnknownTransaction(transaction))?;
        self.roots.remove(&state.root);
        Ok(state.outcome)
    }

    /// Runs a view method of the contract on `account`, without changing anything.
    pub fn view(
        &self,
        account: &AccountId,
        method: &str,
        args: &[u8],
    ) -> Result<Vec<u8>, ExecutionError> {
        let entry = self.account(account)?;
        let code = entry
            .code
            .clone()
            .ok_or_else(|| ExecutionError::NoContractCode(account.clone()))?;
        let context = ReceiptContext {
            current: account.clone(),
            predecessor: account.clone(),
            signer: account.clone(),
            attached_value: Amount::ZERO,
            prepaid_gas: Gas::ZERO,
            is_view: true,
        };
        let mut runtime =
            ReceiptRuntime::new(context, &self.policy, &entry.storage, entry.balance, vec![]);
        match code.execute(&mut runtime, method, args)? {
            Response::Value(bytes) => Ok(bytes),
            Response::Promise(_) | Response::Failure(_) => Err(ExecutionError::InvalidViewResponse),
        }
    }

    /// Runs a view method with JSON arguments, and decodes its JSON result.
    pub fn view_json<T: DeserializeOwned>(
        &self,
        account: &AccountId,
        method: &str,
        args: &serde_json::Value,
    ) -> Result<T, ExecutionError> {
        let args = codec::to_json_bytes(args)?;
        let bytes = self.view(account, method, &args)?;
        Ok(codec::from_json_bytes(&bytes)?)
    }

    #[instrument(level = "debug", skip_all, fields(receipt = %receipt.id, receiver = %receipt.action.receiver()))]
    fn execute_receipt(&mut self, receipt: Receipt, results: Vec<CallOutcome>) {
        let mut record = ReceiptOutcome {
            receipt_id: receipt.id,
            predecessor: receipt.predecessor.clone(),
            receiver: receipt.action.receiver().clone(),
            method: receipt.action.method().map(str::to_owned),
            gas: receipt.action.gas(),
            logs: Vec::new(),
            status: ReceiptStatus::Succeeded(Vec::new()),
            refund: None,
        };
        record.status = match self.run_action(&receipt, results, &mut record.logs) {
            Ok(Settlement::Value(bytes)) => ReceiptStatus::Succeeded(bytes),
            Ok(Settlement::Forward(target)) => ReceiptStatus::Forwarded(target),
            Ok(Settlement::Failure(reason)) => {
                warn!(%reason, "Contract reported a failure");
                ReceiptStatus::Failed(ExecutionError::ContractFailure(reason))
            }
            Err(error) => {
                warn!(%error, "Receipt failed");
                record.refund = self.refund(&receipt);
                ReceiptStatus::Failed(error)
            }
        };

        let settled = match &record.status {
            ReceiptStatus::Succeeded(bytes) => self
                .scheduler
                .settle(receipt.id, CallOutcome::Success(bytes.clone())),
            ReceiptStatus::Forwarded(target) => self.scheduler.forward(receipt.id, *target),
            ReceiptStatus::Failed(_) => self.scheduler.settle(receipt.id, CallOutcome::Failure),
        };

        if let Some(state) = self.transactions.get_mut(&receipt.transaction) {
            state.pending = state.pending.saturating_sub(1);
            state.outcome.receipts.push(record);
            state.outcome.is_complete = state.pending == 0;
        }
        for (id, outcome) in settled {
            self.record_result(id, outcome);
        }
    }

    fn record_result(&mut self, id: ReceiptId, outcome: CallOutcome) {
        let Some(transaction) = self.roots.remove(&id) else {
            return;
        };
        if let Some(state) = self.transactions.get_mut(&transaction) {
            debug!(%transaction, ?outcome, "Transaction settled");
            state.outcome.result = Some(outcome);
        }
    }

    /// Runs the action of a receipt and commits its changes if it succeeds.
    fn run_action(
        &mut self,
        receipt: &Receipt,
        results: Vec<CallOutcome>,
        logs: &mut Vec<String>,
    ) -> Result<Settlement, ExecutionError> {
        let request = match &receipt.action {
            Action::Transfer { receiver, amount } => {
                let account = self.account_mut(receiver)?;
                account.balance.try_add_assign(*amount)?;
                return Ok(Settlement::Value(Vec::new()));
            }
            Action::Call(request) => request,
        };

        let account = self.account(&request.receiver)?;
        let code = account
            .code
            .clone()
            .ok_or_else(|| ExecutionError::NoContractCode(request.receiver.clone()))?;
        let balance = account.balance.try_add(request.attached_value)?;
        let context = ReceiptContext {
            current: request.receiver.clone(),
            predecessor: receipt.predecessor.clone(),
            signer: receipt.signer.clone(),
            attached_value: request.attached_value,
            prepaid_gas: request.gas,
            is_view: false,
        };
        let mut runtime =
            ReceiptRuntime::new(context, &self.policy, &account.storage, balance, results);
        let response = code.execute(&mut runtime, &request.method, &request.args);
        let changes = runtime.into_changes();
        logs.extend(changes.logs.iter().cloned());
        let response = response?;

        if let Response::Promise(index) = response {
            ensure!(
                (index.0 as usize) < changes.promises.len(),
                ExecutionError::InvalidPromiseIndex(index)
            );
        }
        let promise_ids = self.commit(receipt, changes)?;
        Ok(match response {
            Response::Value(bytes) => Settlement::Value(bytes),
            Response::Promise(index) => Settlement::Forward(promise_ids[index.0 as usize]),
            Response::Failure(reason) => Settlement::Failure(reason),
        })
    }

    /// Applies the changes of a successful receipt and schedules the promises it created.
    fn commit(
        &mut self,
        receipt: &Receipt,
        changes: ReceiptChanges,
    ) -> Result<Vec<ReceiptId>, ExecutionError> {
        let limit = self.policy.max_receipts_per_transaction;
        let new_receipts = u32::try_from(changes.promises.len())
            .map_err(|_| ExecutionError::TooManyReceipts(limit))?;
        if let Some(state) = self.transactions.get_mut(&receipt.transaction) {
            state.receipt_count = state
                .receipt_count
                .checked_add(new_receipts)
                .filter(|count| *count <= limit)
                .ok_or(ExecutionError::TooManyReceipts(limit))?;
            state.pending += changes.promises.len();
        }

        let receiver = receipt.action.receiver().clone();
        let account = self.account_mut(&receiver)?;
        account.balance = changes.balance;
        for (key, value) in changes.writes {
            match value {
                Some(value) => account.storage.insert(key, value),
                None => account.storage.remove(&key),
            };
        }

        let mut ids = Vec::with_capacity(changes.promises.len());
        for promise in changes.promises {
            let id = self.scheduler.next_receipt_id();
            let dependencies = promise
                .after
                .map(|after| vec![ids[after.0 as usize]])
                .unwrap_or_default();
            debug!(receipt = %id, receiver = %promise.action.receiver(), "Scheduling receipt");
            self.scheduler.schedule(Receipt {
                id,
                transaction: receipt.transaction,
                predecessor: receiver.clone(),
                signer: receipt.signer.clone(),
                action: promise.action,
                dependencies,
            });
            ids.push(id);
        }
        Ok(ids)
    }

    /// Returns the value attached to a failed receipt to its predecessor.
    fn refund(&mut self, receipt: &Receipt) -> Option<Amount> {
        let amount = receipt.action.attached_value();
        if amount.is_zero() {
            return None;
        }
        match self.accounts.get_mut(&receipt.predecessor) {
            Some(account) => {
                account.balance = account.balance.saturating_add(amount);
                debug!(predecessor = %receipt.predecessor, %amount, "Refunding attached value");
                Some(amount)
            }
            None => {
                warn!(predecessor = %receipt.predecessor, %amount, "Refund target does not exist");
                None
            }
        }
    }
}

enum Settlement {
    Value(Vec<u8>),
    Forward(ReceiptId),
    Failure(String),
}

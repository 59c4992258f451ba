// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use custom_debug_derive::Debug;
use xcc_base::{
    data_types::{Amount, Gas},
    identifiers::AccountId,
    promise::CallOutcome,
};

use crate::{scheduler::ReceiptId, ExecutionError};

/// How the execution of a receipt ended.
#[derive(Debug)]
pub enum ReceiptStatus {
    /// The receipt succeeded and settled with these bytes.
    Succeeded(Vec<u8>),
    /// The receipt succeeded and settles with the outcome of another receipt.
    Forwarded(ReceiptId),
    /// The receipt settled as failed. Its changes were discarded, unless the error is a
    /// [`ExecutionError::ContractFailure`] reported by the contract itself.
    Failed(ExecutionError),
}

/// The record of one executed receipt.
#[derive(Debug)]
pub struct ReceiptOutcome {
    pub receipt_id: ReceiptId,
    pub predecessor: AccountId,
    pub receiver: AccountId,
    /// The called method, or `None` for a transfer.
    #[debug(skip_if = Option::is_none)]
    pub method: Option<String>,
    pub gas: Gas,
    #[debug(skip_if = Vec::is_empty)]
    pub logs: Vec<String>,
    pub status: ReceiptStatus,
    /// The attached value returned to the predecessor after a failure.
    #[debug(skip_if = Option::is_none)]
    pub refund: Option<Amount>,
}

impl ReceiptOutcome {
    /// Returns the error the receipt failed with, if any.
    pub fn error(&self) -> Option<&ExecutionError> {
        match &self.status {
            ReceiptStatus::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// The receipts executed on behalf of a transaction, and its final result.
#[derive(Debug, Default)]
pub struct TransactionOutcome {
    /// The executed receipts, in execution order.
    #[debug(skip_if = Vec::is_empty)]
    pub receipts: Vec<ReceiptOutcome>,
    /// The outcome of the first receipt of the transaction, once it has settled.
    pub result: Option<CallOutcome>,
    /// Whether every receipt of the transaction has been executed.
    pub is_complete: bool,
}

impl TransactionOutcome {
    /// Returns the log lines of all receipts, in execution order.
    pub fn logs(&self) -> Vec<&str> {
        self.receipts
            .iter()
            .flat_map(|receipt| receipt.logs.iter().map(String::as_str))
            .collect()
    }

    /// Returns the settled result of the transaction.
    pub fn result(&self) -> Option<&CallOutcome> {
        self.result.as_ref()
    }

    /// Returns the bytes the transaction succeeded with.
    pub fn success_value(&self) -> Option<&[u8]> {
        match self.result.as_ref()? {
            CallOutcome::Success(bytes) => Some(bytes),
            CallOutcome::Failure => None,
        }
    }

    /// Returns the error of the first receipt that failed, where a failure originated.
    pub fn failure(&self) -> Option<&ExecutionError> {
        self.receipts.iter().find_map(ReceiptOutcome::error)
    }

    /// Returns the first receipt executed on `receiver`.
    pub fn receipt_on(&self, receiver: &AccountId) -> Option<&ReceiptOutcome> {
        self.receipts
            .iter()
            .find(|receipt| &receipt.receiver == receiver)
    }
}

// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module manages the execution of contracts on the ledger.
//!
//! Every signed call becomes a transaction made of receipts. A receipt runs one contract handler
//! to completion, atomically: its storage writes, balance changes and scheduled promises are
//! committed only if the handler succeeds. Promises scheduled by a receipt become new receipts,
//! executed in later steps once the receipts they depend on have settled.

mod ledger;
mod outcome;
pub mod policy;
mod runtime;
pub mod scheduler;

use std::{fmt, marker::PhantomData};

use thiserror::Error;
use xcc_base::{
    codec::CodecError,
    data_types::{Amount, ArithmeticError},
    identifiers::AccountId,
    promise::PromiseIndex,
};
use xcc_sdk::{Contract, EntrypointError, HostError, Response, RuntimeError, SystemApi};

pub use crate::{
    ledger::{Account, Ledger},
    outcome::{ReceiptOutcome, ReceiptStatus, TransactionOutcome},
    policy::{PolicyError, RuntimePolicy},
    scheduler::{ReceiptId, TransactionId},
};

/// An error raised while executing a transaction or one of its receipts.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("account {0} does not exist")]
    AccountNotFound(AccountId),
    #[error("account {0} already exists")]
    AccountAlreadyExists(AccountId),
    #[error("account {0} has no contract deployed")]
    NoContractCode(AccountId),
    #[error("invalid method name {0:?}")]
    InvalidMethodName(String),
    #[error("account {account} has a balance of {balance}, less than the required {required}")]
    InsufficientBalance {
        account: AccountId,
        balance: Amount,
        required: Amount,
    },
    #[error("a transaction cannot create more than {0} receipts")]
    TooManyReceipts(u32),
    #[error("response refers to {0}, which was not created by the call")]
    InvalidPromiseIndex(PromiseIndex),
    #[error("a view call can only return a value")]
    InvalidViewResponse,
    #[error("transaction {0} does not exist")]
    UnknownTransaction(TransactionId),
    #[error("contract failed: {0}")]
    ContractFailure(String),
    #[error(transparent)]
    Entrypoint(#[from] EntrypointError),
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ExecutionError {
    /// Returns the host error that made the contract fail, if any.
    pub fn host_error(&self) -> Option<&HostError> {
        match self {
            ExecutionError::Entrypoint(EntrypointError::Runtime(RuntimeError::Host(error))) => {
                Some(error)
            }
            _ => None,
        }
    }
}

/// The code of a contract, as deployed on an account.
pub trait UserContractCode: Send + Sync {
    /// Invokes `method` with the raw `args`, on top of the given host interface.
    fn execute(
        &self,
        api: &mut dyn SystemApi,
        method: &str,
        args: &[u8],
    ) -> Result<Response, EntrypointError>;
}

/// Adapts a [`Contract`] type into deployable [`UserContractCode`].
pub struct ContractCode<C>(PhantomData<fn() -> C>);

impl<C: Contract> ContractCode<C> {
    /// Creates the deployable code of the contract `C`.
    pub fn new() -> Self {
        ContractCode(PhantomData)
    }
}

impl<C: Contract> Default for ContractCode<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ContractCode<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractCode<{}>", std::any::type_name::<C>())
    }
}

impl<C: Contract> UserContractCode for ContractCode<C> {
    fn execute(
        &self,
        api: &mut dyn SystemApi,
        method: &str,
        args: &[u8],
    ) -> Result<Response, EntrypointError> {
        xcc_sdk::entrypoint::execute::<C>(api, method, args)
    }
}

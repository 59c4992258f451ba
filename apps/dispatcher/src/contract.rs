// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;
use xcc_base::{
    codec::{self, CodecError},
    data_types::ArithmeticError,
    ensure,
    identifiers::{is_valid_method_name, AccountId},
    promise::{CallOutcome, CallRequest},
};
use xcc_sdk::{
    log, Contract, ContractRuntime, HostError, MethodCall, MethodKind, Response, RuntimeError,
};

use crate::{
    DepositCallArgs, DispatchCallArgs, Dispatcher, CALLBACK_GAS, CALLBACK_METHOD,
    DISPATCH_FAILED, INNER_GAS,
};

impl Contract for Dispatcher {
    type Error = Error;

    fn method_kind(method: &str) -> Option<MethodKind> {
        match method {
            "dispatch_call" | "deposit_call" => Some(MethodKind::PAYABLE),
            CALLBACK_METHOD => Some(MethodKind::NON_PAYABLE),
            "get_dispatched_calls" => Some(MethodKind::View),
            _ => None,
        }
    }

    fn default_state() -> Option<Self> {
        Some(Dispatcher::default())
    }

    fn initialize(_runtime: &mut ContractRuntime, call: &MethodCall) -> Result<Self, Self::Error> {
        Err(Error::UnknownMethod(call.method.clone()))
    }

    fn execute(
        &mut self,
        runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Response, Self::Error> {
        match call.method.as_str() {
            "dispatch_call" => {
                let DispatchCallArgs {
                    account,
                    method,
                    args,
                } = call.args()?;
                self.dispatch(runtime, &account, &method, args)
            }
            "deposit_call" => {
                let DepositCallArgs { account, msg } = call.args()?;
                let args = serde_json::json!({ "msg": msg }).to_string();
                self.dispatch(runtime, &account, "deposit", args)
            }
            CALLBACK_METHOD => self.dispatch_callback(runtime),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }

    fn view(
        &self,
        _runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Vec<u8>, Self::Error> {
        match call.method.as_str() {
            "get_dispatched_calls" => Ok(codec::to_json_bytes(&self.dispatched_calls)?),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }
}

impl Dispatcher {
    /// Schedules `account.method(args)` with the whole attached value, followed by the callback
    /// whose result answers this call.
    fn dispatch(
        &mut self,
        runtime: &mut ContractRuntime,
        account: &str,
        method: &str,
        args: String,
    ) -> Result<Response, Error> {
        let receiver = account
            .parse::<AccountId>()
            .map_err(|error| Error::scheduling(account, method, error))?;
        ensure!(
            is_valid_method_name(method),
            Error::scheduling(account, method, "invalid method name")
        );

        log!(runtime, "Dispatching call: {account}.{method}({args})")
            .map_err(|error| Error::refused(account, method, error))?;

        let call = CallRequest::new(receiver, method)
            .with_args(args)
            .with_attached_value(runtime.attached_value())
            .with_gas(INNER_GAS);
        let promise = runtime
            .schedule(call)
            .map_err(|error| Error::refused(account, method, error))?;

        let callback =
            CallRequest::new(runtime.current_account_id(), CALLBACK_METHOD).with_gas(CALLBACK_GAS);
        let callback = runtime.then(promise, callback)?;
        log::trace!("{account}.{method} scheduled, answered by {callback}");
        Ok(Response::Promise(callback))
    }

    /// Counts the settled call, and answers with its result.
    fn dispatch_callback(&mut self, runtime: &mut ContractRuntime) -> Result<Response, Error> {
        ensure!(runtime.is_self_call(), Error::NotACallback);
        let results = runtime.promise_results_count();
        ensure!(results == 1, Error::UnexpectedPromiseResults(results));

        self.dispatched_calls = self
            .dispatched_calls
            .checked_add(1)
            .ok_or(ArithmeticError::Overflow)?;

        match runtime.promise_result(0) {
            Some(CallOutcome::Success(bytes)) => Ok(Response::Value(bytes)),
            Some(CallOutcome::Failure) | None => Ok(Response::Failure(DISPATCH_FAILED.into())),
        }
    }
}

/// An error that can occur during the contract execution.
#[derive(Debug, Error)]
pub enum Error {
    /// The requested call cannot be scheduled.
    #[error("Cannot dispatch a call to {target}: {reason}")]
    Scheduling { target: String, reason: String },

    /// `dispatch_callback` was not scheduled by the contract itself.
    #[error("`dispatch_callback` can only be used as callback method")]
    NotACallback,

    /// `dispatch_callback` did not run after exactly one call.
    #[error("`dispatch_callback` expects 1 promise result, got {0}")]
    UnexpectedPromiseResults(usize),

    /// The contract has no such method.
    #[error("Dispatcher contract has no method {0:?}")]
    UnknownMethod(String),

    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Failed to encode or decode JSON.
    #[error("Failed to encode or decode JSON")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    fn scheduling(account: &str, method: &str, reason: impl ToString) -> Self {
        Error::Scheduling {
            target: format!("{account}.{method}"),
            reason: reason.to_string(),
        }
    }

    /// Reports the host refusing a call because of its own shape as a scheduling error.
    fn refused(account: &str, method: &str, error: RuntimeError) -> Self {
        match error {
            RuntimeError::Host(
                error @ (HostError::InvalidMethodName(_)
                | HostError::ArgumentsTooLarge { .. }
                | HostError::LogTooLong { .. }
                | HostError::TooManyLogs(_)),
            ) => Error::scheduling(account, method, error),
            error => Error::Runtime(error),
        }
    }
}

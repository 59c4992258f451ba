// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Mocking of contracts to help with execution scenario tests.

#![allow(dead_code)]

use std::{collections::BTreeMap, sync::Arc};

use xcc_base::{
    data_types::{Amount, Gas},
    identifiers::AccountId,
    promise::CallRequest,
};
use xcc_execution::{Ledger, UserContractCode};
use xcc_sdk::{EntrypointError, HostError, Response, RuntimeError, SystemApi};

type Handler =
    dyn Fn(&mut dyn SystemApi, &[u8]) -> Result<Response, EntrypointError> + Send + Sync;

/// A contract whose methods are closures working directly on the [`SystemApi`].
#[derive(Clone, Default)]
pub struct MockContract {
    handlers: BTreeMap<String, Arc<Handler>>,
}

impl MockContract {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method to the contract.
    pub fn on(
        mut self,
        method: &str,
        handler: impl Fn(&mut dyn SystemApi, &[u8]) -> Result<Response, EntrypointError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.handlers.insert(method.to_owned(), Arc::new(handler));
        self
    }

    pub fn into_code(self) -> Arc<dyn UserContractCode> {
        Arc::new(self)
    }
}

impl UserContractCode for MockContract {
    fn execute(
        &self,
        api: &mut dyn SystemApi,
        method: &str,
        args: &[u8],
    ) -> Result<Response, EntrypointError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| EntrypointError::MethodNotFound(method.to_owned()))?;
        handler(api, args)
    }
}

/// Converts a host error the way the SDK runtime does.
pub fn host(error: HostError) -> EntrypointError {
    EntrypointError::Runtime(RuntimeError::Host(error))
}

pub fn account(name: &str) -> AccountId {
    name.parse().expect("Invalid test account name")
}

pub fn request(receiver: &str, method: &str) -> CallRequest {
    CallRequest::new(account(receiver), method).with_gas(Gas::new(10_000))
}

/// Creates a ledger with a funded `alice.test` account.
pub fn ledger_with_signer() -> Ledger {
    let mut ledger = Ledger::default();
    ledger
        .create_account(account("alice.test"), Amount::from_tokens(100))
        .expect("Failed to create the signer account");
    ledger
}

/// A contract returning its arguments, optionally logging them first.
pub fn echo() -> MockContract {
    MockContract::new().on("echo", |api, args| {
        api.log(&format!("echo: {}", String::from_utf8_lossy(args)))
            .map_err(host)?;
        Ok(Response::Value(args.to_vec()))
    })
}

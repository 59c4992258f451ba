// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module provides an SDK for developing contracts that call each other asynchronously.
//!
//! A contract is a type implementing [`Contract`]. Its value is the persistent root state of the
//! contract: the host loads it before every invocation and stores it back afterwards. Handlers
//! cannot call other contracts synchronously. Instead they schedule a call through the
//! [`ContractRuntime`], optionally chain a callback with [`ContractRuntime::then`], and return
//! [`Response::Promise`] so that their own caller observes whatever the chain settles with.
//!
//! The host side of the boundary is the [`SystemApi`] trait. Contracts are usually executed by
//! the ledger runtime, and unit-tested against the `MockSystemApi` available with the `test`
//! feature.

pub mod collections;
pub mod entrypoint;
pub mod runtime;
pub mod system_api;
#[cfg(any(test, feature = "test"))]
pub mod test;

use serde::{de::DeserializeOwned, Serialize};
pub use xcc_base;
use xcc_base::{
    codec::{self, CodecError},
    promise::PromiseIndex,
};

pub use self::{
    entrypoint::EntrypointError,
    runtime::{ContractRuntime, RuntimeError},
    system_api::{HostError, SystemApi},
};

/// Formats a message and emits it as a ledger log line of the executing contract.
#[macro_export]
macro_rules! log {
    ($runtime:expr, $($arg:tt)*) => {
        $runtime.log(&format!($($arg)*))
    };
}

/// How a method of a contract may be invoked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MethodKind {
    /// Creates the root state of the contract.
    ///
    /// Unless `ignore_state` is set, the method is rejected if the contract already has a state.
    /// Methods ignoring the existing state are how a new code version reshapes the state left by
    /// the previous one.
    Init {
        /// Whether the method may run over an existing state.
        ignore_state: bool,
    },
    /// Updates the root state of the contract.
    Call {
        /// Whether the method accepts an attached value.
        payable: bool,
    },
    /// Reads the root state of the contract without modifying anything.
    View,
}

impl MethodKind {
    /// A method that may receive an attached value.
    pub const PAYABLE: MethodKind = MethodKind::Call { payable: true };
    /// A method that rejects any attached value.
    pub const NON_PAYABLE: MethodKind = MethodKind::Call { payable: false };
}

/// What a successful invocation settles with.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Settle with these bytes.
    Value(Vec<u8>),
    /// Settle with the outcome of the given promise, once it settles.
    Promise(PromiseIndex),
    /// Settle as failed, while keeping the changes made by the invocation.
    Failure(String),
}

impl Response {
    /// A response settling with no bytes.
    pub fn empty() -> Self {
        Response::Value(Vec::new())
    }

    /// A response settling with `value` encoded as JSON.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, CodecError> {
        Ok(Response::Value(codec::to_json_bytes(value)?))
    }
}

/// A method invocation received by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MethodCall {
    /// The name of the invoked method.
    pub method: String,
    /// The serialized arguments, as sent by the caller.
    pub args: Vec<u8>,
}

impl MethodCall {
    /// Creates an invocation of `method` with the given raw arguments.
    pub fn new(method: impl Into<String>, args: impl Into<Vec<u8>>) -> Self {
        MethodCall {
            method: method.into(),
            args: args.into(),
        }
    }

    /// Decodes the JSON arguments of the invocation.
    pub fn args<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        codec::from_json_args(&self.args)
    }
}

/// The contract interface of an application.
///
/// The implementing type is the root state of the contract. It is persisted as BCS, so large
/// collections should be kept in [`collections`] types, which store only their prefix in the root
/// state.
pub trait Contract: Serialize + DeserializeOwned + Sized {
    /// The type of errors the contract may return. An error aborts the invocation and discards
    /// all its changes.
    type Error: std::error::Error + 'static;

    /// Returns how `method` may be invoked, or `None` if the contract has no such method.
    fn method_kind(method: &str) -> Option<MethodKind>;

    /// The state used when a method is called on a contract that was never initialized.
    ///
    /// Returning `None` makes such calls fail.
    fn default_state() -> Option<Self> {
        None
    }

    /// Handles a method of kind [`MethodKind::Init`], creating the root state.
    fn initialize(runtime: &mut ContractRuntime, call: &MethodCall) -> Result<Self, Self::Error>;

    /// Handles a method of kind [`MethodKind::Call`].
    fn execute(
        &mut self,
        runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Response, Self::Error>;

    /// Handles a method of kind [`MethodKind::View`].
    fn view(&self, runtime: &mut ContractRuntime, call: &MethodCall)
        -> Result<Vec<u8>, Self::Error>;
}

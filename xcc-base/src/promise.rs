// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Requests to schedule calls on other contracts, and the outcome of those calls once settled.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::{
    codec::{self, CodecError},
    data_types::{Amount, Gas},
    identifiers::AccountId,
};

/// A handle to a promise created during the current contract invocation.
///
/// Indices are local to the invocation that created them, starting at zero.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct PromiseIndex(pub u32);

impl Display for PromiseIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise #{}", self.0)
    }
}

/// A request to call `method` on the contract deployed at `receiver`, in a later step.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    /// The account whose contract is called.
    pub receiver: AccountId,
    /// The method to call.
    pub method: String,
    /// The serialized arguments, passed to the method verbatim.
    pub args: Vec<u8>,
    /// The value transferred to the receiver along with the call.
    pub attached_value: Amount,
    /// The gas reserved for the call.
    pub gas: Gas,
}

impl CallRequest {
    /// Creates a request to call `method` on `receiver`, without arguments, value or gas.
    pub fn new(receiver: AccountId, method: impl Into<String>) -> Self {
        CallRequest {
            receiver,
            method: method.into(),
            args: Vec::new(),
            attached_value: Amount::ZERO,
            gas: Gas::ZERO,
        }
    }

    /// Sets the raw argument bytes.
    pub fn with_args(mut self, args: impl Into<Vec<u8>>) -> Self {
        self.args = args.into();
        self
    }

    /// Sets the arguments by encoding `args` as JSON.
    pub fn with_json_args<T: Serialize + ?Sized>(mut self, args: &T) -> Result<Self, CodecError> {
        self.args = codec::to_json_bytes(args)?;
        Ok(self)
    }

    /// Sets the value attached to the call.
    pub fn with_attached_value(mut self, attached_value: Amount) -> Self {
        self.attached_value = attached_value;
        self
    }

    /// Sets the gas reserved for the call.
    pub fn with_gas(mut self, gas: Gas) -> Self {
        self.gas = gas;
        self
    }
}

/// The outcome of a settled call, as observed by a callback.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CallOutcome {
    /// The call succeeded and returned these bytes.
    Success(Vec<u8>),
    /// The call failed.
    Failure,
}

impl CallOutcome {
    /// Returns `true` if the call succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success(_))
    }

    /// Returns the bytes of a successful call.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            CallOutcome::Success(bytes) => Some(bytes),
            CallOutcome::Failure => None,
        }
    }
}

// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module contains the limits enforced while executing contracts.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use xcc_base::codec::{self, CodecError};

/// Room left in a log line for the text around quoted call arguments and method names.
pub const LOG_LINE_OVERHEAD: usize = 512;

const DEFAULT_MAX_ARGUMENTS_SIZE: usize = 4 * 1024 * 1024;
const DEFAULT_MAX_METHOD_NAME_LENGTH: usize = 256;

/// An error raised when loading a [`RuntimePolicy`].
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A contract could not log the arguments of every call it is allowed to schedule.
    #[error(
        "log lines of {max_log_length} bytes cannot quote arguments of {max_arguments_size} bytes \
         and method names of {max_method_name_length} bytes"
    )]
    LogsShorterThanCalls {
        max_log_length: usize,
        max_arguments_size: usize,
        max_method_name_length: usize,
    },
}

/// A collection of limits on what a single transaction or receipt may do.
///
/// Missing fields take their default value when deserializing.
#[derive(Eq, PartialEq, Hash, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimePolicy {
    /// The maximum number of receipts a transaction may create, including its first one.
    pub max_receipts_per_transaction: u32,
    /// The maximum length of a log line, in bytes.
    pub max_log_length: usize,
    /// The maximum number of log lines a receipt may emit.
    pub max_logs_per_receipt: usize,
    /// The maximum size of the arguments of a scheduled call, in bytes.
    pub max_arguments_size: usize,
    /// The maximum length of a method name, in bytes.
    pub max_method_name_length: usize,
}

impl Default for RuntimePolicy {
    fn default() -> Self {
        Self {
            max_receipts_per_transaction: 1_024,
            max_log_length: DEFAULT_MAX_ARGUMENTS_SIZE
                + DEFAULT_MAX_METHOD_NAME_LENGTH
                + LOG_LINE_OVERHEAD,
            max_logs_per_receipt: 100,
            max_arguments_size: DEFAULT_MAX_ARGUMENTS_SIZE,
            max_method_name_length: DEFAULT_MAX_METHOD_NAME_LENGTH,
        }
    }
}

impl RuntimePolicy {
    /// Loads a policy from its JSON representation, and checks it.
    pub fn from_json(bytes: &[u8]) -> Result<Self, PolicyError> {
        let policy: RuntimePolicy = codec::from_json_bytes(bytes)?;
        policy.check()?;
        Ok(policy)
    }

    /// Checks that a contract can log a line quoting any call it may schedule.
    pub fn check(&self) -> Result<(), PolicyError> {
        let quoted = self
            .max_arguments_size
            .saturating_add(self.max_method_name_length)
            .saturating_add(LOG_LINE_OVERHEAD);
        if self.max_log_length < quoted {
            return Err(PolicyError::LogsShorterThanCalls {
                max_log_length: self.max_log_length,
                max_arguments_size: self.max_arguments_size,
                max_method_name_length: self.max_method_name_length,
            });
        }
        Ok(())
    }

    /// Returns `true` if `method` may be scheduled under this policy.
    pub(crate) fn accepts_method_name(&self, method: &str) -> bool {
        method.len() <= self.max_method_name_length
            && xcc_base::identifiers::is_valid_method_name(method)
    }
}

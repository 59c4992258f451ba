// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Identifiers of accounts and contract methods.

use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The minimum length of an account name, in bytes.
pub const MIN_ACCOUNT_ID_LEN: usize = 2;
/// The maximum length of an account name, in bytes.
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

/// The name of an account on the ledger.
///
/// Valid names are made of lowercase ASCII letters, digits and the separators `-`, `_` and `.`.
/// A name cannot start or end with a separator, nor contain two separators in a row.
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

/// An error returned when parsing an invalid [`AccountId`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum InvalidAccountId {
    /// The name is shorter than [`MIN_ACCOUNT_ID_LEN`].
    #[error("account ID {0:?} is too short")]
    TooShort(String),
    /// The name is longer than [`MAX_ACCOUNT_ID_LEN`].
    #[error("account ID {0:?} is too long")]
    TooLong(String),
    /// The name contains a character that is not allowed.
    #[error("account ID {0:?} contains an invalid character at position {1}")]
    InvalidCharacter(String, usize),
    /// The name has a separator at its start or its end, or two separators in a row.
    #[error("account ID {0:?} has a misplaced separator at position {1}")]
    MisplacedSeparator(String, usize),
}

impl AccountId {
    /// Returns the name of this account.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Checks `name` against the account naming rules.
    pub fn validate(name: &str) -> Result<(), InvalidAccountId> {
        if name.len() < MIN_ACCOUNT_ID_LEN {
            return Err(InvalidAccountId::TooShort(name.to_owned()));
        }
        if name.len() > MAX_ACCOUNT_ID_LEN {
            return Err(InvalidAccountId::TooLong(name.to_owned()));
        }

        let mut last_was_separator = true;
        for (position, byte) in name.bytes().enumerate() {
            match byte {
                b'a'..=b'z' | b'0'..=b'9' => last_was_separator = false,
                b'-' | b'_' | b'.' => {
                    if last_was_separator {
                        return Err(InvalidAccountId::MisplacedSeparator(
                            name.to_owned(),
                            position,
                        ));
                    }
                    last_was_separator = true;
                }
                _ => {
                    return Err(InvalidAccountId::InvalidCharacter(
                        name.to_owned(),
                        position,
                    ))
                }
            }
        }
        if last_was_separator {
            return Err(InvalidAccountId::MisplacedSeparator(
                name.to_owned(),
                name.len() - 1,
            ));
        }
        Ok(())
    }
}

impl FromStr for AccountId {
    type Err = InvalidAccountId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountId::validate(s)?;
        Ok(AccountId(s.to_owned()))
    }
}

impl TryFrom<String> for AccountId {
    type Error = InvalidAccountId;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        AccountId::validate(&name)?;
        Ok(AccountId(name))
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        AccountId::try_from(name).map_err(serde::de::Error::custom)
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Returns `true` if `name` can be the name of a contract method.
///
/// Method names are non-empty, made of ASCII alphanumerics and `_`, and do not start with a
/// digit.
pub fn is_valid_method_name(name: &str) -> bool {
    let mut bytes = name.bytes();
    match bytes.next() {
        Some(first) if first.is_ascii_alphabetic() || first == b'_' => {}
        _ => return false,
    }
    bytes.all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

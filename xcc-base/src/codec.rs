// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The codec turning structured values into the opaque bytes exchanged with the host.
//!
//! Call arguments and return values travel as JSON, so that callers outside the ledger can build
//! and read them. Persisted contract state is stored as BCS, which is compact and rejects
//! trailing input: decoding bytes written with one layout using another layout fails instead of
//! silently succeeding.

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

/// An error raised while encoding or decoding a value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Failed to encode or decode JSON.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to encode or decode BCS.
    #[error("BCS codec error: {0}")]
    Bcs(#[from] bcs::Error),
}

/// Encodes a call argument or return value.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(value)?)
}

/// Decodes a call argument or return value.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes the arguments of a method call, reading an empty buffer as an empty JSON object.
pub fn from_json_args<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.is_empty() {
        from_json_bytes(b"{}")
    } else {
        from_json_bytes(bytes)
    }
}

/// Encodes a value for persistent storage.
pub fn to_bcs_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    Ok(bcs::to_bytes(value)?)
}

/// Decodes a value from persistent storage.
pub fn from_bcs_bytes<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    Ok(bcs::from_bytes(bytes)?)
}

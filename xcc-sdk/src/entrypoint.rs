// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The generic entry point dispatching an invocation to the handlers of a [`Contract`].

use thiserror::Error;
use xcc_base::ensure;

use crate::{
    runtime::{ContractRuntime, RuntimeError},
    system_api::SystemApi,
    Contract, MethodCall, MethodKind, Response,
};

/// An error raised while invoking a contract, before, during or after running its handler.
#[derive(Debug, Error)]
pub enum EntrypointError {
    #[error("contract has no method {0:?}")]
    MethodNotFound(String),
    #[error("method {0:?} does not accept an attached value")]
    NotPayable(String),
    #[error("method {0:?} is not a view and cannot be called in a view")]
    NotAView(String),
    #[error("contract is already initialized")]
    AlreadyInitialized,
    #[error("contract is not initialized")]
    NotInitialized,
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("{0}")]
    Contract(String),
}

impl EntrypointError {
    fn contract<E: std::error::Error>(error: E) -> Self {
        EntrypointError::Contract(error.to_string())
    }
}

/// Invokes `method` on the contract `C`, whose state lives behind `api`.
///
/// Loads the root state, runs the handler matching the kind of the method, and stores the state
/// back unless the method is a view.
pub fn execute<C: Contract>(
    api: &mut dyn SystemApi,
    method: &str,
    args: &[u8],
) -> Result<Response, EntrypointError> {
    let kind = C::method_kind(method)
        .ok_or_else(|| EntrypointError::MethodNotFound(method.to_owned()))?;
    let is_view = api.is_view();
    let mut runtime = ContractRuntime::new(api);
    let call = MethodCall::new(method, args);
    log::trace!("Invoking {method} as {kind:?}");

    ensure!(
        !is_view || kind == MethodKind::View,
        EntrypointError::NotAView(call.method)
    );
    ensure!(
        kind == MethodKind::PAYABLE || runtime.attached_value().is_zero(),
        EntrypointError::NotPayable(call.method)
    );

    match kind {
        MethodKind::Init { ignore_state } => {
            ensure!(
                ignore_state || !runtime.state_exists(),
                EntrypointError::AlreadyInitialized
            );
            let state = C::initialize(&mut runtime, &call).map_err(EntrypointError::contract)?;
            runtime.write_state(&state)?;
            Ok(Response::empty())
        }
        MethodKind::Call { .. } => {
            let mut state = load_state::<C>(&runtime)?;
            let response = state
                .execute(&mut runtime, &call)
                .map_err(EntrypointError::contract)?;
            runtime.write_state(&state)?;
            Ok(response)
        }
        MethodKind::View => {
            let state = load_state::<C>(&runtime)?;
            let bytes = state
                .view(&mut runtime, &call)
                .map_err(EntrypointError::contract)?;
            Ok(Response::Value(bytes))
        }
    }
}

fn load_state<C: Contract>(runtime: &ContractRuntime) -> Result<C, EntrypointError> {
    match runtime.read_state::<C>()? {
        Some(state) => Ok(state),
        None => C::default_state().ok_or(EntrypointError::NotInitialized),
    }
}

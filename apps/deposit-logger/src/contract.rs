// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;
use xcc_base::{
    codec::{self, CodecError},
    data_types::ArithmeticError,
};
use xcc_sdk::{log, Contract, ContractRuntime, MethodCall, MethodKind, Response, RuntimeError};

use crate::{DepositArgs, DepositLogger};

impl Contract for DepositLogger {
    type Error = Error;

    fn method_kind(method: &str) -> Option<MethodKind> {
        match method {
            "deposit" => Some(MethodKind::PAYABLE),
            "get_deposited" => Some(MethodKind::View),
            _ => None,
        }
    }

    fn default_state() -> Option<Self> {
        Some(DepositLogger::default())
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
            "deposit" => self.deposit(runtime, call.args()?),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }

    fn view(
        &self,
        _runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Vec<u8>, Self::Error> {
        match call.method.as_str() {
            "get_deposited" => Ok(codec::to_json_bytes(&self.deposited)?),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }
}

impl DepositLogger {
    fn deposit(
        &mut self,
        runtime: &mut ContractRuntime,
        DepositArgs { msg }: DepositArgs,
    ) -> Result<Response, Error> {
        let deposit = runtime.attached_value();
        log::trace!("deposit of {deposit} from {}", runtime.predecessor_account_id());
        self.deposited.try_add_assign(deposit)?;

        let account = runtime.current_account_id();
        log!(runtime, "{account}: {msg} (deposit: {deposit})")?;

        Ok(Response::json(&self.deposited)?)
    }
}

/// An error that can occur during the contract execution.
#[derive(Debug, Error)]
pub enum Error {
    /// The contract has no such method.
    #[error("Deposit Logger contract has no method {0:?}")]
    UnknownMethod(String),

    /// The deposited total no longer fits in an amount.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Failed to encode or decode JSON.
    #[error("Failed to encode or decode JSON")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use xcc_base::data_types::Amount;
    use xcc_sdk::{
        entrypoint::{self, EntrypointError},
        test::MockSystemApi,
        Contract, ContractRuntime, MethodCall, Response,
    };

    use super::Error;
    use crate::DepositLogger;

    fn inner_api(deposit: Amount) -> MockSystemApi {
        MockSystemApi::new()
            .with_current_account("inner-a".parse().unwrap())
            .with_attached_value(deposit)
    }

    #[test]
    fn deposit() {
        let mut api = inner_api(Amount::ONE);
        let mut runtime = ContractRuntime::new(&mut api);
        let mut logger = DepositLogger::default();

        let response = logger
            .execute(
                &mut runtime,
                &MethodCall::new("deposit", r#"{"msg":"Call to A"}"#),
            )
            .unwrap();

        assert_eq!(
            response,
            Response::Value(br#""1000000000000000000000000""#.to_vec())
        );
        assert_eq!(logger.deposited, Amount::ONE);
        assert_eq!(
            api.logs(),
            ["inner-a: Call to A (deposit: 1000000000000000000000000)"]
        );
    }

    #[test]
    fn deposits_accumulate_across_calls() {
        let mut api = inner_api(Amount::from_units(7));
        entrypoint::execute::<DepositLogger>(&mut api, "deposit", br#"{"msg":"one"}"#).unwrap();
        entrypoint::execute::<DepositLogger>(&mut api, "deposit", br#"{"msg":"two"}"#).unwrap();

        let mut api = api.into_view();
        assert_eq!(
            entrypoint::execute::<DepositLogger>(&mut api, "get_deposited", b"").unwrap(),
            Response::Value(br#""14""#.to_vec())
        );
    }

    #[test]
    fn missing_message_is_rejected() {
        let mut api = inner_api(Amount::ONE);
        let mut runtime = ContractRuntime::new(&mut api);
        let mut logger = DepositLogger::default();

        assert_matches!(
            logger.execute(&mut runtime, &MethodCall::new("deposit", "{}")),
            Err(Error::Codec(_))
        );
        assert!(api.logs().is_empty());
    }

    #[test]
    fn unknown_methods_are_rejected() {
        let mut api = inner_api(Amount::ZERO);
        assert_matches!(
            entrypoint::execute::<DepositLogger>(&mut api, "withdraw", b""),
            Err(EntrypointError::MethodNotFound(_))
        );
    }
}

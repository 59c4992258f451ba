// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;
use xcc_base::{
    codec::{self, CodecError},
    data_types::{Amount, ArithmeticError},
    ensure,
    identifiers::AccountId,
};
use xcc_sdk::{Contract, ContractRuntime, MethodCall, MethodKind, Response, RuntimeError};

use crate::{
    state::{self, DonationLedgerV1},
    DonationLedger, InitializeArgs, Leader, ReadTotalArgs, OWNER_SHARE_PERCENT,
};

impl Contract for DonationLedger {
    type Error = Error;

    fn method_kind(method: &str) -> Option<MethodKind> {
        match method {
            "initialize" => Some(MethodKind::Init {
                ignore_state: false,
            }),
            "migrate" => Some(MethodKind::Init { ignore_state: true }),
            "record" => Some(MethodKind::PAYABLE),
            "read_total" | "read_top" | "read_top_single" => Some(MethodKind::View),
            _ => None,
        }
    }

    fn initialize(runtime: &mut ContractRuntime, call: &MethodCall) -> Result<Self, Self::Error> {
        match call.method.as_str() {
            "initialize" => {
                let InitializeArgs { owner } = call.args()?;
                Ok(DonationLedger::new(owner))
            }
            "migrate" => DonationLedger::migrate(runtime),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }

    fn execute(
        &mut self,
        runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Response, Self::Error> {
        match call.method.as_str() {
            "record" => self.record(runtime),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }

    fn view(
        &self,
        runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Vec<u8>, Self::Error> {
        match call.method.as_str() {
            "read_total" => {
                let ReadTotalArgs { account } = call.args()?;
                let total = self.donations.get(runtime, &account)?;
                Ok(codec::to_json_bytes(&total.unwrap_or_default())?)
            }
            "read_top" => Ok(codec::to_json_bytes(&self.top_donor.get(runtime)?)?),
            "read_top_single" => Ok(codec::to_json_bytes(
                &self.top_single_donation.get(runtime)?,
            )?),
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }
}

impl DonationLedger {
    /// Reshapes the state left by [`DonationLedgerV1`] after the code of the account was
    /// replaced. Nothing is written unless the previous layout decodes completely.
    fn migrate(runtime: &mut ContractRuntime) -> Result<Self, Error> {
        ensure!(runtime.is_self_call(), Error::PrivateMethod("migrate"));
        let previous = runtime
            .read_state::<DonationLedgerV1>()
            .map_err(|error| Error::MigrationLayoutMismatch(error.to_string()))?
            .ok_or_else(|| Error::MigrationLayoutMismatch("no prior state".into()))?;

        let state = DonationLedger::from(previous);
        state.top_single_donation.clear(runtime)?;
        log::debug!("Migrated the donations of {}", state.owner);
        Ok(state)
    }

    fn record(&mut self, runtime: &mut ContractRuntime) -> Result<Response, Error> {
        let account = runtime.predecessor_account_id();
        let value = runtime.attached_value();
        let total = state::add_donation(&self.donations, runtime, &account, value)?;

        state::challenge(
            &self.top_donor,
            runtime,
            Leader {
                account: account.clone(),
                amount: total,
            },
        )?;
        state::challenge(
            &self.top_single_donation,
            runtime,
            Leader {
                account,
                amount: value,
            },
        )?;

        pay_owner(runtime, &self.owner, value)?;
        Ok(Response::json(&total)?)
    }
}

/// Forwards the owner's share of a donation, keeping the rest on the contract account.
pub(crate) fn pay_owner(
    runtime: &mut ContractRuntime,
    owner: &AccountId,
    donation: Amount,
) -> Result<(), Error> {
    let share = donation.percent(OWNER_SHARE_PERCENT)?;
    if !share.is_zero() {
        let transfer = runtime.transfer(owner.clone(), share)?;
        log::trace!("Forwarding {share} to {owner} as {transfer}");
    }
    Ok(())
}

/// An error that can occur during the contract execution.
#[derive(Debug, Error)]
pub enum Error {
    /// The state left by the previous version cannot be read.
    #[error("Cannot migrate the prior contract state: {0}")]
    MigrationLayoutMismatch(String),

    /// The method can only be called by the contract account itself.
    #[error("Method `{0}` is private")]
    PrivateMethod(&'static str),

    /// The contract has no such method.
    #[error("Donation Ledger contract has no method {0:?}")]
    UnknownMethod(String),

    /// A total no longer fits in an amount.
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
    use serde_json::json;
    use xcc_base::{data_types::Amount, identifiers::AccountId};
    use xcc_sdk::{
        entrypoint::{self, EntrypointError},
        test::{MockSystemApi, ScheduledPromise},
        Response,
    };

    use crate::{DonationLedger, DonationLedgerV1, Leader};

    fn account(name: &str) -> AccountId {
        name.parse().unwrap()
    }

    fn contract_api() -> MockSystemApi {
        MockSystemApi::new()
            .with_current_account(account("donations"))
            .with_predecessor(account("owner"))
    }

    fn initialize<C: xcc_sdk::Contract>(api: &mut MockSystemApi) {
        let args = json!({ "owner": "owner" }).to_string();
        entrypoint::execute::<C>(api, "initialize", args.as_bytes()).unwrap();
    }

    fn record<C: xcc_sdk::Contract>(
        api: MockSystemApi,
        donor: &str,
        tokens: u128,
    ) -> MockSystemApi {
        let mut api = api
            .with_predecessor(account(donor))
            .with_attached_value(Amount::from_tokens(tokens));
        entrypoint::execute::<C>(&mut api, "record", b"").unwrap();
        api.with_attached_value(Amount::ZERO)
    }

    fn view(api: &mut MockSystemApi, method: &str, args: serde_json::Value) -> Vec<u8> {
        let args = args.to_string();
        match entrypoint::execute::<DonationLedger>(api, method, args.as_bytes()).unwrap() {
            Response::Value(bytes) => bytes,
            response => panic!("Unexpected view response {response:?}"),
        }
    }

    fn top(api: &mut MockSystemApi, method: &str) -> Option<Leader> {
        serde_json::from_slice(&view(api, method, json!({}))).unwrap()
    }

    fn leader(donor: &str, tokens: u128) -> Option<Leader> {
        Some(Leader {
            account: account(donor),
            amount: Amount::from_tokens(tokens),
        })
    }

    #[test]
    fn contract_works() {
        let mut api = contract_api();
        initialize::<DonationLedger>(&mut api);
        assert_eq!(top(&mut api, "read_top"), None);

        let api = record::<DonationLedger>(api, "lovely-person", 2);
        let api = record::<DonationLedger>(api, "another-lovely-person", 3);
        let mut api = record::<DonationLedger>(api, "lovely-person", 2);

        let total = view(&mut api, "read_total", json!({ "account": "lovely-person" }));
        assert_eq!(total, br#""4000000000000000000000000""#);
        assert_eq!(top(&mut api, "read_top"), leader("lovely-person", 4));
        assert_eq!(
            top(&mut api, "read_top_single"),
            leader("another-lovely-person", 3)
        );
    }

    #[test]
    fn unseen_accounts_have_no_donations() {
        let mut api = contract_api();
        initialize::<DonationLedger>(&mut api);

        let total = view(&mut api, "read_total", json!({ "account": "stranger" }));
        assert_eq!(total, br#""0""#);
    }

    #[test]
    fn owner_receives_its_share() {
        let mut api = contract_api();
        initialize::<DonationLedger>(&mut api);
        let mut api = api
            .with_predecessor(account("alice"))
            .with_attached_value(Amount::from_units(250));

        let response = entrypoint::execute::<DonationLedger>(&mut api, "record", b"").unwrap();

        assert_eq!(response, Response::Value(br#""250""#.to_vec()));
        assert_eq!(
            api.promises(),
            [ScheduledPromise::Transfer {
                receiver: account("owner"),
                amount: Amount::from_units(190),
            }]
        );
    }

    #[test]
    fn dust_is_not_forwarded() {
        let mut api = contract_api();
        initialize::<DonationLedger>(&mut api);
        let mut api = api
            .with_predecessor(account("alice"))
            .with_attached_value(Amount::from_units(99));

        entrypoint::execute::<DonationLedger>(&mut api, "record", b"").unwrap();
        assert!(api.promises().is_empty());
    }

    #[test]
    fn owner_must_be_a_valid_account() {
        let mut api = contract_api();
        let args = json!({ "owner": "Not An Account" }).to_string();
        assert_matches!(
            entrypoint::execute::<DonationLedger>(&mut api, "initialize", args.as_bytes()),
            Err(EntrypointError::Contract(_))
        );
        assert!(!xcc_sdk::ContractRuntime::new(&mut api).state_exists());
    }

    #[test]
    fn migration_keeps_donations_and_starts_without_single_leader() {
        let mut api = contract_api();
        initialize::<DonationLedgerV1>(&mut api);
        let api = record::<DonationLedgerV1>(api, "alice", 5);
        let mut api = api.with_predecessor(account("donations"));

        entrypoint::execute::<DonationLedger>(&mut api, "migrate", b"").unwrap();

        let total = view(&mut api, "read_total", json!({ "account": "alice" }));
        assert_eq!(total, br#""5000000000000000000000000""#);
        assert_eq!(top(&mut api, "read_top"), leader("alice", 5));
        assert_eq!(top(&mut api, "read_top_single"), None);
    }

    #[test]
    fn migration_is_private() {
        let mut api = contract_api();
        initialize::<DonationLedgerV1>(&mut api);
        assert_matches!(
            entrypoint::execute::<DonationLedger>(&mut api, "migrate", b""),
            Err(EntrypointError::Contract(message)) if message == "Method `migrate` is private"
        );
    }

    #[test]
    fn migration_requires_the_previous_layout() {
        let mut api = contract_api().with_predecessor(account("donations"));
        assert_matches!(
            entrypoint::execute::<DonationLedger>(&mut api, "migrate", b""),
            Err(EntrypointError::Contract(message))
                if message.starts_with("Cannot migrate the prior contract state")
        );

        initialize::<DonationLedger>(&mut api);
        assert_matches!(
            entrypoint::execute::<DonationLedger>(&mut api, "migrate", b""),
            Err(EntrypointError::Contract(message))
                if message.starts_with("Cannot migrate the prior contract state")
        );
    }
}

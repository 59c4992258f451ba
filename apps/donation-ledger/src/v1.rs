// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The first version of the contract, which only tracks totals.

use xcc_base::codec;
use xcc_sdk::{Contract, ContractRuntime, MethodCall, MethodKind, Response};

use crate::{
    contract::{pay_owner, Error},
    state, DonationLedgerV1, InitializeArgs, Leader, ReadTotalArgs,
};

impl Contract for DonationLedgerV1 {
    type Error = Error;

    fn method_kind(method: &str) -> Option<MethodKind> {
        match method {
            "initialize" => Some(MethodKind::Init {
                ignore_state: false,
            }),
            "record" => Some(MethodKind::PAYABLE),
            "read_total" | "read_top" => Some(MethodKind::View),
            _ => None,
        }
    }

    fn initialize(_runtime: &mut ContractRuntime, call: &MethodCall) -> Result<Self, Self::Error> {
        match call.method.as_str() {
            "initialize" => {
                let InitializeArgs { owner } = call.args()?;
                Ok(DonationLedgerV1::new(owner))
            }
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }

    fn execute(
        &mut self,
        runtime: &mut ContractRuntime,
        call: &MethodCall,
    ) -> Result<Response, Self::Error> {
        match call.method.as_str() {
            "record" => {
                let account = runtime.predecessor_account_id();
                let value = runtime.attached_value();
                let total = state::add_donation(&self.donations, runtime, &account, value)?;
                let leader = Leader {
                    account,
                    amount: total,
                };
                state::challenge(&self.top_donor, runtime, leader)?;
                pay_owner(runtime, &self.owner, value)?;
                Ok(Response::json(&total)?)
            }
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
            _ => Err(Error::UnknownMethod(call.method.clone())),
        }
    }
}

//! Static classification of batch calls by function symbol and argument position.
//!
//! Only shapes whose effect depends on the account being the caller are recognized.
//! Signature-based authorizations can be replayed outside the batch and are out of
//! reach here.

use soroban_sdk::{contractclient, symbol_short, Address, Env, Symbol, TryFromVal, Val, Vec};

use crate::types::Call;

/// Router that grants token allowances on behalf of its callers.
#[allow(dead_code)]
#[contractclient(name = "ApprovalRouterClient")]
pub trait ApprovalRouter {
    fn approve(env: Env, from: Address, token: Address, spender: Address, amount: i128);
}

const TRANSFER: Symbol = symbol_short!("transfer");
const APPROVE: Symbol = symbol_short!("approve");

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CallShape {
    /// Native asset leaving the account
    NativeTransfer(i128),
    /// `transfer(from, to, amount)` on a token contract
    TokenTransfer { token: Address, amount: i128 },
    /// `approve(from, spender, amount, expiration_ledger)` with a non-zero amount
    TokenApprove { token: Address, spender: Address },
    /// Router `approve(from, token, spender, amount)` with a non-zero amount
    RouterApprove { token: Address, spender: Address },
    Unrecognized,
}

fn arg<T: TryFromVal<Env, Val>>(env: &Env, args: &Vec<Val>, index: u32) -> Option<T> {
    args.get(index)
        .and_then(|val| T::try_from_val(env, &val).ok())
}

/// Classifies the function part of `call`. A positive `value` is reported
/// separately by `native_value`.
pub fn classify(env: &Env, call: &Call, native_asset: &Address, router: &Address) -> CallShape {
    let func = match &call.func {
        Some(func) => func.clone(),
        None => return CallShape::Unrecognized,
    };
    let args = &call.args;

    if func == TRANSFER && args.len() == 3 {
        return match arg::<i128>(env, args, 2) {
            Some(amount) if call.target == *native_asset => CallShape::NativeTransfer(amount),
            Some(amount) => CallShape::TokenTransfer {
                token: call.target.clone(),
                amount,
            },
            None => CallShape::Unrecognized,
        };
    }

    if func == APPROVE && args.len() == 4 {
        if call.target == *router {
            let token = arg::<Address>(env, args, 1);
            let spender = arg::<Address>(env, args, 2);
            let amount = arg::<i128>(env, args, 3);
            return match (token, spender, amount) {
                (Some(token), Some(spender), Some(amount)) if amount != 0 => {
                    CallShape::RouterApprove { token, spender }
                }
                _ => CallShape::Unrecognized,
            };
        }

        let spender = arg::<Address>(env, args, 1);
        let amount = arg::<i128>(env, args, 2);
        return match (spender, amount) {
            (Some(spender), Some(amount)) if amount != 0 => CallShape::TokenApprove {
                token: call.target.clone(),
                spender,
            },
            _ => CallShape::Unrecognized,
        };
    }

    CallShape::Unrecognized
}

/// Native value attached to `call`, if any.
pub fn native_value(call: &Call) -> i128 {
    call.value.max(0)
}

/// Accumulated findings of a batch scan.
pub struct ScanReport {
    pub native_spent: i128,
    /// (token, declared amount) pairs in call order, one per transfer call
    pub transfers: Vec<(Address, i128)>,
    /// (token, spender) pairs granted through `approve`
    pub approvals: Vec<(Address, Address)>,
    /// (token, spender) pairs granted through the router
    pub router_approvals: Vec<(Address, Address)>,
}

pub fn scan(env: &Env, calls: &Vec<Call>, native_asset: &Address, router: &Address) -> ScanReport {
    let mut report = ScanReport {
        native_spent: 0,
        transfers: Vec::new(env),
        approvals: Vec::new(env),
        router_approvals: Vec::new(env),
    };

    for call in calls.iter() {
        report.native_spent = report.native_spent.saturating_add(native_value(&call));

        match classify(env, &call, native_asset, router) {
            CallShape::NativeTransfer(amount) => {
                report.native_spent = report.native_spent.saturating_add(amount.max(0));
            }
            CallShape::TokenTransfer { token, amount } => {
                report.transfers.push_back((token, amount));
            }
            CallShape::TokenApprove { token, spender } => {
                report.approvals.push_back((token, spender));
            }
            CallShape::RouterApprove { token, spender } => {
                report.router_approvals.push_back((token, spender));
            }
            CallShape::Unrecognized => {}
        }
    }
    report
}

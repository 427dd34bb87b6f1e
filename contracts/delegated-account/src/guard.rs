//! Guarded execution of bot batches.
//!
//! The batch runs first and is settled afterwards: charges are measured, recorded
//! against every active budget and the invocation aborts on the first breach. The
//! host reverts the batch's effects together with the ledger on any abort.

use soroban_sdk::{symbol_short, token, Address, Env, Map, Val, Vec};

use crate::directory;
use crate::dispatch::dispatch;
use crate::ledger::{self, SpendState};
use crate::scan::{scan, ApprovalRouterClient};
use crate::types::{AccountConfig, AccountEvents, BudgetKey, Call, DataKey, ExecMode};
use crate::AccountError;

pub fn mode(env: &Env) -> ExecMode {
    env.storage()
        .instance()
        .get(&DataKey::Mode)
        .unwrap_or(ExecMode::Idle)
}

pub fn set_mode(env: &Env, mode: ExecMode) {
    env.storage().instance().set(&DataKey::Mode, &mode);
}

fn balance_of(env: &Env, token: &Address, account: &Address) -> i128 {
    token::Client::new(env, token).balance(account)
}

/// Amount to charge a guarded token after the batch.
///
/// Declared transfers count even when the balance was topped up mid-batch, and
/// balance drops count even when no transfer call was recognized.
pub fn token_charge(declared: i128, before: i128, after: i128) -> i128 {
    let dropped = before.saturating_sub(after).max(0);
    declared.max(dropped)
}

pub fn execute_guarded(
    env: &Env,
    config: &AccountConfig,
    bot: &Address,
    calls: &Vec<Call>,
) -> Result<Vec<Val>, AccountError> {
    let account = env.current_contract_address();
    let now = env.ledger().timestamp();

    ensure_targets_allowed(config, calls)?;

    let budgets = directory::list_active(env, bot)?;
    let mut states: Vec<SpendState> = Vec::new(env);
    let mut declared: Map<Address, i128> = Map::new(env);
    for budget in budgets.iter() {
        declared.set(budget.token.clone(), 0);
        let key = BudgetKey {
            spender: bot.clone(),
            token: budget.token,
            period: budget.period,
        };
        states.push_back(ledger::load_state(env, &config.oracle, key));
    }

    let report = scan(env, calls, &config.native_asset, &config.router);

    let mut touched: Map<Address, bool> = Map::new(env);
    for (token, amount) in report.transfers.iter() {
        if let Some(sum) = declared.get(token.clone()) {
            declared.set(token.clone(), sum.saturating_add(amount.max(0)));
            touched.set(token, true);
        }
    }
    // The native asset is a token contract too: allowances and burns move it without
    // a recognized shape, so it is measured like any other guarded token.
    if report.native_spent > 0 && declared.contains_key(config.native_asset.clone()) {
        declared.set(config.native_asset.clone(), report.native_spent);
        touched.set(config.native_asset.clone(), true);
    }

    let mut balances: Map<Address, i128> = Map::new(env);
    for token in declared.keys().iter() {
        balances.set(token.clone(), balance_of(env, &token, &account));
    }

    let results = dispatch(env, &config.native_asset, calls);

    let mut charges: Map<Address, i128> = Map::new(env);
    for (token, declared_sum) in declared.iter() {
        let before = balances.get(token.clone()).unwrap_or(0);
        let after = balance_of(env, &token, &account);
        if !touched.contains_key(token.clone()) && before == after {
            continue;
        }
        charges.set(token, token_charge(declared_sum, before, after));
    }

    // Native budgets settle before token budgets.
    for native_pass in [true, false] {
        for mut state in states.iter() {
            if (state.key.token == config.native_asset) != native_pass {
                continue;
            }
            if let Some(charge) = charges.get(state.key.token.clone()) {
                ledger::record(env, &mut state, charge, now)?;
            }
        }
    }

    revoke_approvals(env, config, &account, &report.approvals, &report.router_approvals);

    AccountEvents::batch_guarded(env, bot, calls.len(), report.native_spent);
    Ok(results)
}

/// Rejects bot calls into the limit oracle, and router calls other than `approve`.
///
/// Both contracts trust the account as their direct caller, so a batch could
/// otherwise raise its own limits or move funds through the router.
fn ensure_targets_allowed(config: &AccountConfig, calls: &Vec<Call>) -> Result<(), AccountError> {
    for call in calls.iter() {
        if call.target == config.oracle {
            return Err(AccountError::Unauthorized);
        }
        if call.target == config.router && call.func != Some(symbol_short!("approve")) {
            return Err(AccountError::Unauthorized);
        }
    }
    Ok(())
}

/// Zeroes every allowance the batch granted.
fn revoke_approvals(
    env: &Env,
    config: &AccountConfig,
    account: &Address,
    approvals: &Vec<(Address, Address)>,
    router_approvals: &Vec<(Address, Address)>,
) {
    let expiration_ledger = env.ledger().sequence();
    for (token, spender) in approvals.iter() {
        token::Client::new(env, &token).approve(account, &spender, &0, &expiration_ledger);
        AccountEvents::approval_revoked(env, &token, &spender);
    }

    let router = ApprovalRouterClient::new(env, &config.router);
    for (token, spender) in router_approvals.iter() {
        router.approve(account, &token, &spender, &0);
        AccountEvents::approval_revoked(env, &token, &spender);
    }
}

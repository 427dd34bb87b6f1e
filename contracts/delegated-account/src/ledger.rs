//! Spend ledger: per budget key spent amount within the last-updated window.
//!
//! The ledger never stores limits. `SpendState` snapshots join a ledger row with
//! the oracle's current limit for the duration of one guarded batch.

use soroban_sdk::{contracttype, log, Address, Env, Vec};

use crate::oracle::read_limit;
use crate::period::window_start;
use crate::types::{AccountEvents, ActiveBudget, BudgetKey, DataKey, Period, SpendInfo, SpendRecord};

/// Working copy of one budget during a guarded batch.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendState {
    pub key: BudgetKey,
    pub limit: i128,
    pub spent: i128,
    pub window_start: u64,
}

/// A charge pushed a budget past its limit.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LimitExceeded {
    pub token: Address,
    pub period: Period,
    pub attempted: i128,
    pub limit: i128,
}

pub fn load_record(env: &Env, key: &BudgetKey) -> SpendRecord {
    env.storage()
        .persistent()
        .get(&DataKey::Spend(key.clone()))
        .unwrap_or_default()
}

fn store_record(env: &Env, key: &BudgetKey, record: &SpendRecord) {
    env.storage()
        .persistent()
        .set(&DataKey::Spend(key.clone()), record);
}

/// Drops the ledger row of `key`; the next spend starts from zero.
pub fn clear(env: &Env, key: &BudgetKey) {
    env.storage().persistent().remove(&DataKey::Spend(key.clone()));
}

pub fn load_state(env: &Env, oracle: &Address, key: BudgetKey) -> SpendState {
    let record = load_record(env, &key);
    let limit = read_limit(env, oracle, &key.spender, &key.token, key.period);
    SpendState {
        key,
        limit,
        spent: record.spent,
        window_start: record.window_start,
    }
}

/// Charges `amount` against `state` at time `now` and persists the result.
///
/// A row from an older window is rolled over before the charge. Nothing is written
/// when the new total exceeds the limit.
pub fn record(
    env: &Env,
    state: &mut SpendState,
    amount: i128,
    now: u64,
) -> Result<i128, LimitExceeded> {
    let current_window = window_start(now, state.key.period);
    let (base, start) = if state.window_start < current_window {
        (0, current_window)
    } else {
        (state.spent, state.window_start)
    };

    let spent = base.saturating_add(amount);
    if spent > state.limit {
        log!(
            env,
            "spend limit exceeded",
            state.key.token,
            state.key.period,
            spent,
            state.limit
        );
        return Err(LimitExceeded {
            token: state.key.token.clone(),
            period: state.key.period,
            attempted: spent,
            limit: state.limit,
        });
    }

    state.spent = spent;
    state.window_start = start;
    store_record(
        env,
        &state.key,
        &SpendRecord {
            spent,
            window_start: start,
        },
    );
    AccountEvents::spend_recorded(env, &state.key, amount, spent);
    Ok(spent)
}

/// Derived read-only view of one budget at time `now`.
pub fn spend_info(
    env: &Env,
    oracle: &Address,
    spender: &Address,
    budget: &ActiveBudget,
    now: u64,
) -> SpendInfo {
    let key = BudgetKey {
        spender: spender.clone(),
        token: budget.token.clone(),
        period: budget.period,
    };
    let record = load_record(env, &key);
    let current_window_start = window_start(now, budget.period);
    let current_spent = if record.window_start >= current_window_start {
        record.spent
    } else {
        0
    };

    SpendInfo {
        token: budget.token.clone(),
        period: budget.period,
        limit: read_limit(env, oracle, spender, &budget.token, budget.period),
        spent: record.spent,
        last_updated: record.window_start,
        current_window_start,
        current_spent,
    }
}

pub fn list_spend_info(
    env: &Env,
    oracle: &Address,
    spender: &Address,
    budgets: &Vec<ActiveBudget>,
) -> Vec<SpendInfo> {
    let now = env.ledger().timestamp();
    let mut infos = Vec::new(env);
    for budget in budgets.iter() {
        infos.push_back(spend_info(env, oracle, spender, &budget, now));
    }
    infos
}

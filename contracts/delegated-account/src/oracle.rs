//! Port to the external limit oracle that owns budget maximums.

use soroban_sdk::{contractclient, Address, Env, Symbol};

use crate::types::Period;

/// Interface of the delegation registry that stores spend limits.
///
/// Limits are keyed by (account, spender, token, rights). The account pushes limits
/// on configuration and re-reads them on every spend.
#[allow(dead_code)]
#[contractclient(name = "LimitOracleClient")]
pub trait LimitOracle {
    fn set_limit(
        env: Env,
        account: Address,
        spender: Address,
        token: Address,
        rights: Symbol,
        amount: i128,
    );

    fn get_limit(
        env: Env,
        spender: Address,
        account: Address,
        token: Address,
        rights: Symbol,
    ) -> i128;
}

/// Rights tag namespacing each period in the oracle's key space.
pub fn rights_tag(env: &Env, period: Period) -> Symbol {
    let tag = match period {
        Period::Minute => "spend_minute",
        Period::Hour => "spend_hour",
        Period::Day => "spend_day",
        Period::Week => "spend_week",
        Period::Month => "spend_month",
        Period::Year => "spend_year",
        Period::Forever => "spend_forever",
    };
    Symbol::new(env, tag)
}

pub fn push_limit(
    env: &Env,
    oracle: &Address,
    spender: &Address,
    token: &Address,
    period: Period,
    amount: i128,
) {
    LimitOracleClient::new(env, oracle).set_limit(
        &env.current_contract_address(),
        spender,
        token,
        &rights_tag(env, period),
        &amount,
    );
}

pub fn read_limit(
    env: &Env,
    oracle: &Address,
    spender: &Address,
    token: &Address,
    period: Period,
) -> i128 {
    LimitOracleClient::new(env, oracle).get_limit(
        spender,
        &env.current_contract_address(),
        token,
        &rights_tag(env, period),
    )
}

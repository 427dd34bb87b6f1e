use soroban_sdk::{token, Address, Env, IntoVal, Val, Vec};

use crate::types::Call;

/// Runs `calls` in order on behalf of the account and collects their results.
///
/// Any failing call aborts the invocation.
pub fn dispatch(env: &Env, native_asset: &Address, calls: &Vec<Call>) -> Vec<Val> {
    let account = env.current_contract_address();
    let native = token::Client::new(env, native_asset);

    let mut results = Vec::new(env);
    for call in calls.iter() {
        if call.value > 0 {
            native.transfer(&account, &call.target, &call.value);
        }

        let result = match &call.func {
            Some(func) => env.invoke_contract::<Val>(&call.target, func, call.args.clone()),
            None => ().into_val(env),
        };
        results.push_back(result);
    }
    results
}

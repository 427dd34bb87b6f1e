//! Budget directory: the ordered set of active (token, period) pairs per spender.
//!
//! Persisted as one `Bytes` blob of fixed-width records, each the token's strkey
//! followed by the period byte. The blob is replaced wholesale on every update.

use soroban_sdk::{Address, Bytes, Env, Vec};

use crate::ledger;
use crate::oracle::push_limit;
use crate::types::{
    AccountEvents, ActiveBudget, BudgetConfig, BudgetKey, DataKey, Period, ADDRESS_STRKEY_LEN,
    BUDGET_RECORD_LEN, MAX_ACTIVE_BUDGETS,
};
use crate::AccountError;

fn encode_entry(env: &Env, token: &Address, period: Period) -> Bytes {
    let mut strkey = [0u8; ADDRESS_STRKEY_LEN as usize];
    token.to_string().copy_into_slice(&mut strkey);

    let mut record = Bytes::from_slice(env, &strkey);
    record.push_back(period.to_u8());
    record
}

pub fn encode(env: &Env, entries: &Vec<ActiveBudget>) -> Bytes {
    let mut blob = Bytes::new(env);
    for entry in entries.iter() {
        blob.append(&encode_entry(env, &entry.token, entry.period));
    }
    blob
}

pub fn decode(env: &Env, blob: &Bytes) -> Result<Vec<ActiveBudget>, AccountError> {
    if blob.len() % BUDGET_RECORD_LEN != 0 {
        return Err(AccountError::InvariantViolation);
    }

    let mut entries = Vec::new(env);
    let mut offset = 0;
    while offset < blob.len() {
        let token = Address::from_string_bytes(&blob.slice(offset..offset + ADDRESS_STRKEY_LEN));
        let period = blob
            .get(offset + ADDRESS_STRKEY_LEN)
            .and_then(Period::from_u8)
            .ok_or(AccountError::InvariantViolation)?;
        entries.push_back(ActiveBudget { token, period });
        offset += BUDGET_RECORD_LEN;
    }
    Ok(entries)
}

/// Rejects configurations that repeat a (token, period) pair.
///
/// Sorts the encoded records and compares neighbours, so detection order does not
/// depend on the order entries were supplied in.
pub fn ensure_unique(env: &Env, entries: &Vec<BudgetConfig>) -> Result<(), AccountError> {
    let mut sorted: Vec<Bytes> = Vec::new(env);
    for entry in entries.iter() {
        let record = encode_entry(env, &entry.token, entry.period);
        let mut index = sorted.len();
        while index > 0 && sorted.get_unchecked(index - 1) > record {
            index -= 1;
        }
        sorted.insert(index, record);
    }

    for i in 1..sorted.len() {
        if sorted.get_unchecked(i - 1) == sorted.get_unchecked(i) {
            return Err(AccountError::DuplicatedBudgetConfig);
        }
    }
    Ok(())
}

/// Replaces the active budgets of `spender`.
///
/// Limits are pushed to the oracle for every entry and ledger rows flagged for reset
/// are cleared before the new directory is written. Budgets left out keep their
/// ledger rows, so re-adding one without `reset` resumes its previous spend.
pub fn set_active(
    env: &Env,
    oracle: &Address,
    spender: &Address,
    entries: &Vec<BudgetConfig>,
) -> Result<(), AccountError> {
    if entries.len() > MAX_ACTIVE_BUDGETS {
        return Err(AccountError::TooManyBudgets);
    }
    ensure_unique(env, entries)?;

    let mut active = Vec::new(env);
    for entry in entries.iter() {
        if entry.limit < 0 {
            return Err(AccountError::InvalidLimit);
        }

        push_limit(env, oracle, spender, &entry.token, entry.period, entry.limit);
        AccountEvents::budget_set(env, spender, &entry.token, entry.period, entry.limit);

        if entry.reset {
            let key = BudgetKey {
                spender: spender.clone(),
                token: entry.token.clone(),
                period: entry.period,
            };
            ledger::clear(env, &key);
            AccountEvents::budget_reset(env, spender, &entry.token, entry.period);
        }

        active.push_back(ActiveBudget {
            token: entry.token,
            period: entry.period,
        });
    }

    env.storage()
        .persistent()
        .set(&DataKey::Budgets(spender.clone()), &encode(env, &active));
    Ok(())
}

pub fn list_active(env: &Env, spender: &Address) -> Result<Vec<ActiveBudget>, AccountError> {
    match env
        .storage()
        .persistent()
        .get::<_, Bytes>(&DataKey::Budgets(spender.clone()))
    {
        Some(blob) => decode(env, &blob),
        None => Ok(Vec::new(env)),
    }
}

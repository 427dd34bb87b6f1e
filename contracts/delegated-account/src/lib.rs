//! # Delegated Account Contract
//!
//! A Soroban account that lets a designated bot submit batches of calls on its
//! behalf under per-token, per-period spend budgets, while a master keeps
//! unrestricted control.
//!
//! ## Features
//!
//! - **Spend Budgets**: Minute to yearly (or never-resetting) windows per token
//! - **Guarded Batches**: Actual spend is measured after the batch and capped
//! - **Approval Hygiene**: Allowances granted by a bot batch are revoked before it returns
//! - **External Limits**: Budget maximums live in a limit oracle, spend lives here
//!
#![no_std]

mod directory;
mod dispatch;
mod guard;
mod ledger;
mod oracle;
mod period;
mod scan;
mod types;
mod validation;

use soroban_sdk::{contract, contractimpl, panic_with_error, Address, Env, Val, Vec};

pub use crate::ledger::{LimitExceeded, SpendState};
pub use crate::oracle::{rights_tag, LimitOracle, LimitOracleClient};
pub use crate::period::{window_start, FOREVER_WINDOW_START};
pub use crate::scan::{ApprovalRouter, ApprovalRouterClient, CallShape};
pub use crate::types::{
    AccountConfig, AccountEvents, ActiveBudget, BudgetConfig, BudgetKey, Call, DataKey, ExecMode,
    Period, SpendInfo, SpendRecord, BUDGET_RECORD_LEN, MAX_ACTIVE_BUDGETS, MAX_BATCH_SIZE,
};
use crate::validation::validate_roles;

/// Error codes for the delegated account contract.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum AccountError {
    /// Contract not initialized
    NotInitialized = 1,
    /// Caller is not allowed, or the account is inside a guarded batch
    Unauthorized = 2,
    /// No bot is configured
    SpenderUnset = 3,
    /// The same (token, period) appears twice in one budget update
    DuplicatedBudgetConfig = 4,
    /// A budget would be exceeded by the batch
    LimitExceeded = 5,
    /// Persisted state could not be decoded
    InvariantViolation = 6,
    /// Bot equals the master or the account itself
    InvalidRole = 7,
    /// Budget limit is negative
    InvalidLimit = 8,
    /// Batch exceeds maximum size
    BatchTooLarge = 9,
    /// Budget update exceeds the maximum number of active budgets
    TooManyBudgets = 10,
}

impl From<AccountError> for soroban_sdk::Error {
    fn from(e: AccountError) -> Self {
        soroban_sdk::Error::from_contract_error(e as u32)
    }
}

impl From<LimitExceeded> for AccountError {
    fn from(_: LimitExceeded) -> Self {
        AccountError::LimitExceeded
    }
}

#[contract]
pub struct DelegatedAccountContract;

#[contractimpl]
impl DelegatedAccountContract {
    /// Sets roles and external collaborators. Runs once, atomically with deployment.
    ///
    /// # Arguments
    /// * `master` - Principal with unrestricted control, if any
    /// * `bot` - Principal allowed to submit guarded batches, if any
    /// * `native_asset` - Stellar Asset Contract of the native asset
    /// * `router` - Router whose grants are revoked after bot batches
    /// * `oracle` - Limit oracle holding budget maximums
    pub fn __constructor(
        env: Env,
        master: Option<Address>,
        bot: Option<Address>,
        native_asset: Address,
        router: Address,
        oracle: Address,
    ) {
        if let Err(e) = validate_roles(&env, &master, &bot) {
            panic_with_error!(&env, e);
        }

        let config = AccountConfig {
            native_asset,
            router,
            oracle,
        };
        env.storage().instance().set(&DataKey::Config, &config);
        env.storage().instance().set(&DataKey::Master, &master);
        env.storage().instance().set(&DataKey::Bot, &bot);
        guard::set_mode(&env, ExecMode::Idle);

        AccountEvents::initialized(&env, &master, &bot);
    }

    /// Replaces the master. Passing `None` clears it.
    pub fn set_master(env: Env, caller: Address, master: Option<Address>) {
        Self::require_admin(&env, &caller);

        let bot = Self::get_bot(env.clone());
        if let Err(e) = validate_roles(&env, &master, &bot) {
            panic_with_error!(&env, e);
        }

        env.storage().instance().set(&DataKey::Master, &master);
        AccountEvents::master_changed(&env, &master);
    }

    /// Replaces the bot. Passing `None` clears it.
    pub fn set_bot(env: Env, caller: Address, bot: Option<Address>) {
        Self::require_admin(&env, &caller);

        let master = Self::get_master(env.clone());
        if let Err(e) = validate_roles(&env, &master, &bot) {
            panic_with_error!(&env, e);
        }

        env.storage().instance().set(&DataKey::Bot, &bot);
        AccountEvents::bot_changed(&env, &bot);
    }

    pub fn get_master(env: Env) -> Option<Address> {
        env.storage()
            .instance()
            .get(&DataKey::Master)
            .unwrap_or(None)
    }

    pub fn get_bot(env: Env) -> Option<Address> {
        env.storage().instance().get(&DataKey::Bot).unwrap_or(None)
    }

    pub fn get_config(env: Env) -> AccountConfig {
        Self::require_config(&env)
    }

    pub fn get_mode(env: Env) -> ExecMode {
        guard::mode(&env)
    }

    /// Replaces the bot's active budgets.
    ///
    /// # Arguments
    /// * `caller` - The master
    /// * `entries` - Budgets to activate; limits are pushed to the oracle and
    ///   entries flagged `reset` start from zero spend
    ///
    /// # Errors
    /// * `SpenderUnset` - If no bot is configured
    /// * `DuplicatedBudgetConfig` - If a (token, period) pair repeats
    /// * `InvalidLimit` - If a limit is negative
    /// * `TooManyBudgets` - If more than `MAX_ACTIVE_BUDGETS` entries are given
    pub fn set_budgets(env: Env, caller: Address, entries: Vec<BudgetConfig>) {
        Self::require_admin(&env, &caller);
        let config = Self::require_config(&env);

        let spender = match Self::get_bot(env.clone()) {
            Some(bot) => bot,
            None => panic_with_error!(&env, AccountError::SpenderUnset),
        };

        if let Err(e) = directory::set_active(&env, &config.oracle, &spender, &entries) {
            panic_with_error!(&env, e);
        }
    }

    /// Returns the bot's active budgets in configuration order.
    pub fn list_active_budgets(env: Env) -> Vec<ActiveBudget> {
        match Self::get_bot(env.clone()) {
            Some(bot) => Self::active_budgets(&env, &bot),
            None => Vec::new(&env),
        }
    }

    /// Returns limit, spend and current window of every active budget of the bot.
    pub fn list_spend_info(env: Env) -> Vec<SpendInfo> {
        let bot = match Self::get_bot(env.clone()) {
            Some(bot) => bot,
            None => return Vec::new(&env),
        };
        let config = Self::require_config(&env);
        let budgets = Self::active_budgets(&env, &bot);
        ledger::list_spend_info(&env, &config.oracle, &bot, &budgets)
    }

    /// Executes a batch of calls from the account.
    ///
    /// Batches from the bot run guarded: spend is measured and charged against
    /// the active budgets and allowances granted by the batch are revoked. Batches
    /// from the master run unguarded.
    ///
    /// # Errors
    /// * `Unauthorized` - If the caller holds no role or a guarded batch is in flight
    /// * `BatchTooLarge` - If more than `MAX_BATCH_SIZE` calls are given
    /// * `LimitExceeded` - If any budget would be exceeded
    pub fn execute(env: Env, caller: Address, calls: Vec<Call>) -> Vec<Val> {
        caller.require_auth();
        let config = Self::require_config(&env);
        Self::require_idle(&env);

        if calls.len() > MAX_BATCH_SIZE {
            panic_with_error!(&env, AccountError::BatchTooLarge);
        }

        if Self::get_bot(env.clone()).as_ref() == Some(&caller) {
            guard::set_mode(&env, ExecMode::Guarded);
            let outcome = guard::execute_guarded(&env, &config, &caller, &calls);
            guard::set_mode(&env, ExecMode::Idle);

            return match outcome {
                Ok(results) => results,
                Err(e) => panic_with_error!(&env, e),
            };
        }

        if !Self::is_admin(&env, &caller) {
            panic_with_error!(&env, AccountError::Unauthorized);
        }
        AccountEvents::batch_direct(&env, &caller, calls.len());
        dispatch::dispatch(&env, &config.native_asset, &calls)
    }

    fn active_budgets(env: &Env, spender: &Address) -> Vec<ActiveBudget> {
        match directory::list_active(env, spender) {
            Ok(budgets) => budgets,
            Err(e) => panic_with_error!(env, e),
        }
    }

    fn require_config(env: &Env) -> AccountConfig {
        match env.storage().instance().get(&DataKey::Config) {
            Some(config) => config,
            None => panic_with_error!(env, AccountError::NotInitialized),
        }
    }

    fn require_idle(env: &Env) {
        if guard::mode(env) == ExecMode::Guarded {
            panic_with_error!(env, AccountError::Unauthorized);
        }
    }

    fn is_admin(env: &Env, caller: &Address) -> bool {
        Self::get_master(env.clone()).as_ref() == Some(caller)
    }

    // Internal helper to verify the master
    fn require_admin(env: &Env, caller: &Address) {
        caller.require_auth();
        Self::require_idle(env);

        if !Self::is_admin(env, caller) {
            panic_with_error!(env, AccountError::Unauthorized);
        }
    }
}

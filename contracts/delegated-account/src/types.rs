use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, Val, Vec};

/// Maximum number of calls in a single `execute` batch.
pub const MAX_BATCH_SIZE: u32 = 100;

/// Maximum number of active budgets a spender may carry.
pub const MAX_ACTIVE_BUDGETS: u32 = 32;

/// Length of an `Address` strkey (`G...` accounts and `C...` contracts).
pub const ADDRESS_STRKEY_LEN: u32 = 56;

/// Width of one persisted directory record: token strkey followed by the period byte.
pub const BUDGET_RECORD_LEN: u32 = ADDRESS_STRKEY_LEN + 1;

/// Budget window granularity.
///
/// Discriminants are persisted in directory blobs and must never be reordered.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
#[repr(u32)]
pub enum Period {
    Minute = 0,
    Hour = 1,
    Day = 2,
    Week = 3,
    Month = 4,
    Year = 5,
    Forever = 6,
}

impl Period {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Period> {
        match value {
            0 => Some(Period::Minute),
            1 => Some(Period::Hour),
            2 => Some(Period::Day),
            3 => Some(Period::Week),
            4 => Some(Period::Month),
            5 => Some(Period::Year),
            6 => Some(Period::Forever),
            _ => None,
        }
    }
}

/// Identifies one rate-limited bucket.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BudgetKey {
    pub spender: Address,
    pub token: Address,
    pub period: Period,
}

/// One entry of a `set_budgets` call.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BudgetConfig {
    pub token: Address,
    pub period: Period,
    /// Maximum spend per window, forwarded to the limit oracle
    pub limit: i128,
    /// Clear the spend ledger for this key before the directory is replaced
    pub reset: bool,
}

/// An active (token, period) pair in a spender's budget directory.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ActiveBudget {
    pub token: Address,
    pub period: Period,
}

/// Persisted spend ledger row. Absent rows read as `{ spent: 0, window_start: 0 }`.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SpendRecord {
    pub spent: i128,
    pub window_start: u64,
}

/// Read-only view of a budget combining directory, ledger and oracle state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpendInfo {
    pub token: Address,
    pub period: Period,
    pub limit: i128,
    pub spent: i128,
    pub last_updated: u64,
    pub current_window_start: u64,
    /// `spent` if `last_updated` falls in the current window, else 0
    pub current_spent: i128,
}

/// A call descriptor handed to `execute`.
///
/// A positive `value` moves that much of the native asset to `target` before
/// `func` (if any) is invoked with `args`.
#[contracttype]
#[derive(Clone, Debug)]
pub struct Call {
    pub target: Address,
    pub value: i128,
    pub func: Option<Symbol>,
    pub args: Vec<Val>,
}

/// External collaborators fixed at initialization.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AccountConfig {
    /// Stellar Asset Contract of the native asset; also the native budget token
    pub native_asset: Address,
    /// Router whose `approve(from, token, spender, amount)` grants are revoked after bot batches
    pub router: Address,
    /// Limit oracle holding the authoritative budget maximums
    pub oracle: Address,
}

/// Execution mode of the account.
#[contracttype]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ExecMode {
    Idle,
    Guarded,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Master,
    Bot,
    Mode,
    /// Encoded budget directory of a spender
    Budgets(Address),
    /// Spend ledger row of a budget key
    Spend(BudgetKey),
}

pub struct AccountEvents;

impl AccountEvents {
    pub fn initialized(env: &Env, master: &Option<Address>, bot: &Option<Address>) {
        let topics = (symbol_short!("init"), symbol_short!("account"));
        env.events().publish(topics, (master.clone(), bot.clone()));
    }

    pub fn master_changed(env: &Env, master: &Option<Address>) {
        let topics = (symbol_short!("role"), symbol_short!("master"));
        env.events().publish(topics, master.clone());
    }

    pub fn bot_changed(env: &Env, bot: &Option<Address>) {
        let topics = (symbol_short!("role"), symbol_short!("bot"));
        env.events().publish(topics, bot.clone());
    }

    pub fn budget_set(env: &Env, spender: &Address, token: &Address, period: Period, limit: i128) {
        let topics = (symbol_short!("budget"), symbol_short!("set"), spender.clone());
        env.events().publish(topics, (token.clone(), period, limit));
    }

    pub fn budget_reset(env: &Env, spender: &Address, token: &Address, period: Period) {
        let topics = (symbol_short!("budget"), symbol_short!("reset"), spender.clone());
        env.events().publish(topics, (token.clone(), period));
    }

    pub fn spend_recorded(env: &Env, key: &BudgetKey, amount: i128, spent: i128) {
        let topics = (symbol_short!("spend"), symbol_short!("record"), key.spender.clone());
        env.events()
            .publish(topics, (key.token.clone(), key.period, amount, spent));
    }

    pub fn approval_revoked(env: &Env, token: &Address, spender: &Address) {
        let topics = (symbol_short!("approve"), symbol_short!("revoked"));
        env.events().publish(topics, (token.clone(), spender.clone()));
    }

    pub fn batch_guarded(env: &Env, bot: &Address, call_count: u32, native_spent: i128) {
        let topics = (symbol_short!("batch"), symbol_short!("guarded"), bot.clone());
        env.events().publish(topics, (call_count, native_spent));
    }

    pub fn batch_direct(env: &Env, caller: &Address, call_count: u32) {
        let topics = (symbol_short!("batch"), symbol_short!("direct"), caller.clone());
        env.events().publish(topics, call_count);
    }
}

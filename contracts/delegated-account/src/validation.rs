//! Role invariants checked on every role mutation.

use soroban_sdk::{Address, Env};

use crate::AccountError;

/// The bot may be unset, but when set it must differ from both the master and the
/// account itself.
pub fn validate_roles(
    env: &Env,
    master: &Option<Address>,
    bot: &Option<Address>,
) -> Result<(), AccountError> {
    let bot = match bot {
        Some(bot) => bot,
        None => return Ok(()),
    };

    if *bot == env.current_contract_address() {
        return Err(AccountError::InvalidRole);
    }
    if master.as_ref() == Some(bot) {
        return Err(AccountError::InvalidRole);
    }
    Ok(())
}

//! HAM token command handlers.

use std::sync::Arc;

use serde_json::Value;

use crate::commands::{address_param, amount_param, lock, to_json, Result};
use crate::DaemonState;

/// HAM balance of `account`.
pub async fn balance_of(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = address_param(params, "account")?;
    let balance = lock(&state.deployment.token, "token")?.balance_of(&account);
    Ok(serde_json::json!(balance.to_string()))
}

pub async fn minter(state: &Arc<DaemonState>) -> Result {
    let minter = lock(&state.deployment.token, "token")?.minter();
    Ok(serde_json::json!(minter))
}

/// Name, symbol, decimals, supply and minter.
pub async fn info(state: &Arc<DaemonState>) -> Result {
    let info = lock(&state.deployment.token, "token")?.info();
    to_json(&info)
}

/// Mint `amount` to `to`. Only succeeds when `from` is the minter, which
/// after deployment is the bank contract.
pub async fn mint(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;
    let to = address_param(params, "to")?;
    let amount = amount_param(params, "amount")?;

    let balance = lock(&state.deployment.token, "token")?.mint(&from, to, amount)?;
    Ok(serde_json::json!({ "balance": balance.to_string() }))
}

pub async fn pass_minter_role(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;
    let new_minter = address_param(params, "new_minter")?;

    lock(&state.deployment.token, "token")?.pass_minter_role(&from, new_minter)?;
    Ok(serde_json::json!({ "minter": new_minter }))
}

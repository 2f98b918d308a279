//! Bank command handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::commands::{address_param, amount_param, lock, to_json, Result};
use crate::DaemonState;

/// Deposit `value` wei from `from`.
pub async fn deposit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;
    let value = amount_param(params, "value")?;

    let receipt = lock(&state.deployment.bank, "bank")?.deposit(from, value)?;
    state.event_bus.emit_all(&receipt.events);

    to_json(&receipt)
}

/// Withdraw the principal of `from` and mint its HAM interest.
pub async fn withdraw(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;

    let receipt = lock(&state.deployment.bank, "bank")?.withdraw(from)?;
    state.event_bus.emit_all(&receipt.events);
    info!(account = %from, reward = %receipt.reward, "withdrawal served");

    to_json(&receipt)
}

/// Position of `account`.
pub async fn investor(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = address_param(params, "account")?;
    let position = lock(&state.deployment.bank, "bank")?.investor(&account);
    to_json(&position)
}

pub async fn yearly_return_rate(state: &Arc<DaemonState>) -> Result {
    let rate = lock(&state.deployment.bank, "bank")?.yearly_return_rate();
    Ok(serde_json::json!(rate))
}

/// Bank address and the wei it holds.
pub async fn custody(state: &Arc<DaemonState>) -> Result {
    let bank = lock(&state.deployment.bank, "bank")?;
    let balance = bank.custody_balance()?;
    Ok(serde_json::json!({
        "address": bank.address(),
        "balance": balance.to_string(),
    }))
}

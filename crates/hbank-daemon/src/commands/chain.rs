//! Chain, native balance and subscription handlers.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::commands::{address_param, lock, Result};
use crate::events::{EventFilter, Subscription};
use crate::rpc::RpcError;
use crate::DaemonState;

/// Most blocks a single `chain_mine` call may produce.
pub const MAX_MINE_BATCH: u64 = 10_000;

pub async fn block_number(state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!(state.chain.block_number()))
}

/// Native wei balance of `account`.
pub async fn native_balance_of(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = address_param(params, "account")?;
    let balance = lock(state.chain.native(), "native")?.balance_of(&account);
    Ok(serde_json::json!(balance.to_string()))
}

/// Funded dev accounts; the first one deployed the contracts.
pub async fn accounts(state: &Arc<DaemonState>) -> Result {
    Ok(serde_json::json!(state.chain.accounts()))
}

/// Dev-only: mine `count` blocks (default 1) immediately.
pub async fn mine(state: &Arc<DaemonState>, params: &Value) -> Result {
    let count = params.get("count").and_then(Value::as_u64).unwrap_or(1);
    if count == 0 || count > MAX_MINE_BATCH {
        return Err(RpcError::invalid_params(&format!(
            "count must be between 1 and {MAX_MINE_BATCH}"
        )));
    }
    let block = state.chain.clock().mine_many(count);
    info!(count, block, "blocks mined on request");
    Ok(serde_json::json!(block))
}

/// Subscribe the calling connection to contract events. Returns the
/// subscription and the bus sequence it starts after.
pub async fn subscribe_events(
    state: &Arc<DaemonState>,
    params: &Value,
) -> Result<(Subscription, Value)> {
    let filter = match params.get("filter") {
        None | Some(Value::Null) => EventFilter::default(),
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| RpcError::invalid_params(&format!("filter: {e}")))?,
    };
    let subscription = state.event_bus.subscribe(filter);
    Ok((
        subscription,
        serde_json::json!({
            "subscribed": true,
            "sequence": state.event_bus.sequence(),
        }),
    ))
}

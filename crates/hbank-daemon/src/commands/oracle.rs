//! ETH/HAM oracle command handlers.

use std::sync::Arc;

use serde_json::Value;

use hbank_types::Address;

use crate::commands::{address_param, lock, optional_address_param, u64_param, Result};
use crate::DaemonState;

/// Read the rate, refreshing it if stale. `from` is optional; anyone may
/// read.
pub async fn get_rate(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = optional_address_param(params, "from")?.unwrap_or(Address::ZERO);

    let reading = lock(&state.deployment.oracle, "oracle")?.get_rate(&from)?;
    let refreshed = reading.event.is_some();
    if let Some(event) = reading.event {
        state.event_bus.emit(event);
    }

    Ok(serde_json::json!({
        "rate": reading.rate,
        "refreshed": refreshed,
    }))
}

/// Force a new rate. Owner only.
pub async fn update_rate(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;
    let rate = u64_param(params, "rate")?;

    let event = lock(&state.deployment.oracle, "oracle")?.update_rate(&from, rate)?;
    let block = event.tick;
    state.event_bus.emit(event);

    Ok(serde_json::json!({ "rate": rate, "block": block }))
}

/// Cached rate and the block it was set at. Never refreshes.
pub async fn last_update_block(state: &Arc<DaemonState>) -> Result {
    let oracle = lock(&state.deployment.oracle, "oracle")?;
    Ok(serde_json::json!({
        "block": oracle.last_update_tick(),
        "rate": oracle.rate(),
        "price_feed": oracle.price_feed(),
    }))
}

pub async fn transfer_ownership(state: &Arc<DaemonState>, params: &Value) -> Result {
    let from = address_param(params, "from")?;
    let new_owner = address_param(params, "new_owner")?;

    let event = lock(&state.deployment.oracle, "oracle")?.transfer_ownership(&from, new_owner)?;
    state.event_bus.emit(event);

    Ok(serde_json::json!({ "owner": new_owner }))
}

/// Dev-only: set the rate the stub source serves on the next refresh.
pub async fn dev_set_oracle_rate(state: &Arc<DaemonState>, params: &Value) -> Result {
    let rate = u64_param(params, "rate")?;
    state.rate_source.dev_set_rate(rate);
    Ok(serde_json::json!({ "rate_set": true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::dev_state;
    use serde_json::json;

    #[tokio::test]
    async fn test_fresh_read_does_not_refresh() {
        let state = dev_state();
        let reading = get_rate(&state, &json!({})).await.expect("rate");
        assert_eq!(reading, json!({ "rate": 0, "refreshed": false }));
    }

    #[tokio::test]
    async fn test_stale_read_refreshes_from_source() {
        let state = dev_state();
        dev_set_oracle_rate(&state, &json!({ "rate": 250 }))
            .await
            .expect("set rate");
        state.chain.clock().mine_many(4);

        let reading = get_rate(&state, &json!({})).await.expect("rate");
        assert_eq!(reading, json!({ "rate": 250, "refreshed": true }));

        let last = last_update_block(&state).await.expect("last update");
        assert_eq!(last["block"], 5);
        assert_eq!(last["price_feed"], "ETH/HAM");
    }

    #[tokio::test]
    async fn test_update_rate_owner_only() {
        let state = dev_state();
        let outsider = Address::from_index(4);
        let err = update_rate(&state, &json!({ "from": outsider, "rate": 5 }))
            .await
            .expect_err("not owner");
        assert_eq!(err.message, "caller is not the owner");

        let deployer = state.chain.deployer();
        let updated = update_rate(&state, &json!({ "from": deployer, "rate": 5 }))
            .await
            .expect("owner update");
        assert_eq!(updated["rate"], 5);
    }
}

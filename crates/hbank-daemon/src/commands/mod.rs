//! IPC command handlers.
//!
//! Each submodule implements the commands for one contract. Callers are
//! identified by the `from` param; the daemon trusts it as a dev chain
//! trusts its unlocked accounts.

pub mod bank;
pub mod chain;
pub mod oracle;
pub mod token;

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;

use hbank_types::Address;

use crate::rpc::RpcError;

/// Handler result.
pub type Result<T = Value> = std::result::Result<T, RpcError>;

/// Malformed call parameters.
#[derive(Debug, thiserror::Error)]
pub enum ParamError {
    #[error("{0} required")]
    Missing(&'static str),

    #[error("{name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl From<ParamError> for RpcError {
    fn from(err: ParamError) -> Self {
        RpcError::invalid_params(&err.to_string())
    }
}

/// Required `0x`-prefixed address param.
pub fn address_param(params: &Value, name: &'static str) -> Result<Address> {
    let raw = params
        .get(name)
        .and_then(Value::as_str)
        .ok_or(ParamError::Missing(name))?;
    let address = raw.parse().map_err(|e: hbank_types::AddressParseError| {
        ParamError::Invalid {
            name,
            reason: e.to_string(),
        }
    })?;
    Ok(address)
}

/// Optional address param.
pub fn optional_address_param(params: &Value, name: &'static str) -> Result<Option<Address>> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => address_param(params, name).map(Some),
    }
}

/// Required wei/token amount. Accepts a decimal string or a JSON integer.
pub fn amount_param(params: &Value, name: &'static str) -> Result<u128> {
    let value = params.get(name).ok_or(ParamError::Missing(name))?;
    let amount = match value {
        Value::String(s) => s.parse::<u128>().map_err(|e| ParamError::Invalid {
            name,
            reason: e.to_string(),
        })?,
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| ParamError::Invalid {
                name,
                reason: "expected a non-negative integer".to_string(),
            })?,
        _ => {
            return Err(ParamError::Invalid {
                name,
                reason: "expected a decimal string or integer".to_string(),
            }
            .into())
        }
    };
    Ok(amount)
}

/// Required `u64` param.
pub fn u64_param(params: &Value, name: &'static str) -> Result<u64> {
    let value = params
        .get(name)
        .and_then(Value::as_u64)
        .ok_or(ParamError::Missing(name))?;
    Ok(value)
}

/// Lock a contract handle for the duration of one call.
pub fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| RpcError::internal_error(&format!("{what} lock poisoned")))
}

/// Serialize a receipt or record into the response.
pub fn to_json<T: Serialize>(value: &T) -> Result {
    serde_json::to_value(value)
        .map_err(|e| RpcError::internal_error(&format!("serialization failed: {e}")))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::config::DaemonConfig;
    use crate::DaemonState;

    /// Daemon state with dev mode on and no block producer.
    pub fn dev_state() -> Arc<DaemonState> {
        let mut config = DaemonConfig::default();
        config.advanced.dev_mode = true;
        Arc::new(DaemonState::new(config).expect("daemon state"))
    }
}

//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC 2.0 calls to the command handlers. A
//! connection that calls `subscribe_events` additionally receives matching
//! contract events as `hbank_event` notifications.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use hbank_ledger::LedgerError;
use hbank_oracle::OracleError;
use hbank_token::TokenError;
use hbank_types::{Event, NativeError};

use crate::commands;
use crate::events::Subscription;
use crate::DaemonState;

/// Method name of pushed event notifications.
pub const EVENT_NOTIFICATION: &str = "hbank_event";

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC success response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// Server-initiated message without an ID.
#[derive(Debug, Serialize)]
pub struct RpcNotification<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: &'a Event,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RpcError {
    pub code: i32,
    /// Error name, or the contract's reason string for reverted calls.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self {
            code: -32700,
            message: "PARSE_ERROR".to_string(),
            data: None,
        }
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self {
            code: -32600,
            message: "INVALID_REQUEST".to_string(),
            data: None,
        }
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "METHOD_NOT_FOUND".to_string(),
            data: Some(serde_json::json!({"method": method})),
        }
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self {
            code: -32602,
            message: "INVALID_PARAMS".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self {
            code: -32603,
            message: "INTERNAL_ERROR".to_string(),
            data: Some(serde_json::json!({"detail": detail})),
        }
    }

    // Contract errors

    /// Call reverted (-32000). The message is the contract's reason.
    pub fn reverted(reason: &str) -> Self {
        Self {
            code: -32000,
            message: reason.to_string(),
            data: None,
        }
    }

    /// Insufficient native funds (-32040).
    pub fn insufficient_funds(reason: &str, required: u128, available: u128) -> Self {
        Self {
            code: -32040,
            message: reason.to_string(),
            data: Some(serde_json::json!({
                "required": required.to_string(),
                "available": available.to_string(),
            })),
        }
    }

    /// Dev-only method called without dev mode (-32050).
    pub fn dev_mode_disabled() -> Self {
        Self {
            code: -32050,
            message: "DEV_MODE_DISABLED".to_string(),
            data: None,
        }
    }
}

impl From<NativeError> for RpcError {
    fn from(err: NativeError) -> Self {
        match &err {
            NativeError::InsufficientFunds {
                required,
                available,
                ..
            } => Self::insufficient_funds(&err.to_string(), *required, *available),
            NativeError::Overflow(_) => Self::reverted(&err.to_string()),
        }
    }
}

impl From<TokenError> for RpcError {
    fn from(err: TokenError) -> Self {
        Self::reverted(&err.to_string())
    }
}

impl From<OracleError> for RpcError {
    fn from(err: OracleError) -> Self {
        Self::reverted(&err.to_string())
    }
}

impl From<LedgerError> for RpcError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Native(inner) => inner.into(),
            LedgerError::LockPoisoned(what) => {
                Self::internal_error(&format!("{what} lock poisoned"))
            }
            other => Self::reverted(&other.to_string()),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    let mut subscription: Option<Subscription> = None;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break; // EOF
                };
                if line.trim().is_empty() {
                    continue;
                }
                let response = handle_line(&state, &line, &mut subscription).await;
                write_message(&mut writer, &response).await?;
            }
            Some(event) = next_event(&mut subscription) => {
                let notification = RpcNotification {
                    jsonrpc: "2.0",
                    method: EVENT_NOTIFICATION,
                    params: &event,
                };
                write_message(&mut writer, &notification).await?;
            }
        }
    }

    Ok(())
}

/// Parse one request line and produce its response.
async fn handle_line(
    state: &Arc<DaemonState>,
    line: &str,
    subscription: &mut Option<Subscription>,
) -> RpcResponse {
    let request = match serde_json::from_str::<RpcRequest>(line) {
        Ok(request) => request,
        Err(_) => return RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
    };
    if request.jsonrpc != "2.0" {
        return RpcResponse::error(request.id, RpcError::invalid_request());
    }

    // Subscriptions live on the connection, not in the dispatch table.
    if request.method == "subscribe_events" {
        return match commands::chain::subscribe_events(state, &request.params).await {
            Ok((sub, value)) => {
                *subscription = Some(sub);
                RpcResponse::success(request.id, value)
            }
            Err(err) => RpcResponse::error(request.id, err),
        };
    }

    dispatch_request(state.clone(), request).await
}

/// Resolves with the next subscribed event; pending forever without a
/// subscription.
async fn next_event(subscription: &mut Option<Subscription>) -> Option<Event> {
    match subscription {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

async fn write_message<T: Serialize>(writer: &mut OwnedWriteHalf, message: &T) -> anyhow::Result<()> {
    let mut json = serde_json::to_string(message)?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();
    let params = &request.params;

    debug!("Dispatching RPC method: {}", method);

    let dev_only = matches!(method, "chain_mine" | "dev_set_oracle_rate");
    if dev_only && !state.config.advanced.dev_mode {
        return RpcResponse::error(id, RpcError::dev_mode_disabled());
    }

    let result = match method {
        // Bank
        "hbank_deposit" => commands::bank::deposit(&state, params).await,
        "hbank_withdraw" => commands::bank::withdraw(&state, params).await,
        "hbank_investor" => commands::bank::investor(&state, params).await,
        "hbank_yearly_return_rate" => commands::bank::yearly_return_rate(&state).await,
        "hbank_custody" => commands::bank::custody(&state).await,

        // Token
        "token_balance_of" => commands::token::balance_of(&state, params).await,
        "token_minter" => commands::token::minter(&state).await,
        "token_info" => commands::token::info(&state).await,
        "token_mint" => commands::token::mint(&state, params).await,
        "token_pass_minter_role" => commands::token::pass_minter_role(&state, params).await,

        // Oracle
        "oracle_get_rate" => commands::oracle::get_rate(&state, params).await,
        "oracle_update_rate" => commands::oracle::update_rate(&state, params).await,
        "oracle_last_update_block" => commands::oracle::last_update_block(&state).await,
        "oracle_transfer_ownership" => commands::oracle::transfer_ownership(&state, params).await,

        // Chain
        "native_balance_of" => commands::chain::native_balance_of(&state, params).await,
        "chain_block_number" => commands::chain::block_number(&state).await,
        "chain_accounts" => commands::chain::accounts(&state).await,

        // Dev-only commands
        "chain_mine" => commands::chain::mine(&state, params).await,
        "dev_set_oracle_rate" => commands::oracle::dev_set_oracle_rate(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => {
            debug!(method, code = err.code, message = %err.message, "RPC call failed");
            RpcResponse::error(id, err)
        }
    }
}

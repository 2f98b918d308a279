//! Configuration file management.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hbank_ledger::{DeployConfig, RewardPolicy, DEFAULT_YEARLY_RETURN_RATE};
use hbank_oracle::{DEFAULT_RATE, STALENESS_THRESHOLD};

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Local chain settings.
    #[serde(default)]
    pub chain: ChainConfig,
    /// Bank deployment settings.
    #[serde(default)]
    pub bank: BankConfig,
    /// Oracle settings.
    #[serde(default)]
    pub oracle: OracleConfig,
    /// JSON-RPC settings.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Local chain configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Block number the chain starts at. Deposits need a block above 0.
    #[serde(default = "default_genesis_block")]
    pub genesis_block: u64,
    /// Milliseconds between blocks. 0 = only mine on `chain_mine`.
    #[serde(default = "default_block_interval_ms")]
    pub block_interval_ms: u64,
    /// Number of funded dev accounts. Account 0 deploys the contracts.
    #[serde(default = "default_dev_accounts")]
    pub dev_accounts: u64,
    /// Starting native balance of each dev account, in whole Ether.
    #[serde(default = "default_dev_account_balance")]
    pub dev_account_balance_eth: u64,
}

/// Bank deployment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankConfig {
    /// Yearly return rate, percent (1-100).
    #[serde(default = "default_yearly_return_rate")]
    pub yearly_return_rate: u64,
    #[serde(default)]
    pub reward_policy: RewardPolicy,
}

/// Oracle configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Blocks after which the cached rate is refreshed on read.
    #[serde(default = "default_staleness_threshold")]
    pub staleness_threshold: u64,
    /// Rate the stub source serves on refresh.
    #[serde(default = "default_stub_rate")]
    pub stub_rate: u64,
}

/// JSON-RPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Socket path. Empty = $data_dir/hbank.sock.
    #[serde(default)]
    pub socket_path: String,
    /// Per-subscriber event buffer.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

/// Advanced configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Enable `dev_*` and `chain_mine` RPC methods.
    #[serde(default)]
    pub dev_mode: bool,
}

// Default value functions

fn default_genesis_block() -> u64 {
    1
}

fn default_block_interval_ms() -> u64 {
    1000
}

fn default_dev_accounts() -> u64 {
    10
}

fn default_dev_account_balance() -> u64 {
    100
}

fn default_yearly_return_rate() -> u64 {
    DEFAULT_YEARLY_RETURN_RATE
}

fn default_staleness_threshold() -> u64 {
    STALENESS_THRESHOLD
}

fn default_stub_rate() -> u64 {
    DEFAULT_RATE
}

fn default_event_buffer() -> usize {
    1000
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            genesis_block: default_genesis_block(),
            block_interval_ms: default_block_interval_ms(),
            dev_accounts: default_dev_accounts(),
            dev_account_balance_eth: default_dev_account_balance(),
        }
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            yearly_return_rate: default_yearly_return_rate(),
            reward_policy: RewardPolicy::default(),
        }
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            staleness_threshold: default_staleness_threshold(),
            stub_rate: default_stub_rate(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket_path: String::new(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Parameters for deploying token, oracle and bank.
    pub fn deploy_config(&self) -> DeployConfig {
        DeployConfig {
            yearly_return_rate: self.bank.yearly_return_rate,
            staleness_threshold: self.oracle.staleness_threshold,
            reward_policy: self.bank.reward_policy,
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.advanced.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.advanced.data_dir)
        }
    }

    /// Get the RPC socket path.
    pub fn socket_path(&self) -> PathBuf {
        if self.rpc.socket_path.is_empty() {
            self.data_dir().join("hbank.sock")
        } else {
            PathBuf::from(&self.rpc.socket_path)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Default data directory, overridable with `HBANK_DATA_DIR`.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("HBANK_DATA_DIR") {
            return PathBuf::from(dir);
        }
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".hbank"))
            .unwrap_or_else(|_| PathBuf::from("/tmp/hbank"))
    }
}

//! Account identities.
//!
//! An [`Address`] is a 20-byte account identifier rendered as a `0x`-prefixed
//! lowercase hex string. Externally owned accounts and contracts share the
//! same address space.

use std::fmt;
use std::str::FromStr;

use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Length of an address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Marker byte that prefixes every contract address.
const CONTRACT_PREFIX: u8 = 0xc0;

/// A 20-byte account identity.
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, SerializeDisplay, DeserializeFromStr,
)]
pub struct Address([u8; ADDRESS_LEN]);

/// Error returned when parsing an [`Address`] from a string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressParseError {
    /// The string does not start with `0x`.
    #[error("address must start with 0x")]
    MissingPrefix,

    /// The hex body is not valid hex.
    #[error("invalid hex in address: {0}")]
    InvalidHex(String),

    /// The decoded body has the wrong length.
    #[error("address must be {ADDRESS_LEN} bytes, got {0}")]
    InvalidLength(usize),
}

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Build an address from raw bytes.
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministic externally owned account for index `n`, the same way a
    /// development chain hands out `accounts[n]`.
    pub fn from_index(n: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = 0x0a;
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Address assigned to the `nonce`-th contract created by `deployer`.
    pub fn contract(deployer: &Address, nonce: u64) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = CONTRACT_PREFIX;
        bytes[1..11].copy_from_slice(&deployer.0[ADDRESS_LEN - 10..]);
        bytes[ADDRESS_LEN - 8..].copy_from_slice(&nonce.to_be_bytes());
        Self(bytes)
    }

    /// Raw bytes of this address.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// True for addresses produced by [`Address::contract`].
    pub fn is_contract(&self) -> bool {
        self.0[0] == CONTRACT_PREFIX
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressParseError::MissingPrefix)?;
        let decoded =
            hex::decode(body).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let bytes: [u8; ADDRESS_LEN] = decoded
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::InvalidLength(decoded.len()))?;
        Ok(Self(bytes))
    }
}

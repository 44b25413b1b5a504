//! Network identity and per-chain configuration
//!
//! A [`Chain`] names a network, its RPC endpoint, the deployed batch-call
//! contract, and the native token. Known networks can be constructed by
//! chain id with sensible defaults; everything is overridable for custom
//! deployments and can be deserialized from external configuration.

use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};

/// Canonical Multicall3 deployment address
///
/// The same deterministic address on every major EVM network.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Native token metadata for a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeToken {
    /// Token symbol (e.g. "ETH", "MATIC")
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u8,
}

/// Network identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    /// EIP-155 chain id
    pub id: u64,
    /// Human-readable network name
    pub name: String,
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Deployed batch-call contract, if the network has one
    ///
    /// `None` disables aggregation; every call falls back to individual
    /// execution.
    #[serde(default)]
    pub multicall: Option<Address>,
    /// Native token configuration
    pub native: NativeToken,
    /// Indicative seconds between blocks
    #[serde(default = "default_block_time")]
    pub block_time_secs: u64,
    /// Blocks before a read is considered settled
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
}

fn default_block_time() -> u64 {
    12
}

fn default_confirmations() -> u64 {
    1
}

impl Chain {
    /// Build a chain from explicit parts
    pub fn new(id: u64, name: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rpc_url: rpc_url.into(),
            multicall: Some(MULTICALL3_ADDRESS),
            native: native_token(id),
            block_time_secs: block_time(id),
            confirmations: default_confirmations(),
        }
    }

    /// Build a known network by chain id
    ///
    /// Fills in name, native token, block time and the canonical
    /// Multicall3 address. Unknown ids get ETH-like defaults.
    pub fn known(id: u64, rpc_url: impl Into<String>) -> Self {
        Self::new(id, chain_name(id), rpc_url)
    }

    pub fn with_multicall(mut self, multicall: Option<Address>) -> Self {
        self.multicall = multicall;
        self
    }
}

/// Network name for known chain ids
fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "ethereum",
        10 => "optimism",
        56 => "bsc",
        100 => "gnosis",
        137 => "polygon",
        250 => "fantom",
        8453 => "base",
        42161 => "arbitrum",
        43114 => "avalanche",
        _ => "unknown",
    }
}

/// Native token configuration for known chain ids
fn native_token(chain_id: u64) -> NativeToken {
    match chain_id {
        1 | 10 | 8453 | 42161 => NativeToken { symbol: "ETH".into(), decimals: 18 },
        56 => NativeToken { symbol: "BNB".into(), decimals: 18 },
        100 => NativeToken { symbol: "xDAI".into(), decimals: 18 },
        137 => NativeToken { symbol: "MATIC".into(), decimals: 18 },
        250 => NativeToken { symbol: "FTM".into(), decimals: 18 },
        43114 => NativeToken { symbol: "AVAX".into(), decimals: 18 },
        // Default to ETH configuration for unknown chains
        _ => NativeToken { symbol: "ETH".into(), decimals: 18 },
    }
}

/// Indicative block time in seconds for known chain ids
fn block_time(chain_id: u64) -> u64 {
    match chain_id {
        1 => 12,
        10 | 8453 => 2,
        56 | 137 => 3,
        100 => 5,
        250 | 43114 => 2,
        42161 => 1,
        _ => 12,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_chain_defaults() {
        let chain = Chain::known(137, "https://polygon-rpc.com");
        assert_eq!(chain.name, "polygon");
        assert_eq!(chain.native.symbol, "MATIC");
        assert_eq!(chain.multicall, Some(MULTICALL3_ADDRESS));
    }

    #[test]
    fn test_multicall_override() {
        let chain = Chain::known(1, "http://localhost:8545").with_multicall(None);
        assert!(chain.multicall.is_none());
    }
}

//! Core types for the call engine and balance resolution pipeline
//!
//! This module defines the core data structures used throughout the system:
//! - Contracts, tokens and balances as adapters declare and produce them
//! - Block references and the per-query resolution context
//! - Arbitrary-precision amount arithmetic helpers

use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::eips::BlockId;
pub use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::chain::Chain;
use crate::client::CallDispatcher;
use crate::errors::{ConfigError, DispatchError};

/// Block reference for read calls
///
/// Every call in one resolution pass is pinned to the same reference so
/// the pass observes a consistent chain state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRef {
    /// Head of the chain at dispatch time
    #[default]
    Latest,
    /// A specific block number
    Number(u64),
}

impl From<BlockRef> for BlockId {
    fn from(block: BlockRef) -> Self {
        match block {
            BlockRef::Latest => BlockId::latest(),
            BlockRef::Number(number) => BlockId::number(number),
        }
    }
}

/// Position category of a balance
///
/// Tags what kind of position produced the balance so downstream
/// aggregation can group and render it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Wallet,
    Lp,
    Farm,
    Stake,
    Lend,
    Borrow,
    Lock,
    Vest,
    Reward,
}

/// A token with guaranteed metadata
///
/// Unlike [`Contract`], a `Token` always carries decimals and symbol, so
/// amounts denominated in it can be formatted without further lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Chain the token lives on
    pub chain_id: u64,
    /// Token contract address
    pub address: Address,
    /// Token symbol (e.g. "USDC"); empty when resolution degraded
    pub symbol: String,
    /// Number of decimal places
    pub decimals: u8,
}

/// An on-chain contract an adapter wants to inspect
///
/// Metadata fields are optional because adapters often only know the
/// address up front; handlers that need a field ask for it through
/// [`Contract::require_decimals`] and friends, which turn absence into a
/// configuration error instead of a silent skip.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
    /// Chain the contract lives on
    pub chain_id: u64,
    /// Contract address
    pub address: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Constituent tokens backing this position, in adapter-declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub underlyings: Vec<Token>,
    /// Reward tokens accrued by this position, in adapter-declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<Token>,
    /// Adapter-defined extra fields (pool ids, helper addresses, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Contract {
    pub fn new(chain_id: u64, address: Address) -> Self {
        Self {
            chain_id,
            address,
            ..Default::default()
        }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_decimals(mut self, decimals: u8) -> Self {
        self.decimals = Some(decimals);
        self
    }

    pub fn with_underlyings(mut self, underlyings: Vec<Token>) -> Self {
        self.underlyings = underlyings;
        self
    }

    pub fn with_rewards(mut self, rewards: Vec<Token>) -> Self {
        self.rewards = rewards;
        self
    }

    /// Decimals, or a configuration error naming the missing field
    pub fn require_decimals(&self) -> Result<u8, ConfigError> {
        self.decimals.ok_or(ConfigError::MissingField {
            address: self.address.to_string(),
            field: "decimals",
        })
    }

    /// Symbol, or a configuration error naming the missing field
    pub fn require_symbol(&self) -> Result<&str, ConfigError> {
        self.symbol.as_deref().ok_or(ConfigError::MissingField {
            address: self.address.to_string(),
            field: "symbol",
        })
    }

    /// View this contract as a [`Token`], requiring full metadata
    pub fn as_token(&self) -> Result<Token, ConfigError> {
        Ok(Token {
            chain_id: self.chain_id,
            address: self.address,
            symbol: self.require_symbol()?.to_owned(),
            decimals: self.require_decimals()?,
        })
    }
}

impl From<Token> for Contract {
    fn from(token: Token) -> Self {
        Self {
            chain_id: token.chain_id,
            address: token.address,
            symbol: Some(token.symbol),
            decimals: Some(token.decimals),
            ..Default::default()
        }
    }
}

/// A token amount held by the queried wallet
///
/// Amounts are `U256` in the token's smallest unit. Failed lookups are
/// omitted from results entirely rather than reported as zero, so a zero
/// amount always means an actual zero balance.
#[derive(Debug, Clone, Serialize)]
pub struct Balance {
    #[serde(flatten)]
    pub token: Token,
    /// Amount in the token's smallest unit
    pub amount: U256,
    pub category: Category,
    /// Reward balances accrued by this position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rewards: Vec<Balance>,
    /// Underlying balances backing this position
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub underlyings: Vec<Balance>,
}

impl Balance {
    pub fn new(token: Token, amount: U256, category: Category) -> Self {
        Self {
            token,
            amount,
            category,
            rewards: Vec::new(),
            underlyings: Vec::new(),
        }
    }

    pub fn with_rewards(mut self, rewards: Vec<Balance>) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn with_underlyings(mut self, underlyings: Vec<Balance>) -> Self {
        self.underlyings = underlyings;
        self
    }
}

/// Immutable per-query resolution context
///
/// A resolution pass is a pure function of (chain, wallet, block); the
/// context carries those plus the shared dispatch handle and an optional
/// deadline. Cloning is cheap and concurrent passes share nothing mutable.
#[derive(Clone)]
pub struct BalancesContext {
    pub chain: Chain,
    /// Wallet being queried
    pub address: Address,
    pub block: BlockRef,
    /// RPC dispatch handle
    pub client: Arc<dyn CallDispatcher>,
    /// Calls still pending when this elapses resolve to `Failure`
    pub deadline: Option<Instant>,
}

impl BalancesContext {
    pub fn new(chain: Chain, client: Arc<dyn CallDispatcher>, address: Address) -> Self {
        Self {
            chain,
            address,
            block: BlockRef::Latest,
            client,
            deadline: None,
        }
    }

    pub fn at_block(mut self, number: u64) -> Self {
        self.block = BlockRef::Number(number);
        self
    }

    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    /// Time left before the deadline, or `None` when no deadline is set
    pub(crate) fn remaining(&self) -> Result<Option<Duration>, DispatchError> {
        match self.deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    Err(DispatchError::DeadlineExceeded)
                } else {
                    Ok(Some(remaining))
                }
            }
            None => Ok(None),
        }
    }
}

/// Floor of `amount * numerator / denominator` without precision loss
///
/// Share-of-reserve splits multiply balances by pool reserves before
/// dividing by total supply; the intermediate product can exceed 256 bits.
/// The computation is decomposed so the result is exact whenever it fits
/// in a `U256`. Returns `None` on division by zero or a result that does
/// not fit.
pub fn mul_div(amount: U256, numerator: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    match amount.checked_mul(numerator) {
        Some(product) => Some(product / denominator),
        None => {
            // amount = q * denominator + r, so
            // floor(amount * n / d) == q * n + floor(r * n / d)
            let quotient = amount / denominator;
            let remainder = amount % denominator;
            let high = quotient.checked_mul(numerator)?;
            let low = remainder.checked_mul(numerator)? / denominator;
            high.checked_add(low)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_exact() {
        let amount = U256::from(1_000_000u64);
        assert_eq!(
            mul_div(amount, U256::from(3u64), U256::from(4u64)),
            Some(U256::from(750_000u64))
        );
    }

    #[test]
    fn test_mul_div_overflowing_product() {
        // amount * numerator overflows 256 bits, result still fits
        let amount = U256::MAX / U256::from(2u64);
        let result = mul_div(amount, U256::from(100u64), U256::from(200u64));
        assert_eq!(result, Some(amount / U256::from(2u64)));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert_eq!(mul_div(U256::from(1u64), U256::from(1u64), U256::ZERO), None);
    }

    #[test]
    fn test_require_fields() {
        let contract = Contract::new(1, Address::ZERO);
        assert!(contract.require_decimals().is_err());
        assert!(contract
            .clone()
            .with_decimals(18)
            .require_decimals()
            .is_ok());
    }
}

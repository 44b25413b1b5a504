//! ERC20 token metadata and wallet balance resolution
//!
//! Metadata lookups (decimals, symbol) go through the batch engine, two
//! calls per address, and are memoized for the lifetime of one
//! [`Erc20Resolver`] - one resolution pass. Individual lookup failures
//! degrade to defaults (decimals 0, empty symbol) instead of aborting the
//! pass. There is no cross-pass cache.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use once_cell::sync::Lazy;
use tracing::debug;

use crate::call::multicall::{getEthBalanceCall, multicall};
use crate::call::{dispatch_with_deadline, Call};
use alloy::dyn_abi::DynSolValue;
use crate::types::{Balance, BalancesContext, Category, Token};

static DECIMALS: Lazy<Function> =
    Lazy::new(|| Function::parse("decimals()(uint8)").expect("static ABI signature"));
static SYMBOL: Lazy<Function> =
    Lazy::new(|| Function::parse("symbol()(string)").expect("static ABI signature"));
static BALANCE_OF: Lazy<Function> =
    Lazy::new(|| Function::parse("balanceOf(address)(uint256)").expect("static ABI signature"));

/// Pass-scoped ERC20 metadata resolver
///
/// Create one per resolution pass and share it with nested helpers;
/// repeated lookups of an address issue no additional calls within the
/// pass.
#[derive(Default)]
pub struct Erc20Resolver {
    cache: Mutex<HashMap<Address, Token>>,
}

impl Erc20Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve metadata for a list of addresses, order preserved
    ///
    /// Returns one entry per input address, duplicates included. Addresses
    /// already resolved in this pass are served from memory.
    pub async fn resolve(&self, ctx: &BalancesContext, addresses: &[Address]) -> Vec<Token> {
        let pending: Vec<Address> = {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            let mut seen = HashSet::new();
            addresses
                .iter()
                .copied()
                .filter(|address| !cache.contains_key(address) && seen.insert(*address))
                .collect()
        };

        if !pending.is_empty() {
            let mut calls = Vec::with_capacity(pending.len() * 2);
            for address in &pending {
                calls.push(Call::new(*address, DECIMALS.clone()));
                calls.push(Call::new(*address, SYMBOL.clone()));
            }
            let results = multicall(ctx, calls).await;

            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            for (address, pair) in pending.iter().zip(results.chunks_exact(2)) {
                let decimals = pair[0]
                    .uint()
                    .filter(|value| *value <= U256::from(u8::MAX))
                    .map(|value| value.to::<u8>())
                    .unwrap_or(0);
                let symbol = pair[1].string().unwrap_or_default();
                if decimals == 0 && symbol.is_empty() {
                    debug!(token = %address, "Token metadata lookup degraded to defaults");
                }
                cache.insert(
                    *address,
                    Token {
                        chain_id: ctx.chain.id,
                        address: *address,
                        symbol,
                        decimals,
                    },
                );
            }
        }

        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        addresses
            .iter()
            .map(|address| {
                cache.get(address).cloned().unwrap_or_else(|| Token {
                    chain_id: ctx.chain.id,
                    address: *address,
                    symbol: String::new(),
                    decimals: 0,
                })
            })
            .collect()
    }
}

/// One-shot metadata resolution with a fresh pass-scoped cache
pub async fn get_erc20_details(ctx: &BalancesContext, addresses: &[Address]) -> Vec<Token> {
    Erc20Resolver::new().resolve(ctx, addresses).await
}

/// Wallet balances for a list of ERC20 tokens
///
/// Issues one batched `balanceOf(wallet)` per token; tokens whose call
/// fails are omitted from the result, never reported as zero.
pub async fn get_balances_of(
    ctx: &BalancesContext,
    resolver: &Erc20Resolver,
    tokens: &[Address],
) -> Vec<Balance> {
    let metas = resolver.resolve(ctx, tokens).await;
    let calls = tokens
        .iter()
        .map(|token| {
            Call::new(*token, BALANCE_OF.clone())
                .with_params(vec![DynSolValue::Address(ctx.address)])
        })
        .collect();
    let results = multicall(ctx, calls).await;

    metas
        .into_iter()
        .zip(results)
        .filter_map(|(token, result)| {
            result
                .uint()
                .map(|amount| Balance::new(token, amount, Category::Wallet))
        })
        .collect()
}

/// Native coin balance of the queried wallet
///
/// Reads through the batch-call contract's `getEthBalance` helper, so a
/// chain without one yields `None`, as does any dispatch failure.
pub async fn get_native_balance(ctx: &BalancesContext) -> Option<Balance> {
    let multicall_address = ctx.chain.multicall?;
    let data: Bytes = getEthBalanceCall { addr: ctx.address }.abi_encode().into();

    let raw = match dispatch_with_deadline(ctx, multicall_address, data).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "Native balance lookup failed");
            return None;
        }
    };
    let amount = getEthBalanceCall::abi_decode_returns(&raw).ok()?;

    Some(Balance::new(
        Token {
            chain_id: ctx.chain.id,
            address: Address::ZERO,
            symbol: ctx.chain.native.symbol.clone(),
            decimals: ctx.chain.native.decimals,
        },
        amount,
        Category::Wallet,
    ))
}

//! # EVM Balance Aggregation Core
//!
//! A library for reading a wallet's token holdings across DeFi protocols
//! by batching on-chain read calls and resolving them into balances.
//!
//! ## Core Features
//!
//! - **Batched Execution**
//!   - Multicall3 aggregation with per-call failure isolation
//!   - Transparent splitting over a configurable batch size
//!   - Bounded exponential retry of whole invocations
//!   - Individual-call fallback for chains without a batch contract
//!
//! - **Balance Resolution**
//!   - Named contract groups resolved concurrently
//!   - Deterministic, declaration-ordered output
//!   - Failed lookups omitted, never reported as zero
//!
//! - **Token Metadata**
//!   - Batched decimals/symbol resolution
//!   - Pass-scoped memoization
//!   - Graceful degradation on non-conforming tokens
//!
//! ## Features
//!
//! - `rustls-tls`: Uses rustls as the TLS implementation instead of native-tls (OpenSSL).
//!   This is useful for environments where OpenSSL is not available or not desired.
//!
//!   Usage example:
//!   ```toml
//!   [dependencies]
//!   evm-balances = { version = "0.4", default-features = false, features = ["rustls-tls"] }
//!   ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use alloy::primitives::address;
//! use evm_balances::{
//!     multicall,
//!     call::Call,
//!     client::connect,
//!     chain::Chain,
//!     types::BalancesContext,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let chain = Chain::known(1, "https://eth-mainnet.g.alchemy.com/v2/your-api-key");
//! let client = Arc::new(connect(&chain.rpc_url)?);
//! let wallet = address!("28C6c06298d514Db089934071355E5743bf21d60");
//! let ctx = BalancesContext::new(chain, client, wallet);
//!
//! // Two independent reads, one network round trip
//! let usdc = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
//! let dai = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
//! let calls = vec![
//!     Call::parse(usdc, "balanceOf(address)(uint256)")?
//!         .with_params(vec![wallet.into()]),
//!     Call::parse(dai, "balanceOf(address)(uint256)")?
//!         .with_params(vec![wallet.into()]),
//! ];
//!
//! for result in multicall(&ctx, calls).await {
//!     match result.uint() {
//!         Some(amount) => println!("balance: {amount}"),
//!         None => println!("balance unavailable"),
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `call`: Call descriptors, single execution and Multicall3 batching
//! - `resolve`: ERC20 metadata and contract-group balance resolution
//! - `chain`: Network identity and per-chain configuration
//! - `client`: RPC dispatch seam and the alloy-backed client
//! - `adapter`: Protocol adapter boundary types
//! - `types`: Core data structures
//! - `errors`: Error types and handling

pub mod adapter;
pub mod call;
pub mod chain;
pub mod client;
pub mod errors;
pub mod resolve;
pub mod types;

// Re-export only the essential types and functions
pub use call::multicall::{multicall, multicall_with, BatchOptions};
pub use call::{execute, Call, CallResult};
pub use chain::Chain;
pub use client::{connect, CallDispatcher, RpcClient};
pub use errors::{ConfigError, DispatchError, Error};
pub use resolve::balance::{resolve_balances, BalanceHandler, ContractGroups, GroupHandlers};
pub use resolve::erc20::{get_balances_of, get_erc20_details, get_native_balance, Erc20Resolver};
pub use types::{Balance, BalancesContext, BlockRef, Category, Contract, Token};

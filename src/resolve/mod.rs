//! Balance resolution pipeline
//!
//! This module turns adapter-declared contracts into wallet balances.
//!
//! # Modules
//!
//! - [`erc20`]: ERC20 token metadata and wallet balance resolution
//!   - Pass-scoped memoized symbol/decimals lookups
//!   - Batched `balanceOf` over token lists
//!   - Native coin balance via the batch-call contract
//!
//! - [`balance`]: named contract-group fan-out
//!   - Concurrent per-group balance handlers
//!   - Deterministic, declaration-ordered flattening

pub mod balance;
pub mod erc20;

//! Adapter boundary
//!
//! Protocol-specific logic lives outside this crate. An [`Adapter`]
//! declares which contracts to inspect and converts their state into
//! balances using the call engine and resolution primitives. This module
//! only defines the boundary surface; registration, discovery and output
//! validation belong to the loading harness.

use std::sync::Arc;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Serialize;

use crate::chain::Chain;
use crate::client::CallDispatcher;
use crate::errors::Error;
use crate::resolve::balance::ContractGroups;
use crate::types::{Balance, BalancesContext, BlockRef};

/// Context for contract discovery
///
/// Discovery runs per adapter, not per wallet, so it carries no wallet
/// address.
#[derive(Clone)]
pub struct BaseContext {
    pub chain: Chain,
    pub block: BlockRef,
    pub client: Arc<dyn CallDispatcher>,
}

impl BaseContext {
    pub fn new(chain: Chain, client: Arc<dyn CallDispatcher>) -> Self {
        Self {
            chain,
            block: BlockRef::Latest,
            client,
        }
    }

    /// Derive a wallet-query context from this discovery context
    ///
    /// Discovery calls that go through the engine carry no wallet; the
    /// zero address stands in.
    pub fn for_wallet(&self, address: Address) -> BalancesContext {
        BalancesContext {
            chain: self.chain.clone(),
            address,
            block: self.block,
            client: Arc::clone(&self.client),
            deadline: None,
        }
    }

    pub fn as_query_ctx(&self) -> BalancesContext {
        self.for_wallet(Address::ZERO)
    }
}

/// Contracts an adapter wants inspected, plus a revalidation hint
#[derive(Debug, Clone, Default)]
pub struct ContractsOutput {
    pub contracts: ContractGroups,
    /// Seconds until the declared contracts should be re-discovered
    pub revalidate: Option<u64>,
}

/// One group of resolved balances
#[derive(Debug, Clone, Serialize)]
pub struct BalanceGroup {
    pub balances: Vec<Balance>,
}

/// Balances an adapter resolved for one wallet
#[derive(Debug, Clone, Default, Serialize)]
pub struct BalancesOutput {
    pub groups: Vec<BalanceGroup>,
}

/// A protocol adapter
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Stable identifier, unique across the registry
    fn id(&self) -> &str;

    /// Declare the contracts to inspect for this protocol
    async fn get_contracts(&self, ctx: &BaseContext) -> Result<ContractsOutput, Error>;

    /// Convert declared contracts into balances for the queried wallet
    async fn get_balances(
        &self,
        ctx: &BalancesContext,
        contracts: &ContractGroups,
    ) -> Result<BalancesOutput, Error>;
}

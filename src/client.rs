//! RPC dispatch seam
//!
//! Every read in the system funnels through the [`CallDispatcher`] trait:
//! the engine stays transport-agnostic and tests can substitute an
//! in-memory dispatcher. [`RpcClient`] is the production implementation
//! over an alloy HTTP provider.

use alloy::primitives::{Address, Bytes};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::debug;

use crate::errors::{ConfigError, DispatchError};
use crate::types::BlockRef;

/// Read-only call dispatch to a chain endpoint
///
/// Implementations send `{target, calldata, block}` and return the raw
/// returned bytes or an explicit error. No encoding or decoding happens
/// at this layer.
#[async_trait]
pub trait CallDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        target: Address,
        data: Bytes,
        block: BlockRef,
    ) -> Result<Bytes, DispatchError>;
}

/// Dispatcher backed by an alloy provider
pub struct RpcClient<P> {
    provider: P,
}

impl<P> RpcClient<P>
where
    P: Provider,
{
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> CallDispatcher for RpcClient<P>
where
    P: Provider,
{
    async fn dispatch(
        &self,
        target: Address,
        data: Bytes,
        block: BlockRef,
    ) -> Result<Bytes, DispatchError> {
        debug!(to = %target, ?block, bytes = data.len(), "Dispatching read call");

        let tx = TransactionRequest::default().to(target).input(data.into());
        self.provider
            .call(tx)
            .block(block.into())
            .await
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

/// Create an HTTP-backed dispatcher for an RPC endpoint
///
/// # Example
/// ```no_run
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// use evm_balances::client::connect;
/// let client = connect("https://eth.llamarpc.com")?;
/// # Ok(())
/// # }
/// ```
pub fn connect(rpc_url: &str) -> Result<RpcClient<impl Provider + Clone>, ConfigError> {
    let url = rpc_url
        .parse()
        .map_err(|_| ConfigError::InvalidRpcUrl(rpc_url.to_string()))?;
    Ok(RpcClient::new(ProviderBuilder::new().connect_http(url)))
}

//! Aggregated batch execution of read calls
//!
//! Turns a list of independent read calls into as few network round trips
//! as possible via the chain's deployed Multicall3 contract, while
//! guaranteeing that the result list matches the input list positionally.
//!
//! Key properties:
//! - Calls are chunked to a configurable maximum per aggregate invocation
//!   and results concatenated in original order
//! - A reverting or non-conforming individual call resolves to `Failure`
//!   without affecting sibling calls in the same invocation
//! - Network failure of a whole invocation is retried with bounded
//!   exponential backoff; after exhaustion every contained call fails
//! - Chains without a batch-call contract, and batches below a size
//!   threshold, fall back to individual execution

use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolCall;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::RetryIf;
use tracing::{debug, warn};

use crate::call::{dispatch_with_deadline, execute, Call, CallResult};
use crate::errors::DispatchError;
use crate::types::BalancesContext;

// Multicall3 interface - standard and widely supported

mod multicall3 {
    use alloy::sol;

    sol! {
        #[derive(Debug)]
        struct MulticallCall {
            address target;
            bytes callData;
        }

        #[derive(Debug)]
        struct MulticallResult {
            bool success;
            bytes returnData;
        }

        contract Multicall3 {
            function tryAggregate(bool requireSuccess, MulticallCall[] calldata calls)
                public payable
                returns (MulticallResult[] memory returnData);

            function getEthBalance(address addr) public view returns (uint256 balance);
        }
    }
}

pub use multicall3::{MulticallCall, MulticallResult};
pub(crate) use multicall3::Multicall3::getEthBalanceCall;
use multicall3::Multicall3::tryAggregateCall;

/// Tuning knobs for aggregate execution
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Maximum calls per aggregate invocation; larger inputs are split
    pub max_batch_size: usize,
    /// Below this call count, calls are executed individually
    pub fallback_threshold: usize,
    /// Additional attempts after a failed aggregate invocation
    pub max_retries: usize,
    /// Base delay for exponential backoff between attempts
    pub backoff_base_ms: u64,
    /// Concurrent aggregate invocations in flight per batch
    pub max_in_flight: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            fallback_threshold: 2,
            max_retries: 3,
            backoff_base_ms: 100,
            max_in_flight: 4,
        }
    }
}

/// Execute a batch of read calls with default options
///
/// The returned list has the same length and order as the input,
/// regardless of how the batch was split or which calls failed.
pub async fn multicall(ctx: &BalancesContext, calls: Vec<Call>) -> Vec<CallResult> {
    multicall_with(ctx, calls, &BatchOptions::default()).await
}

/// Execute a batch of read calls with explicit options
pub async fn multicall_with(
    ctx: &BalancesContext,
    calls: Vec<Call>,
    opts: &BatchOptions,
) -> Vec<CallResult> {
    if calls.is_empty() {
        return Vec::new();
    }

    let Some(multicall_address) = ctx.chain.multicall else {
        debug!(
            chain = %ctx.chain.name,
            calls = calls.len(),
            "No batch-call contract configured, executing individually"
        );
        return execute_individually(ctx, calls).await;
    };

    if calls.len() < opts.fallback_threshold {
        return execute_individually(ctx, calls).await;
    }

    let max = opts.max_batch_size.max(1);
    let mut chunks = Vec::new();
    let mut rest = calls;
    while rest.len() > max {
        let tail = rest.split_off(max);
        chunks.push(rest);
        rest = tail;
    }
    chunks.push(rest);

    debug!(
        chain = %ctx.chain.name,
        invocations = chunks.len(),
        "Dispatching aggregate invocations"
    );

    // buffered() bounds in-flight invocations and preserves chunk order
    let results: Vec<Vec<CallResult>> = stream::iter(
        chunks
            .into_iter()
            .map(|chunk| execute_chunk(ctx, multicall_address, chunk, opts)),
    )
    .buffered(opts.max_in_flight.max(1))
    .collect()
    .await;

    results.into_iter().flatten().collect()
}

/// Individual-execution fallback, order preserved
async fn execute_individually(ctx: &BalancesContext, calls: Vec<Call>) -> Vec<CallResult> {
    join_all(calls.into_iter().map(|call| execute(ctx, call))).await
}

/// Execute one aggregate invocation and reassemble results positionally
async fn execute_chunk(
    ctx: &BalancesContext,
    multicall_address: Address,
    chunk: Vec<Call>,
    opts: &BatchOptions,
) -> Vec<CallResult> {
    // Calls that fail to encode never reach the wire; their slots resolve
    // to Failure while siblings still aggregate.
    let mut encoded: Vec<Option<Bytes>> = Vec::with_capacity(chunk.len());
    for call in &chunk {
        match call.encode() {
            Ok(data) => encoded.push(Some(data)),
            Err(e) => {
                debug!(error = %e, "Excluding unencodable call from aggregate");
                encoded.push(None);
            }
        }
    }

    let aggregate: Vec<MulticallCall> = chunk
        .iter()
        .zip(&encoded)
        .filter_map(|(call, data)| {
            data.as_ref().map(|data| MulticallCall {
                target: call.target,
                callData: data.clone(),
            })
        })
        .collect();

    if aggregate.is_empty() {
        return chunk.into_iter().map(CallResult::Failure).collect();
    }
    let sent = aggregate.len();

    match dispatch_aggregate(ctx, multicall_address, aggregate, opts).await {
        Ok(results) if results.len() == sent => {
            let mut results = results.into_iter();
            chunk
                .into_iter()
                .zip(encoded)
                .map(|(call, data)| {
                    if data.is_none() {
                        return CallResult::Failure(call);
                    }
                    match results.next() {
                        Some(result) if result.success => match call.decode(&result.returnData) {
                            Ok(values) => CallResult::Success(values),
                            Err(e) => {
                                debug!(to = %call.target, error = %e, "Call output decoding failed");
                                CallResult::Failure(call)
                            }
                        },
                        _ => CallResult::Failure(call),
                    }
                })
                .collect()
        }
        Ok(results) => {
            warn!(
                expected = sent,
                got = results.len(),
                "Aggregate response cardinality mismatch, failing whole invocation"
            );
            chunk.into_iter().map(CallResult::Failure).collect()
        }
        Err(e) => {
            warn!(
                error = %e,
                calls = chunk.len(),
                "Aggregate invocation failed after retries"
            );
            chunk.into_iter().map(CallResult::Failure).collect()
        }
    }
}

/// Dispatch one tryAggregate invocation with bounded exponential retry
async fn dispatch_aggregate(
    ctx: &BalancesContext,
    multicall_address: Address,
    calls: Vec<MulticallCall>,
    opts: &BatchOptions,
) -> Result<Vec<MulticallResult>, DispatchError> {
    let calldata: Bytes = tryAggregateCall {
        requireSuccess: false,
        calls,
    }
    .abi_encode()
    .into();

    let strategy = ExponentialBackoff::from_millis(opts.backoff_base_ms.max(1))
        .max_delay(Duration::from_secs(2))
        .take(opts.max_retries);

    let raw = RetryIf::spawn(
        strategy,
        || {
            let calldata = calldata.clone();
            async move {
                dispatch_with_deadline(ctx, multicall_address, calldata)
                    .await
                    .map_err(|e| {
                        if e.is_retryable() {
                            warn!(error = %e, "Aggregate dispatch failed, will retry");
                        }
                        e
                    })
            }
        },
        DispatchError::is_retryable,
    )
    .await?;

    tryAggregateCall::abi_decode_returns(&raw)
        .map_err(|e| DispatchError::InvalidResponse(e.to_string()))
}

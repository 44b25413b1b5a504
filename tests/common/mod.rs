//! Shared mock dispatcher for integration tests
//!
//! Stands in for a chain endpoint: direct calls and Multicall3
//! `tryAggregate` invocations are answered from a programmable table of
//! per-call responses, with counters for asserting batching behavior.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{Address, Bytes};
use alloy::sol;
use alloy::sol_types::SolCall;
use async_trait::async_trait;

use evm_balances::errors::DispatchError;
use evm_balances::types::BlockRef;
use evm_balances::CallDispatcher;

// Local mirror of the wire interfaces, for building expected blobs
sol! {
    struct AggregateCall {
        address target;
        bytes callData;
    }

    struct AggregateResult {
        bool success;
        bytes returnData;
    }

    contract Multicall3 {
        function tryAggregate(bool requireSuccess, AggregateCall[] calldata calls)
            public payable
            returns (AggregateResult[] memory returnData);

        function getEthBalance(address addr) public view returns (uint256 balance);
    }

    function decimals() public view returns (uint8);
    function symbol() public view returns (string);
    function balanceOf(address owner) public view returns (uint256);
}

type Key = (Address, Bytes);

#[derive(Default)]
pub struct MockDispatcher {
    answers: Mutex<HashMap<Key, Bytes>>,
    reverts: Mutex<HashSet<Key>>,
    lookups: Mutex<HashMap<Key, usize>>,
    /// Aggregate invocations left to fail (usize::MAX = always)
    failures_left: AtomicUsize,
    truncate: AtomicBool,
    pub aggregate_invocations: AtomicUsize,
    pub single_invocations: AtomicUsize,
    pub dispatches: AtomicUsize,
}

impl MockDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Program the return data for one (target, calldata) pair
    pub fn answer(&self, target: Address, calldata: Vec<u8>, ret: Vec<u8>) {
        self.answers
            .lock()
            .unwrap()
            .insert((target, calldata.into()), ret.into());
    }

    /// Mark one (target, calldata) pair as reverting
    pub fn revert(&self, target: Address, calldata: Vec<u8>) {
        self.reverts.lock().unwrap().insert((target, calldata.into()));
    }

    /// Fail the next `count` aggregate invocations at the transport level
    pub fn fail_aggregates(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Drop the last result from every aggregate response
    pub fn set_truncate_response(&self, on: bool) {
        self.truncate.store(on, Ordering::SeqCst);
    }

    /// How many times one (target, calldata) pair was looked up
    pub fn lookup_count(&self, target: Address, calldata: Vec<u8>) -> usize {
        self.lookups
            .lock()
            .unwrap()
            .get(&(target, calldata.into()))
            .copied()
            .unwrap_or(0)
    }

    pub fn aggregate_count(&self) -> usize {
        self.aggregate_invocations.load(Ordering::SeqCst)
    }

    pub fn single_count(&self) -> usize {
        self.single_invocations.load(Ordering::SeqCst)
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatches.load(Ordering::SeqCst)
    }

    fn respond(&self, target: Address, data: &Bytes) -> (bool, Bytes) {
        let key = (target, data.clone());
        *self.lookups.lock().unwrap().entry(key.clone()).or_default() += 1;
        if self.reverts.lock().unwrap().contains(&key) {
            return (false, Bytes::new());
        }
        match self.answers.lock().unwrap().get(&key) {
            Some(ret) => (true, ret.clone()),
            // Unprogrammed targets behave like an EOA: success, no data
            None => (true, Bytes::new()),
        }
    }
}

#[async_trait]
impl CallDispatcher for MockDispatcher {
    async fn dispatch(
        &self,
        target: Address,
        data: Bytes,
        _block: BlockRef,
    ) -> Result<Bytes, DispatchError> {
        self.dispatches.fetch_add(1, Ordering::SeqCst);

        if data.len() >= 4 && data[..4] == Multicall3::tryAggregateCall::SELECTOR {
            self.aggregate_invocations.fetch_add(1, Ordering::SeqCst);

            let failures_left = self.failures_left.load(Ordering::SeqCst);
            if failures_left > 0 {
                if failures_left != usize::MAX {
                    self.failures_left.fetch_sub(1, Ordering::SeqCst);
                }
                return Err(DispatchError::Transport("connection reset".into()));
            }

            let decoded = Multicall3::tryAggregateCall::abi_decode(&data)
                .map_err(|e| DispatchError::InvalidResponse(e.to_string()))?;
            let mut results: Vec<AggregateResult> = decoded
                .calls
                .iter()
                .map(|call| {
                    let (success, ret) = self.respond(call.target, &call.callData);
                    AggregateResult {
                        success,
                        returnData: ret,
                    }
                })
                .collect();
            if self.truncate.load(Ordering::SeqCst) {
                results.pop();
            }
            return Ok(Multicall3::tryAggregateCall::abi_encode_returns(&results).into());
        }

        self.single_invocations.fetch_add(1, Ordering::SeqCst);
        let (success, ret) = self.respond(target, &data);
        if success {
            Ok(ret)
        } else {
            Err(DispatchError::Transport("execution reverted".into()))
        }
    }
}

//! Contract read calls as plain data
//!
//! A [`Call`] bundles a target address, an ABI function descriptor and an
//! ordered parameter list. Descriptors are values, not generated bindings,
//! so adapters can build calls from signatures at runtime the same way
//! they declare contracts. [`execute`] runs a single call; batches go
//! through [`multicall`](crate::call::multicall).
//!
//! Execution never raises to the caller: a revert, endpoint error or
//! schema mismatch resolves to [`CallResult::Failure`] carrying the
//! original call for diagnostics.

use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::json_abi::Function;
use alloy::primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::errors::{CallError, ConfigError, DispatchError};
use crate::types::BalancesContext;

pub mod multicall;

/// A single contract read call
///
/// `function` doubles as the expected output schema: decoding validates
/// return data against its declared outputs.
#[derive(Debug, Clone)]
pub struct Call {
    /// Target contract address
    pub target: Address,
    /// ABI descriptor of the function to invoke
    pub function: Function,
    /// Ordered call parameters
    pub params: Vec<DynSolValue>,
}

impl Call {
    pub fn new(target: Address, function: Function) -> Self {
        Self {
            target,
            function,
            params: Vec::new(),
        }
    }

    /// Build a call from a human-readable signature
    ///
    /// # Example
    /// ```
    /// # use alloy::primitives::Address;
    /// # use evm_balances::call::Call;
    /// let call = Call::parse(Address::ZERO, "balanceOf(address)(uint256)").unwrap();
    /// assert_eq!(call.function.name, "balanceOf");
    /// ```
    pub fn parse(target: Address, signature: &str) -> Result<Self, ConfigError> {
        let function = Function::parse(signature).map_err(|e| ConfigError::InvalidAbi {
            signature: signature.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(target, function))
    }

    pub fn with_params(mut self, params: Vec<DynSolValue>) -> Self {
        self.params = params;
        self
    }

    /// ABI-encode selector and parameters
    pub(crate) fn encode(&self) -> Result<Bytes, CallError> {
        self.function
            .abi_encode_input(&self.params)
            .map(Into::into)
            .map_err(|e| CallError::Encode {
                target: self.target.to_string(),
                reason: e.to_string(),
            })
    }

    /// Decode return data against the descriptor's output schema
    pub(crate) fn decode(&self, data: &[u8]) -> Result<Vec<DynSolValue>, CallError> {
        self.function
            .abi_decode_output(data)
            .map_err(|e| CallError::Decode {
                target: self.target.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Outcome of one read call
///
/// Failure carries the original call and no decoded output, so a missing
/// balance can never be conflated with a zero balance.
#[derive(Debug, Clone)]
pub enum CallResult {
    /// Decoded output values, one per declared return
    Success(Vec<DynSolValue>),
    /// The call that could not be completed
    Failure(Call),
}

impl CallResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Success(_))
    }

    /// Decoded outputs, if the call succeeded
    pub fn values(&self) -> Option<&[DynSolValue]> {
        match self {
            CallResult::Success(values) => Some(values),
            CallResult::Failure(_) => None,
        }
    }

    pub fn into_values(self) -> Option<Vec<DynSolValue>> {
        match self {
            CallResult::Success(values) => Some(values),
            CallResult::Failure(_) => None,
        }
    }

    /// First output as an unsigned integer
    pub fn uint(&self) -> Option<U256> {
        self.values()?
            .first()
            .and_then(DynSolValue::as_uint)
            .map(|(value, _)| value)
    }

    /// First output as an address
    pub fn address(&self) -> Option<Address> {
        self.values()?.first().and_then(DynSolValue::as_address)
    }

    /// First output as a string
    pub fn string(&self) -> Option<String> {
        self.values()?
            .first()
            .and_then(DynSolValue::as_str)
            .map(ToOwned::to_owned)
    }
}

/// Execute one read call
///
/// Encodes per the call's ABI descriptor, dispatches a read-only
/// invocation at the context's block, and decodes the output. All
/// failure modes resolve to [`CallResult::Failure`].
pub async fn execute(ctx: &BalancesContext, call: Call) -> CallResult {
    let data = match call.encode() {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "Call encoding failed");
            return CallResult::Failure(call);
        }
    };

    let raw = match dispatch_with_deadline(ctx, call.target, data).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!(to = %call.target, error = %e, "Call dispatch failed");
            return CallResult::Failure(call);
        }
    };

    match call.decode(&raw) {
        Ok(values) => CallResult::Success(values),
        Err(e) => {
            debug!(error = %e, "Call output decoding failed");
            CallResult::Failure(call)
        }
    }
}

/// Dispatch raw calldata, bounded by the context deadline
pub(crate) async fn dispatch_with_deadline(
    ctx: &BalancesContext,
    target: Address,
    data: Bytes,
) -> Result<Bytes, DispatchError> {
    match ctx.remaining()? {
        Some(remaining) => {
            tokio::time::timeout(remaining, ctx.client.dispatch(target, data, ctx.block))
                .await
                .map_err(|_| DispatchError::DeadlineExceeded)?
        }
        None => ctx.client.dispatch(target, data, ctx.block).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature() {
        let call = Call::parse(Address::ZERO, "decimals()(uint8)").unwrap();
        assert_eq!(call.function.name, "decimals");
        assert_eq!(call.function.outputs.len(), 1);
    }

    #[test]
    fn test_parse_invalid_signature() {
        assert!(Call::parse(Address::ZERO, "not a signature").is_err());
    }

    #[test]
    fn test_encode_checks_arity() {
        // balanceOf takes one address; encoding with none must fail
        let call = Call::parse(Address::ZERO, "balanceOf(address)(uint256)").unwrap();
        assert!(call.encode().is_err());

        let call = call.with_params(vec![DynSolValue::Address(Address::ZERO)]);
        assert!(call.encode().is_ok());
    }

    #[test]
    fn test_result_accessors() {
        let result = CallResult::Success(vec![DynSolValue::Uint(U256::from(42u64), 256)]);
        assert_eq!(result.uint(), Some(U256::from(42u64)));
        assert_eq!(result.string(), None);

        let failure =
            CallResult::Failure(Call::parse(Address::ZERO, "decimals()(uint8)").unwrap());
        assert!(!failure.is_success());
        assert_eq!(failure.uint(), None);
    }
}

//! Error types for the batched call engine and balance resolution
//!
//! This module defines a layered error handling system that covers:
//! - Configuration errors surfaced to adapter authors
//! - Dispatch (network-level) errors for aggregate invocations
//! - Per-call errors absorbed into `CallResult::Failure`
//! - Error conversion and propagation

use thiserror::Error;

/// Top-level error type for the balance resolution system
///
/// Encompasses the errors that can escape a resolution pass. Per-call
/// faults never appear here: they resolve to `CallResult::Failure` and
/// the affected entries are omitted from the output.
#[derive(Debug, Error)]
pub enum Error {
    /// Errors in adapter or chain configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Network-level errors that survived the retry policy
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Configuration-specific errors
///
/// These are setup mistakes on the adapter author's side. They are fatal
/// and surface immediately rather than being absorbed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid or malformed RPC URL
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    /// A human-readable ABI signature failed to parse
    #[error("Invalid ABI signature `{signature}`: {reason}")]
    InvalidAbi {
        signature: String,
        reason: String,
    },

    /// A declared contract group has no matching balance handler
    #[error("No balance handler registered for contract group `{group}`")]
    MissingHandler {
        group: String,
    },

    /// A contract is missing a field its handler requires
    #[error("Contract {address} is missing required field `{field}`")]
    MissingField {
        address: String,
        field: &'static str,
    },
}

/// Network-level dispatch errors
///
/// These affect a whole RPC invocation (a single `eth_call` or an entire
/// aggregate batch). Aggregate invocations retry with bounded backoff;
/// after exhaustion every contained call resolves to `Failure`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Transport failure reaching the endpoint
    #[error("RPC transport failure: {0}")]
    Transport(String),

    /// The caller-supplied deadline elapsed before the call completed
    #[error("Deadline exceeded before the call completed")]
    DeadlineExceeded,

    /// The aggregate response could not be decoded or had the wrong shape
    #[error("Invalid aggregate response: {0}")]
    InvalidResponse(String),
}

impl DispatchError {
    /// Whether retrying the invocation can possibly help
    pub fn is_retryable(&self) -> bool {
        matches!(self, DispatchError::Transport(_))
    }
}

/// Per-call errors
///
/// These affect exactly one call slot and are absorbed into
/// `CallResult::Failure` without touching sibling calls. They exist as a
/// typed enum for diagnostics, not for propagation.
#[derive(Debug, Error)]
pub enum CallError {
    /// Parameter encoding failed for the call's ABI descriptor
    ///
    /// # Fields
    /// * `target` - Call target address
    /// * `reason` - Detailed error message
    #[error("Failed to encode call to {target}: {reason}")]
    Encode {
        target: String,
        reason: String,
    },

    /// The call reverted on-chain
    ///
    /// # Fields
    /// * `target` - Call target address
    #[error("Call to {target} reverted")]
    Reverted {
        target: String,
    },

    /// Return data did not match the expected output schema
    ///
    /// # Fields
    /// * `target` - Call target address
    /// * `reason` - Detailed error message
    #[error("Failed to decode return data from {target}: {reason}")]
    Decode {
        target: String,
        reason: String,
    },
}

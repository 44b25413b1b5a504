//! Named contract-group balance fan-out
//!
//! Adapters declare contracts in named groups and supply one balance
//! handler per group. [`resolve_balances`] checks that every declared
//! group has a handler, runs all handlers concurrently, and flattens the
//! results in declaration order regardless of completion order.

use std::collections::HashMap;

use futures::future::{join_all, BoxFuture};
use tracing::debug;

use crate::errors::{ConfigError, Error};
use crate::types::{Balance, BalancesContext, Contract};

/// Balance handler for one contract group
///
/// Handlers absorb per-call failures by filtering `Failure` slots and
/// omitting the affected positions; returning `Err` means the handler
/// itself is broken and fails the whole resolution.
pub type BalanceHandler = Box<
    dyn for<'a> Fn(&'a BalancesContext, &'a [Contract]) -> BoxFuture<'a, Result<Vec<Balance>, Error>>
        + Send
        + Sync,
>;

/// Insertion-ordered named contract groups
///
/// Declaration order is the output order, so it is kept explicitly rather
/// than left to a hash map.
#[derive(Debug, Clone, Default)]
pub struct ContractGroups {
    groups: Vec<(String, Vec<Contract>)>,
}

impl ContractGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a group holding a single contract
    pub fn with_one(mut self, name: impl Into<String>, contract: Contract) -> Self {
        self.groups.push((name.into(), vec![contract]));
        self
    }

    /// Declare a group holding a list of contracts
    pub fn with_many(mut self, name: impl Into<String>, contracts: Vec<Contract>) -> Self {
        self.groups.push((name.into(), contracts));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Contract])> {
        self.groups
            .iter()
            .map(|(name, contracts)| (name.as_str(), contracts.as_slice()))
    }

    pub fn get(&self, name: &str) -> Option<&[Contract]> {
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, contracts)| contracts.as_slice())
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Balance handlers keyed by group name
#[derive(Default)]
pub struct GroupHandlers {
    handlers: HashMap<String, BalanceHandler>,
}

impl GroupHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a group name
    pub fn with<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: for<'a> Fn(
                &'a BalancesContext,
                &'a [Contract],
            ) -> BoxFuture<'a, Result<Vec<Balance>, Error>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    fn get(&self, name: &str) -> Option<&BalanceHandler> {
        self.handlers.get(name)
    }
}

/// Resolve every declared contract group into one flat balance list
///
/// Every group present in `groups` must have a matching handler; a
/// missing handler is a configuration error surfaced before any handler
/// runs. Handlers execute concurrently with no ordering dependency
/// between groups; the flattened output follows declaration order.
pub async fn resolve_balances(
    ctx: &BalancesContext,
    groups: &ContractGroups,
    handlers: &GroupHandlers,
) -> Result<Vec<Balance>, Error> {
    let mut jobs = Vec::with_capacity(groups.len());
    for (name, contracts) in groups.iter() {
        let handler = handlers.get(name).ok_or_else(|| ConfigError::MissingHandler {
            group: name.to_string(),
        })?;
        jobs.push(async move { (name, handler(ctx, contracts).await) });
    }

    // join_all keeps declaration order regardless of completion order
    let finished = join_all(jobs).await;

    let mut balances = Vec::new();
    for (name, result) in finished {
        let group_balances = result?;
        debug!(group = name, count = group_balances.len(), "Group resolved");
        balances.extend(group_balances);
    }
    Ok(balances)
}

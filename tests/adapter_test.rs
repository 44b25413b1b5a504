//! End-to-end adapter boundary test: discovery then balance resolution

mod common;

use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use common::{balanceOfCall, MockDispatcher};
use evm_balances::adapter::{Adapter, BalanceGroup, BalancesOutput, BaseContext, ContractsOutput};
use evm_balances::{
    multicall, resolve_balances, Balance, BalancesContext, Call, Category, Chain, Contract,
    ContractGroups, Error, GroupHandlers,
};
use futures::future::BoxFuture;
use futures::FutureExt;

/// One batched balanceOf per market; failed markets are omitted
fn market_balances<'a>(
    ctx: &'a BalancesContext,
    contracts: &'a [Contract],
) -> BoxFuture<'a, Result<Vec<Balance>, Error>> {
    async move {
        let calls = contracts
            .iter()
            .map(|market| {
                Call::parse(market.address, "balanceOf(address)(uint256)")
                    .map(|call| call.with_params(vec![ctx.address.into()]))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let results = multicall(ctx, calls).await;

        let balances = contracts
            .iter()
            .zip(results)
            .filter_map(|(market, result)| {
                let token = market.as_token().ok()?;
                result
                    .uint()
                    .map(|amount| Balance::new(token, amount, Category::Lend))
            })
            .collect();
        Ok(balances)
    }
    .boxed()
}

/// Minimal lending-style adapter over a fixed market list
struct LendingAdapter {
    markets: Vec<Address>,
}

#[async_trait]
impl Adapter for LendingAdapter {
    fn id(&self) -> &str {
        "test-lending"
    }

    async fn get_contracts(&self, _ctx: &BaseContext) -> Result<ContractsOutput, Error> {
        let markets = self
            .markets
            .iter()
            .map(|address| Contract::new(1, *address).with_symbol("cTEST").with_decimals(8))
            .collect();
        Ok(ContractsOutput {
            contracts: ContractGroups::new().with_many("markets", markets),
            revalidate: Some(3_600),
        })
    }

    async fn get_balances(
        &self,
        ctx: &BalancesContext,
        contracts: &ContractGroups,
    ) -> Result<BalancesOutput, Error> {
        let handlers = GroupHandlers::new().with("markets", market_balances);
        let balances = resolve_balances(ctx, contracts, &handlers).await?;
        Ok(BalancesOutput {
            groups: vec![BalanceGroup { balances }],
        })
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_adapter_roundtrip() -> Result<()> {
    let wallet = Address::repeat_byte(0xAA);
    let market_a = Address::repeat_byte(1);
    let market_b = Address::repeat_byte(2);

    let mock = MockDispatcher::new();
    let calldata = balanceOfCall { owner: wallet }.abi_encode();
    mock.answer(
        market_a,
        calldata.clone(),
        balanceOfCall::abi_encode_returns(&U256::from(250u64)),
    );
    mock.revert(market_b, calldata);

    let chain = Chain::known(1, "http://localhost:8545");
    let base = BaseContext::new(chain, mock.clone());
    let adapter = LendingAdapter {
        markets: vec![market_a, market_b],
    };

    let discovered = adapter.get_contracts(&base).await?;
    assert_eq!(discovered.revalidate, Some(3_600));
    assert_eq!(discovered.contracts.len(), 1);

    let ctx = base.for_wallet(wallet);
    let output = adapter.get_balances(&ctx, &discovered.contracts).await?;

    assert_eq!(output.groups.len(), 1);
    let balances = &output.groups[0].balances;
    // The reverting market is omitted, not reported as zero
    assert_eq!(balances.len(), 1);
    assert_eq!(balances[0].amount, U256::from(250u64));
    assert_eq!(balances[0].category, Category::Lend);
    Ok(())
}

//! Spot-aggregator price feed.
//!
//! Per-token ETH prices come from an on-chain spot price aggregator
//! (`getRateToEth`), batched through Multicall3 so one `eth_call` covers
//! the whole token set. The base fee comes from `eth_feeHistory`.

use crate::error::{Error, Result};
use crate::oracle::multicall::{IMulticall3, MULTICALL3_ADDRESS};
use crate::price::PriceFeed;
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{address, Address, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

sol! {
    /// 1inch spot price aggregator.
    #[derive(Debug)]
    interface ISpotPriceAggregator {
        function getRateToEth(address srcToken, bool useSrcWrappers)
            external
            view
            returns (uint256 weightedRate);
    }
}

/// 1inch spot price aggregator on mainnet.
pub const SPOT_AGGREGATOR_ADDRESS: Address =
    address!("0AdDd25a91563696D8567Df78D5A01C9a991F9B8");

/// `getRateToEth` scales the rate by 1e18 on both legs.
const RATE_SCALE: f64 = 1e36;

/// Price feed backed by the spot aggregator contract.
pub struct SpotPriceFeed {
    rpc_url: String,
    aggregator: Address,
}

impl SpotPriceFeed {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            aggregator: SPOT_AGGREGATOR_ADDRESS,
        }
    }

    pub fn with_aggregator(rpc_url: String, aggregator: Address) -> Self {
        Self {
            rpc_url,
            aggregator,
        }
    }
}

#[async_trait]
impl PriceFeed for SpotPriceFeed {
    async fn fetch_price_eth(
        &self,
        tokens: &[Address],
        block_number: u64,
    ) -> Result<HashMap<Address, f64>> {
        if tokens.is_empty() {
            return Ok(HashMap::new());
        }

        let calls: Vec<IMulticall3::Call> = tokens
            .iter()
            .map(|&token| IMulticall3::Call {
                target: self.aggregator,
                callData: ISpotPriceAggregator::getRateToEthCall {
                    srcToken: token,
                    useSrcWrappers: true,
                }
                .abi_encode()
                .into(),
            })
            .collect();

        let calldata = IMulticall3::tryAggregateCall {
            requireSuccess: false,
            calls,
        }
        .abi_encode();

        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse().map_err(Error::oracle)?);
        let tx = TransactionRequest::default()
            .to(MULTICALL3_ADDRESS)
            .input(calldata.into());
        let raw = provider
            .call(tx)
            .block(block_number.into())
            .await
            .map_err(Error::oracle)?;

        let results =
            IMulticall3::tryAggregateCall::abi_decode_returns(&raw).map_err(Error::oracle)?;

        let mut prices = HashMap::with_capacity(tokens.len());
        for (&token, result) in tokens.iter().zip(results) {
            if !result.success || result.returnData.len() < 32 {
                warn!(token = %token, block_number, "no spot price, token will be excluded");
                continue;
            }
            let rate = U256::from_be_slice(&result.returnData[..32]);
            let price = crate::num::u256_to_f64(rate) / RATE_SCALE;
            if price > 0.0 {
                prices.insert(token, price);
            } else {
                warn!(token = %token, block_number, "zero spot price, token will be excluded");
            }
        }

        debug!(
            priced = prices.len(),
            requested = tokens.len(),
            block_number,
            "spot prices fetched"
        );
        Ok(prices)
    }

    async fn base_fee_history(&self, block_number: u64) -> Result<Vec<u128>> {
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse().map_err(Error::oracle)?);

        // Requesting one block yields two base fees: the block's own and
        // the next block's projection.
        let history = provider
            .get_fee_history(1, BlockNumberOrTag::Number(block_number), &[])
            .await
            .map_err(Error::oracle)?;

        if history.base_fee_per_gas.is_empty() {
            return Err(Error::OracleUnavailable(
                "fee history returned no base fee".into(),
            ));
        }
        Ok(history.base_fee_per_gas)
    }
}

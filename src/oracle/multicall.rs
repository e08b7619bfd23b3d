//! Multicall-backed quote oracle.
//!
//! Packs an entire quote batch into a single Multicall3 `tryAggregate`
//! `eth_call` pinned to the target block, and decodes the per-call
//! `(success, returnData)` pairs in input order.

use crate::error::{Error, Result};
use crate::oracle::{CallReturn, QuoteCall, QuoteOracle};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{address, Address};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use tracing::debug;

sol! {
    /// Multicall3 batching interface (tryAggregate is Multicall2-compatible).
    #[derive(Debug)]
    interface IMulticall3 {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function tryAggregate(bool requireSuccess, Call[] calldata calls)
            external
            payable
            returns (Result[] memory returnData);
    }
}

/// Multicall3 deployment address, identical across the major EVM chains.
pub const MULTICALL3_ADDRESS: Address = address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Quote oracle that aggregates a batch through Multicall3.
pub struct MulticallOracle {
    rpc_url: String,
    multicall: Address,
}

impl MulticallOracle {
    pub fn new(rpc_url: String) -> Self {
        Self {
            rpc_url,
            multicall: MULTICALL3_ADDRESS,
        }
    }

    /// Use a non-standard multicall deployment (side chains, forks).
    pub fn with_contract(rpc_url: String, multicall: Address) -> Self {
        Self { rpc_url, multicall }
    }

    async fn eth_call(
        &self,
        to: Address,
        calldata: Vec<u8>,
        block_number: u64,
    ) -> Result<Vec<u8>> {
        let provider = ProviderBuilder::new()
            .connect_http(self.rpc_url.parse().map_err(Error::oracle)?);

        let tx = TransactionRequest::default().to(to).input(calldata.into());

        let output = provider
            .call(tx)
            .block(block_number.into())
            .await
            .map_err(Error::oracle)?;

        Ok(output.to_vec())
    }
}

#[async_trait]
impl QuoteOracle for MulticallOracle {
    async fn batch(
        &self,
        calls: &[QuoteCall],
        require_success: bool,
        block_number: u64,
    ) -> Result<Vec<CallReturn>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let wrapped: Vec<IMulticall3::Call> = calls
            .iter()
            .map(|call| IMulticall3::Call {
                target: call.target,
                callData: call.calldata.clone(),
            })
            .collect();

        debug!(
            calls = wrapped.len(),
            require_success, block_number, "multicall batch"
        );

        let calldata = IMulticall3::tryAggregateCall {
            requireSuccess: require_success,
            calls: wrapped,
        }
        .abi_encode();

        let raw = self.eth_call(self.multicall, calldata, block_number).await?;

        let decoded =
            IMulticall3::tryAggregateCall::abi_decode_returns(&raw).map_err(Error::oracle)?;

        if decoded.len() != calls.len() {
            return Err(Error::OracleUnavailable(format!(
                "multicall returned {} results for {} calls",
                decoded.len(),
                calls.len()
            )));
        }

        Ok(decoded
            .into_iter()
            .map(|result| CallReturn {
                success: result.success,
                return_data: result.returnData,
            })
            .collect())
    }

    async fn resolve_block(&self, block: BlockNumberOrTag) -> Result<u64> {
        match block {
            BlockNumberOrTag::Number(number) => Ok(number),
            _ => {
                let provider = ProviderBuilder::new()
                    .connect_http(self.rpc_url.parse().map_err(Error::oracle)?);
                provider.get_block_number().await.map_err(Error::oracle)
            }
        }
    }
}

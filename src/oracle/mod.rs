//! Quote oracle contract: batched call descriptors, decoded returns, and
//! the chunked concurrent dispatch used for whole-graph quoting.
//!
//! The oracle itself is a collaborator behind the [`QuoteOracle`] trait;
//! this module only fixes the call/return wire shapes and the closed set of
//! return decoders.

use crate::error::{Error, Result};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolValue;
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::debug;

pub(crate) mod multicall;

pub use multicall::{MulticallOracle, MULTICALL3_ADDRESS};

/// Default divisor for the chunk policy: a batch of `n` calls is split into
/// chunks of `max(1, n / 4)`. A tunable, not a contract.
pub const DEFAULT_CHUNK_DIVISOR: usize = 4;

/// How a venue's raw return bytes decode into an output amount.
///
/// A closed tag set instead of a per-call closure: the post-processing step
/// dispatches on this variant, which keeps the decoder inventory fixed and
/// auditable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    /// First 32-byte word is `uint256 amountOut`. Trailing words, if any,
    /// are ignored, so this covers both single-return and multi-return
    /// concentrated-liquidity quoters.
    AmountOut,
    /// ABI-encoded `uint256[] amounts`; the last element is the output
    /// amount (constant-product router `getAmountsOut` shape).
    AmountsOut,
}

/// One quote request: where to call, what to send, how to read the answer.
#[derive(Debug, Clone)]
pub struct QuoteCall {
    /// Contract to call.
    pub target: Address,
    /// ABI-encoded calldata (selector plus arguments).
    pub calldata: Bytes,
    /// Decoder for the raw return bytes.
    pub decode: DecodeKind,
}

/// One entry of a batch response, in input order.
#[derive(Debug, Clone)]
pub struct CallReturn {
    /// Whether the sub-call succeeded.
    pub success: bool,
    /// Raw return bytes; empty when the call failed.
    pub return_data: Bytes,
}

impl CallReturn {
    /// A failed sub-call with no data.
    pub fn failure() -> Self {
        Self {
            success: false,
            return_data: Bytes::new(),
        }
    }
}

/// Batched call executor pinned to a block height.
///
/// Implementations may reorder work internally but must return results in
/// input order. A transport-level failure is the only error; per-call
/// failures come back as `CallReturn { success: false, .. }` unless
/// `require_success` promotes them.
#[async_trait]
pub trait QuoteOracle: Send + Sync {
    /// Execute a batch of calls against the state at `block_number`.
    async fn batch(
        &self,
        calls: &[QuoteCall],
        require_success: bool,
        block_number: u64,
    ) -> Result<Vec<CallReturn>>;

    /// Resolve a block identifier to a concrete height, so a whole
    /// invocation operates on a single block.
    async fn resolve_block(&self, block: BlockNumberOrTag) -> Result<u64>;
}

/// Decode a batch entry into an output amount.
///
/// A failed call, short data, or a malformed array all decode to zero; the
/// quote layer turns zero output into an infinite edge weight, so decode
/// failures are never fatal.
pub fn decode_amount_out(kind: DecodeKind, ret: &CallReturn) -> U256 {
    if !ret.success {
        return U256::ZERO;
    }
    let data = ret.return_data.as_ref();
    match kind {
        DecodeKind::AmountOut => {
            if data.len() < 32 {
                return U256::ZERO;
            }
            U256::from_be_slice(&data[..32])
        }
        DecodeKind::AmountsOut => match Vec::<U256>::abi_decode(data) {
            Ok(amounts) => amounts.last().copied().unwrap_or(U256::ZERO),
            Err(_) => U256::ZERO,
        },
    }
}

/// Split a batch into chunks and dispatch them concurrently, preserving
/// input order in the flattened result.
///
/// The oracle may chunk further internally; this is the core-side fan-out
/// so one slow chunk does not serialise the whole graph quote.
pub async fn batch_chunked(
    oracle: &Arc<dyn QuoteOracle>,
    calls: Vec<QuoteCall>,
    require_success: bool,
    block_number: u64,
    chunk_divisor: usize,
    concurrency: usize,
) -> Result<Vec<CallReturn>> {
    if calls.is_empty() {
        return Ok(Vec::new());
    }

    let total = calls.len();
    let chunk_size = (total / chunk_divisor.max(1)).max(1);
    let chunks: Vec<Vec<QuoteCall>> = calls.chunks(chunk_size).map(|c| c.to_vec()).collect();

    debug!(
        total,
        chunks = chunks.len(),
        chunk_size,
        block_number,
        "dispatching quote batch"
    );

    // `buffered` both bounds the in-flight chunk count and yields results
    // in submission order.
    let results: Vec<Vec<CallReturn>> = stream::iter(chunks.into_iter().map(|chunk| {
        let oracle = Arc::clone(oracle);
        async move { oracle.batch(&chunk, require_success, block_number).await }
    }))
    .buffered(concurrency.max(1))
    .try_collect()
    .await?;

    let flat: Vec<CallReturn> = results.into_iter().flatten().collect();
    if flat.len() != total {
        return Err(Error::OracleUnavailable(format!(
            "oracle returned {} results for {} calls",
            flat.len(),
            total
        )));
    }
    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(value: u64) -> Bytes {
        let mut data = [0u8; 32];
        data[24..].copy_from_slice(&value.to_be_bytes());
        Bytes::from(data.to_vec())
    }

    #[test]
    fn test_decode_amount_out_word() {
        let ret = CallReturn {
            success: true,
            return_data: word(1_000_000),
        };
        assert_eq!(
            decode_amount_out(DecodeKind::AmountOut, &ret),
            U256::from(1_000_000u64)
        );
    }

    #[test]
    fn test_decode_amount_out_ignores_trailing_words() {
        // QuoterV2-style return: amountOut plus three extra words.
        let mut data = word(42).to_vec();
        data.extend_from_slice(&[0u8; 96]);
        let ret = CallReturn {
            success: true,
            return_data: Bytes::from(data),
        };
        assert_eq!(
            decode_amount_out(DecodeKind::AmountOut, &ret),
            U256::from(42u64)
        );
    }

    #[test]
    fn test_decode_amounts_out_takes_last_element() {
        let amounts = vec![U256::from(100u64), U256::from(199u64)];
        let ret = CallReturn {
            success: true,
            return_data: Bytes::from(amounts.abi_encode()),
        };
        assert_eq!(
            decode_amount_out(DecodeKind::AmountsOut, &ret),
            U256::from(199u64)
        );
    }

    #[test]
    fn test_decode_failure_is_zero() {
        assert_eq!(
            decode_amount_out(DecodeKind::AmountOut, &CallReturn::failure()),
            U256::ZERO
        );
        assert_eq!(
            decode_amount_out(DecodeKind::AmountsOut, &CallReturn::failure()),
            U256::ZERO
        );
    }

    #[test]
    fn test_decode_short_data_is_zero() {
        let ret = CallReturn {
            success: true,
            return_data: Bytes::from(vec![0u8; 8]),
        };
        assert_eq!(decode_amount_out(DecodeKind::AmountOut, &ret), U256::ZERO);
        assert_eq!(decode_amount_out(DecodeKind::AmountsOut, &ret), U256::ZERO);
    }

    #[test]
    fn test_chunk_sizing() {
        // The policy is max(1, n/4): small batches stay whole.
        for (n, expected) in [(1usize, 1usize), (3, 1), (8, 2), (100, 25)] {
            assert_eq!((n / DEFAULT_CHUNK_DIVISOR).max(1), expected);
        }
    }
}

//! Price feed contract and probe normalisation.
//!
//! Negative-cycle detection compares `-log2` rates across edges, which is
//! only meaningful when all edges are measured at comparable input
//! magnitudes; AMM slippage otherwise makes the weights incomparable. The
//! probe for each token is sized so every starting probe has the same
//! economic value in the native gas asset.

use crate::error::{Error, Result};
use crate::num::f64_to_u256;
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

mod spot;

pub use spot::SpotPriceFeed;

/// Per-token price collaborator.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Unit price of each token expressed in the native gas asset at the
    /// block. Tokens the feed cannot price are absent from the map.
    async fn fetch_price_eth(
        &self,
        tokens: &[Address],
        block_number: u64,
    ) -> Result<HashMap<Address, f64>>;

    /// Base fees per gas starting at `block_number`, in wei, as
    /// `eth_feeHistory` reports them: the entry for the block itself
    /// followed by the next block's projected base fee. The first entry
    /// feeds the default `u_eth`; the cache keeps every entry under its
    /// own block.
    async fn base_fee_history(&self, block_number: u64) -> Result<Vec<u128>>;
}

/// Probe amounts with equal economic value across tokens:
/// `round(u_eth * price_eth(token) * 1e18)`.
///
/// Tokens whose probe sizes to zero (absent price, zero price, overflow
/// guard) are excluded, the same way a missing price excludes them.
pub fn probe_amounts(prices: &HashMap<Address, f64>, u_eth: f64) -> HashMap<Address, U256> {
    prices
        .iter()
        .filter_map(|(&token, &price)| {
            let probe = f64_to_u256((u_eth * price * 1e18).round());
            if probe.is_zero() {
                warn!(token = %token, price, "probe sized to zero, excluding token");
                None
            } else {
                Some((token, probe))
            }
        })
        .collect()
}

/// Block-keyed caches for the two feed calls, owned by the orchestrator.
///
/// Values are a function of the block alone, so concurrent writers may
/// race freely: last writer wins and any winner is correct.
#[derive(Default)]
pub struct FeedCache {
    prices: RwLock<HashMap<u64, PriceCacheEntry>>,
    base_fees: RwLock<HashMap<u64, u128>>,
}

struct PriceCacheEntry {
    /// Tokens the cached fetch covered; a token can be covered yet absent
    /// from the price map (the feed had no price for it).
    fetched: HashSet<Address>,
    prices: HashMap<Address, f64>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prices for `tokens` at `block_number`, served from cache when the
    /// cached fetch covered every requested token.
    pub async fn prices_at(
        &self,
        feed: &Arc<dyn PriceFeed>,
        tokens: &[Address],
        block_number: u64,
    ) -> Result<HashMap<Address, f64>> {
        if let Some(entry) = self.prices.read().await.get(&block_number) {
            if tokens.iter().all(|t| entry.fetched.contains(t)) {
                return Ok(tokens
                    .iter()
                    .filter_map(|t| entry.prices.get(t).map(|&p| (*t, p)))
                    .collect());
            }
        }

        let prices = feed.fetch_price_eth(tokens, block_number).await?;
        self.prices.write().await.insert(
            block_number,
            PriceCacheEntry {
                fetched: tokens.iter().copied().collect(),
                prices: prices.clone(),
            },
        );
        Ok(prices)
    }

    /// Base fee at `block_number`. One fee-history response covers both
    /// the block and its successor, so a miss seeds the cache for
    /// `block_number + 1` as well.
    pub async fn base_fee_at(
        &self,
        feed: &Arc<dyn PriceFeed>,
        block_number: u64,
    ) -> Result<u128> {
        if let Some(&fee) = self.base_fees.read().await.get(&block_number) {
            return Ok(fee);
        }

        let history = feed.base_fee_history(block_number).await?;
        let mut base_fees = self.base_fees.write().await;
        for (offset, &fee) in history.iter().enumerate() {
            base_fees.insert(block_number + offset as u64, fee);
        }

        history
            .first()
            .copied()
            .ok_or_else(|| Error::OracleUnavailable("price feed returned no base fee".into()))
    }
}

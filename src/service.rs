//! Arbitrage service: wires the graph, oracle, price feed and search
//! components into the single public entry point.
//!
//! Control flow for one invocation:
//! `(tokens, exchange_functions, block) -> ExchangeGraph -> batched quotes
//! -> QuoteGraph -> CycleFinder -> candidates -> sequential re-quote ->
//! profitable Arbitrages`.
//!
//! An invocation is cancelled by dropping its future; in-flight oracle
//! requests are dropped with it and no partial results escape, because
//! results only materialise at the very end.

use crate::config::SearchConfig;
use crate::error::{Error, Result};
use crate::graph::{ExchangeFunction, ExchangeGraph, Quote, QuoteGraph};
use crate::oracle::{batch_chunked, decode_amount_out, QuoteOracle};
use crate::path::Arbitrage;
use crate::price::{probe_amounts, FeedCache, PriceFeed};
use crate::search::{ArbitrageEvaluator, CycleFinder, NaiveEnumerator};
use alloy_eips::BlockNumberOrTag;
use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which search kernel to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Bounded depth-first enumeration quoting every internal step.
    Naive,
    /// Negative-cycle detection over a quoted snapshot, then re-quote.
    BellmanFord,
}

/// The orchestrator. Owns its collaborators and the per-block caches;
/// every `find_arbitrages` call is otherwise independent.
pub struct ArbitrageService {
    oracle: Arc<dyn QuoteOracle>,
    feed: Arc<dyn PriceFeed>,
    config: SearchConfig,
    cache: FeedCache,
}

impl ArbitrageService {
    pub fn new(oracle: Arc<dyn QuoteOracle>, feed: Arc<dyn PriceFeed>) -> Self {
        Self::with_config(oracle, feed, SearchConfig::default())
    }

    pub fn with_config(
        oracle: Arc<dyn QuoteOracle>,
        feed: Arc<dyn PriceFeed>,
        config: SearchConfig,
    ) -> Self {
        Self {
            oracle,
            feed,
            config,
            cache: FeedCache::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Find profitable cyclic arbitrages over `tokens` across
    /// `exchange_functions` at `block`.
    ///
    /// `u_eth` scales the per-token probe; `None` derives it from the
    /// block's base fee and the configured multiplier. `max_hops` bounds
    /// the naive enumeration (`None` takes the configured default); the
    /// Bellman-Ford search returns token-simple cycles, bounded by the
    /// token count. Tokens the price feed cannot price are excluded for
    /// this invocation; if fewer than two remain, the result is empty.
    pub async fn find_arbitrages(
        &self,
        tokens: &[Address],
        exchange_functions: Vec<Arc<dyn ExchangeFunction>>,
        block: BlockNumberOrTag,
        max_hops: Option<usize>,
        u_eth: Option<f64>,
        algorithm: Algorithm,
    ) -> Result<Vec<Arbitrage>> {
        let block_number = self.oracle.resolve_block(block).await?;
        let max_hops = max_hops.unwrap_or(self.config.max_hops);

        let u_eth = match u_eth {
            Some(value) => value,
            None => {
                let base_fee = self.cache.base_fee_at(&self.feed, block_number).await?;
                base_fee as f64 * self.config.u_eth_scale
            }
        };

        let prices = self
            .cache
            .prices_at(&self.feed, tokens, block_number)
            .await?;
        let probes = probe_amounts(&prices, u_eth);

        let priced: Vec<Address> = tokens
            .iter()
            .copied()
            .filter(|token| probes.contains_key(token))
            .collect();
        for token in tokens.iter().filter(|t| !probes.contains_key(*t)) {
            warn!(token = %token, block_number, "excluding token without a usable price");
        }
        if priced.len() < 2 {
            info!(
                priced = priced.len(),
                block_number, "fewer than two priced tokens, nothing to search"
            );
            return Ok(Vec::new());
        }

        let exchange = ExchangeGraph::new(priced, exchange_functions);

        match algorithm {
            Algorithm::Naive => {
                NaiveEnumerator::new(&exchange, Arc::clone(&self.oracle))
                    .find_arbitrages(
                        &probes,
                        max_hops,
                        block_number,
                        self.config.only_profitable,
                    )
                    .await
            }
            Algorithm::BellmanFord => {
                let quote_graph = self
                    .build_quote_graph(&exchange, &probes, block_number)
                    .await?;

                let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
                info!(
                    candidates = candidates.len(),
                    block_number, "negative-cycle search complete"
                );

                ArbitrageEvaluator::new(&exchange, Arc::clone(&self.oracle))
                    .evaluate(
                        candidates,
                        &probes,
                        block_number,
                        self.config.only_profitable,
                        self.config.concurrency,
                    )
                    .await
            }
        }
    }

    /// Quote every edge of the exchange graph in one chunked oracle batch
    /// and assemble the per-block snapshot.
    async fn build_quote_graph(
        &self,
        exchange: &ExchangeGraph,
        probes: &HashMap<Address, U256>,
        block_number: u64,
    ) -> Result<QuoteGraph> {
        let mut calls = Vec::with_capacity(exchange.edge_count());
        for id in exchange.edge_ids() {
            let edge = exchange.edge(id);
            // Every remaining token has a probe by construction.
            let amount_in = probes[&edge.token_in];
            calls.push(exchange.quote_call(id, amount_in, block_number));
        }
        let decode_kinds: Vec<_> = calls.iter().map(|call| call.decode).collect();

        let returns = batch_chunked(
            &self.oracle,
            calls,
            false,
            block_number,
            self.config.chunk_divisor,
            self.config.concurrency,
        )
        .await?;

        if returns.len() != exchange.edge_count() {
            return Err(Error::OracleUnavailable(format!(
                "oracle returned {} quotes for {} edges",
                returns.len(),
                exchange.edge_count()
            )));
        }

        let quotes: Vec<Quote> = exchange
            .edge_ids()
            .zip(decode_kinds.iter().zip(returns.iter()))
            .map(|(id, (&kind, ret))| {
                let edge = exchange.edge(id);
                let amount_in = probes[&edge.token_in];
                Quote::new(
                    edge.token_in,
                    edge.token_out,
                    amount_in,
                    decode_amount_out(kind, ret),
                )
            })
            .collect();

        let failed = quotes.iter().filter(|q| q.amount_out.is_zero()).count();
        if failed > 0 {
            debug!(
                failed,
                total = quotes.len(),
                block_number,
                "failed quotes kept with infinite weight"
            );
        }

        Ok(QuoteGraph::new(exchange, quotes, block_number))
    }
}

//! Naive enumerator: bounded depth-first cycle enumeration.
//!
//! The alternative to the Bellman-Ford finder. For each hop count in
//! `[2, max_hops]` and each start token, explores outgoing edges without
//! revisiting a token and closes back to the start at exactly the target
//! depth. Every internal step quotes actual output amounts, so there is no
//! log-linearisation error, at the price of exponential fan-out.

use crate::error::{Error, Result};
use crate::graph::ExchangeGraph;
use crate::oracle::{decode_amount_out, QuoteOracle};
use crate::path::{Arbitrage, Hop, Path};
use alloy_primitives::{Address, U256};
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Depth-first enumeration over one exchange graph.
pub struct NaiveEnumerator<'a> {
    exchange: &'a ExchangeGraph,
    oracle: Arc<dyn QuoteOracle>,
}

impl<'a> NaiveEnumerator<'a> {
    pub fn new(exchange: &'a ExchangeGraph, oracle: Arc<dyn QuoteOracle>) -> Self {
        Self { exchange, oracle }
    }

    /// Enumerate profitable cycles of every length in `[2, max_hops]`,
    /// starting from each token in insertion order.
    pub async fn find_arbitrages(
        &self,
        probe_amounts: &HashMap<Address, U256>,
        max_hops: usize,
        block_number: u64,
        only_profitable: bool,
    ) -> Result<Vec<Arbitrage>> {
        if max_hops < 2 {
            return Err(Error::InvariantViolated(format!(
                "at least 2 hops are needed for a cycle, given max_hops = {max_hops}"
            )));
        }

        let mut arbitrages = Vec::new();
        for &token_in in self.exchange.tokens() {
            let Some(&amount_in) = probe_amounts.get(&token_in) else {
                continue;
            };
            for hops in 2..=max_hops {
                let found = self
                    .explore(
                        hops,
                        token_in,
                        amount_in,
                        Path::new(),
                        block_number,
                        only_profitable,
                    )
                    .await?;
                arbitrages.extend(found);
            }
        }

        debug!(
            arbitrages = arbitrages.len(),
            max_hops, block_number, "naive enumeration complete"
        );
        Ok(arbitrages)
    }

    /// Recursive expansion. Each step batches the quotes for all parallel
    /// edges to a candidate next token; the closing step quotes the edges
    /// back to the start token and emits any path that ends above its
    /// input.
    fn explore(
        &self,
        hops_left: usize,
        start_token: Address,
        start_amount: U256,
        path: Path,
        block_number: u64,
        only_profitable: bool,
    ) -> BoxFuture<'_, Result<Vec<Arbitrage>>> {
        async move {
            let curr_token = path.last_token_out().unwrap_or(start_token);
            let curr_amount = path.last().map(|hop| hop.amount_out).unwrap_or(start_amount);
            let mut arbitrages = Vec::new();

            if hops_left == 1 {
                // Closing hop back to the start token.
                for (edge_id, amount_out) in self
                    .quote_pair(curr_token, start_token, curr_amount, block_number)
                    .await?
                {
                    let mut closed = path.clone();
                    closed.append(Hop {
                        edge_id,
                        edge: *self.exchange.edge(edge_id),
                        amount_in: curr_amount,
                        amount_out,
                        block_number,
                    })?;
                    if amount_out > start_amount || !only_profitable {
                        arbitrages.push(Arbitrage::new(closed, block_number, 0)?);
                    }
                }
                return Ok(arbitrages);
            }

            for &next_token in self.exchange.tokens() {
                // Token-simple: never revisit. The start token is only
                // reachable through the closing step above.
                if next_token == curr_token || path.contains_token(next_token) {
                    continue;
                }
                for (edge_id, amount_out) in self
                    .quote_pair(curr_token, next_token, curr_amount, block_number)
                    .await?
                {
                    let mut extended = path.clone();
                    extended.append(Hop {
                        edge_id,
                        edge: *self.exchange.edge(edge_id),
                        amount_in: curr_amount,
                        amount_out,
                        block_number,
                    })?;
                    let found = self
                        .explore(
                            hops_left - 1,
                            start_token,
                            start_amount,
                            extended,
                            block_number,
                            only_profitable,
                        )
                        .await?;
                    arbitrages.extend(found);
                }
            }

            Ok(arbitrages)
        }
        .boxed()
    }

    /// Quote every parallel edge of one token pair in a single oracle
    /// batch. Failed quotes come back as zero output.
    async fn quote_pair(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        block_number: u64,
    ) -> Result<Vec<(crate::graph::EdgeId, U256)>> {
        let edge_ids = self.exchange.edges_between(token_in, token_out);
        let calls: Vec<_> = edge_ids
            .iter()
            .map(|&id| self.exchange.quote_call(id, amount_in, block_number))
            .collect();
        let returns = self.oracle.batch(&calls, false, block_number).await?;

        Ok(edge_ids
            .iter()
            .zip(calls.iter().zip(returns.iter()))
            .map(|(&id, (call, ret))| (id, decode_amount_out(call.decode, ret)))
            .collect())
    }
}

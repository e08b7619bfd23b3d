//! Arbitrage evaluator: confirms candidate cycles against the oracle.
//!
//! The cycle finder works on a log-linearised model at one probe size; this
//! pass re-quotes each candidate hop-by-hop at the snapshot block to get
//! actual output amounts. Evaluation within a path is strictly sequential
//! (each hop's input is the previous hop's output); independent candidates
//! run concurrently with input order preserved.

use crate::error::{Error, Result};
use crate::graph::{EdgeId, ExchangeGraph};
use crate::oracle::{decode_amount_out, QuoteOracle};
use crate::path::{Arbitrage, Hop, Path};
use alloy_primitives::{Address, U256};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Sequential re-quoter for candidate cycles.
pub struct ArbitrageEvaluator<'a> {
    exchange: &'a ExchangeGraph,
    oracle: Arc<dyn QuoteOracle>,
}

impl<'a> ArbitrageEvaluator<'a> {
    pub fn new(exchange: &'a ExchangeGraph, oracle: Arc<dyn QuoteOracle>) -> Self {
        Self { exchange, oracle }
    }

    /// Evaluate all candidates. Output preserves candidate order even
    /// though evaluations overlap.
    pub async fn evaluate(
        &self,
        candidates: Vec<Vec<EdgeId>>,
        probe_amounts: &HashMap<Address, U256>,
        block_number: u64,
        only_profitable: bool,
        concurrency: usize,
    ) -> Result<Vec<Arbitrage>> {
        let evaluated: Vec<Option<Arbitrage>> =
            stream::iter(candidates.into_iter().map(|candidate| {
                self.evaluate_one(candidate, probe_amounts, block_number, only_profitable)
            }))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;

        Ok(evaluated.into_iter().flatten().collect())
    }

    /// Re-quote one candidate. A failed sub-quote yields zero, which
    /// propagates to a zero final amount and an unprofitable verdict,
    /// never an error.
    async fn evaluate_one(
        &self,
        candidate: Vec<EdgeId>,
        probe_amounts: &HashMap<Address, U256>,
        block_number: u64,
        only_profitable: bool,
    ) -> Result<Option<Arbitrage>> {
        let Some(&first) = candidate.first() else {
            return Ok(None);
        };
        let start_token = self.exchange.edge(first).token_in;
        let Some(&amount_in) = probe_amounts.get(&start_token) else {
            return Ok(None);
        };

        let mut path = Path::new();
        let mut current = amount_in;
        for &edge_id in &candidate {
            let call = self.exchange.quote_call(edge_id, current, block_number);
            let returns = self
                .oracle
                .batch(std::slice::from_ref(&call), false, block_number)
                .await?;
            let amount_out = returns
                .first()
                .map(|ret| decode_amount_out(call.decode, ret))
                .unwrap_or(U256::ZERO);

            path.append(Hop {
                edge_id,
                edge: *self.exchange.edge(edge_id),
                amount_in: current,
                amount_out,
                block_number,
            })?;
            current = amount_out;
        }

        if !path.is_closed() {
            return Err(Error::InvariantViolated(
                "candidate cycle does not close back to its start token".to_string(),
            ));
        }

        if current > amount_in || !only_profitable {
            Ok(Some(Arbitrage::new(path, block_number, 0)?))
        } else {
            debug!(
                start = %start_token,
                hops = candidate.len(),
                "candidate cycle not profitable on re-quote"
            );
            Ok(None)
        }
    }
}

//! Exchange graph: the static token/venue multigraph.
//!
//! Vertices are tokens, edges are `(token_in, token_out, venue)` triples.
//! The graph is a flat arena (token vector, exchange-function vector, edge
//! vector) addressed by integer handles, with a pair index for the
//! parallel-edge lists. Built once per invocation, read-only afterwards.

use crate::oracle::QuoteCall;
use alloy_primitives::{Address, Bytes, U256};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Venue handle: index into the exchange-function list. Stable within a
/// run; two edges over the same pair differ exactly in this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VenueId(pub u32);

/// Edge handle: index into the exchange graph's edge arena, in enumeration
/// order (token_in-major, then token_out, then venue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(pub u32);

/// Unsigned swap transaction parameters produced by a venue's swap factory.
/// Building these is pure; nothing in this crate signs or sends them.
#[derive(Debug, Clone, Serialize)]
pub struct SwapParams {
    /// Contract the transaction calls.
    pub to: Address,
    /// ABI-encoded calldata.
    pub calldata: Bytes,
    /// Native value attached to the call.
    pub value: U256,
}

/// A venue's quote and swap factories.
///
/// Implementations must be pure with respect to their arguments modulo
/// block state: the same inputs produce the same descriptor.
pub trait ExchangeFunction: Send + Sync {
    /// Stable human-readable venue label, e.g. `"uniswap_v3/500"`.
    fn venue_label(&self) -> &str;

    /// Build the quote descriptor for swapping `amount_in` of `token_in`
    /// into `token_out` against the state at `block_number`.
    fn quote_call(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        block_number: u64,
    ) -> QuoteCall;

    /// Build the unsigned swap transaction for the same hop. The slippage
    /// bound is the caller's to choose.
    fn swap_params(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        amount_out_minimum: U256,
        recipient: Address,
        block_number: u64,
    ) -> SwapParams;
}

/// A directed `(token_in, token_out, venue)` triple; the atomic unit of
/// routing. Identity is the triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExchangeEdge {
    pub token_in: Address,
    pub token_out: Address,
    pub venue: VenueId,
}

/// The static exchange multigraph: complete over the token set (minus
/// self-loops), with one parallel edge per registered exchange function.
pub struct ExchangeGraph {
    tokens: Vec<Address>,
    functions: Vec<Arc<dyn ExchangeFunction>>,
    edges: Vec<ExchangeEdge>,
    by_pair: HashMap<(Address, Address), Vec<EdgeId>>,
}

impl ExchangeGraph {
    /// Materialise the graph. For every ordered pair of distinct tokens,
    /// one edge per exchange function, in registration order.
    pub fn new(tokens: Vec<Address>, functions: Vec<Arc<dyn ExchangeFunction>>) -> Self {
        let n = tokens.len();
        let v = functions.len();
        let mut edges = Vec::with_capacity(n.saturating_sub(1) * n * v);
        let mut by_pair = HashMap::with_capacity(n.saturating_sub(1) * n);

        for &token_in in &tokens {
            for &token_out in &tokens {
                if token_in == token_out {
                    continue;
                }
                let mut ids = Vec::with_capacity(v);
                for venue in 0..v as u32 {
                    let id = EdgeId(edges.len() as u32);
                    edges.push(ExchangeEdge {
                        token_in,
                        token_out,
                        venue: VenueId(venue),
                    });
                    ids.push(id);
                }
                by_pair.insert((token_in, token_out), ids);
            }
        }

        debug!(
            tokens = n,
            venues = v,
            edges = edges.len(),
            "exchange graph built"
        );

        Self {
            tokens,
            functions,
            edges,
            by_pair,
        }
    }

    /// Registered tokens, in insertion order.
    pub fn tokens(&self) -> &[Address] {
        &self.tokens
    }

    pub fn venue_count(&self) -> usize {
        self.functions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolve an edge handle.
    pub fn edge(&self, id: EdgeId) -> &ExchangeEdge {
        &self.edges[id.0 as usize]
    }

    /// All edge handles, in enumeration order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    /// Parallel edges between a token pair, in venue registration order.
    ///
    /// Panics if either token is unregistered or `token_in == token_out`;
    /// both are programming errors, not market conditions.
    pub fn edges_between(&self, token_in: Address, token_out: Address) -> &[EdgeId] {
        self.by_pair
            .get(&(token_in, token_out))
            .unwrap_or_else(|| {
                panic!("no edge list for pair {token_in} -> {token_out}; tokens must be registered and distinct")
            })
    }

    /// The exchange function behind a venue handle.
    pub fn function(&self, venue: VenueId) -> &Arc<dyn ExchangeFunction> {
        &self.functions[venue.0 as usize]
    }

    pub fn venue_label(&self, venue: VenueId) -> &str {
        self.functions[venue.0 as usize].venue_label()
    }

    /// Build the quote descriptor for an edge at a given input amount.
    pub fn quote_call(&self, id: EdgeId, amount_in: U256, block_number: u64) -> QuoteCall {
        let edge = self.edge(id);
        self.functions[edge.venue.0 as usize].quote_call(
            edge.token_in,
            edge.token_out,
            amount_in,
            block_number,
        )
    }

    /// Build the unsigned swap transaction for an edge.
    pub fn swap_params(
        &self,
        id: EdgeId,
        amount_in: U256,
        amount_out_minimum: U256,
        recipient: Address,
        block_number: u64,
    ) -> SwapParams {
        let edge = self.edge(id);
        self.functions[edge.venue.0 as usize].swap_params(
            edge.token_in,
            edge.token_out,
            amount_in,
            amount_out_minimum,
            recipient,
            block_number,
        )
    }
}

//! Quote graph: a per-block snapshot of the exchange graph decorated with
//! measured quotes.
//!
//! Key insight carried through the search: with edge weight
//! `-log2(amount_out / amount_in)`, a cycle whose rate product exceeds 1
//! has negative total weight, so arbitrage detection reduces to
//! negative-cycle detection.

use crate::graph::{EdgeId, ExchangeGraph};
use crate::num::u256_to_f64;
use alloy_primitives::{Address, U256};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use tracing::debug;

/// A measurement of one edge's output for a specific input at a specific
/// block. A failed venue call is a quote with `amount_out == 0`.
#[derive(Debug, Clone)]
pub struct Quote {
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    /// `amount_out / amount_in`; zero when `amount_in` is zero.
    pub rate: f64,
    /// `-log2(rate)`; `+inf` when the rate is not positive, so failed
    /// quotes never participate in a shortest path.
    pub neg_log_rate: f64,
}

impl Quote {
    pub fn new(token_in: Address, token_out: Address, amount_in: U256, amount_out: U256) -> Self {
        let rate = if amount_in.is_zero() {
            0.0
        } else {
            u256_to_f64(amount_out) / u256_to_f64(amount_in)
        };
        let neg_log_rate = if rate > 0.0 {
            -rate.log2()
        } else {
            f64::INFINITY
        };
        Self {
            token_in,
            token_out,
            amount_in,
            amount_out,
            rate,
            neg_log_rate,
        }
    }
}

/// Edge payload of the petgraph view: the arena handle plus a copy of the
/// weight so relaxation never chases the quote vector.
#[derive(Debug, Clone, Copy)]
pub struct QuoteEdge {
    pub edge_id: EdgeId,
    pub weight: f64,
}

/// The quoted snapshot, bound to one block height.
///
/// Quotes live in a flat vector indexed by [`EdgeId`]; the petgraph view
/// exists for the search kernel. Node indices follow token insertion order
/// and edge indices follow the exchange graph's edge enumeration order, so
/// every iteration over this structure is deterministic.
pub struct QuoteGraph {
    graph: DiGraph<Address, QuoteEdge>,
    token_nodes: HashMap<Address, NodeIndex>,
    quotes: Vec<Quote>,
    block_number: u64,
}

impl QuoteGraph {
    /// Assemble the snapshot from per-edge quotes in edge enumeration
    /// order. Failed quotes stay in the graph with infinite weight; nothing
    /// is pruned here.
    pub fn new(exchange: &ExchangeGraph, quotes: Vec<Quote>, block_number: u64) -> Self {
        assert_eq!(
            quotes.len(),
            exchange.edge_count(),
            "one quote per exchange edge"
        );

        let mut graph =
            DiGraph::with_capacity(exchange.tokens().len(), exchange.edge_count());
        let mut token_nodes = HashMap::with_capacity(exchange.tokens().len());
        for &token in exchange.tokens() {
            token_nodes.insert(token, graph.add_node(token));
        }

        for id in exchange.edge_ids() {
            let edge = exchange.edge(id);
            graph.add_edge(
                token_nodes[&edge.token_in],
                token_nodes[&edge.token_out],
                QuoteEdge {
                    edge_id: id,
                    weight: quotes[id.0 as usize].neg_log_rate,
                },
            );
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            block_number,
            "quote graph built"
        );

        Self {
            graph,
            token_nodes,
            quotes,
            block_number,
        }
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    pub fn quote(&self, id: EdgeId) -> &Quote {
        &self.quotes[id.0 as usize]
    }

    /// The petgraph view for the search kernel.
    pub fn graph(&self) -> &DiGraph<Address, QuoteEdge> {
        &self.graph
    }

    pub fn node(&self, token: Address) -> Option<NodeIndex> {
        self.token_nodes.get(&token).copied()
    }

    pub fn token(&self, node: NodeIndex) -> Address {
        self.graph[node]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Sum of `-log2` weights along a sequence of edges.
    pub fn cycle_weight(&self, edges: &[EdgeId]) -> f64 {
        edges.iter().map(|&id| self.quote(id).neg_log_rate).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_rate_and_log_rate_coherence() {
        let quote = Quote::new(addr(1), addr(2), U256::from(100u64), U256::from(200u64));
        assert!((quote.rate - 2.0).abs() < 1e-12);
        assert!((quote.neg_log_rate + (2.0f64).log2()).abs() < 1e-12);

        // The identity -log2(rate) == -log2(out/in) must hold generally.
        let quote = Quote::new(addr(1), addr(2), U256::from(300u64), U256::from(100u64));
        let expected = -(100.0f64 / 300.0).log2();
        assert!((quote.neg_log_rate - expected).abs() < 1e-9);
    }

    #[test]
    fn test_failed_quote_has_infinite_weight() {
        let quote = Quote::new(addr(1), addr(2), U256::from(100u64), U256::ZERO);
        assert_eq!(quote.rate, 0.0);
        assert!(quote.neg_log_rate.is_infinite());
    }

    #[test]
    fn test_zero_input_has_infinite_weight() {
        let quote = Quote::new(addr(1), addr(2), U256::ZERO, U256::from(100u64));
        assert_eq!(quote.rate, 0.0);
        assert!(quote.neg_log_rate.is_infinite());
    }

    #[test]
    fn test_favourable_rate_is_negative_weight() {
        let quote = Quote::new(addr(1), addr(2), U256::from(100u64), U256::from(150u64));
        assert!(quote.neg_log_rate < 0.0);

        let quote = Quote::new(addr(1), addr(2), U256::from(100u64), U256::from(50u64));
        assert!(quote.neg_log_rate > 0.0);
    }
}

//! Negative-cycle search over the quote graph.
//!
//! Standard Bellman-Ford, one run per source token: |V|-1 relaxation
//! rounds, then a detection pass whose first successful relaxation
//! witnesses a negative cycle. Parallel edges need no special casing
//! during relaxation: iterating edges in insertion order with a strict
//! `<` means the minimum-weight sibling wins and ties go to the earliest
//! venue, while the chosen edge identity is remembered in the predecessor
//! arrays.

use crate::graph::{EdgeId, QuoteGraph};
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashSet;
use tracing::debug;

/// Cycle search over one [`QuoteGraph`] snapshot.
pub struct CycleFinder<'a> {
    quote_graph: &'a QuoteGraph,
}

impl<'a> CycleFinder<'a> {
    pub fn new(quote_graph: &'a QuoteGraph) -> Self {
        Self { quote_graph }
    }

    /// Candidate cycles, at most one per source token, in token insertion
    /// order. Cycles rediscovered from a later source as a rotation of an
    /// earlier one are dropped, so each distinct cycle appears once.
    pub fn find_candidate_cycles(&self) -> Vec<Vec<EdgeId>> {
        let mut candidates = Vec::new();
        let mut seen: HashSet<Vec<EdgeId>> = HashSet::new();

        for source in self.quote_graph.graph().node_indices() {
            let Some(cycle) = self.find_cycle_from(source) else {
                continue;
            };
            if seen.insert(rotate_to_min(&cycle)) {
                debug!(
                    source = %self.quote_graph.token(source),
                    hops = cycle.len(),
                    weight = self.quote_graph.cycle_weight(&cycle),
                    "negative cycle found"
                );
                candidates.push(cycle);
            }
        }

        candidates
    }

    /// One Bellman-Ford run. Returns a negative cycle reachable from
    /// `source`, as exchange-edge handles in forward order, or `None`.
    fn find_cycle_from(&self, source: NodeIndex) -> Option<Vec<EdgeId>> {
        let graph = self.quote_graph.graph();
        let n = graph.node_count();

        let mut dist = vec![f64::INFINITY; n];
        let mut pred: Vec<Option<NodeIndex>> = vec![None; n];
        let mut pred_edge: Vec<Option<EdgeIndex>> = vec![None; n];
        dist[source.index()] = 0.0;

        // |V|-1 relaxation rounds, with an early exit once a round makes
        // no progress (a fixpoint cannot contain a reachable negative
        // cycle).
        for _round in 1..n {
            let mut any_update = false;
            for edge in graph.edge_references() {
                let (u, v) = (edge.source(), edge.target());
                if dist[u.index()].is_infinite() {
                    continue;
                }
                let candidate = dist[u.index()] + edge.weight().weight;
                if candidate < dist[v.index()] {
                    dist[v.index()] = candidate;
                    pred[v.index()] = Some(u);
                    pred_edge[v.index()] = Some(edge.id());
                    any_update = true;
                }
            }
            if !any_update {
                return None;
            }
        }

        // Detection pass: the first edge that still relaxes witnesses a
        // negative cycle. Apply that relaxation so the predecessor walk
        // below passes through it.
        let mut witness = None;
        for edge in graph.edge_references() {
            let (u, v) = (edge.source(), edge.target());
            if dist[u.index()].is_infinite() {
                continue;
            }
            if dist[u.index()] + edge.weight().weight < dist[v.index()] {
                dist[v.index()] = dist[u.index()] + edge.weight().weight;
                pred[v.index()] = Some(u);
                pred_edge[v.index()] = Some(edge.id());
                witness = Some(v);
                break;
            }
        }
        let witness = witness?;

        // The witness may hang off the cycle rather than sit on it; |V|
        // predecessor steps are guaranteed to land inside.
        let mut on_cycle = witness;
        for _ in 0..n {
            on_cycle = pred[on_cycle.index()]?;
        }

        // Walk predecessors until the landing vertex repeats, collecting
        // the chosen edge into each vertex; the walk runs backwards, so
        // reverse at the end.
        let mut cycle_edges = Vec::new();
        let mut current = on_cycle;
        loop {
            let edge = pred_edge[current.index()]?;
            cycle_edges.push(edge);
            current = pred[current.index()]?;
            if current == on_cycle {
                break;
            }
        }
        cycle_edges.reverse();

        Some(
            cycle_edges
                .into_iter()
                .map(|e| graph[e].edge_id)
                .collect(),
        )
    }
}

/// Canonical form of a cycle for dedup: rotate so the smallest edge handle
/// comes first. Rotations of the same cycle share this form.
fn rotate_to_min(cycle: &[EdgeId]) -> Vec<EdgeId> {
    let Some(min_pos) = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, id)| *id)
        .map(|(i, _)| i)
    else {
        return Vec::new();
    };
    let mut rotated = Vec::with_capacity(cycle.len());
    rotated.extend_from_slice(&cycle[min_pos..]);
    rotated.extend_from_slice(&cycle[..min_pos]);
    rotated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ExchangeFunction, ExchangeGraph, Quote, SwapParams, VenueId};
    use crate::oracle::{DecodeKind, QuoteCall};
    use alloy_primitives::{Address, Bytes, U256};
    use std::collections::HashMap;
    use std::sync::Arc;

    struct StubVenue;

    impl ExchangeFunction for StubVenue {
        fn venue_label(&self) -> &str {
            "stub"
        }

        fn quote_call(
            &self,
            _token_in: Address,
            _token_out: Address,
            _amount_in: U256,
            _block_number: u64,
        ) -> QuoteCall {
            QuoteCall {
                target: Address::ZERO,
                calldata: Bytes::new(),
                decode: DecodeKind::AmountOut,
            }
        }

        fn swap_params(
            &self,
            _token_in: Address,
            _token_out: Address,
            _amount_in: U256,
            _amount_out_minimum: U256,
            _recipient: Address,
            _block_number: u64,
        ) -> SwapParams {
            SwapParams {
                to: Address::ZERO,
                calldata: Bytes::new(),
                value: U256::ZERO,
            }
        }
    }

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    /// Build a quoted snapshot from a rate table. Pairs absent from the
    /// table quote as failures (zero out, infinite weight).
    fn make_quote_graph(
        num_tokens: usize,
        num_venues: usize,
        rates: &HashMap<(u8, u8, u32), f64>,
    ) -> (ExchangeGraph, QuoteGraph) {
        let tokens: Vec<Address> = (1..=num_tokens).map(|i| addr(i as u8)).collect();
        let functions: Vec<Arc<dyn ExchangeFunction>> = (0..num_venues)
            .map(|_| Arc::new(StubVenue) as Arc<dyn ExchangeFunction>)
            .collect();
        let exchange = ExchangeGraph::new(tokens, functions);

        let amount_in = U256::from(1_000_000u64);
        let quotes: Vec<Quote> = exchange
            .edge_ids()
            .map(|id| {
                let edge = exchange.edge(id);
                let key = (edge.token_in[0], edge.token_out[0], edge.venue.0);
                let amount_out = rates
                    .get(&key)
                    .map(|rate| U256::from((1_000_000.0 * rate) as u64))
                    .unwrap_or(U256::ZERO);
                Quote::new(edge.token_in, edge.token_out, amount_in, amount_out)
            })
            .collect();

        let quote_graph = QuoteGraph::new(&exchange, quotes, 100);
        (exchange, quote_graph)
    }

    #[test]
    fn test_fair_market_has_no_cycle() {
        // Round trips multiply to <= 1 everywhere.
        let rates = HashMap::from([
            ((1, 2, 0), 2.0),
            ((2, 1, 0), 0.5),
            ((1, 3, 0), 3.0),
            ((3, 1, 0), 0.333),
            ((2, 3, 0), 1.5),
            ((3, 2, 0), 0.666),
        ]);
        let (_, quote_graph) = make_quote_graph(3, 1, &rates);

        let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
        assert!(candidates.is_empty(), "fair market must yield no cycles");
    }

    #[test]
    fn test_two_hop_cycle_found_once() {
        let rates = HashMap::from([((1, 2, 0), 2.0), ((2, 1, 0), 0.6)]);
        let (exchange, quote_graph) = make_quote_graph(2, 1, &rates);

        let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
        // Both sources see the same cycle; the rotation dedup keeps one.
        assert_eq!(candidates.len(), 1);
        let cycle = &candidates[0];
        assert_eq!(cycle.len(), 2);
        assert_eq!(
            exchange.edge(cycle[0]).token_in,
            exchange.edge(cycle[1]).token_out
        );
    }

    #[test]
    fn test_seeded_cycle_weight_is_recovered() {
        // A -> B -> C -> A with rate product 2 * 2 * 0.3 = 1.2.
        let rates = HashMap::from([((1, 2, 0), 2.0), ((2, 3, 0), 2.0), ((3, 1, 0), 0.3)]);
        let (_, quote_graph) = make_quote_graph(3, 1, &rates);

        let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].len(), 3);

        let expected = -(1.2f64).log2();
        let weight = quote_graph.cycle_weight(&candidates[0]);
        assert!(
            (weight - expected).abs() < 1e-6,
            "weight {weight} vs expected {expected}"
        );
    }

    #[test]
    fn test_parallel_edge_selection_prefers_better_rate() {
        // Two venues quote A -> B; only venue 1 makes the cycle negative.
        let rates = HashMap::from([
            ((1, 2, 0), 2.0),
            ((1, 2, 1), 2.1),
            ((2, 1, 0), 0.5),
            ((2, 1, 1), 0.5),
        ]);
        let (exchange, quote_graph) = make_quote_graph(2, 2, &rates);

        let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
        assert_eq!(candidates.len(), 1);

        let a_to_b = candidates[0]
            .iter()
            .find(|&&id| exchange.edge(id).token_in == addr(1))
            .copied()
            .expect("cycle must contain an A -> B hop");
        assert_eq!(exchange.edge(a_to_b).venue, VenueId(1));
    }

    #[test]
    fn test_failing_parallel_edge_is_skipped_for_sibling() {
        // Venue 0's A -> B quote fails; venue 1's works and arbitrages.
        let rates = HashMap::from([
            ((1, 2, 1), 2.5),
            ((2, 1, 0), 0.5),
            ((2, 1, 1), 0.5),
        ]);
        let (exchange, quote_graph) = make_quote_graph(2, 2, &rates);

        let candidates = CycleFinder::new(&quote_graph).find_candidate_cycles();
        assert_eq!(candidates.len(), 1);

        let a_to_b = candidates[0]
            .iter()
            .find(|&&id| exchange.edge(id).token_in == addr(1))
            .copied()
            .unwrap();
        assert_eq!(exchange.edge(a_to_b).venue, VenueId(1));
    }

    #[test]
    fn test_rotate_to_min_canonicalises_rotations() {
        let a = vec![EdgeId(5), EdgeId(1), EdgeId(3)];
        let b = vec![EdgeId(1), EdgeId(3), EdgeId(5)];
        let c = vec![EdgeId(3), EdgeId(5), EdgeId(1)];
        assert_eq!(rotate_to_min(&a), rotate_to_min(&b));
        assert_eq!(rotate_to_min(&b), rotate_to_min(&c));
    }
}

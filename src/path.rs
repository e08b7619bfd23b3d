//! Path data carriers: hops, partially-built paths, confirmed arbitrages.
//!
//! `Path` owns both the ordered hop sequence and a token multiset so that
//! "does this path already touch token X?" is O(1) during enumeration. The
//! chaining invariant (each hop starts where the previous one ended) is
//! enforced on append; violating it is a programming error surfaced as
//! [`Error::InvariantViolated`].

use crate::error::{Error, Result};
use crate::graph::{EdgeId, ExchangeEdge, VenueId};
use crate::num::u256_to_f64;
use alloy_primitives::{Address, I256, U256};
use serde::Serialize;
use std::collections::HashMap;

/// One executed (or re-quoted) swap along a path.
#[derive(Debug, Clone, Copy)]
pub struct Hop {
    /// Handle into the exchange graph that produced this hop.
    pub edge_id: EdgeId,
    /// The edge triple itself, copied so the hop can outlive the graph.
    pub edge: ExchangeEdge,
    pub amount_in: U256,
    pub amount_out: U256,
    pub block_number: u64,
}

impl Hop {
    pub fn token_in(&self) -> Address {
        self.edge.token_in
    }

    pub fn token_out(&self) -> Address {
        self.edge.token_out
    }
}

/// An ordered hop sequence plus the multiset of tokens it touches.
///
/// Grows from the tail via [`Path::append`], shrinks from the tail via
/// [`Path::pop`]; the token multiset stays in sync with both.
#[derive(Debug, Clone, Default)]
pub struct Path {
    hops: Vec<Hop>,
    tokens_involved: HashMap<Address, u32>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    pub fn first(&self) -> Option<&Hop> {
        self.hops.first()
    }

    pub fn last(&self) -> Option<&Hop> {
        self.hops.last()
    }

    /// Output token of the last hop, if any.
    pub fn last_token_out(&self) -> Option<Address> {
        self.hops.last().map(Hop::token_out)
    }

    /// O(1) membership against the token multiset.
    pub fn contains_token(&self, token: Address) -> bool {
        self.tokens_involved.contains_key(&token)
    }

    /// True when the last hop's output returns to the first hop's input.
    pub fn is_closed(&self) -> bool {
        match (self.hops.first(), self.hops.last()) {
            (Some(first), Some(last)) => first.token_in() == last.token_out(),
            _ => false,
        }
    }

    /// Append a hop to the tail. The hop's input token must equal the
    /// current tail's output token (any hop is accepted onto an empty
    /// path).
    pub fn append(&mut self, hop: Hop) -> Result<()> {
        if let Some(last) = self.hops.last() {
            if last.token_out() != hop.token_in() {
                return Err(Error::InvariantViolated(format!(
                    "hop input token {} does not chain from previous output token {}",
                    hop.token_in(),
                    last.token_out()
                )));
            }
        }
        *self.tokens_involved.entry(hop.token_in()).or_insert(0) += 1;
        *self.tokens_involved.entry(hop.token_out()).or_insert(0) += 1;
        self.hops.push(hop);
        Ok(())
    }

    /// Remove and return the tail hop, keeping the multiset in sync.
    pub fn pop(&mut self) -> Option<Hop> {
        let hop = self.hops.pop()?;
        for token in [hop.token_in(), hop.token_out()] {
            if let Some(count) = self.tokens_involved.get_mut(&token) {
                *count -= 1;
                if *count == 0 {
                    self.tokens_involved.remove(&token);
                }
            }
        }
        Some(hop)
    }
}

/// A confirmed cyclic path at a block height, with derived economics.
///
/// Owns its path; may outlive the quote graph snapshot that produced it.
#[derive(Debug, Clone)]
pub struct Arbitrage {
    path: Path,
    block_number: u64,
    expected_gas: u64,
}

impl Arbitrage {
    /// Freeze a closed, non-empty path into an arbitrage.
    pub fn new(path: Path, block_number: u64, expected_gas: u64) -> Result<Self> {
        if path.is_empty() {
            return Err(Error::InvariantViolated(
                "arbitrage path must be non-empty".to_string(),
            ));
        }
        if !path.is_closed() {
            return Err(Error::InvariantViolated(format!(
                "arbitrage path must be cyclic: starts at {}, ends at {}",
                path.first().map(Hop::token_in).unwrap_or_default(),
                path.last_token_out().unwrap_or_default()
            )));
        }
        Ok(Self {
            path,
            block_number,
            expected_gas,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Gas expectation supplied by the caller; this crate never estimates.
    pub fn expected_gas(&self) -> u64 {
        self.expected_gas
    }

    /// Entry token of the cycle.
    pub fn token_in(&self) -> Address {
        self.path.hops()[0].token_in()
    }

    pub fn amount_in(&self) -> U256 {
        self.path.hops()[0].amount_in
    }

    pub fn amount_out(&self) -> U256 {
        self.path.hops()[self.path.len() - 1].amount_out
    }

    /// Fractional return before costs: `amount_out / amount_in - 1`.
    pub fn return_precost(&self) -> f64 {
        let amount_in = u256_to_f64(self.amount_in());
        if amount_in == 0.0 {
            return 0.0;
        }
        u256_to_f64(self.amount_out()) / amount_in - 1.0
    }

    /// Signed profit in units of the entry token.
    pub fn profit(&self) -> I256 {
        let (amount_out, amount_in) = (self.amount_out(), self.amount_in());
        if amount_out >= amount_in {
            I256::from_raw(amount_out - amount_in)
        } else {
            -I256::from_raw(amount_in - amount_out)
        }
    }

    pub fn is_profitable(&self) -> bool {
        self.amount_out() > self.amount_in()
    }

    /// Serialisable record form with the derived fields materialised.
    pub fn to_record(&self) -> ArbitrageRecord {
        ArbitrageRecord {
            token_in: self.token_in(),
            amount_in: self.amount_in(),
            amount_out: self.amount_out(),
            profit: self.profit(),
            return_precost: self.return_precost(),
            block_number: self.block_number,
            expected_gas: self.expected_gas,
            hops: self
                .path
                .hops()
                .iter()
                .map(|hop| HopRecord {
                    token_in: hop.token_in(),
                    token_out: hop.token_out(),
                    venue: hop.edge.venue,
                    amount_in: hop.amount_in,
                    amount_out: hop.amount_out,
                })
                .collect(),
        }
    }
}

/// Flat record form of an [`Arbitrage`] for external consumption.
#[derive(Debug, Clone, Serialize)]
pub struct ArbitrageRecord {
    pub token_in: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub profit: I256,
    pub return_precost: f64,
    pub block_number: u64,
    pub expected_gas: u64,
    pub hops: Vec<HopRecord>,
}

/// One hop of an [`ArbitrageRecord`].
#[derive(Debug, Clone, Serialize)]
pub struct HopRecord {
    pub token_in: Address,
    pub token_out: Address,
    pub venue: VenueId,
    pub amount_in: U256,
    pub amount_out: U256,
}

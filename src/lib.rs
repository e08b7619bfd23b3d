//! Cyclic arbitrage detection across on-chain exchange venues.
//!
//! Given a token set and a list of exchange functions (one per venue and
//! fee tier), this crate builds a directed multigraph of instantaneous
//! exchange rates at a single block height, searches it for negative-weight
//! cycles, and confirms each candidate by re-quoting its hops against the
//! chain.
//!
//! The transform that makes this work: arbitrage exists when the rate
//! product around a cycle exceeds 1, and with edge weight
//! `-log2(amount_out / amount_in)` that is exactly a negative-weight cycle,
//! so Bellman-Ford finds it.
//!
//! Pipeline for one [`service::ArbitrageService::find_arbitrages`] call:
//!
//! 1. Resolve the block and fetch per-token prices; size one equal-value
//!    probe per token.
//! 2. Materialise the [`graph::ExchangeGraph`] and quote every edge in one
//!    chunked oracle batch, producing a [`graph::QuoteGraph`] snapshot.
//! 3. Run [`search::CycleFinder`] (or the [`search::NaiveEnumerator`]
//!    alternative) for candidate cycles.
//! 4. Re-quote each candidate hop-by-hop with
//!    [`search::ArbitrageEvaluator`] and keep the profitable ones.
//!
//! The chain itself sits behind two collaborator traits,
//! [`oracle::QuoteOracle`] and [`price::PriceFeed`]; batteries-included
//! implementations backed by Multicall3 and a spot price aggregator live
//! in the same modules. Nothing in this crate signs, sends, or persists
//! anything.

pub mod config;
pub mod error;
pub mod graph;
mod num;
pub mod oracle;
pub mod path;
pub mod price;
pub mod search;
pub mod service;
pub mod venues;

pub use config::SearchConfig;
pub use error::{Error, Result};
pub use graph::{
    EdgeId, ExchangeEdge, ExchangeFunction, ExchangeGraph, Quote, QuoteGraph, SwapParams,
    VenueId,
};
pub use oracle::{
    batch_chunked, decode_amount_out, CallReturn, DecodeKind, MulticallOracle, QuoteCall,
    QuoteOracle,
};
pub use path::{Arbitrage, ArbitrageRecord, Hop, HopRecord, Path};
pub use price::{probe_amounts, FeedCache, PriceFeed, SpotPriceFeed};
pub use search::{ArbitrageEvaluator, CycleFinder, NaiveEnumerator};
pub use service::{Algorithm, ArbitrageService};
pub use venues::{
    collect_exchange_functions, ConcentratedVenue, ConcentratedVenuePlugin,
    ConstantProductVenue, VenuePlugin,
};

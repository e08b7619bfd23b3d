//! Graph layer.
//!
//! - `exchange`: the static token/venue multigraph built once per
//!   invocation.
//! - `quote`: the per-block snapshot of that graph decorated with measured
//!   quotes, which the cycle search runs over.

mod exchange;
mod quote;

pub use exchange::{
    EdgeId, ExchangeEdge, ExchangeFunction, ExchangeGraph, SwapParams, VenueId,
};
pub use quote::{Quote, QuoteEdge, QuoteGraph};

//! Venue plug-ins.
//!
//! A venue exposes quote and swap factories behind the uniform
//! [`ExchangeFunction`] interface; a plug-in enumerates the functions it
//! offers (one per fee tier for concentrated liquidity). The core never
//! sees venue specifics beyond the descriptor/decoder pair.

use crate::graph::ExchangeFunction;
use std::sync::Arc;

mod concentrated;
mod constant_product;

pub use concentrated::{
    ConcentratedVenue, ConcentratedVenuePlugin, FEE_TIERS, UNISWAP_V3_QUOTER,
    UNISWAP_V3_ROUTER,
};
pub use constant_product::{ConstantProductVenue, UNISWAP_V2_ROUTER};

/// A source of exchange functions.
pub trait VenuePlugin: Send + Sync {
    /// Enumerate the exchange functions this venue exposes at the block.
    fn exchange_functions(&self, block_number: u64) -> Vec<Arc<dyn ExchangeFunction>>;
}

/// Concatenate exchange functions across plug-ins, preserving plug-in
/// order; edge lists and venue handles inherit this ordering.
pub fn collect_exchange_functions(
    plugins: &[Arc<dyn VenuePlugin>],
    block_number: u64,
) -> Vec<Arc<dyn ExchangeFunction>> {
    plugins
        .iter()
        .flat_map(|plugin| plugin.exchange_functions(block_number))
        .collect()
}

//! Search configuration.
//!
//! Ambient tunables for an [`crate::service::ArbitrageService`]. Every
//! field has a sensible default and an environment override, so embedding
//! applications can ship without a config file.

use std::env;

/// Tunables for a search service instance.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Multiplier applied to the block base fee to derive the default
    /// probe exposure `u_eth` when the caller does not supply one.
    pub u_eth_scale: f64,

    /// Default hop bound for the naive enumerator.
    pub max_hops: usize,

    /// Quote batches are split into chunks of `max(1, n / chunk_divisor)`.
    pub chunk_divisor: usize,

    /// Bound on concurrently in-flight oracle requests (chunk dispatch and
    /// candidate evaluation share this).
    pub concurrency: usize,

    /// Drop cycles whose re-quoted output does not exceed their input.
    /// Disable to observe near-misses.
    pub only_profitable: bool,
}

impl SearchConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Self {
            u_eth_scale: env::var("PROSPECTOR_U_ETH_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.u_eth_scale),

            max_hops: env::var("PROSPECTOR_MAX_HOPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_hops),

            chunk_divisor: env::var("PROSPECTOR_CHUNK_DIVISOR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.chunk_divisor),

            concurrency: env::var("PROSPECTOR_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),

            only_profitable: env::var("PROSPECTOR_ONLY_PROFITABLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.only_profitable),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            u_eth_scale: 1e7,
            max_hops: 3,
            chunk_divisor: crate::oracle::DEFAULT_CHUNK_DIVISOR,
            concurrency: 4,
            only_profitable: true,
        }
    }
}

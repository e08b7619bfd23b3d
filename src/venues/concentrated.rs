//! Concentrated-liquidity venue (UniswapV3-compatible quoter + router).
//!
//! The quoter's `quoteExactInputSingle` returns `uint256 amountOut` as its
//! first word, so the `AmountOut` decoder covers both the single-return V1
//! quoter and the multi-return V2 variant. One exchange function exists
//! per fee tier; the tier set belongs to this plug-in, not to the core.

use crate::graph::{ExchangeFunction, SwapParams};
use crate::oracle::{DecodeKind, QuoteCall};
use crate::venues::VenuePlugin;
use alloy_primitives::{
    address,
    aliases::{U160, U24},
    Address, U256,
};
use alloy_sol_types::{sol, SolCall};
use std::sync::Arc;

sol! {
    /// Concentrated-liquidity quoter (QuoterV1-compatible).
    #[derive(Debug)]
    interface IQuoter {
        function quoteExactInputSingle(
            address tokenIn,
            address tokenOut,
            uint24 fee,
            uint256 amountIn,
            uint160 sqrtPriceLimitX96
        ) external returns (uint256 amountOut);
    }

    /// Concentrated-liquidity swap router.
    #[derive(Debug)]
    interface ISwapRouter {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 deadline;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params)
            external
            payable
            returns (uint256 amountOut);
    }
}

/// Fee tiers enumerated by the plug-in, in hundredths of a basis point.
pub const FEE_TIERS: [u32; 4] = [100, 500, 3000, 10000];

/// UniswapV3 QuoterV1 on mainnet.
pub const UNISWAP_V3_QUOTER: Address = address!("b27308f9F90D607463bb33eA1BeBb41C27CE5AB6");

/// UniswapV3 SwapRouter on mainnet.
pub const UNISWAP_V3_ROUTER: Address = address!("E592427A0AEce92De3Edee1F18E0157C05861564");

/// One fee tier of a concentrated-liquidity venue.
#[derive(Debug, Clone)]
pub struct ConcentratedVenue {
    label: String,
    quoter: Address,
    router: Address,
    fee: u32,
    swap_deadline: u64,
}

impl ConcentratedVenue {
    pub fn new(
        label: impl Into<String>,
        quoter: Address,
        router: Address,
        fee: u32,
        swap_deadline: u64,
    ) -> Self {
        Self {
            label: label.into(),
            quoter,
            router,
            fee,
            swap_deadline,
        }
    }

    pub fn fee(&self) -> u32 {
        self.fee
    }
}

impl ExchangeFunction for ConcentratedVenue {
    fn venue_label(&self) -> &str {
        &self.label
    }

    fn quote_call(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        _block_number: u64,
    ) -> QuoteCall {
        let calldata = IQuoter::quoteExactInputSingleCall {
            tokenIn: token_in,
            tokenOut: token_out,
            fee: U24::from(self.fee),
            amountIn: amount_in,
            sqrtPriceLimitX96: U160::ZERO,
        }
        .abi_encode();

        QuoteCall {
            target: self.quoter,
            calldata: calldata.into(),
            decode: DecodeKind::AmountOut,
        }
    }

    fn swap_params(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        amount_out_minimum: U256,
        recipient: Address,
        _block_number: u64,
    ) -> SwapParams {
        let calldata = ISwapRouter::exactInputSingleCall {
            params: ISwapRouter::ExactInputSingleParams {
                tokenIn: token_in,
                tokenOut: token_out,
                fee: U24::from(self.fee),
                recipient,
                deadline: U256::from(self.swap_deadline),
                amountIn: amount_in,
                amountOutMinimum: amount_out_minimum,
                sqrtPriceLimitX96: U160::ZERO,
            },
        }
        .abi_encode();

        SwapParams {
            to: self.router,
            calldata: calldata.into(),
            value: U256::ZERO,
        }
    }
}

/// Plug-in that exposes one [`ConcentratedVenue`] per fee tier.
pub struct ConcentratedVenuePlugin {
    label: String,
    quoter: Address,
    router: Address,
    fee_tiers: Vec<u32>,
    swap_deadline: u64,
}

impl ConcentratedVenuePlugin {
    pub fn new(
        label: impl Into<String>,
        quoter: Address,
        router: Address,
        fee_tiers: Vec<u32>,
        swap_deadline: u64,
    ) -> Self {
        Self {
            label: label.into(),
            quoter,
            router,
            fee_tiers,
            swap_deadline,
        }
    }

    /// The mainnet UniswapV3 deployment across all standard fee tiers.
    pub fn uniswap_v3(swap_deadline: u64) -> Self {
        Self::new(
            "uniswap_v3",
            UNISWAP_V3_QUOTER,
            UNISWAP_V3_ROUTER,
            FEE_TIERS.to_vec(),
            swap_deadline,
        )
    }
}

impl VenuePlugin for ConcentratedVenuePlugin {
    fn exchange_functions(&self, _block_number: u64) -> Vec<Arc<dyn ExchangeFunction>> {
        self.fee_tiers
            .iter()
            .map(|&fee| {
                Arc::new(ConcentratedVenue::new(
                    format!("{}/{}", self.label, fee),
                    self.quoter,
                    self.router,
                    fee,
                    self.swap_deadline,
                )) as Arc<dyn ExchangeFunction>
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_one_function_per_fee_tier() {
        let plugin = ConcentratedVenuePlugin::uniswap_v3(1_700_000_000);
        let functions = plugin.exchange_functions(100);

        assert_eq!(functions.len(), FEE_TIERS.len());
        assert_eq!(functions[0].venue_label(), "uniswap_v3/100");
        assert_eq!(functions[3].venue_label(), "uniswap_v3/10000");
    }

    #[test]
    fn test_quote_call_encodes_fee_tier() {
        let venue = ConcentratedVenue::new(
            "uniswap_v3/500",
            UNISWAP_V3_QUOTER,
            UNISWAP_V3_ROUTER,
            500,
            0,
        );
        let call = venue.quote_call(addr(1), addr(2), U256::from(1000u64), 100);

        assert_eq!(call.target, UNISWAP_V3_QUOTER);
        assert_eq!(call.decode, DecodeKind::AmountOut);

        let decoded = IQuoter::quoteExactInputSingleCall::abi_decode(&call.calldata).unwrap();
        assert_eq!(decoded.fee, U24::from(500u32));
        assert_eq!(decoded.amountIn, U256::from(1000u64));
        assert_eq!(decoded.sqrtPriceLimitX96, U160::ZERO);
    }

    #[test]
    fn test_swap_params_encode_explicit_minimum() {
        let venue = ConcentratedVenue::new(
            "uniswap_v3/3000",
            UNISWAP_V3_QUOTER,
            UNISWAP_V3_ROUTER,
            3000,
            1_700_000_000,
        );
        let params = venue.swap_params(
            addr(1),
            addr(2),
            U256::from(1000u64),
            U256::from(950u64),
            addr(9),
            100,
        );

        assert_eq!(params.to, UNISWAP_V3_ROUTER);
        let decoded = ISwapRouter::exactInputSingleCall::abi_decode(&params.calldata).unwrap();
        assert_eq!(decoded.params.amountOutMinimum, U256::from(950u64));
        assert_eq!(decoded.params.recipient, addr(9));
        assert_eq!(decoded.params.fee, U24::from(3000u32));
    }
}

//! Constant-product venue (UniswapV2-compatible router).
//!
//! Quotes go through the router's `getAmountsOut`, which returns the
//! amounts along the path; the last element is the output. Swaps build
//! `swapExactTokensForTokens` calldata.

use crate::graph::{ExchangeFunction, SwapParams};
use crate::oracle::{DecodeKind, QuoteCall};
use crate::venues::VenuePlugin;
use alloy_primitives::{address, Address, U256};
use alloy_sol_types::{sol, SolCall};
use std::sync::Arc;

sol! {
    /// UniswapV2-style router, quote and swap subset.
    #[derive(Debug)]
    interface IRouter02 {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external
            view
            returns (uint256[] memory amounts);

        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }
}

/// UniswapV2 router02 on mainnet.
pub const UNISWAP_V2_ROUTER: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// One constant-product venue. Also its own plug-in, since a router
/// exposes exactly one exchange function.
#[derive(Debug, Clone)]
pub struct ConstantProductVenue {
    label: String,
    router: Address,
    /// Unix timestamp applied as the swap deadline. Supplied by the
    /// caller; this crate does not read clocks.
    swap_deadline: u64,
}

impl ConstantProductVenue {
    pub fn new(label: impl Into<String>, router: Address, swap_deadline: u64) -> Self {
        Self {
            label: label.into(),
            router,
            swap_deadline,
        }
    }

    /// The mainnet UniswapV2 deployment.
    pub fn uniswap_v2(swap_deadline: u64) -> Self {
        Self::new("uniswap_v2", UNISWAP_V2_ROUTER, swap_deadline)
    }
}

impl ExchangeFunction for ConstantProductVenue {
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
        let calldata = IRouter02::getAmountsOutCall {
            amountIn: amount_in,
            path: vec![token_in, token_out],
        }
        .abi_encode();

        QuoteCall {
            target: self.router,
            calldata: calldata.into(),
            decode: DecodeKind::AmountsOut,
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
        let calldata = IRouter02::swapExactTokensForTokensCall {
            amountIn: amount_in,
            amountOutMin: amount_out_minimum,
            path: vec![token_in, token_out],
            to: recipient,
            deadline: U256::from(self.swap_deadline),
        }
        .abi_encode();

        SwapParams {
            to: self.router,
            calldata: calldata.into(),
            value: U256::ZERO,
        }
    }
}

impl VenuePlugin for ConstantProductVenue {
    fn exchange_functions(&self, _block_number: u64) -> Vec<Arc<dyn ExchangeFunction>> {
        vec![Arc::new(self.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_quote_call_shape() {
        let venue = ConstantProductVenue::uniswap_v2(1_700_000_000);
        let call = venue.quote_call(addr(1), addr(2), U256::from(1000u64), 100);

        assert_eq!(call.target, UNISWAP_V2_ROUTER);
        assert_eq!(call.decode, DecodeKind::AmountsOut);
        assert_eq!(
            &call.calldata[..4],
            IRouter02::getAmountsOutCall::SELECTOR.as_slice()
        );

        let decoded = IRouter02::getAmountsOutCall::abi_decode(&call.calldata).unwrap();
        assert_eq!(decoded.amountIn, U256::from(1000u64));
        assert_eq!(decoded.path, vec![addr(1), addr(2)]);
    }

    #[test]
    fn test_swap_params_carry_explicit_minimum() {
        let venue = ConstantProductVenue::uniswap_v2(1_700_000_000);
        let params = venue.swap_params(
            addr(1),
            addr(2),
            U256::from(1000u64),
            U256::from(990u64),
            addr(9),
            100,
        );

        assert_eq!(params.to, UNISWAP_V2_ROUTER);
        assert_eq!(params.value, U256::ZERO);

        let decoded =
            IRouter02::swapExactTokensForTokensCall::abi_decode(&params.calldata).unwrap();
        assert_eq!(decoded.amountOutMin, U256::from(990u64));
        assert_eq!(decoded.to, addr(9));
        assert_eq!(decoded.deadline, U256::from(1_700_000_000u64));
    }
}

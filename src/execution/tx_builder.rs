use std::fmt;

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, Bytes, TxKind, U160, U256};
use alloy::sol_types::SolCall;
use alloy_primitives::aliases::U24;

use super::gas::scale_fee;
use crate::chain::GasData;
use crate::{IERC20, ISwapRouter, IWETH};

const SQRT_PRICE_LIMIT_X96: U160 = U160::ZERO;
pub const WETH_TX_GAS_LIMIT: u64 = 100_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxBuildError {
    FeeTierOutOfRange { fee: u32 },
}

impl fmt::Display for TxBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeeTierOutOfRange { fee } => write!(f, "fee tier {fee} does not fit in uint24"),
        }
    }
}

impl std::error::Error for TxBuildError {}

/// Chain id, nonce and EIP-1559 fee caps shared by every tx in a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxEnvelopeParams {
    pub chain_id: u64,
    pub nonce: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

impl TxEnvelopeParams {
    /// Fee caps from `gas` scaled by `aggressiveness_pct / 100`.
    pub fn from_gas_data(gas: &GasData, nonce: u64, aggressiveness_pct: u64) -> Self {
        Self {
            chain_id: gas.chain_id,
            nonce,
            max_fee_per_gas: scale_fee(gas.max_fee_per_gas, aggressiveness_pct),
            max_priority_fee_per_gas: scale_fee(gas.max_priority_fee_per_gas, aggressiveness_pct),
        }
    }
}

fn build_call_tx(
    params: TxEnvelopeParams,
    to: Address,
    input: Vec<u8>,
    value: U256,
    gas_limit: u64,
) -> TxEip1559 {
    TxEip1559 {
        chain_id: params.chain_id,
        nonce: params.nonce,
        gas_limit,
        max_fee_per_gas: params.max_fee_per_gas,
        max_priority_fee_per_gas: params.max_priority_fee_per_gas,
        to: TxKind::Call(to),
        value,
        input: Bytes::from(input),
        ..Default::default()
    }
}

pub fn build_approve_tx(
    params: TxEnvelopeParams,
    token: Address,
    spender: Address,
    amount: U256,
    gas_limit: u64,
) -> TxEip1559 {
    let input = IERC20::approveCall { spender, amount }.abi_encode();
    build_call_tx(params, token, input, U256::ZERO, gas_limit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapLeg {
    pub token_in: Address,
    pub token_out: Address,
    pub fee: u32,
    pub recipient: Address,
    pub deadline: u64,
    pub amount_in: U256,
    pub amount_out_minimum: U256,
}

pub fn exact_input_single_params(
    leg: SwapLeg,
) -> Result<ISwapRouter::ExactInputSingleParams, TxBuildError> {
    let fee = U24::try_from(leg.fee).map_err(|_| TxBuildError::FeeTierOutOfRange { fee: leg.fee })?;
    Ok(ISwapRouter::ExactInputSingleParams {
        tokenIn: leg.token_in,
        tokenOut: leg.token_out,
        fee,
        recipient: leg.recipient,
        deadline: U256::from(leg.deadline),
        amountIn: leg.amount_in,
        amountOutMinimum: leg.amount_out_minimum,
        sqrtPriceLimitX96: SQRT_PRICE_LIMIT_X96,
    })
}

pub fn build_swap_tx(
    params: TxEnvelopeParams,
    router: Address,
    leg: SwapLeg,
    gas_limit: u64,
) -> Result<TxEip1559, TxBuildError> {
    let input = ISwapRouter::exactInputSingleCall {
        params: exact_input_single_params(leg)?,
    }
    .abi_encode();
    Ok(build_call_tx(params, router, input, U256::ZERO, gas_limit))
}

pub fn build_wrap_tx(params: TxEnvelopeParams, weth: Address, amount: U256) -> TxEip1559 {
    let input = IWETH::depositCall {}.abi_encode();
    build_call_tx(params, weth, input, amount, WETH_TX_GAS_LIMIT)
}

pub fn build_unwrap_tx(params: TxEnvelopeParams, weth: Address, amount: U256) -> TxEip1559 {
    let input = IWETH::withdrawCall { amount }.abi_encode();
    build_call_tx(params, weth, input, U256::ZERO, WETH_TX_GAS_LIMIT)
}

#[cfg(test)]
mod tests {
    use alloy::primitives::address;

    use super::*;

    const TOKEN: Address = address!("4200000000000000000000000000000000000042");
    const ROUTER: Address = address!("e592427a0aece92de3edee1f18e0157c05861564");

    fn params() -> TxEnvelopeParams {
        TxEnvelopeParams {
            chain_id: 10,
            nonce: 3,
            max_fee_per_gas: 20,
            max_priority_fee_per_gas: 2,
        }
    }

    #[test]
    fn envelope_scales_gas_data_fees() {
        let gas = GasData {
            chain_id: 42161,
            gas_price: 9,
            max_fee_per_gas: 2_000,
            max_priority_fee_per_gas: 250,
            nonce: 11,
            errors: Vec::new(),
        };
        let envelope = TxEnvelopeParams::from_gas_data(&gas, 12, 1_000);
        assert_eq!(envelope.chain_id, 42161);
        assert_eq!(envelope.nonce, 12);
        assert_eq!(envelope.max_fee_per_gas, 20_000);
        assert_eq!(envelope.max_priority_fee_per_gas, 2_500);
    }

    #[test]
    fn approve_targets_token_with_encoded_spender() {
        let tx = build_approve_tx(params(), TOKEN, ROUTER, U256::from(110u64), 300_000);
        assert_eq!(tx.to, TxKind::Call(TOKEN));
        assert_eq!(tx.gas_limit, 300_000);
        assert_eq!(tx.value, U256::ZERO);
        let decoded =
            IERC20::approveCall::abi_decode(&tx.input).expect("approve calldata should decode");
        assert_eq!(decoded.spender, ROUTER);
        assert_eq!(decoded.amount, U256::from(110u64));
    }

    #[test]
    fn swap_encodes_exact_input_single() {
        let leg = SwapLeg {
            token_in: TOKEN,
            token_out: Address::repeat_byte(0x11),
            fee: 3_000,
            recipient: Address::repeat_byte(0x22),
            deadline: 1_700_000_300,
            amount_in: U256::from(1_000u64),
            amount_out_minimum: U256::from(950u64),
        };
        let tx = build_swap_tx(params(), ROUTER, leg, 600_000).expect("swap should build");
        assert_eq!(tx.to, TxKind::Call(ROUTER));
        assert_eq!(tx.nonce, 3);
        let decoded = ISwapRouter::exactInputSingleCall::abi_decode(&tx.input)
            .expect("swap calldata should decode");
        assert_eq!(decoded.params.amountIn, U256::from(1_000u64));
        assert_eq!(decoded.params.amountOutMinimum, U256::from(950u64));
        assert_eq!(decoded.params.deadline, U256::from(1_700_000_300u64));
        assert_eq!(decoded.params.sqrtPriceLimitX96, U160::ZERO);
    }

    #[test]
    fn oversized_fee_tier_is_rejected() {
        let leg = SwapLeg {
            token_in: TOKEN,
            token_out: TOKEN,
            fee: 1 << 24,
            recipient: Address::ZERO,
            deadline: 0,
            amount_in: U256::from(1u64),
            amount_out_minimum: U256::ZERO,
        };
        assert_eq!(
            build_swap_tx(params(), ROUTER, leg, 1).err(),
            Some(TxBuildError::FeeTierOutOfRange { fee: 1 << 24 })
        );
    }

    #[test]
    fn weth_txs_use_fixed_gas_limit() {
        let wrap = build_wrap_tx(params(), TOKEN, U256::from(5u64));
        assert_eq!(wrap.value, U256::from(5u64));
        assert_eq!(wrap.gas_limit, WETH_TX_GAS_LIMIT);
        assert!(IWETH::depositCall::abi_decode(&wrap.input).is_ok());

        let unwrap = build_unwrap_tx(params(), TOKEN, U256::from(5u64));
        assert_eq!(unwrap.value, U256::ZERO);
        let decoded = IWETH::withdrawCall::abi_decode(&unwrap.input).expect("withdraw decodes");
        assert_eq!(decoded.amount, U256::from(5u64));
    }
}

use alloy::primitives::U256;

use super::TxOutcome;
use super::executor::{ExecutionError, NonceTracker, resolve_token, sign_and_broadcast};
use super::tx_builder::{TxEnvelopeParams, WETH_TX_GAS_LIMIT, build_unwrap_tx, build_wrap_tx};
use crate::chain::{ChainReader, ChainWriter, RemoteSigner};
use crate::portfolio::scale_pct;
use crate::tokens::{Chain, NATIVE_SYMBOL, TokenConfig, WRAPPED_NATIVE_SYMBOL};

/// `balance * pct / 100` minus the worst-case fee for the deposit itself.
pub fn wrap_amount(balance: U256, pct: u64, gas_limit: u64, max_fee_per_gas: u128) -> Option<U256> {
    let gas_cost = U256::from(gas_limit).saturating_mul(U256::from(max_fee_per_gas));
    let amount = scale_pct(balance, pct).checked_sub(gas_cost)?;
    (!amount.is_zero()).then_some(amount)
}

pub fn unwrap_amount(weth_balance: U256, pct: u64) -> Option<U256> {
    let amount = scale_pct(weth_balance, pct);
    (!amount.is_zero()).then_some(amount)
}

fn weth_tokens(
    chain: Chain,
) -> Result<(&'static TokenConfig, &'static TokenConfig), ExecutionError> {
    Ok((
        resolve_token(chain, NATIVE_SYMBOL)?,
        resolve_token(chain, WRAPPED_NATIVE_SYMBOL)?,
    ))
}

/// Deposits `pct`% of the native balance into WETH. `Ok(None)` when nothing
/// is left after reserving gas.
pub async fn wrap_native<R, W, S>(
    reader: &R,
    writer: &W,
    signer: &S,
    chain: Chain,
    pct: u64,
    gas_aggressiveness_pct: u64,
) -> Result<Option<TxOutcome>, ExecutionError>
where
    R: ChainReader,
    W: ChainWriter,
    S: RemoteSigner,
{
    let (native, weth) = weth_tokens(chain)?;
    let owner = signer.address();
    let balance = reader.get_balance(chain, owner, native).await?;
    let gas = reader.gas_data(chain, owner).await?;
    let params = TxEnvelopeParams::from_gas_data(&gas, gas.nonce, gas_aggressiveness_pct);

    let Some(amount) = wrap_amount(balance, pct, WETH_TX_GAS_LIMIT, params.max_fee_per_gas) else {
        tracing::info!(chain = %chain, %balance, pct, "native balance too small to wrap");
        return Ok(None);
    };
    tracing::info!(chain = %chain, %amount, "wrapping native balance");
    let tx = build_wrap_tx(params, weth.address, amount);
    sign_and_broadcast(writer, signer, chain, tx, "wrapSig", &mut NonceTracker::default())
        .await
        .map(Some)
}

/// Withdraws `pct`% of the WETH balance. `Ok(None)` when there is nothing to
/// unwrap.
pub async fn unwrap_native<R, W, S>(
    reader: &R,
    writer: &W,
    signer: &S,
    chain: Chain,
    pct: u64,
    gas_aggressiveness_pct: u64,
) -> Result<Option<TxOutcome>, ExecutionError>
where
    R: ChainReader,
    W: ChainWriter,
    S: RemoteSigner,
{
    let (_, weth) = weth_tokens(chain)?;
    let owner = signer.address();
    let balance = reader.get_balance(chain, owner, weth).await?;
    let Some(amount) = unwrap_amount(balance, pct) else {
        tracing::info!(chain = %chain, "no WETH to unwrap");
        return Ok(None);
    };
    let gas = reader.gas_data(chain, owner).await?;
    let params = TxEnvelopeParams::from_gas_data(&gas, gas.nonce, gas_aggressiveness_pct);
    tracing::info!(chain = %chain, %amount, "unwrapping WETH");
    let tx = build_unwrap_tx(params, weth.address, amount);
    sign_and_broadcast(writer, signer, chain, tx, "unwrapSig", &mut NonceTracker::default())
        .await
        .map(Some)
}

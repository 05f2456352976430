use std::collections::HashMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, U256};

use super::tx_builder::{
    SwapLeg, TxBuildError, TxEnvelopeParams, build_approve_tx, build_swap_tx,
};
use super::{TradeExecutionResult, TxOutcome};
use crate::chain::{ChainError, ChainReader, ChainWriter, GasData, RemoteSigner, SignerError};
use crate::config::TradeConfig;
use crate::portfolio::{
    TradeInstruction, UnitsError, min_amount_out, parse_units, scale_pct,
};
use crate::tokens::{Chain, TokenConfig, token_config};

#[derive(Debug)]
pub enum ExecutionError {
    UnknownToken { chain: Chain, token: String },
    InvalidAmount { amount: String, source: UnitsError },
    Chain(ChainError),
    Signer(SignerError),
    TxBuild(TxBuildError),
    ZeroSpotPrice { from_token: String, to_token: String },
    PriceImpactTooHigh { impact_pct: f64, maximum_pct: f64 },
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownToken { chain, token } => write!(f, "unknown token {token} on {chain}"),
            Self::InvalidAmount { amount, source } => {
                write!(f, "invalid trade amount {amount}: {source}")
            }
            Self::Chain(err) => write!(f, "{err}"),
            Self::Signer(err) => write!(f, "{err}"),
            Self::TxBuild(err) => write!(f, "tx build error: {err}"),
            Self::ZeroSpotPrice {
                from_token,
                to_token,
            } => write!(f, "spot quote for {from_token} -> {to_token} is zero"),
            Self::PriceImpactTooHigh {
                impact_pct,
                maximum_pct,
            } => write!(f, "Price impact too high: {impact_pct}% (maximum {maximum_pct}%)"),
        }
    }
}

impl std::error::Error for ExecutionError {}

impl From<ChainError> for ExecutionError {
    fn from(value: ChainError) -> Self {
        Self::Chain(value)
    }
}

impl From<SignerError> for ExecutionError {
    fn from(value: SignerError) -> Self {
        Self::Signer(value)
    }
}

impl From<TxBuildError> for ExecutionError {
    fn from(value: TxBuildError) -> Self {
        Self::TxBuild(value)
    }
}

/// A batch that stopped early. `completed` holds every instruction that ran to
/// the end; transactions already broadcast are not reverted.
#[derive(Debug)]
pub struct BatchAborted {
    pub completed: Vec<TradeExecutionResult>,
    pub failed_index: usize,
    pub error: ExecutionError,
}

impl fmt::Display for BatchAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trade batch aborted at instruction {} after {} completed: {}",
            self.failed_index,
            self.completed.len(),
            self.error
        )
    }
}

impl std::error::Error for BatchAborted {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Next nonce per chain. Seeded once from the first gas data fetch on a chain
/// and advanced only by successful broadcasts.
#[derive(Debug, Clone, Default)]
pub struct NonceTracker {
    next: HashMap<Chain, u64>,
}

impl NonceTracker {
    pub fn seed(&mut self, chain: Chain, nonce: u64) -> u64 {
        *self.next.entry(chain).or_insert(nonce)
    }

    pub fn current(&self, chain: Chain) -> Option<u64> {
        self.next.get(&chain).copied()
    }

    pub fn advance(&mut self, chain: Chain) {
        if let Some(nonce) = self.next.get_mut(&chain) {
            *nonce += 1;
        }
    }
}

/// `(spot - actual) / spot * 100` where `actual` is the quote normalised to
/// one whole input token. Negative when the trade beats spot.
pub fn price_impact_pct(
    spot_quote: U256,
    quote: U256,
    amount_in: U256,
    decimals: u8,
) -> Option<f64> {
    if spot_quote.is_zero() || amount_in.is_zero() {
        return None;
    }
    let one_token = U256::from(10u64).pow(U256::from(decimals));
    let actual = quote.saturating_mul(one_token) / amount_in;
    let spot = f64::from(spot_quote);
    let impact = if spot_quote >= actual {
        f64::from(spot_quote - actual) / spot
    } else {
        -(f64::from(actual - spot_quote) / spot)
    };
    Some(impact * 100.0)
}

pub(super) fn resolve_token(chain: Chain, symbol: &str) -> Result<&'static TokenConfig, ExecutionError> {
    token_config(chain, symbol).ok_or_else(|| ExecutionError::UnknownToken {
        chain,
        token: symbol.to_string(),
    })
}

/// Fee and nonce preview, one entry per instruction.
pub async fn generate_gas_data<R: ChainReader>(
    reader: &R,
    instructions: &[TradeInstruction],
    owner: Address,
) -> Result<Vec<GasData>, ChainError> {
    let mut out = Vec::with_capacity(instructions.len());
    for instruction in instructions {
        out.push(reader.gas_data(instruction.chain, owner).await?);
    }
    Ok(out)
}

pub(super) async fn sign_and_broadcast<W, S>(
    writer: &W,
    signer: &S,
    chain: Chain,
    tx: TxEip1559,
    sig_name: &str,
    nonces: &mut NonceTracker,
) -> Result<TxOutcome, ExecutionError>
where
    W: ChainWriter,
    S: RemoteSigner,
{
    let signed = signer.sign_transaction(tx, sig_name).await?;
    match writer.send_raw_transaction(chain, signed).await {
        Ok(hash) => {
            nonces.advance(chain);
            tracing::info!(chain = %chain, sig_name, tx_hash = %hash, "broadcast transaction");
            Ok(TxOutcome::Sent(hash))
        }
        Err(err) => {
            tracing::warn!(chain = %chain, sig_name, error = %err, "broadcast failed");
            Ok(TxOutcome::Failed(err.to_string()))
        }
    }
}

fn envelope(
    gas: &GasData,
    nonces: &NonceTracker,
    chain: Chain,
    trade_config: &TradeConfig,
) -> TxEnvelopeParams {
    TxEnvelopeParams::from_gas_data(
        gas,
        nonces.current(chain).unwrap_or(gas.nonce),
        trade_config.gas_aggressiveness_pct,
    )
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

async fn execute_one<R, W, S>(
    reader: &R,
    writer: &W,
    signer: &S,
    instruction: &TradeInstruction,
    trade_config: &TradeConfig,
    nonces: &mut NonceTracker,
) -> Result<TradeExecutionResult, ExecutionError>
where
    R: ChainReader,
    W: ChainWriter,
    S: RemoteSigner,
{
    let chain = instruction.chain;
    let chain_config = chain.config();
    let from = resolve_token(chain, &instruction.from_token)?;
    let to = resolve_token(chain, &instruction.to_token)?;
    let owner = signer.address();

    let gas = reader.gas_data(chain, owner).await?;
    if !gas.errors.is_empty() {
        tracing::warn!(chain = %chain, errors = ?gas.errors, "gas data is partial");
    }
    nonces.seed(chain, gas.nonce);

    let amount_in =
        parse_units(&instruction.from_amount, from.decimals).map_err(|source| {
            ExecutionError::InvalidAmount {
                amount: instruction.from_amount.clone(),
                source,
            }
        })?;
    let router = chain_config.uniswap.swap_router;

    let approve_amount = scale_pct(amount_in, trade_config.approval_buffer_pct);
    let approve = build_approve_tx(
        envelope(&gas, nonces, chain, trade_config),
        from.address,
        router,
        approve_amount,
        trade_config.gas_estimate_base,
    );
    let approve_tx = sign_and_broadcast(writer, signer, chain, approve, "approveSig", nonces).await?;

    let quote = reader.quote(chain, from, to, amount_in).await?;
    let fresh_min_out = min_amount_out(quote, trade_config.slippage_bps);
    let one_token = U256::from(10u64).pow(U256::from(from.decimals));
    let spot = reader.quote(chain, from, to, one_token).await?;
    let impact_pct =
        price_impact_pct(spot, quote, amount_in, from.decimals).ok_or_else(|| {
            ExecutionError::ZeroSpotPrice {
                from_token: instruction.from_token.clone(),
                to_token: instruction.to_token.clone(),
            }
        })?;
    tracing::info!(
        chain = %chain,
        from_token = %instruction.from_token,
        to_token = %instruction.to_token,
        price_impact_pct = impact_pct,
        "price impact"
    );
    if impact_pct > trade_config.maximum_price_impact_pct {
        return Err(ExecutionError::PriceImpactTooHigh {
            impact_pct,
            maximum_pct: trade_config.maximum_price_impact_pct,
        });
    }

    let leg = SwapLeg {
        token_in: from.address,
        token_out: to.address,
        fee: chain_config.uniswap.fee,
        recipient: owner,
        deadline: unix_now().saturating_add(trade_config.swap_deadline_secs),
        amount_in,
        amount_out_minimum: fresh_min_out,
    };
    let swap = build_swap_tx(
        envelope(&gas, nonces, chain, trade_config),
        router,
        leg,
        trade_config.gas_estimate_base.saturating_mul(2),
    )?;
    let swap_tx = sign_and_broadcast(writer, signer, chain, swap, "swapSig", nonces).await?;

    Ok(TradeExecutionResult {
        instruction: instruction.clone(),
        approve_tx,
        swap_tx,
        min_amount_out: fresh_min_out,
        price_impact_pct: impact_pct,
    })
}

/// Runs each instruction's approve then swap strictly in order. Stops at the
/// first fatal error.
pub async fn execute_trade_instructions<R, W, S>(
    reader: &R,
    writer: &W,
    signer: &S,
    instructions: &[TradeInstruction],
    trade_config: &TradeConfig,
) -> Result<Vec<TradeExecutionResult>, BatchAborted>
where
    R: ChainReader,
    W: ChainWriter,
    S: RemoteSigner,
{
    let mut nonces = NonceTracker::default();
    let mut completed = Vec::with_capacity(instructions.len());
    for (index, instruction) in instructions.iter().enumerate() {
        tracing::info!(
            index,
            chain = %instruction.chain,
            from_token = %instruction.from_token,
            to_token = %instruction.to_token,
            from_amount = %instruction.from_amount,
            "executing trade instruction"
        );
        match execute_one(reader, writer, signer, instruction, trade_config, &mut nonces).await {
            Ok(result) => completed.push(result),
            Err(error) => {
                tracing::error!(index, error = %error, "trade batch aborted");
                return Err(BatchAborted {
                    completed,
                    failed_index: index,
                    error,
                });
            }
        }
    }
    Ok(completed)
}

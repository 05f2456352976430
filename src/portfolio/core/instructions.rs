use std::fmt;

use alloy::primitives::U256;

use super::format::{format_decimal, min_amount_out, parse_units};
use super::types::{PortfolioItem, TradeInstruction, find_item, parse_decimal_f64};
use crate::tokens::token_config;

/// Why a candidate trade was dropped. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingPortfolioItem,
    UnknownToken,
    InvalidAmount(String),
    ZeroAmount,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPortfolioItem => write!(f, "sell token not in portfolio"),
            Self::UnknownToken => write!(f, "sell token not in registry"),
            Self::InvalidAmount(raw) => write!(f, "invalid amount format {raw}"),
            Self::ZeroAmount => write!(f, "zero amount"),
        }
    }
}

/// Converts a USD trade size into a sell instruction using the first portfolio
/// item holding `sell_token` to price it.
pub(super) fn build_instruction(
    portfolio: &[PortfolioItem],
    sell_token: &str,
    buy_token: &str,
    usd_size: f64,
    slippage_bps: u32,
    reason: impl FnOnce() -> String,
) -> Result<TradeInstruction, SkipReason> {
    let item = find_item(portfolio, sell_token).ok_or(SkipReason::MissingPortfolioItem)?;
    let token = token_config(item.chain, sell_token).ok_or(SkipReason::UnknownToken)?;

    let token_amount = (usd_size / item.usd_value_f64()) * item.balance_f64();
    let from_amount = format_decimal(token_amount, token.decimals);
    let smallest = parse_units(&from_amount, token.decimals)
        .map_err(|_| SkipReason::InvalidAmount(from_amount.clone()))?;
    if parse_decimal_f64(&from_amount) <= 0.0 || smallest == U256::ZERO {
        return Err(SkipReason::ZeroAmount);
    }

    Ok(TradeInstruction {
        chain: item.chain,
        from_token: sell_token.to_string(),
        to_token: buy_token.to_string(),
        from_amount,
        min_amount_out: min_amount_out(smallest, slippage_bps).to_string(),
        reason: reason(),
    })
}

pub(super) fn log_skip(strategy: &'static str, sell_token: &str, buy_token: &str, skip: &SkipReason) {
    match skip {
        SkipReason::MissingPortfolioItem | SkipReason::UnknownToken => {
            tracing::debug!(strategy, sell_token, buy_token, reason = %skip, "skipping trade");
        }
        SkipReason::InvalidAmount(_) | SkipReason::ZeroAmount => {
            tracing::info!(strategy, sell_token, buy_token, reason = %skip, "skipping trade");
        }
    }
}

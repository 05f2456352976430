use alloy::primitives::{Address, U256};

use super::{PortfolioItem, format_units, parse_units};
use crate::chain::ChainReader;
use crate::tokens::{Chain, NATIVE_SYMBOL, QUOTE_SYMBOL, TokenConfig, WRAPPED_NATIVE_SYMBOL};

/// Decimals used for `usd_value` strings.
const USD_DECIMALS: u8 = 6;

async fn usd_value<R: ChainReader>(
    reader: &R,
    chain: Chain,
    token: &'static TokenConfig,
    balance: U256,
) -> Option<U256> {
    if token.symbol == QUOTE_SYMBOL {
        return Some(balance);
    }
    let quote_token = chain.config().token(QUOTE_SYMBOL)?;
    match reader.quote(chain, token, quote_token, balance).await {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(chain = %chain, token = token.symbol, error = %err, "price lookup failed, excluding token");
            None
        }
    }
}

/// Reads every registry token on every chain and values it in USDC. Tokens
/// that cannot be read or priced are left out.
pub async fn fetch_portfolio<R: ChainReader>(reader: &R, owner: Address) -> Vec<PortfolioItem> {
    let mut items = Vec::new();
    for chain in Chain::ALL {
        for token in chain.config().tokens {
            let balance = match reader.get_balance(chain, owner, token).await {
                Ok(balance) => balance,
                Err(err) => {
                    tracing::warn!(chain = %chain, token = token.symbol, error = %err, "balance read failed");
                    continue;
                }
            };
            if balance.is_zero() {
                tracing::debug!(chain = %chain, token = token.symbol, "zero balance");
                continue;
            }
            let Some(value) = usd_value(reader, chain, token, balance).await else {
                continue;
            };
            if value.is_zero() {
                tracing::debug!(chain = %chain, token = token.symbol, "token has no USD value");
                continue;
            }
            items.push(PortfolioItem {
                chain,
                token: token.symbol.to_string(),
                balance: format_units(balance, token.decimals),
                usd_value: format_units(value, USD_DECIMALS),
                percentage: 0.0,
            });
        }
    }
    with_percentages(merge_wrapped_native(items))
}

fn add_decimal_strings(left: &str, right: &str, decimals: u8) -> String {
    let parse = |raw: &str| parse_units(raw, decimals).unwrap_or(U256::ZERO);
    format_units(parse(left).saturating_add(parse(right)), decimals)
}

/// Folds each chain's WETH holding into its ETH holding. WETH held without
/// ETH is relabelled.
pub fn merge_wrapped_native(items: Vec<PortfolioItem>) -> Vec<PortfolioItem> {
    let mut merged: Vec<PortfolioItem> = Vec::with_capacity(items.len());
    let mut wrapped = Vec::new();
    for item in items {
        if item.token == WRAPPED_NATIVE_SYMBOL {
            wrapped.push(item);
        } else {
            merged.push(item);
        }
    }

    for weth in wrapped {
        let native_decimals = weth
            .chain
            .config()
            .token(NATIVE_SYMBOL)
            .map_or(18, |token| token.decimals);
        match merged
            .iter_mut()
            .find(|item| item.chain == weth.chain && item.token == NATIVE_SYMBOL)
        {
            Some(eth) => {
                eth.balance = add_decimal_strings(&eth.balance, &weth.balance, native_decimals);
                eth.usd_value = add_decimal_strings(&eth.usd_value, &weth.usd_value, USD_DECIMALS);
            }
            None => merged.push(PortfolioItem {
                token: NATIVE_SYMBOL.to_string(),
                ..weth
            }),
        }
    }
    merged
}

/// Recomputes each item's share of the total USD value. All zero when the
/// total is zero.
pub fn with_percentages(mut items: Vec<PortfolioItem>) -> Vec<PortfolioItem> {
    let total: f64 = items.iter().map(PortfolioItem::usd_value_f64).sum();
    for item in &mut items {
        item.percentage = if total > 0.0 {
            item.usd_value_f64() / total * 100.0
        } else {
            0.0
        };
    }
    items
}

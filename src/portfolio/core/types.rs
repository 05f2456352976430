use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tokens::Chain;

/// Fixed haircut applied to every computed trade size to leave room for fees and slippage.
pub const ADJUSTMENT_FACTOR: f64 = 0.99;

/// One token holding valued in USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub chain: Chain,
    pub token: String,
    /// Human units, e.g. "1.234".
    pub balance: String,
    pub usd_value: String,
    /// Share of total USD value in percent. Derived, never read back as input.
    #[serde(default)]
    pub percentage: f64,
}

impl PortfolioItem {
    pub fn balance_f64(&self) -> f64 {
        parse_decimal_f64(&self.balance)
    }

    pub fn usd_value_f64(&self) -> f64 {
        parse_decimal_f64(&self.usd_value)
    }
}

/// Unparsable values count as zero.
pub(crate) fn parse_decimal_f64(raw: &str) -> f64 {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    /// token symbol -> target fraction in [0, 1].
    pub target_allocations: BTreeMap<String, f64>,
    /// Deviation tolerance in percentage points.
    pub threshold_percentage: f64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            target_allocations: BTreeMap::from([("ETH".to_string(), 0.5), ("OP".to_string(), 0.2)]),
            threshold_percentage: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeInstruction {
    pub chain: Chain,
    pub from_token: String,
    pub to_token: String,
    /// Human units at the sell token's precision.
    pub from_amount: String,
    /// Smallest units.
    pub min_amount_out: String,
    pub reason: String,
}

/// Net USD imbalance for one token.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedOrder {
    pub token: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pairing {
    pub sell_token: String,
    pub buy_token: String,
    pub trade_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioAnalysis {
    pub total_value: f64,
    pub current_allocations: BTreeMap<String, f64>,
    pub tokens_to_sell: Vec<String>,
    pub tokens_to_buy: Vec<String>,
}

impl PortfolioAnalysis {
    pub fn current(&self, token: &str) -> f64 {
        self.current_allocations.get(token).copied().unwrap_or(0.0)
    }
}

pub(super) fn find_item<'a>(portfolio: &'a [PortfolioItem], token: &str) -> Option<&'a PortfolioItem> {
    portfolio.iter().find(|item| item.token == token)
}

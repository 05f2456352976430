use std::fmt;
use std::str::FromStr;

use super::aggregate::aggregate_orders_instructions;
use super::diagnostics::log_portfolio_analysis;
use super::full_matrix::full_matrix_instructions;
use super::pairing::optimized_pairing_instructions;
use super::types::{PortfolioItem, StrategyConfig, TradeInstruction};
use crate::config::TradeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebalanceStrategyType {
    FullMatrix,
    AggregateOrders,
    OptimizedPairing,
}

type StrategyFn = fn(&[PortfolioItem], &StrategyConfig, &TradeConfig) -> Vec<TradeInstruction>;

impl RebalanceStrategyType {
    pub const ALL: [Self; 3] = [Self::FullMatrix, Self::AggregateOrders, Self::OptimizedPairing];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FullMatrix => "FULL_MATRIX",
            Self::AggregateOrders => "AGGREGATE_ORDERS",
            Self::OptimizedPairing => "OPTIMIZED_PAIRING",
        }
    }

    fn generator(self) -> StrategyFn {
        match self {
            Self::FullMatrix => full_matrix_instructions,
            Self::AggregateOrders => aggregate_orders_instructions,
            Self::OptimizedPairing => optimized_pairing_instructions,
        }
    }
}

impl fmt::Display for RebalanceStrategyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RebalanceStrategyType {
    type Err = StrategyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| StrategyError::Unsupported(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyError {
    Unsupported(String),
}

impl fmt::Display for StrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(raw) => write!(f, "unsupported strategy type: {raw}"),
        }
    }
}

impl std::error::Error for StrategyError {}

/// Logs the analysis, then runs the selected strategy.
pub fn generate_rebalance_instructions(
    kind: RebalanceStrategyType,
    portfolio: &[PortfolioItem],
    config: &StrategyConfig,
    trade_config: &TradeConfig,
) -> Vec<TradeInstruction> {
    log_portfolio_analysis(portfolio, config);
    let instructions = kind.generator()(portfolio, config, trade_config);
    tracing::info!(
        strategy = %kind,
        instructions = instructions.len(),
        "generated rebalance instructions"
    );
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_loosely() {
        assert_eq!(
            "FULL_MATRIX".parse::<RebalanceStrategyType>(),
            Ok(RebalanceStrategyType::FullMatrix)
        );
        assert_eq!(
            "aggregate-orders".parse::<RebalanceStrategyType>(),
            Ok(RebalanceStrategyType::AggregateOrders)
        );
        assert_eq!(
            " optimized_pairing ".parse::<RebalanceStrategyType>(),
            Ok(RebalanceStrategyType::OptimizedPairing)
        );
    }

    #[test]
    fn unknown_name_is_unsupported() {
        assert_eq!(
            "LINEAR_PROGRAM".parse::<RebalanceStrategyType>(),
            Err(StrategyError::Unsupported("LINEAR_PROGRAM".to_string()))
        );
    }

    #[test]
    fn display_round_trips() {
        for kind in RebalanceStrategyType::ALL {
            assert_eq!(kind.to_string().parse::<RebalanceStrategyType>(), Ok(kind));
        }
    }
}

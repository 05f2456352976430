mod aggregate;
mod analyzer;
pub mod diagnostics;
mod format;
mod full_matrix;
mod instructions;
mod pairing;
mod strategy;
mod types;

pub use aggregate::{aggregate_orders_instructions, net_orders};
pub use analyzer::{analyze_portfolio, deviation_pct};
pub use format::{
    BPS_DENOMINATOR, UnitsError, format_decimal, format_units, min_amount_out, parse_units, scale_pct,
};
pub use full_matrix::full_matrix_instructions;
pub use instructions::SkipReason;
pub use pairing::{optimized_pairing_instructions, solve_optimal_pairing};
pub use strategy::{RebalanceStrategyType, StrategyError, generate_rebalance_instructions};
pub use types::{
    ADJUSTMENT_FACTOR, AggregatedOrder, Pairing, PortfolioAnalysis, PortfolioItem, StrategyConfig,
    TradeInstruction,
};

#[cfg(test)]
#[path = "../tests.rs"]
mod tests;

mod core;
pub mod snapshot;

pub use core::diagnostics::{AllocationRow, allocation_rows, log_portfolio_analysis};
pub use core::{
    ADJUSTMENT_FACTOR, AggregatedOrder, BPS_DENOMINATOR, Pairing, PortfolioAnalysis, PortfolioItem,
    RebalanceStrategyType, SkipReason, StrategyConfig, StrategyError, TradeInstruction, UnitsError,
    aggregate_orders_instructions, analyze_portfolio, deviation_pct, format_decimal, format_units,
    full_matrix_instructions, generate_rebalance_instructions, min_amount_out, net_orders,
    optimized_pairing_instructions, parse_units, scale_pct, solve_optimal_pairing,
};
pub use snapshot::{fetch_portfolio, merge_wrapped_native, with_percentages};

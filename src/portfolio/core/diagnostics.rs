use std::collections::BTreeSet;

use super::analyzer::{analyze_portfolio, deviation_pct};
use super::types::{PortfolioItem, StrategyConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub token: String,
    pub current_pct: f64,
    pub target_pct: f64,
    pub deviation_pct: f64,
}

/// One row per token held or targeted, sorted by symbol.
pub fn allocation_rows(portfolio: &[PortfolioItem], config: &StrategyConfig) -> Vec<AllocationRow> {
    let analysis = analyze_portfolio(
        portfolio,
        &config.target_allocations,
        config.threshold_percentage,
    );
    let tokens: BTreeSet<&String> = analysis
        .current_allocations
        .keys()
        .chain(config.target_allocations.keys())
        .collect();

    tokens
        .into_iter()
        .map(|token| {
            let current = analysis.current(token);
            let target = config.target_allocations.get(token).copied().unwrap_or(0.0);
            AllocationRow {
                token: token.clone(),
                current_pct: current * 100.0,
                target_pct: target * 100.0,
                deviation_pct: deviation_pct(current, target),
            }
        })
        .collect()
}

pub fn log_portfolio_analysis(portfolio: &[PortfolioItem], config: &StrategyConfig) {
    let total_value: f64 = portfolio.iter().map(PortfolioItem::usd_value_f64).sum();
    tracing::info!(
        total_value_usdc = format_args!("{total_value:.2}"),
        threshold_pct = config.threshold_percentage,
        holdings = portfolio.len(),
        "portfolio analysis"
    );
    for row in allocation_rows(portfolio, config) {
        tracing::info!(
            token = %row.token,
            current_pct = format_args!("{:.2}", row.current_pct),
            target_pct = format_args!("{:.2}", row.target_pct),
            deviation_pct = format_args!("{:.2}", row.deviation_pct),
            "allocation"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::tokens::Chain;

    #[test]
    fn rows_cover_held_and_targeted_tokens() {
        let portfolio = vec![PortfolioItem {
            chain: Chain::Optimism,
            token: "WBTC".to_string(),
            balance: "0.001".to_string(),
            usd_value: "100".to_string(),
            percentage: 100.0,
        }];
        let config = StrategyConfig {
            target_allocations: BTreeMap::from([("ETH".to_string(), 1.0)]),
            threshold_percentage: 1.0,
        };
        let rows = allocation_rows(&portfolio, &config);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].token, "ETH");
        assert_eq!(rows[0].current_pct, 0.0);
        assert_eq!(rows[0].deviation_pct, 100.0);
        assert_eq!(rows[1].token, "WBTC");
        assert_eq!(rows[1].target_pct, 0.0);
        assert_eq!(rows[1].current_pct, 100.0);
    }
}

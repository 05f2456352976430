use std::collections::BTreeMap;

use super::types::{PortfolioAnalysis, PortfolioItem};

/// Computes total value, current allocation fractions and the tokens whose
/// deviation from target exceeds `threshold_percentage` percentage points.
///
/// Allocations are keyed by bare symbol; when a symbol appears more than once
/// the last item in portfolio order wins.
pub fn analyze_portfolio(
    portfolio: &[PortfolioItem],
    target_allocations: &BTreeMap<String, f64>,
    threshold_percentage: f64,
) -> PortfolioAnalysis {
    let total_value: f64 = portfolio.iter().map(PortfolioItem::usd_value_f64).sum();

    let mut current_allocations = BTreeMap::new();
    for item in portfolio {
        let share = if total_value > 0.0 {
            item.usd_value_f64() / total_value
        } else {
            0.0
        };
        current_allocations.insert(item.token.clone(), share);
    }

    let mut tokens_to_sell = Vec::new();
    let mut tokens_to_buy = Vec::new();
    for (token, &target) in target_allocations {
        let current = current_allocations.get(token).copied().unwrap_or(0.0);
        if deviation_pct(current, target) > threshold_percentage {
            if current > target {
                tokens_to_sell.push(token.clone());
            } else {
                tokens_to_buy.push(token.clone());
            }
        }
    }

    PortfolioAnalysis {
        total_value,
        current_allocations,
        tokens_to_sell,
        tokens_to_buy,
    }
}

/// Absolute gap between two fractions, in percentage points.
pub fn deviation_pct(current: f64, target: f64) -> f64 {
    (current - target).abs() * 100.0
}

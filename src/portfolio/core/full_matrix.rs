use super::analyzer::analyze_portfolio;
use super::instructions::{build_instruction, log_skip};
use super::types::{ADJUSTMENT_FACTOR, PortfolioItem, StrategyConfig, TradeInstruction};
use crate::config::TradeConfig;

const STRATEGY: &str = "full_matrix";

/// Pairs every over-allocated token with every under-allocated one, each
/// candidate sized to the full sell excess.
pub fn full_matrix_instructions(
    portfolio: &[PortfolioItem],
    config: &StrategyConfig,
    trade_config: &TradeConfig,
) -> Vec<TradeInstruction> {
    let analysis = analyze_portfolio(
        portfolio,
        &config.target_allocations,
        config.threshold_percentage,
    );

    let mut instructions = Vec::new();
    for sell in &analysis.tokens_to_sell {
        for buy in &analysis.tokens_to_buy {
            let target = |token: &str| config.target_allocations.get(token).copied().unwrap_or(0.0);
            let excess = analysis.current(sell) - target(sell);
            let buy_gap = analysis.current(buy) - target(buy);
            let usd_size = excess * analysis.total_value * ADJUSTMENT_FACTOR;

            let built = build_instruction(
                portfolio,
                sell,
                buy,
                usd_size,
                trade_config.slippage_bps,
                || {
                    format!(
                        "Rebalancing: {sell} is {:.2}% over target, {buy} is {:.2}% under target",
                        excess * 100.0,
                        buy_gap * 100.0
                    )
                },
            );
            match built {
                Ok(instruction) => instructions.push(instruction),
                Err(skip) => log_skip(STRATEGY, sell, buy, &skip),
            }
        }
    }
    instructions
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::tokens::Chain;

    fn item(token: &str, balance: &str, usd: &str) -> PortfolioItem {
        PortfolioItem {
            chain: Chain::Optimism,
            token: token.to_string(),
            balance: balance.to_string(),
            usd_value: usd.to_string(),
            percentage: 0.0,
        }
    }

    fn config(pairs: &[(&str, f64)]) -> StrategyConfig {
        StrategyConfig {
            target_allocations: pairs.iter().map(|(t, f)| (t.to_string(), *f)).collect(),
            threshold_percentage: 1.0,
        }
    }

    #[test]
    fn eth_op_scenario_sells_nine_point_nine_usd_of_eth() {
        let portfolio = vec![item("ETH", "0.03", "60"), item("OP", "20", "40")];
        let out = full_matrix_instructions(
            &portfolio,
            &config(&[("ETH", 0.5), ("OP", 0.5)]),
            &TradeConfig::default(),
        );
        assert_eq!(out.len(), 1);
        let instruction = &out[0];
        assert_eq!(instruction.from_token, "ETH");
        assert_eq!(instruction.to_token, "OP");
        let sold: f64 = instruction.from_amount.parse().expect("numeric amount");
        assert!((sold * 2000.0 - 9.9).abs() < 1e-9, "sold {sold} ETH");
        assert_eq!(
            instruction.reason,
            "Rebalancing: ETH is 10.00% over target, OP is -10.00% under target"
        );
    }

    #[test]
    fn emits_one_candidate_per_sell_buy_pair() {
        let portfolio = vec![
            item("ETH", "0.02", "40"),
            item("OP", "40", "40"),
            item("USDC", "10", "10"),
            item("WBTC", "0.0001", "10"),
        ];
        let out = full_matrix_instructions(
            &portfolio,
            &config(&[("ETH", 0.25), ("OP", 0.25), ("USDC", 0.25), ("WBTC", 0.25)]),
            &TradeConfig::default(),
        );
        assert_eq!(out.len(), 4);
        let pairs: Vec<(&str, &str)> = out
            .iter()
            .map(|i| (i.from_token.as_str(), i.to_token.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("ETH", "USDC"), ("ETH", "WBTC"), ("OP", "USDC"), ("OP", "WBTC")]
        );
    }

    #[test]
    fn buys_token_absent_from_portfolio() {
        let portfolio = vec![item("OP", "10", "100")];
        let out = full_matrix_instructions(
            &portfolio,
            &StrategyConfig {
                target_allocations: BTreeMap::from([("OP".to_string(), 0.0), ("ETH".to_string(), 1.0)]),
                threshold_percentage: 1.0,
            },
            &TradeConfig::default(),
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].from_token, "OP");
        assert_eq!(out[0].to_token, "ETH");
    }

    #[test]
    fn balanced_portfolio_produces_nothing() {
        let portfolio = vec![item("ETH", "0.025", "50"), item("OP", "25", "50")];
        let out = full_matrix_instructions(
            &portfolio,
            &config(&[("ETH", 0.5), ("OP", 0.5)]),
            &TradeConfig::default(),
        );
        assert!(out.is_empty());
    }
}

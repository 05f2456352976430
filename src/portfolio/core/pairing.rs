use super::aggregate::net_orders;
use super::analyzer::analyze_portfolio;
use super::instructions::{build_instruction, log_skip};
use super::types::{AggregatedOrder, Pairing, PortfolioItem, StrategyConfig, TradeInstruction};
use crate::config::TradeConfig;

const STRATEGY: &str = "optimized_pairing";

/// Two-pointer greedy matcher. Each step fully consumes at least one side, so
/// the loop runs at most `sells.len() + buys.len()` times and the matched total
/// is `min(sum(sells), sum(buys))`.
pub fn solve_optimal_pairing(sells: &[AggregatedOrder], buys: &[AggregatedOrder]) -> Vec<Pairing> {
    let mut sell_left: Vec<f64> = sells.iter().map(|order| order.amount).collect();
    let mut buy_left: Vec<f64> = buys.iter().map(|order| order.amount).collect();
    let mut pairings = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < sells.len() && j < buys.len() {
        let trade_amount = sell_left[i].min(buy_left[j]);
        pairings.push(Pairing {
            sell_token: sells[i].token.clone(),
            buy_token: buys[j].token.clone(),
            trade_amount,
        });
        sell_left[i] -= trade_amount;
        buy_left[j] -= trade_amount;
        // NaN never compares greater than zero, so it also advances.
        let sell_done = !(sell_left[i] > 0.0);
        let buy_done = !(buy_left[j] > 0.0);
        if sell_done {
            i += 1;
        }
        if buy_done {
            j += 1;
        }
    }
    pairings
}

pub fn optimized_pairing_instructions(
    portfolio: &[PortfolioItem],
    config: &StrategyConfig,
    trade_config: &TradeConfig,
) -> Vec<TradeInstruction> {
    let analysis = analyze_portfolio(
        portfolio,
        &config.target_allocations,
        config.threshold_percentage,
    );
    let (sells, buys) = net_orders(&analysis, config);

    solve_optimal_pairing(&sells, &buys)
        .into_iter()
        .filter_map(|pairing| {
            let Pairing {
                sell_token,
                buy_token,
                trade_amount,
            } = pairing;
            build_instruction(
                portfolio,
                &sell_token,
                &buy_token,
                trade_amount,
                trade_config.slippage_bps,
                || {
                    format!(
                        "Optimized pairing via LP: Trade {trade_amount:.2} USD from {sell_token} to {buy_token}"
                    )
                },
            )
            .inspect_err(|skip| log_skip(STRATEGY, &sell_token, &buy_token, skip))
            .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Chain;

    fn order(token: &str, amount: f64) -> AggregatedOrder {
        AggregatedOrder {
            token: token.to_string(),
            amount,
        }
    }

    #[test]
    fn op_fills_eth_then_usdc() {
        let sells = vec![order("OP", 100.0)];
        let buys = vec![order("ETH", 30.0), order("USDC", 80.0)];
        let pairings = solve_optimal_pairing(&sells, &buys);
        assert_eq!(
            pairings,
            vec![
                Pairing {
                    sell_token: "OP".to_string(),
                    buy_token: "ETH".to_string(),
                    trade_amount: 30.0,
                },
                Pairing {
                    sell_token: "OP".to_string(),
                    buy_token: "USDC".to_string(),
                    trade_amount: 70.0,
                },
            ]
        );
        assert_eq!(sells[0].amount, 100.0, "inputs stay untouched");
    }

    #[test]
    fn equal_sides_advance_together() {
        let sells = vec![order("OP", 10.0), order("WBTC", 5.0)];
        let buys = vec![order("ETH", 10.0), order("USDC", 5.0)];
        let pairings = solve_optimal_pairing(&sells, &buys);
        assert_eq!(pairings.len(), 2);
        assert_eq!(pairings[1].sell_token, "WBTC");
        assert_eq!(pairings[1].buy_token, "USDC");
    }

    #[test]
    fn empty_side_produces_nothing() {
        assert!(solve_optimal_pairing(&[], &[order("ETH", 1.0)]).is_empty());
        assert!(solve_optimal_pairing(&[order("ETH", 1.0)], &[]).is_empty());
    }

    #[test]
    fn reasons_mention_pairing() {
        let item = |token: &str, balance: &str, usd: &str| PortfolioItem {
            chain: Chain::Optimism,
            token: token.to_string(),
            balance: balance.to_string(),
            usd_value: usd.to_string(),
            percentage: 0.0,
        };
        let portfolio = vec![item("WBTC", "0.0002", "20"), item("ETH", "0.04", "80")];
        let config = StrategyConfig {
            target_allocations: [("ETH".to_string(), 0.5), ("WBTC".to_string(), 0.5)]
                .into_iter()
                .collect(),
            threshold_percentage: 1.0,
        };
        let out = optimized_pairing_instructions(&portfolio, &config, &TradeConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].from_token, "ETH");
        assert_eq!(out[0].to_token, "WBTC");
        assert_eq!(
            out[0].reason,
            "Optimized pairing via LP: Trade 29.70 USD from ETH to WBTC"
        );
    }
}

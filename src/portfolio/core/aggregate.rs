use super::analyzer::{analyze_portfolio, deviation_pct};
use super::instructions::{SkipReason, build_instruction, log_skip};
use super::types::{
    ADJUSTMENT_FACTOR, AggregatedOrder, PortfolioAnalysis, PortfolioItem, StrategyConfig,
    TradeInstruction,
};
use crate::config::TradeConfig;

const STRATEGY: &str = "aggregate_orders";

/// Net USD imbalances per target token, split into sell and buy sides in
/// target-map order.
pub fn net_orders(
    analysis: &PortfolioAnalysis,
    config: &StrategyConfig,
) -> (Vec<AggregatedOrder>, Vec<AggregatedOrder>) {
    let mut sells = Vec::new();
    let mut buys = Vec::new();
    for (token, &target) in &config.target_allocations {
        let current = analysis.current(token);
        if deviation_pct(current, target) <= config.threshold_percentage {
            continue;
        }
        let diff = current - target;
        let order = AggregatedOrder {
            token: token.clone(),
            amount: diff.abs() * analysis.total_value * ADJUSTMENT_FACTOR,
        };
        if diff > 0.0 {
            sells.push(order);
        } else {
            buys.push(order);
        }
    }
    (sells, buys)
}

/// Greedily matches net sells against net buys so each token trades at most
/// once per counterparty.
pub fn aggregate_orders_instructions(
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
    match_net_orders(&sells, &buys, |sell, buy, trade_usd| {
        build_instruction(
            portfolio,
            sell,
            buy,
            trade_usd,
            trade_config.slippage_bps,
            || format!("Aggregated order: Matching {trade_usd:.2} USD from {sell} to {buy}"),
        )
    })
}

/// Two-pointer walk over net sells and buys. A missing sell item advances the
/// sell side. Any other skip advances the sell side when it has no more left
/// than the buy side, otherwise the buy side.
pub(super) fn match_net_orders<F>(
    sells: &[AggregatedOrder],
    buys: &[AggregatedOrder],
    mut build: F,
) -> Vec<TradeInstruction>
where
    F: FnMut(&str, &str, f64) -> Result<TradeInstruction, SkipReason>,
{
    let mut sell_left: Vec<f64> = sells.iter().map(|order| order.amount).collect();
    let mut buy_left: Vec<f64> = buys.iter().map(|order| order.amount).collect();
    let mut instructions = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < sells.len() && j < buys.len() {
        let (sell, buy) = (sells[i].token.as_str(), buys[j].token.as_str());
        let trade_usd = sell_left[i].min(buy_left[j]);

        match build(sell, buy, trade_usd) {
            Ok(instruction) => {
                instructions.push(instruction);
                sell_left[i] -= trade_usd;
                buy_left[j] -= trade_usd;
                let sell_done = sell_left[i] <= 0.0;
                let buy_done = buy_left[j] <= 0.0;
                if sell_done {
                    i += 1;
                }
                if buy_done {
                    j += 1;
                }
            }
            Err(SkipReason::MissingPortfolioItem) => {
                log_skip(STRATEGY, sell, buy, &SkipReason::MissingPortfolioItem);
                i += 1;
            }
            Err(skip) => {
                log_skip(STRATEGY, sell, buy, &skip);
                if sell_left[i] <= buy_left[j] {
                    i += 1;
                } else {
                    j += 1;
                }
            }
        }
    }
    instructions
}

#[cfg(test)]
mod tests {
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
    fn net_orders_split_by_sign_with_haircut() {
        let portfolio = vec![item("ETH", "0.03", "60"), item("OP", "20", "40")];
        let config = config(&[("ETH", 0.5), ("OP", 0.5)]);
        let analysis = analyze_portfolio(&portfolio, &config.target_allocations, 1.0);
        let (sells, buys) = net_orders(&analysis, &config);
        assert_eq!(sells.len(), 1);
        assert_eq!(buys.len(), 1);
        assert_eq!(sells[0].token, "ETH");
        assert!((sells[0].amount - 9.9).abs() < 1e-9);
        assert!((buys[0].amount - 9.9).abs() < 1e-9);
    }

    #[test]
    fn one_seller_fills_two_buyers() {
        let portfolio = vec![
            item("OP", "70", "70"),
            item("ETH", "0.01", "20"),
            item("USDC", "10", "10"),
        ];
        let out = aggregate_orders_instructions(
            &portfolio,
            &config(&[("OP", 0.4), ("ETH", 0.35), ("USDC", 0.25)]),
            &TradeConfig::default(),
        );
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|i| i.from_token == "OP"));
        assert_eq!(out[0].to_token, "ETH");
        assert_eq!(out[1].to_token, "USDC");
        assert_eq!(out[0].reason, "Aggregated order: Matching 14.85 USD from OP to ETH");
        assert_eq!(out[1].reason, "Aggregated order: Matching 14.85 USD from OP to USDC");
    }

    #[test]
    fn unpriceable_sell_is_skipped_without_stalling() {
        // OP on arbitrum has no registry entry, so every OP trade is skipped.
        let mut op = item("OP", "70", "70");
        op.chain = Chain::Arbitrum;
        let portfolio = vec![op, item("WBTC", "0.0002", "20"), item("ETH", "0.005", "10")];
        let out = aggregate_orders_instructions(
            &portfolio,
            &config(&[("ETH", 0.5), ("OP", 0.3), ("WBTC", 0.2)]),
            &TradeConfig::default(),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn instruction_count_is_bounded_by_sides() {
        let portfolio = vec![
            item("ETH", "0.02", "40"),
            item("OP", "40", "40"),
            item("USDC", "10", "10"),
            item("WBTC", "0.0001", "10"),
        ];
        let out = aggregate_orders_instructions(
            &portfolio,
            &config(&[("ETH", 0.25), ("OP", 0.25), ("USDC", 0.25), ("WBTC", 0.25)]),
            &TradeConfig::default(),
        );
        assert!(out.len() <= 3);
        assert!(!out.is_empty());
    }
}

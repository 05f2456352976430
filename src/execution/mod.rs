use alloy::primitives::{TxHash, U256};
use serde::Serialize;

use crate::portfolio::TradeInstruction;

pub mod executor;
pub mod gas;
pub mod tx_builder;
pub mod weth;

pub use executor::{
    BatchAborted, ExecutionError, NonceTracker, execute_trade_instructions, generate_gas_data,
    price_impact_pct,
};

/// Result of one broadcast attempt. Broadcast failures are recorded here rather
/// than aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status", content = "value")]
pub enum TxOutcome {
    Sent(TxHash),
    Failed(String),
}

impl TxOutcome {
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Sent(hash) => Some(*hash),
            Self::Failed(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeExecutionResult {
    pub instruction: TradeInstruction,
    pub approve_tx: TxOutcome,
    pub swap_tx: TxOutcome,
    /// Recomputed from the fresh quote, smallest units of the buy token.
    pub min_amount_out: U256,
    pub price_impact_pct: f64,
}

impl TradeExecutionResult {
    pub fn sent_tx_hashes(&self) -> impl Iterator<Item = TxHash> + '_ {
        [&self.approve_tx, &self.swap_tx]
            .into_iter()
            .filter_map(TxOutcome::tx_hash)
    }

    pub fn is_success(&self) -> bool {
        matches!(self.swap_tx, TxOutcome::Sent(_))
    }
}

/// Explorer links for every transaction that made it to the mempool.
pub fn explorer_links(results: &[TradeExecutionResult]) -> Vec<String> {
    results
        .iter()
        .flat_map(|result| {
            let config = result.instruction.chain.config();
            result
                .sent_tx_hashes()
                .map(move |hash| config.explorer_tx_url(&hash.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Chain;

    fn result(approve: TxOutcome, swap: TxOutcome) -> TradeExecutionResult {
        TradeExecutionResult {
            instruction: TradeInstruction {
                chain: Chain::Arbitrum,
                from_token: "ETH".to_string(),
                to_token: "USDC".to_string(),
                from_amount: "0.1".to_string(),
                min_amount_out: "1".to_string(),
                reason: "test".to_string(),
            },
            approve_tx: approve,
            swap_tx: swap,
            min_amount_out: U256::from(1u64),
            price_impact_pct: 0.0,
        }
    }

    #[test]
    fn only_sent_hashes_are_linked() {
        let hash = TxHash::repeat_byte(0xab);
        let results = vec![result(
            TxOutcome::Sent(hash),
            TxOutcome::Failed("nonce too low".to_string()),
        )];
        let links = explorer_links(&results);
        assert_eq!(links, vec![format!("https://arbiscan.io/tx/{hash}")]);
        assert!(!results[0].is_success());
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(TxOutcome::Failed("rejected".to_string()))
            .expect("outcome should serialize");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["value"], "rejected");
    }
}

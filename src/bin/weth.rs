use std::error::Error;

use rebalance_bot::chain::{AlloyChainClient, LocalSigner, RemoteSigner};
use rebalance_bot::config::{RuntimeConfig, TradeConfig, WethMode, weth_settings_from_env};
use rebalance_bot::execution::TxOutcome;
use rebalance_bot::execution::weth::{unwrap_native, wrap_native};
use rebalance_bot::tokens::Chain;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = RuntimeConfig::from_env()?;
    let trade_config = TradeConfig::from_env()?;
    let (mode, percentage) = weth_settings_from_env()?;
    let chain = Chain::Optimism;

    let signer = LocalSigner::from_private_key(runtime.require_private_key()?)?;
    let client = AlloyChainClient::from_runtime(&runtime)?;
    tracing::info!(
        signer = %signer.address(),
        chain = %chain,
        mode = ?mode,
        percentage,
        "weth runtime resolved"
    );

    let outcome = match mode {
        WethMode::Wrap => {
            wrap_native(
                &client,
                &client,
                &signer,
                chain,
                percentage,
                trade_config.gas_aggressiveness_pct,
            )
            .await?
        }
        WethMode::Unwrap => {
            unwrap_native(
                &client,
                &client,
                &signer,
                chain,
                percentage,
                trade_config.gas_aggressiveness_pct,
            )
            .await?
        }
    };

    match outcome {
        Some(TxOutcome::Sent(hash)) => {
            let link = chain.config().explorer_tx_url(&hash.to_string());
            tracing::info!(tx_hash = %hash, link = %link, "weth transaction sent");
        }
        Some(TxOutcome::Failed(reason)) => {
            return Err(format!("weth transaction was not broadcast: {reason}").into());
        }
        None => tracing::info!("nothing to do"),
    }
    Ok(())
}

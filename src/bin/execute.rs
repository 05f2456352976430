use std::error::Error;
use std::str::FromStr;

use rebalance_bot::chain::{AlloyChainClient, LocalSigner, RemoteSigner};
use rebalance_bot::config::{RuntimeConfig, TradeConfig, load_strategy_config, read_portfolio_file};
use rebalance_bot::execution::{execute_trade_instructions, explorer_links, generate_gas_data};
use rebalance_bot::portfolio::{self, RebalanceStrategyType, generate_rebalance_instructions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let runtime = RuntimeConfig::from_env()?;
    let trade_config = TradeConfig::from_env()?;
    let strategy = RebalanceStrategyType::from_str(&runtime.strategy)?;
    let strategy_config = load_strategy_config(&runtime.preferences_path);

    let signer = LocalSigner::from_private_key(runtime.require_private_key()?)?;
    let signer_address = signer.address();
    let client = AlloyChainClient::from_runtime(&runtime)?;
    tracing::info!(
        signer = %signer_address,
        strategy = %strategy,
        execute_submit = runtime.execute_submit,
        "execution runtime resolved"
    );

    let items = match runtime.portfolio_file.as_deref() {
        Some(path) => read_portfolio_file(path)?,
        None => portfolio::fetch_portfolio(&client, signer_address).await,
    };
    let instructions =
        generate_rebalance_instructions(strategy, &items, &strategy_config, &trade_config);
    if instructions.is_empty() {
        tracing::info!("no rebalance instructions generated; nothing to execute");
        return Ok(());
    }

    let gas = generate_gas_data(&client, &instructions, signer_address).await?;
    for (index, (instruction, gas)) in instructions.iter().zip(&gas).enumerate() {
        tracing::info!(
            index,
            chain = %instruction.chain,
            from_token = %instruction.from_token,
            to_token = %instruction.to_token,
            from_amount = %instruction.from_amount,
            max_fee_per_gas = gas.max_fee_per_gas,
            max_priority_fee_per_gas = gas.max_priority_fee_per_gas,
            nonce = gas.nonce,
            gas_errors = ?gas.errors,
            "planned trade"
        );
    }

    if !runtime.execute_submit {
        println!("{}", serde_json::to_string_pretty(&instructions)?);
        tracing::info!("dry-run mode active (set EXECUTE_SUBMIT=1 to broadcast)");
        return Ok(());
    }

    match execute_trade_instructions(&client, &client, &signer, &instructions, &trade_config).await
    {
        Ok(results) => {
            for link in explorer_links(&results) {
                tracing::info!(link = %link, "transaction sent");
            }
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }
        Err(aborted) => {
            for link in explorer_links(&aborted.completed) {
                tracing::info!(link = %link, "transaction sent before abort");
            }
            Err(aborted.into())
        }
    }
}

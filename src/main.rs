use std::error::Error;
use std::str::FromStr;

use alloy::primitives::Address;
use rebalance_bot::chain::{AlloyChainClient, LocalSigner, RemoteSigner};
use rebalance_bot::config::{RuntimeConfig, TradeConfig, load_strategy_config, read_portfolio_file};
use rebalance_bot::portfolio::{
    self, PortfolioItem, RebalanceStrategyType, generate_rebalance_instructions,
};

/// `WALLET` wins; otherwise the address behind `PRIVATE_KEY`.
fn resolve_owner(config: &RuntimeConfig) -> Result<Address, Box<dyn Error>> {
    if let Some(wallet) = config.wallet.as_deref() {
        return Ok(Address::from_str(wallet)?);
    }
    let signer = LocalSigner::from_private_key(config.require_private_key()?)?;
    Ok(signer.address())
}

async fn load_portfolio(config: &RuntimeConfig) -> Result<Vec<PortfolioItem>, Box<dyn Error>> {
    if let Some(path) = config.portfolio_file.as_deref() {
        tracing::info!(path, "reading portfolio snapshot from file");
        return Ok(read_portfolio_file(path)?);
    }
    let owner = resolve_owner(config)?;
    tracing::info!(owner = %owner, "fetching portfolio balances");
    let client = AlloyChainClient::from_runtime(config)?;
    Ok(portfolio::fetch_portfolio(&client, owner).await)
}

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

    let items = load_portfolio(&runtime).await?;
    if items.is_empty() {
        tracing::warn!("portfolio is empty; nothing to rebalance");
        return Ok(());
    }
    for item in &items {
        tracing::info!(
            chain = %item.chain,
            token = %item.token,
            balance = %item.balance,
            usd_value = %item.usd_value,
            percentage = item.percentage,
            "holding"
        );
    }

    let instructions =
        generate_rebalance_instructions(strategy, &items, &strategy_config, &trade_config);
    println!("{}", serde_json::to_string_pretty(&instructions)?);
    Ok(())
}

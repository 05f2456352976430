use std::collections::HashMap;

use alloy::primitives::{Address, Bytes, TxHash, U160, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy_primitives::aliases::U24;

use super::{ChainError, ChainReader, ChainWriter, GasData};
use crate::config::RuntimeConfig;
use crate::execution::gas::{build_gas_rpc_client, fetch_gas_data};
use crate::tokens::{Chain, TokenConfig};
use crate::{IERC20, IQuoter};

/// Alloy HTTP providers per chain for balances, QuoterV1 calls and raw
/// broadcast. Fee data goes through plain JSON-RPC.
#[derive(Clone)]
pub struct AlloyChainClient {
    providers: HashMap<Chain, DynProvider>,
    rpc_urls: HashMap<Chain, String>,
    http: reqwest::Client,
}

impl AlloyChainClient {
    pub fn new(rpc_urls: impl IntoIterator<Item = (Chain, String)>) -> Result<Self, ChainError> {
        let mut providers = HashMap::new();
        let mut urls = HashMap::new();
        for (chain, raw) in rpc_urls {
            let url = raw
                .trim()
                .parse()
                .map_err(|_| ChainError::InvalidRpcUrl {
                    chain,
                    raw: raw.clone(),
                })?;
            providers.insert(chain, ProviderBuilder::new().connect_http(url).erased());
            urls.insert(chain, raw);
        }

        let http = build_gas_rpc_client().map_err(|source| ChainError::Gas {
            chain: Chain::Optimism,
            source,
        })?;
        Ok(Self {
            providers,
            rpc_urls: urls,
            http,
        })
    }

    pub fn from_runtime(config: &RuntimeConfig) -> Result<Self, ChainError> {
        Self::new(
            Chain::ALL
                .into_iter()
                .map(|chain| (chain, config.rpc_url(chain).to_string())),
        )
    }

    fn provider(&self, chain: Chain) -> Result<&DynProvider, ChainError> {
        self.providers
            .get(&chain)
            .ok_or(ChainError::MissingRpcUrl(chain))
    }
}

fn provider_error(chain: Chain, err: impl std::fmt::Display) -> ChainError {
    ChainError::Provider {
        chain,
        message: err.to_string(),
    }
}

impl ChainReader for AlloyChainClient {
    async fn get_balance(
        &self,
        chain: Chain,
        owner: Address,
        token: &'static TokenConfig,
    ) -> Result<U256, ChainError> {
        let provider = self.provider(chain)?;
        if token.native {
            return provider
                .get_balance(owner)
                .await
                .map_err(|err| provider_error(chain, err));
        }
        IERC20::new(token.address, provider.clone())
            .balanceOf(owner)
            .call()
            .await
            .map_err(|err| provider_error(chain, err))
    }

    async fn quote(
        &self,
        chain: Chain,
        token_in: &'static TokenConfig,
        token_out: &'static TokenConfig,
        amount_in: U256,
    ) -> Result<U256, ChainError> {
        let provider = self.provider(chain)?;
        let dex = chain.config().uniswap;
        let fee = U24::try_from(dex.fee)
            .map_err(|_| provider_error(chain, format!("fee tier {} out of range", dex.fee)))?;
        IQuoter::new(dex.quoter, provider.clone())
            .quoteExactInputSingle(
                token_in.address,
                token_out.address,
                fee,
                amount_in,
                U160::ZERO,
            )
            .call()
            .await
            .map_err(|err| provider_error(chain, err))
    }

    async fn gas_data(&self, chain: Chain, owner: Address) -> Result<GasData, ChainError> {
        let rpc_url = self
            .rpc_urls
            .get(&chain)
            .ok_or(ChainError::MissingRpcUrl(chain))?;
        fetch_gas_data(&self.http, rpc_url, chain.config().chain_id, owner)
            .await
            .map_err(|source| ChainError::Gas { chain, source })
    }
}

impl ChainWriter for AlloyChainClient {
    async fn send_raw_transaction(&self, chain: Chain, signed: Bytes) -> Result<TxHash, ChainError> {
        let pending = self
            .provider(chain)?
            .send_raw_transaction(&signed)
            .await
            .map_err(|err| provider_error(chain, err))?;
        Ok(*pending.tx_hash())
    }
}

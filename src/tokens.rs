use std::fmt;
use std::str::FromStr;

use alloy::primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Symbol every portfolio value is quoted against.
pub const QUOTE_SYMBOL: &str = "USDC";
pub const NATIVE_SYMBOL: &str = "ETH";
pub const WRAPPED_NATIVE_SYMBOL: &str = "WETH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Optimism,
    Arbitrum,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Optimism, Chain::Arbitrum];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimism => "optimism",
            Self::Arbitrum => "arbitrum",
        }
    }

    pub fn config(self) -> &'static ChainConfig {
        match self {
            Self::Optimism => &OPTIMISM,
            Self::Arbitrum => &ARBITRUM,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownChain(pub String);

impl fmt::Display for UnknownChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown chain: {}", self.0)
    }
}

impl std::error::Error for UnknownChain {}

impl FromStr for Chain {
    type Err = UnknownChain;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "optimism" | "op" => Ok(Self::Optimism),
            "arbitrum" | "arb" => Ok(Self::Arbitrum),
            _ => Err(UnknownChain(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenConfig {
    pub symbol: &'static str,
    pub name: &'static str,
    pub address: Address,
    pub decimals: u8,
    /// Held as the chain's native coin; `address` is the wrapped contract used for swaps.
    pub native: bool,
}

/// Uniswap V3 routing parameters for a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DexConfig {
    pub quoter: Address,
    pub swap_router: Address,
    pub fee: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct ChainConfig {
    pub chain: Chain,
    pub chain_id: u64,
    pub rpc_url: &'static str,
    pub explorer: &'static str,
    pub tokens: &'static [TokenConfig],
    pub uniswap: DexConfig,
}

impl ChainConfig {
    pub fn token(&self, symbol: &str) -> Option<&'static TokenConfig> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }

    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("https://{}/tx/{}", self.explorer, tx_hash)
    }
}

pub static OPTIMISM: ChainConfig = ChainConfig {
    chain: Chain::Optimism,
    chain_id: 10,
    rpc_url: "https://mainnet.optimism.io",
    explorer: "optimistic.etherscan.io",
    tokens: &[
        TokenConfig {
            symbol: "OP",
            name: "Optimism",
            address: address!("4200000000000000000000000000000000000042"),
            decimals: 18,
            native: false,
        },
        TokenConfig {
            symbol: "ETH",
            name: "Ether",
            address: address!("4200000000000000000000000000000000000006"),
            decimals: 18,
            native: true,
        },
        TokenConfig {
            symbol: "WETH",
            name: "Wrapped Ether",
            address: address!("4200000000000000000000000000000000000006"),
            decimals: 18,
            native: false,
        },
        TokenConfig {
            symbol: "USDC",
            name: "USD Coin",
            address: address!("0b2c639c533813f4aa9d7837caf62653d097ff85"),
            decimals: 6,
            native: false,
        },
        TokenConfig {
            symbol: "DAI",
            name: "Dai Stablecoin",
            address: address!("da10009cbd5d07dd0cecc66161fc93d7c9000da1"),
            decimals: 18,
            native: false,
        },
        TokenConfig {
            symbol: "WBTC",
            name: "Wrapped BTC",
            address: address!("68f180fcce6836688e9084f035309e29bf0a2095"),
            decimals: 8,
            native: false,
        },
    ],
    uniswap: DexConfig {
        quoter: address!("b27308f9f90d607463bb33ea1bebb41c27ce5ab6"),
        swap_router: address!("e592427a0aece92de3edee1f18e0157c05861564"),
        fee: 3000,
    },
};

pub static ARBITRUM: ChainConfig = ChainConfig {
    chain: Chain::Arbitrum,
    chain_id: 42161,
    rpc_url: "https://arbitrum.llamarpc.com",
    explorer: "arbiscan.io",
    tokens: &[
        TokenConfig {
            symbol: "ETH",
            name: "Ether",
            address: address!("82af49447d8a07e3bd95bd0d56f35241523fbab1"),
            decimals: 18,
            native: true,
        },
        TokenConfig {
            symbol: "USDC",
            name: "USD Coin",
            address: address!("af88d065e77c8cc2239327c5edb3a432268e5831"),
            decimals: 6,
            native: false,
        },
        TokenConfig {
            symbol: "DAI",
            name: "Dai Stablecoin",
            address: address!("da10009cbd5d07dd0cecc66161fc93d7c9000da1"),
            decimals: 18,
            native: false,
        },
        TokenConfig {
            symbol: "WBTC",
            name: "Wrapped BTC",
            address: address!("2f2a2543b76a4166549f7aab2e75bef0aefc5b0f"),
            decimals: 8,
            native: false,
        },
    ],
    uniswap: DexConfig {
        quoter: address!("b27308f9f90d607463bb33ea1bebb41c27ce5ab6"),
        swap_router: address!("68b3465833fb72a70ecdf485e0e4c7bd8665fc45"),
        fee: 3000,
    },
};

pub fn token_config(chain: Chain, symbol: &str) -> Option<&'static TokenConfig> {
    chain.config().token(symbol)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_chain_quotes_in_usdc() {
        for chain in Chain::ALL {
            let usdc = token_config(chain, QUOTE_SYMBOL).expect("usdc should be listed");
            assert_eq!(usdc.decimals, 6, "usdc on {chain} must use 6 decimals");
        }
    }

    #[test]
    fn native_eth_swaps_through_wrapped_contract() {
        let eth = token_config(Chain::Optimism, NATIVE_SYMBOL).expect("eth listed");
        let weth = token_config(Chain::Optimism, WRAPPED_NATIVE_SYMBOL).expect("weth listed");
        assert!(eth.native);
        assert!(!weth.native);
        assert_eq!(eth.address, weth.address);
    }

    #[test]
    fn chain_round_trips_through_str_and_serde() {
        for chain in Chain::ALL {
            assert_eq!(chain.as_str().parse::<Chain>(), Ok(chain));
            let json = serde_json::to_string(&chain).expect("chain should serialize");
            assert_eq!(json, format!("\"{}\"", chain.as_str()));
        }
        assert!("polygon".parse::<Chain>().is_err());
    }

    #[test]
    fn chain_ids_and_explorer_links() {
        assert_eq!(Chain::Optimism.config().chain_id, 10);
        assert_eq!(Chain::Arbitrum.config().chain_id, 42161);
        assert_eq!(
            Chain::Arbitrum.config().explorer_tx_url("0xabc"),
            "https://arbiscan.io/tx/0xabc"
        );
    }

    #[test]
    fn unknown_symbol_is_absent() {
        assert!(token_config(Chain::Arbitrum, "OP").is_none());
    }
}

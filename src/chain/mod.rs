use std::fmt;
use std::future::Future;

use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, Bytes, TxHash, U256};
use serde::{Deserialize, Serialize};

use crate::execution::gas::GasDataError;
use crate::tokens::{Chain, TokenConfig};

pub mod rpc;
pub mod signer;

pub use rpc::AlloyChainClient;
pub use signer::{LocalSigner, SignerError};

/// Fee and nonce snapshot for one chain. Individual fee lookups that fail are
/// zeroed and reported in `errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GasData {
    pub chain_id: u64,
    pub gas_price: u128,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub nonce: u64,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Read side of a chain: balances, DEX quotes and fee data.
pub trait ChainReader {
    /// Native balance for native tokens, ERC20 `balanceOf` otherwise.
    fn get_balance(
        &self,
        chain: Chain,
        owner: Address,
        token: &'static TokenConfig,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    /// Exact-input quote in `token_out` smallest units.
    fn quote(
        &self,
        chain: Chain,
        token_in: &'static TokenConfig,
        token_out: &'static TokenConfig,
        amount_in: U256,
    ) -> impl Future<Output = Result<U256, ChainError>> + Send;

    fn gas_data(
        &self,
        chain: Chain,
        owner: Address,
    ) -> impl Future<Output = Result<GasData, ChainError>> + Send;
}

pub trait ChainWriter {
    fn send_raw_transaction(
        &self,
        chain: Chain,
        signed: Bytes,
    ) -> impl Future<Output = Result<TxHash, ChainError>> + Send;
}

/// Signs EIP-1559 transactions. `sig_name` labels the signature for signers
/// that track requests by name.
pub trait RemoteSigner {
    fn address(&self) -> Address;

    fn sign_transaction(
        &self,
        tx: TxEip1559,
        sig_name: &str,
    ) -> impl Future<Output = Result<Bytes, SignerError>> + Send;
}

#[derive(Debug)]
pub enum ChainError {
    Provider { chain: Chain, message: String },
    Gas { chain: Chain, source: GasDataError },
    MissingRpcUrl(Chain),
    InvalidRpcUrl { chain: Chain, raw: String },
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Provider { chain, message } => write!(f, "{chain} provider error: {message}"),
            Self::Gas { chain, source } => write!(f, "{chain} gas data error: {source}"),
            Self::MissingRpcUrl(chain) => write!(f, "no rpc url configured for {chain}"),
            Self::InvalidRpcUrl { chain, raw } => write!(f, "invalid rpc url for {chain}: {raw}"),
        }
    }
}

impl std::error::Error for ChainError {}

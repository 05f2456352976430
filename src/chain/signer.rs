use std::fmt;

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, Bytes};
use alloy::signers::local::PrivateKeySigner;

use super::RemoteSigner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignerError {
    InvalidKey(String),
    Signing { sig_name: String, message: String },
}

impl fmt::Display for SignerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey(message) => write!(f, "invalid private key: {message}"),
            Self::Signing { sig_name, message } => {
                write!(f, "failed to sign {sig_name}: {message}")
            }
        }
    }
}

impl std::error::Error for SignerError {}

/// In-process key. Produces EIP-2718 encoded signed envelopes.
#[derive(Clone)]
pub struct LocalSigner {
    inner: PrivateKeySigner,
}

impl LocalSigner {
    pub fn from_private_key(raw: &str) -> Result<Self, SignerError> {
        let trimmed = raw.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let inner = hex
            .parse::<PrivateKeySigner>()
            .map_err(|err| SignerError::InvalidKey(err.to_string()))?;
        Ok(Self { inner })
    }
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.inner.address())
            .finish()
    }
}

impl RemoteSigner for LocalSigner {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_transaction(&self, tx: TxEip1559, sig_name: &str) -> Result<Bytes, SignerError> {
        let mut tx = tx;
        let signature = self
            .inner
            .sign_transaction_sync(&mut tx)
            .map_err(|err| SignerError::Signing {
                sig_name: sig_name.to_string(),
                message: err.to_string(),
            })?;
        tracing::debug!(sig_name, nonce = tx.nonce, chain_id = tx.chain_id, "signed transaction");
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        Ok(Bytes::from(envelope.encoded_2718()))
    }
}

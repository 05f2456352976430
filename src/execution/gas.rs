use std::fmt;
use std::time::Duration;

use alloy::primitives::Address;
use serde_json::Value;

use crate::chain::GasData;

const GAS_RPC_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasDataError(String);

impl GasDataError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl fmt::Display for GasDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for GasDataError {}

pub fn build_gas_rpc_client() -> Result<reqwest::Client, GasDataError> {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(GAS_RPC_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| GasDataError::new(format!("failed to build rpc client: {e}")))
}

/// `max_priority = base / 4`, `max_fee = base * 2`.
pub fn derive_eip1559_fees(base_fee: u128) -> (u128, u128) {
    (base_fee / 4, base_fee.saturating_mul(2))
}

/// Multiplies a fee by `pct / 100`, saturating.
pub fn scale_fee(fee: u128, pct: u64) -> u128 {
    fee.saturating_mul(u128::from(pct)) / 100
}

/// Base fee from `eth_feeHistory(1, latest)`, gas price from `eth_gasPrice`
/// and the pending nonce. Fee lookups that fail are zeroed and listed in
/// `errors`; a nonce failure is an error.
pub async fn fetch_gas_data(
    client: &reqwest::Client,
    rpc_url: &str,
    chain_id: u64,
    owner: Address,
) -> Result<GasData, GasDataError> {
    if rpc_url.trim().is_empty() {
        return Err(GasDataError::new("rpc url is empty"));
    }

    let mut errors = Vec::new();

    let base_fee = match rpc_call(
        client,
        rpc_url,
        "eth_feeHistory",
        serde_json::json!(["0x1", "latest", []]),
    )
    .await
    .and_then(|result| parse_fee_history_base_fee(&result))
    {
        Ok(base_fee) => base_fee,
        Err(err) => {
            tracing::warn!(chain_id, error = %err, "eth_feeHistory failed; base fee zeroed");
            errors.push(format!("baseFee: {err}"));
            0
        }
    };
    let (max_priority_fee_per_gas, max_fee_per_gas) = derive_eip1559_fees(base_fee);

    let gas_price = match rpc_call(client, rpc_url, "eth_gasPrice", serde_json::json!([]))
        .await
        .and_then(|result| parse_hex_u128(&result))
    {
        Ok(gas_price) => gas_price,
        Err(err) => {
            tracing::warn!(chain_id, error = %err, "eth_gasPrice failed; gas price zeroed");
            errors.push(format!("gasPrice: {err}"));
            0
        }
    };

    let nonce_result = rpc_call(
        client,
        rpc_url,
        "eth_getTransactionCount",
        serde_json::json!([owner.to_string(), "pending"]),
    )
    .await?;
    let nonce = u64::try_from(parse_hex_u128(&nonce_result)?)
        .map_err(|_| GasDataError::new("nonce does not fit into u64"))?;

    Ok(GasData {
        chain_id,
        gas_price,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        nonce,
        errors,
    })
}

async fn rpc_call(
    client: &reqwest::Client,
    rpc_url: &str,
    method: &str,
    params: Value,
) -> Result<Value, GasDataError> {
    let payload = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });

    let response = client
        .post(rpc_url)
        .json(&payload)
        .send()
        .await
        .map_err(|e| GasDataError::new(format!("{method} request failed: {e}")))?
        .error_for_status()
        .map_err(|e| GasDataError::new(format!("{method} bad http status: {e}")))?;

    let body: Value = response
        .json()
        .await
        .map_err(|e| GasDataError::new(format!("failed to decode {method} body: {e}")))?;
    take_result(body, method)
}

fn take_result(mut body: Value, method: &str) -> Result<Value, GasDataError> {
    if let Some(err) = body.get("error") {
        return Err(GasDataError::new(format!("{method} returned error: {err}")));
    }
    match body.get_mut("result").map(Value::take) {
        Some(result) if !result.is_null() => Ok(result),
        _ => Err(GasDataError::new(format!("missing {method} result"))),
    }
}

fn parse_fee_history_base_fee(result: &Value) -> Result<u128, GasDataError> {
    let first = result
        .get("baseFeePerGas")
        .and_then(Value::as_array)
        .and_then(|fees| fees.first())
        .ok_or_else(|| GasDataError::new("fee history missing baseFeePerGas"))?;
    parse_hex_u128(first)
}

fn parse_hex_u128(value: &Value) -> Result<u128, GasDataError> {
    let raw = value
        .as_str()
        .ok_or_else(|| GasDataError::new(format!("expected hex quantity, got {value}")))?;
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| GasDataError::new(format!("hex quantity missing 0x prefix: {raw}")))?;
    if digits.is_empty() {
        return Err(GasDataError::new("empty hex quantity"));
    }
    u128::from_str_radix(digits, 16)
        .map_err(|e| GasDataError::new(format!("invalid hex quantity {raw}: {e}")))
}

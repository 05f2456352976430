use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::portfolio::{PortfolioItem, StrategyConfig, with_percentages};
use crate::tokens::Chain;

pub const DEFAULT_PREFERENCES_PATH: &str = "config/preferences.json";
pub const DEFAULT_EXECUTE_SUBMIT: bool = false;
pub const DEFAULT_WRAP_PERCENTAGE: u64 = 50;
pub const DEFAULT_UNWRAP_PERCENTAGE: u64 = 100;

const ALLOCATION_SUM_TOLERANCE: f64 = 1e-6;

/// Execution knobs shared by the strategies and the trade executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeConfig {
    #[serde(rename = "SLIPPAGE_BPS")]
    pub slippage_bps: u32,
    #[serde(rename = "MAX_SLIPPAGE_BPS")]
    pub max_slippage_bps: u32,
    /// Percentage points.
    #[serde(rename = "MAXIMUM_PRICE_IMPACT")]
    pub maximum_price_impact_pct: f64,
    #[serde(rename = "GAS_ESTIMATE_BASE")]
    pub gas_estimate_base: u64,
    /// Fee multiplier in percent; 1000 means x10.
    #[serde(rename = "GAS_AGGRESSIVENESS_PCT")]
    pub gas_aggressiveness_pct: u64,
    #[serde(rename = "APPROVAL_BUFFER_PCT")]
    pub approval_buffer_pct: u64,
    #[serde(rename = "SWAP_DEADLINE_SECS")]
    pub swap_deadline_secs: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            slippage_bps: 500,
            max_slippage_bps: 500,
            maximum_price_impact_pct: 0.1,
            gas_estimate_base: 300_000,
            gas_aggressiveness_pct: 1_000,
            approval_buffer_pct: 110,
            swap_deadline_secs: 300,
        }
    }
}

impl TradeConfig {
    /// Defaults overridden by `SLIPPAGE_BPS`, `MAXIMUM_PRICE_IMPACT` and
    /// `GAS_AGGRESSIVENESS_PCT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            slippage_bps: parse_env("SLIPPAGE_BPS", defaults.slippage_bps)?,
            maximum_price_impact_pct: parse_env(
                "MAXIMUM_PRICE_IMPACT",
                defaults.maximum_price_impact_pct,
            )?,
            gas_aggressiveness_pct: parse_env(
                "GAS_AGGRESSIVENESS_PCT",
                defaults.gas_aggressiveness_pct,
            )?,
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_slippage_bps > 10_000 {
            return Err(ConfigError::InvalidTradeConfig(format!(
                "max_slippage_bps {} exceeds 10000",
                self.max_slippage_bps
            )));
        }
        if self.slippage_bps > self.max_slippage_bps {
            return Err(ConfigError::InvalidTradeConfig(format!(
                "slippage_bps {} exceeds max_slippage_bps {}",
                self.slippage_bps, self.max_slippage_bps
            )));
        }
        if !self.maximum_price_impact_pct.is_finite() || self.maximum_price_impact_pct < 0.0 {
            return Err(ConfigError::InvalidTradeConfig(format!(
                "maximum_price_impact_pct must be finite and non-negative, got {}",
                self.maximum_price_impact_pct
            )));
        }
        if self.gas_aggressiveness_pct == 0 {
            return Err(ConfigError::InvalidTradeConfig(
                "gas_aggressiveness_pct must be positive".to_string(),
            ));
        }
        if self.approval_buffer_pct < 100 {
            return Err(ConfigError::InvalidTradeConfig(format!(
                "approval_buffer_pct {} would approve less than the swap amount",
                self.approval_buffer_pct
            )));
        }
        Ok(())
    }
}

/// Process-level settings for the binaries.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub private_key: Option<String>,
    pub wallet: Option<String>,
    pub rpc_optimism: String,
    pub rpc_arbitrum: String,
    pub execute_submit: bool,
    pub strategy: String,
    pub preferences_path: String,
    pub portfolio_file: Option<String>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            private_key: optional_env("PRIVATE_KEY"),
            wallet: optional_env("WALLET"),
            rpc_optimism: optional_env("RPC_OPTIMISM")
                .unwrap_or_else(|| Chain::Optimism.config().rpc_url.to_string()),
            rpc_arbitrum: optional_env("RPC_ARBITRUM")
                .unwrap_or_else(|| Chain::Arbitrum.config().rpc_url.to_string()),
            execute_submit: parse_env_bool("EXECUTE_SUBMIT", DEFAULT_EXECUTE_SUBMIT)?,
            strategy: optional_env("REBALANCE_STRATEGY")
                .unwrap_or_else(|| "OPTIMIZED_PAIRING".to_string()),
            preferences_path: optional_env("PREFERENCES_PATH")
                .unwrap_or_else(|| DEFAULT_PREFERENCES_PATH.to_string()),
            portfolio_file: optional_env("PORTFOLIO_FILE"),
        })
    }

    pub fn rpc_url(&self, chain: Chain) -> &str {
        match chain {
            Chain::Optimism => &self.rpc_optimism,
            Chain::Arbitrum => &self.rpc_arbitrum,
        }
    }

    pub fn require_private_key(&self) -> Result<&str, ConfigError> {
        self.private_key
            .as_deref()
            .ok_or(ConfigError::MissingEnv("PRIVATE_KEY"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WethMode {
    Wrap,
    Unwrap,
}

impl WethMode {
    pub fn default_percentage(self) -> u64 {
        match self {
            Self::Wrap => DEFAULT_WRAP_PERCENTAGE,
            Self::Unwrap => DEFAULT_UNWRAP_PERCENTAGE,
        }
    }
}

impl FromStr for WethMode {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "wrap" => Ok(Self::Wrap),
            "unwrap" => Ok(Self::Unwrap),
            _ => Err(ConfigError::InvalidEnvValue {
                name: "WETH_MODE",
                value: raw.to_string(),
            }),
        }
    }
}

/// `WETH_MODE` plus `WETH_PERCENTAGE` (1..=100, defaulting per mode).
pub fn weth_settings_from_env() -> Result<(WethMode, u64), ConfigError> {
    let mode = match optional_env("WETH_MODE") {
        Some(raw) => raw.parse::<WethMode>()?,
        None => WethMode::Wrap,
    };
    let percentage = parse_env("WETH_PERCENTAGE", mode.default_percentage())?;
    if percentage == 0 || percentage > 100 {
        return Err(ConfigError::InvalidEnvValue {
            name: "WETH_PERCENTAGE",
            value: percentage.to_string(),
        });
    }
    Ok((mode, percentage))
}

/// Reads persisted preferences, falling back to the default allocation when
/// the file is missing or malformed.
pub fn load_strategy_config(path: impl AsRef<Path>) -> StrategyConfig {
    let path = path.as_ref();
    match read_strategy_config(path) {
        Ok(config) => {
            let sum: f64 = config.target_allocations.values().sum();
            if (sum - 1.0).abs() > ALLOCATION_SUM_TOLERANCE {
                tracing::warn!(
                    path = %path.display(),
                    sum,
                    "target allocations do not sum to 1"
                );
            }
            config
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to load preferences; using default strategy config"
            );
            StrategyConfig::default()
        }
    }
}

fn read_strategy_config(path: &Path) -> Result<StrategyConfig, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let config: StrategyConfig = serde_json::from_str(&raw)?;
    if config
        .target_allocations
        .values()
        .any(|fraction| !fraction.is_finite() || *fraction < 0.0 || *fraction > 1.0)
    {
        return Err(ConfigError::InvalidPreferences(
            "target allocations must be fractions in [0, 1]".to_string(),
        ));
    }
    if !config.threshold_percentage.is_finite() || config.threshold_percentage < 0.0 {
        return Err(ConfigError::InvalidPreferences(format!(
            "threshold_percentage must be non-negative, got {}",
            config.threshold_percentage
        )));
    }
    Ok(config)
}

/// Offline snapshot: a JSON array of portfolio items. Percentages are
/// recomputed from the USD values.
pub fn read_portfolio_file(path: impl AsRef<Path>) -> Result<Vec<PortfolioItem>, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let items: Vec<PortfolioItem> = serde_json::from_str(&raw)?;
    Ok(with_percentages(items))
}

#[derive(Debug)]
pub enum ConfigError {
    MissingEnv(&'static str),
    InvalidEnvValue { name: &'static str, value: String },
    InvalidTradeConfig(String),
    InvalidPreferences(String),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnv(name) => write!(f, "required env var {name} is not set"),
            Self::InvalidEnvValue { name, value } => write!(f, "invalid env var {name}={value}"),
            Self::InvalidTradeConfig(message) => write!(f, "invalid trade config: {message}"),
            Self::InvalidPreferences(message) => write!(f, "invalid preferences: {message}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    let Some(raw) = optional_env(name) else {
        return Ok(default);
    };
    raw.parse::<T>()
        .map_err(|_| ConfigError::InvalidEnvValue { name, value: raw })
}

fn parse_env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = optional_env(name) else {
        return Ok(default);
    };
    parse_bool_literal(&raw).ok_or(ConfigError::InvalidEnvValue { name, value: raw })
}

fn parse_bool_literal(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

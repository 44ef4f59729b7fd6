//! Scanner configuration loaded from TOML

use limit_order_core::{
    order::pubkey_serde, Pubkey, StaticTokenRegistry, TokenInfo, CHAOS_MINT, LIMIT_ORDER_PROGRAM_ID,
    LOGOS_MINT,
};
use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentLevel;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use validator::Validate;

use crate::error::{ScannerError, ScannerResult};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    /// Limit order program owning the order accounts
    #[serde(with = "pubkey_serde")]
    pub program_id: Pubkey,

    #[validate]
    pub rpc: RpcConfig,

    /// Tokens whose orders are scanned
    #[validate]
    pub tokens: Vec<TrackedToken>,

    #[validate]
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RpcConfig {
    #[validate(url)]
    pub url: String,
    pub commitment: String,
    #[validate(range(min = 1, max = 300))]
    pub timeout_secs: u64,
}

/// Token to scan for
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackedToken {
    #[validate(length(min = 1, max = 16))]
    pub symbol: String,

    #[serde(with = "pubkey_serde")]
    pub mint: Pubkey,

    /// Known decimals; looked up over RPC when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(max = 28))]
    pub decimals: Option<u8>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Retry configuration for RPC fetches
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    #[validate(range(max = 10))]
    pub max_retries: u32,

    /// Base delay between retries in milliseconds
    #[validate(range(min = 1))]
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Include the full field dump of every order
    #[serde(default)]
    pub detailed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Emit JSON log lines
    #[serde(default)]
    pub json: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            program_id: LIMIT_ORDER_PROGRAM_ID,
            rpc: RpcConfig::default(),
            tokens: vec![
                TrackedToken::new("CHAOS", CHAOS_MINT, Some(6)),
                TrackedToken::new("LOGOS", LOGOS_MINT, Some(6)),
            ],
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.mainnet-beta.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl TrackedToken {
    pub fn new(symbol: impl Into<String>, mint: Pubkey, decimals: Option<u8>) -> Self {
        Self {
            symbol: symbol.into(),
            mint,
            decimals,
            enabled: true,
        }
    }
}

impl RpcConfig {
    pub fn commitment_level(&self) -> ScannerResult<CommitmentLevel> {
        CommitmentLevel::from_str(&self.commitment).map_err(|_| {
            ScannerError::Configuration(format!(
                "Invalid commitment '{}', expected processed, confirmed or finalized",
                self.commitment
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RetryConfig {
    /// Calculate delay for retry attempt
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        if attempt == 0 {
            return self.base_delay_ms;
        }

        let exponential_delay =
            self.base_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        (exponential_delay as u64).min(self.max_delay_ms)
    }

    fn check(&self) -> ScannerResult<()> {
        if self.max_delay_ms < self.base_delay_ms {
            return Err(ScannerError::Configuration(format!(
                "max_delay_ms ({}) must be at least base_delay_ms ({})",
                self.max_delay_ms, self.base_delay_ms
            )));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(ScannerError::Configuration(format!(
                "backoff_multiplier ({}) must be at least 1.0",
                self.backoff_multiplier
            )));
        }
        Ok(())
    }
}

impl ScannerConfig {
    /// Load and validate configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> ScannerResult<Self> {
        let config = Self::load(path)?;
        config.check()?;
        Ok(config)
    }

    /// Parse configuration from file without validating it, so command
    /// line overrides can be applied before [`ScannerConfig::check`]
    pub fn load(path: impl AsRef<Path>) -> ScannerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScannerError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> ScannerResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Field-level validation plus cross-field checks
    pub fn check(&self) -> ScannerResult<()> {
        self.validate()?;
        self.rpc.commitment_level()?;
        self.retry.check()?;

        if self.enabled_tokens().is_empty() {
            return Err(ScannerError::Configuration(
                "At least one enabled token is required".to_string(),
            ));
        }

        let mut mints: Vec<_> = self.tokens.iter().map(|t| t.mint).collect();
        mints.sort();
        if mints.windows(2).any(|w| w[0] == w[1]) {
            return Err(ScannerError::Configuration(
                "Tokens must have distinct mints".to_string(),
            ));
        }

        Ok(())
    }

    pub fn enabled_tokens(&self) -> Vec<&TrackedToken> {
        self.tokens.iter().filter(|t| t.enabled).collect()
    }

    /// Built-in tokens overlaid with configured tokens that declare decimals
    pub fn static_registry(&self) -> StaticTokenRegistry {
        let mut registry = StaticTokenRegistry::well_known();
        for token in &self.tokens {
            if let Some(decimals) = token.decimals {
                registry.insert(TokenInfo::new(token.symbol.clone(), token.mint, decimals));
            }
        }
        registry
    }
}

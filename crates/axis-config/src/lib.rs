//! Configuration module for the AXIS transaction lifecycle.
//!
//! This module provides the configuration structures for the chain client, the
//! identifier resolver, the chain scanner and transaction submission defaults.
//! Configuration is read from TOML, with `${VAR}` and `${VAR:-default}`
//! environment substitution, and validated on parse.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure.
///
/// Every section except `[chain]` can be omitted and falls back to defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Chain query client settings.
	pub chain: ChainConfig,
	/// Identifier resolution timing.
	#[serde(default)]
	pub resolver: ResolverConfig,
	/// Chain scanner bounds.
	#[serde(default)]
	pub scanner: ScannerConfig,
	/// Submission defaults.
	#[serde(default)]
	pub transaction: TransactionConfig,
}

/// Chain query client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChainConfig {
	/// Base URL of the explorer REST API, without the network segment.
	pub api_url: String,
	/// Network path segment, e.g. `testnet` or `mainnet`.
	#[serde(default = "default_network")]
	pub network: String,
	/// Per-request HTTP timeout in seconds.
	#[serde(default = "default_request_timeout")]
	pub request_timeout_seconds: u64,
}

fn default_network() -> String {
	"testnet".to_string()
}

fn default_request_timeout() -> u64 {
	15
}

/// Identifier resolution timing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
	/// Sleep between wallet polls and between scans.
	#[serde(default = "default_poll_interval")]
	pub poll_interval_seconds: u64,
	/// Upper bound on a whole resolution.
	#[serde(default = "default_max_wait")]
	pub max_wait_seconds: u64,
	/// Extra scans attempted after the wallet reports completion without an id.
	#[serde(default = "default_confirm_scan_attempts")]
	pub confirm_scan_attempts: u32,
}

fn default_poll_interval() -> u64 {
	3
}

fn default_max_wait() -> u64 {
	120
}

fn default_confirm_scan_attempts() -> u32 {
	3
}

impl Default for ResolverConfig {
	fn default() -> Self {
		Self {
			poll_interval_seconds: default_poll_interval(),
			max_wait_seconds: default_max_wait(),
			confirm_scan_attempts: default_confirm_scan_attempts(),
		}
	}
}

impl ResolverConfig {
	pub fn poll_interval(&self) -> Duration {
		Duration::from_secs(self.poll_interval_seconds)
	}

	pub fn max_wait(&self) -> Duration {
		Duration::from_secs(self.max_wait_seconds)
	}
}

/// Chain scanner bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScannerConfig {
	/// Largest block span the scanner agrees to walk.
	#[serde(default = "default_max_window")]
	pub max_window_blocks: u64,
	/// Blocks scanned below the submission height to absorb height skew.
	#[serde(default = "default_lookback")]
	pub lookback_blocks: u64,
}

fn default_max_window() -> u64 {
	100
}

fn default_lookback() -> u64 {
	2
}

impl Default for ScannerConfig {
	fn default() -> Self {
		Self {
			max_window_blocks: default_max_window(),
			lookback_blocks: default_lookback(),
		}
	}
}

/// Submission defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionConfig {
	/// Fee in microcredits used when the caller does not pass one.
	#[serde(default = "default_fee")]
	pub default_fee: u64,
	/// Pay fees from a private record instead of the public balance.
	#[serde(default)]
	pub fee_private: bool,
	/// Simulate the lifecycle without touching the wallet or the chain.
	#[serde(default)]
	pub dry_run: bool,
}

/// Returns the default fee: 0.5 credits.
fn default_fee() -> u64 {
	500_000
}

impl Default for TransactionConfig {
	fn default() -> Self {
		Self {
			default_fee: default_fee(),
			fee_private: false,
			dry_run: false,
		}
	}
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 256 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving environment variables.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path.as_ref()).await?;
		content.parse()
	}

	/// Validates the configuration.
	///
	/// - Chain API URL and network must be set
	/// - Poll interval must be positive and fit at least once in the max wait
	/// - Scanner window must be between 1 and 10000 blocks
	fn validate(&self) -> Result<(), ConfigError> {
		if self.chain.api_url.trim().is_empty() {
			return Err(ConfigError::Validation(
				"chain.api_url cannot be empty".into(),
			));
		}
		if !self.chain.api_url.starts_with("http://") && !self.chain.api_url.starts_with("https://")
		{
			return Err(ConfigError::Validation(format!(
				"chain.api_url must be an http(s) URL, got '{}'",
				self.chain.api_url
			)));
		}
		if self.chain.network.trim().is_empty() {
			return Err(ConfigError::Validation(
				"chain.network cannot be empty".into(),
			));
		}
		if self.chain.request_timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"chain.request_timeout_seconds must be greater than 0".into(),
			));
		}

		if self.resolver.poll_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"resolver.poll_interval_seconds must be greater than 0".into(),
			));
		}
		if self.resolver.max_wait_seconds < self.resolver.poll_interval_seconds {
			return Err(ConfigError::Validation(format!(
				"resolver.max_wait_seconds ({}) must be at least one poll interval ({})",
				self.resolver.max_wait_seconds, self.resolver.poll_interval_seconds
			)));
		}

		if self.scanner.max_window_blocks == 0 {
			return Err(ConfigError::Validation(
				"scanner.max_window_blocks must be at least 1".into(),
			));
		}
		if self.scanner.max_window_blocks > 10_000 {
			return Err(ConfigError::Validation(
				"scanner.max_window_blocks cannot exceed 10000".into(),
			));
		}

		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

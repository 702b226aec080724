//! Chain query module for the AXIS transaction lifecycle.
//!
//! This module provides a read-only view of the network: latest height,
//! blocks by height and transaction lookups. It also hosts the bounded chain
//! scanner the identifier resolver falls back to when the wallet cannot name
//! the canonical transaction identifier itself.

use async_trait::async_trait;
use axis_types::ChainBlock;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod explorer;
	pub mod memory;
}

pub mod scanner;

pub use scanner::ChainScanner;

/// Errors that can occur while querying the chain.
#[derive(Debug, Error)]
pub enum ChainError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The requested block or transaction does not exist (yet).
	#[error("Not found: {0}")]
	NotFound(String),
	/// The node answered with a payload that could not be decoded.
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the read-only interface to the network.
///
/// Implementations are constructed once and shared by reference, so every
/// method takes `&self`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainQueryInterface: Send + Sync {
	/// Returns the height of the latest block.
	async fn latest_height(&self) -> Result<u64, ChainError>;

	/// Fetches the block at `height`.
	async fn block(&self, height: u64) -> Result<ChainBlock, ChainError>;

	/// Returns true once the network knows the transaction `id`.
	async fn transaction_exists(&self, id: &str) -> Result<bool, ChainError>;
}

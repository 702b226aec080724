//! Explorer REST client.
//!
//! Talks to an Aleo explorer API laid out as `{api_url}/{network}/...`:
//! `latest/height`, `block/{height}` and `transaction/{id}`.

use crate::{ChainError, ChainQueryInterface};
use async_trait::async_trait;
use axis_config::ChainConfig;
use axis_types::{ChainBlock, ChainTransaction};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Block payload as returned by the explorer. Only the fields the scanner
/// reads are modelled; everything else is ignored.
#[derive(Debug, Deserialize)]
struct BlockResponse {
	#[serde(default)]
	header: Option<BlockHeader>,
	#[serde(default)]
	transactions: Vec<ConfirmedTransaction>,
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
	metadata: BlockMetadata,
}

#[derive(Debug, Deserialize)]
struct BlockMetadata {
	height: u64,
}

#[derive(Debug, Deserialize)]
struct ConfirmedTransaction {
	transaction: TransactionBody,
}

#[derive(Debug, Deserialize)]
struct TransactionBody {
	id: String,
	#[serde(default)]
	execution: Option<Execution>,
}

#[derive(Debug, Deserialize)]
struct Execution {
	#[serde(default)]
	transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
struct Transition {
	program: String,
}

impl BlockResponse {
	fn into_block(self, requested_height: u64) -> ChainBlock {
		let height = self
			.header
			.map(|h| h.metadata.height)
			.unwrap_or(requested_height);
		let transactions = self
			.transactions
			.into_iter()
			.map(|confirmed| {
				let body = confirmed.transaction;
				let programs = body
					.execution
					.map(|e| e.transitions)
					.unwrap_or_default()
					.into_iter()
					.map(|t| t.program);
				ChainTransaction::new(body.id, programs)
			})
			.collect();
		ChainBlock {
			height,
			transactions,
		}
	}
}

/// Chain client backed by the explorer HTTP API.
pub struct ExplorerClient {
	client: reqwest::Client,
	base_url: String,
}

impl ExplorerClient {
	/// Creates a client for `api_url` scoped to `network`.
	pub fn new(api_url: &str, network: &str, timeout: Duration) -> Result<Self, ChainError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| ChainError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

		Ok(Self {
			client,
			base_url: format!("{}/{}", api_url.trim_end_matches('/'), network),
		})
	}

	pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
		Self::new(
			&config.api_url,
			&config.network,
			Duration::from_secs(config.request_timeout_seconds),
		)
	}

	async fn get(&self, path: &str) -> Result<reqwest::Response, ChainError> {
		let url = format!("{}/{}", self.base_url, path);
		self.client
			.get(&url)
			.send()
			.await
			.map_err(|e| ChainError::Network(format!("GET {} failed: {}", url, e)))
	}
}

#[async_trait]
impl ChainQueryInterface for ExplorerClient {
	async fn latest_height(&self) -> Result<u64, ChainError> {
		let response = self.get("latest/height").await?;
		if !response.status().is_success() {
			return Err(ChainError::Network(format!(
				"Latest height request returned {}",
				response.status()
			)));
		}
		response
			.json::<u64>()
			.await
			.map_err(|e| ChainError::InvalidResponse(format!("Bad height payload: {}", e)))
	}

	async fn block(&self, height: u64) -> Result<ChainBlock, ChainError> {
		let response = self.get(&format!("block/{}", height)).await?;
		match response.status() {
			StatusCode::NOT_FOUND => Err(ChainError::NotFound(format!("block {}", height))),
			status if !status.is_success() => Err(ChainError::Network(format!(
				"Block {} request returned {}",
				height, status
			))),
			_ => {
				let body = response.json::<BlockResponse>().await.map_err(|e| {
					ChainError::InvalidResponse(format!("Bad block {} payload: {}", height, e))
				})?;
				Ok(body.into_block(height))
			},
		}
	}

	async fn transaction_exists(&self, id: &str) -> Result<bool, ChainError> {
		let response = self.get(&format!("transaction/{}", id)).await?;
		match response.status() {
			StatusCode::NOT_FOUND => Ok(false),
			status if status.is_success() => Ok(true),
			status => Err(ChainError::Network(format!(
				"Transaction lookup returned {}",
				status
			))),
		}
	}
}

//! In-memory chain for tests and local runs.
//!
//! Blocks, the latest height and known transactions are set by the caller.
//! Failures can be injected per height, and every block fetch and
//! transaction lookup is recorded so callers can assert on access patterns.

use crate::{ChainError, ChainQueryInterface};
use async_trait::async_trait;
use axis_types::ChainBlock;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Default)]
struct ChainData {
	latest_height: u64,
	blocks: BTreeMap<u64, ChainBlock>,
	known_transactions: HashSet<String>,
	failing_heights: HashSet<u64>,
	fail_latest_height: bool,
	latest_height_delay: Option<Duration>,
	block_fetches: Vec<u64>,
	transaction_lookups: Vec<String>,
}

/// Chain client holding all state in memory.
#[derive(Default)]
pub struct MemoryChain {
	data: RwLock<ChainData>,
}

impl MemoryChain {
	/// Creates a chain whose latest block is `height`.
	pub fn at_height(height: u64) -> Self {
		Self {
			data: RwLock::new(ChainData {
				latest_height: height,
				..Default::default()
			}),
		}
	}

	pub async fn set_latest_height(&self, height: u64) {
		self.data.write().await.latest_height = height;
	}

	/// Stores a block and makes its transactions known. The latest height is
	/// raised to the block's height if it was below.
	pub async fn push_block(&self, block: ChainBlock) {
		let mut data = self.data.write().await;
		for tx in &block.transactions {
			data.known_transactions.insert(tx.canonical_id.clone());
		}
		data.latest_height = data.latest_height.max(block.height);
		data.blocks.insert(block.height, block);
	}

	/// Marks a transaction as known without placing it in a block.
	pub async fn add_transaction(&self, id: impl Into<String>) {
		self.data.write().await.known_transactions.insert(id.into());
	}

	/// Makes fetches of `height` fail with a network error.
	pub async fn fail_block(&self, height: u64) {
		self.data.write().await.failing_heights.insert(height);
	}

	pub async fn fail_latest_height(&self, fail: bool) {
		self.data.write().await.fail_latest_height = fail;
	}

	/// Makes every latest-height query take `delay` before answering.
	pub async fn delay_latest_height(&self, delay: Duration) {
		self.data.write().await.latest_height_delay = Some(delay);
	}

	/// Heights fetched so far, in call order.
	pub async fn block_fetches(&self) -> Vec<u64> {
		self.data.read().await.block_fetches.clone()
	}

	/// Transaction ids looked up so far, in call order.
	pub async fn transaction_lookups(&self) -> Vec<String> {
		self.data.read().await.transaction_lookups.clone()
	}
}

#[async_trait]
impl ChainQueryInterface for MemoryChain {
	async fn latest_height(&self) -> Result<u64, ChainError> {
		let delay = self.data.read().await.latest_height_delay;
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}

		let data = self.data.read().await;
		if data.fail_latest_height {
			return Err(ChainError::Network("latest height unavailable".into()));
		}
		Ok(data.latest_height)
	}

	async fn block(&self, height: u64) -> Result<ChainBlock, ChainError> {
		let mut data = self.data.write().await;
		data.block_fetches.push(height);

		if data.failing_heights.contains(&height) {
			return Err(ChainError::Network(format!("block {} unavailable", height)));
		}
		if height > data.latest_height {
			return Err(ChainError::NotFound(format!("block {}", height)));
		}

		Ok(data.blocks.get(&height).cloned().unwrap_or(ChainBlock {
			height,
			transactions: vec![],
		}))
	}

	async fn transaction_exists(&self, id: &str) -> Result<bool, ChainError> {
		let mut data = self.data.write().await;
		data.transaction_lookups.push(id.to_string());
		Ok(data.known_transactions.contains(id))
	}
}

//! Bounded block-range search for a program's transaction.
//!
//! The scanner walks from the latest block back to just below the submission
//! height, looking for the first transaction whose execution transitions
//! reference the target program. It refuses windows larger than its cap, and
//! a block that fails to load is skipped rather than aborting the scan.

use crate::{ChainError, ChainQueryInterface};
use axis_config::ScannerConfig;
use axis_types::truncate_id;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::instrument;

pub struct ChainScanner {
	chain: Arc<dyn ChainQueryInterface>,
	max_window_blocks: u64,
	lookback_blocks: u64,
}

impl ChainScanner {
	pub fn new(chain: Arc<dyn ChainQueryInterface>, config: &ScannerConfig) -> Self {
		Self {
			chain,
			max_window_blocks: config.max_window_blocks,
			lookback_blocks: config.lookback_blocks,
		}
	}

	/// Heights to visit for a scan starting at `from_height` with the chain at
	/// `latest_height`, or `None` when the window is empty or exceeds the cap.
	pub fn window(&self, from_height: u64, latest_height: u64) -> Option<RangeInclusive<u64>> {
		let start = from_height.saturating_sub(self.lookback_blocks);
		if latest_height < start {
			return None;
		}
		let blocks = latest_height - start + 1;
		if blocks > self.max_window_blocks {
			return None;
		}
		Some(start..=latest_height)
	}

	/// Searches recent blocks for a transaction touching `program_id`.
	///
	/// Returns the canonical id of the newest match, `Ok(None)` when nothing
	/// matched or the window was refused, and an error only when the latest
	/// height itself could not be read.
	#[instrument(skip(self), fields(program = %program_id))]
	pub async fn scan(&self, program_id: &str, from_height: u64) -> Result<Option<String>, ChainError> {
		let latest_height = self.chain.latest_height().await?;

		let Some(window) = self.window(from_height, latest_height) else {
			tracing::debug!(
				from_height,
				latest_height,
				max_window = self.max_window_blocks,
				"Scan window refused"
			);
			return Ok(None);
		};

		for height in window.rev() {
			let block = match self.chain.block(height).await {
				Ok(block) => block,
				Err(e) => {
					tracing::debug!(height, error = %e, "Skipping block");
					continue;
				},
			};

			if let Some(tx) = block.transactions.iter().find(|tx| tx.touches(program_id)) {
				tracing::info!(
					height,
					tx_id = %truncate_id(&tx.canonical_id),
					"Found program transaction"
				);
				return Ok(Some(tx.canonical_id.clone()));
			}
		}

		Ok(None)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::MockChainQueryInterface;
	use axis_types::{ChainBlock, ChainTransaction};
	use mockall::predicate::eq;
	use std::sync::Mutex;

	const PROGRAM: &str = "axis_lending_v2.aleo";

	fn scanner(mock: MockChainQueryInterface) -> ChainScanner {
		ChainScanner::new(Arc::new(mock), &ScannerConfig::default())
	}

	fn empty_block(height: u64) -> ChainBlock {
		ChainBlock {
			height,
			transactions: vec![],
		}
	}

	#[test]
	fn test_window_bounds() {
		let scanner = scanner(MockChainQueryInterface::new());
		assert_eq!(scanner.window(500, 510), Some(498..=510));
		assert_eq!(scanner.window(1, 5), Some(0..=5));
		assert_eq!(scanner.window(500, 497), None);
		// 100 blocks is the cap, 101 is refused
		assert_eq!(scanner.window(102, 199), Some(100..=199));
		assert_eq!(scanner.window(102, 200), None);
	}

	#[tokio::test]
	async fn test_returns_newest_match() {
		let mut mock = MockChainQueryInterface::new();
		mock.expect_latest_height().returning(|| Ok(105));
		mock.expect_block().returning(|height| {
			let transactions = match height {
				104 => vec![ChainTransaction::new("at1newer", [PROGRAM])],
				102 => vec![ChainTransaction::new("at1older", [PROGRAM])],
				_ => vec![ChainTransaction::new("at1other", ["credits.aleo"])],
			};
			Ok(ChainBlock {
				height,
				transactions,
			})
		});

		let found = scanner(mock).scan(PROGRAM, 100).await.unwrap();
		assert_eq!(found.as_deref(), Some("at1newer"));
	}

	#[tokio::test]
	async fn test_skips_failing_blocks() {
		let mut mock = MockChainQueryInterface::new();
		mock.expect_latest_height().returning(|| Ok(12));
		mock.expect_block()
			.with(eq(12))
			.returning(|_| Err(ChainError::Network("connection reset".into())));
		mock.expect_block().with(eq(11)).returning(|height| {
			Ok(ChainBlock {
				height,
				transactions: vec![ChainTransaction::new("at1match", [PROGRAM])],
			})
		});

		let found = scanner(mock).scan(PROGRAM, 11).await.unwrap();
		assert_eq!(found.as_deref(), Some("at1match"));
	}

	#[tokio::test]
	async fn test_visits_whole_window_newest_first() {
		let visited = Arc::new(Mutex::new(Vec::new()));
		let record = visited.clone();

		let mut mock = MockChainQueryInterface::new();
		mock.expect_latest_height().returning(|| Ok(53));
		mock.expect_block().returning(move |height| {
			record.lock().unwrap().push(height);
			Ok(empty_block(height))
		});

		let found = scanner(mock).scan(PROGRAM, 50).await.unwrap();
		assert_eq!(found, None);
		assert_eq!(*visited.lock().unwrap(), vec![53, 52, 51, 50, 49, 48]);
	}

	#[tokio::test]
	async fn test_refuses_oversized_window_without_fetching() {
		let mut mock = MockChainQueryInterface::new();
		mock.expect_latest_height().returning(|| Ok(1_000_000));
		mock.expect_block().never();

		let found = scanner(mock).scan(PROGRAM, 10).await.unwrap();
		assert_eq!(found, None);
	}

	#[tokio::test]
	async fn test_latest_height_failure_is_reported() {
		let mut mock = MockChainQueryInterface::new();
		mock.expect_latest_height()
			.returning(|| Err(ChainError::Network("timeout".into())));
		mock.expect_block().never();

		let result = scanner(mock).scan(PROGRAM, 10).await;
		assert!(matches!(result, Err(ChainError::Network(_))));
	}
}

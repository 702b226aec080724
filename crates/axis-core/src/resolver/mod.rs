//! Identifier resolution.
//!
//! A submitted transaction comes back from the wallet as an opaque tracking
//! value. The resolver turns it into the canonical network identifier using,
//! in order of preference:
//!
//! 1. the raw value itself, when it is already canonical;
//! 2. a canonical id embedded in a wallet status response;
//! 3. the wallet's execution payload, once the status reads as confirmed;
//! 4. a bounded chain scan for the target program, racing wallet polling.
//!
//! A failed status aborts with [`ResolveError::TransactionFailedOnChain`].
//! When the deadline passes first, the raw value is returned as a
//! best-effort result instead of an error.

use crate::cancel::CancellationToken;
use axis_chain::{ChainQueryInterface, ChainScanner};
use axis_config::{ResolverConfig, ScannerConfig};
use axis_types::{
	classify_status, extract_canonical_id, is_canonical_id, truncate_id, Resolution, StatusClass,
};
use axis_wallet::WalletGateway;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio::time::{sleep, sleep_until, Instant};
use tracing::instrument;

/// Errors that end a resolution without an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
	/// The wallet reported the transaction as failed or rejected.
	#[error("Transaction failed on chain: {0}")]
	TransactionFailedOnChain(String),
	/// The request was abandoned before resolution finished.
	#[error("Resolution cancelled")]
	Cancelled,
}

pub struct IdentifierResolver {
	chain: Arc<dyn ChainQueryInterface>,
	scanner: ChainScanner,
	poll_interval: Duration,
	max_wait: Duration,
	confirm_scan_attempts: u32,
}

impl IdentifierResolver {
	pub fn new(
		chain: Arc<dyn ChainQueryInterface>,
		resolver: &ResolverConfig,
		scanner: &ScannerConfig,
	) -> Self {
		Self {
			scanner: ChainScanner::new(chain.clone(), scanner),
			chain,
			poll_interval: resolver.poll_interval(),
			max_wait: resolver.max_wait(),
			confirm_scan_attempts: resolver.confirm_scan_attempts,
		}
	}

	/// Resolves `raw_id` to a canonical identifier.
	///
	/// `submission_height` anchors the chain scan; when unknown, the first
	/// latest height observed is used instead. Pass `None` for `wallet` to
	/// rely on the chain alone.
	#[instrument(skip_all, fields(tracking_id = %truncate_id(raw_id), program = %program_id))]
	pub async fn resolve(
		&self,
		wallet: Option<&WalletGateway>,
		raw_id: &str,
		program_id: &str,
		submission_height: Option<u64>,
		cancel: &CancellationToken,
	) -> Result<Resolution, ResolveError> {
		if cancel.is_cancelled() {
			return Err(ResolveError::Cancelled);
		}

		let raw_id = raw_id.trim();
		if is_canonical_id(raw_id) {
			tracing::info!("Tracking id is already canonical");
			self.spawn_confirmation_watch(raw_id.to_string(), cancel.clone());
			return Ok(Resolution::canonical(raw_id));
		}

		let deadline = Instant::now() + self.max_wait;
		let anchor = OnceCell::new_with(submission_height);

		let wallet_tracks = wallet.is_some_and(|w| w.capabilities().can_track());
		let wallet_track = async {
			match wallet {
				Some(wallet) if wallet_tracks => {
					self.track_wallet(wallet, raw_id, program_id, &anchor)
						.await
				},
				_ => None,
			}
		};
		let chain_track = self.track_chain(program_id, &anchor, wallet_tracks);

		tokio::select! {
			Some(outcome) = wallet_track => outcome,
			id = chain_track => {
				tracing::info!(tx_id = %truncate_id(&id), "Resolved by chain scan");
				Ok(Resolution::canonical(id))
			},
			_ = sleep_until(deadline) => {
				tracing::warn!(
					max_wait_secs = self.max_wait.as_secs(),
					"Resolution timed out, returning tracking id"
				);
				Ok(Resolution::best_effort(raw_id))
			},
			_ = cancel.cancelled() => {
				tracing::debug!("Resolution cancelled");
				Err(ResolveError::Cancelled)
			},
		}
	}

	/// Polls the wallet until it names an identifier or reports a final
	/// status. Returns `None` when the wallet turns out to have no lookups,
	/// leaving the chain track to finish the job.
	async fn track_wallet(
		&self,
		wallet: &WalletGateway,
		raw_id: &str,
		program_id: &str,
		anchor: &OnceCell<u64>,
	) -> Option<Result<Resolution, ResolveError>> {
		let mut round = 0u32;
		loop {
			round += 1;
			match wallet.status(raw_id).await {
				Some(Ok(status)) => {
					if let Some(id) = extract_canonical_id(&status) {
						tracing::info!(round, tx_id = %truncate_id(&id), "Canonical id in wallet status");
						return Some(Ok(Resolution::canonical(id)));
					}
					match classify_status(&status) {
						StatusClass::Failed => {
							tracing::warn!(status = %status, "Wallet reports failure");
							return Some(Err(ResolveError::TransactionFailedOnChain(status)));
						},
						StatusClass::Confirmed => {
							tracing::info!(round, status = %status, "Wallet reports completion");
							return Some(
								self.finish_confirmed(wallet, raw_id, program_id, anchor)
									.await,
							);
						},
						StatusClass::Pending => {
							tracing::debug!(round, status = %status, "Still pending");
						},
					}
				},
				Some(Err(e)) => {
					tracing::warn!(round, error = %e, "Status poll failed");
				},
				None => match wallet.execution(raw_id).await {
					Some(Ok(execution)) => {
						if let Some(id) = extract_canonical_id(&execution) {
							tracing::info!(round, tx_id = %truncate_id(&id), "Canonical id in execution");
							return Some(Ok(Resolution::canonical(id)));
						}
						tracing::debug!(round, "Execution lookup has no id yet");
					},
					Some(Err(e)) => {
						tracing::warn!(round, error = %e, "Execution lookup failed");
					},
					None => return None,
				},
			}

			sleep(self.poll_interval).await;
		}
	}

	/// The wallet says the transaction completed. Look for the id in the
	/// execution payload, then give the chain a few more tries, then settle
	/// for the tracking id.
	async fn finish_confirmed(
		&self,
		wallet: &WalletGateway,
		raw_id: &str,
		program_id: &str,
		anchor: &OnceCell<u64>,
	) -> Result<Resolution, ResolveError> {
		match wallet.execution(raw_id).await {
			Some(Ok(execution)) => {
				if let Some(id) = extract_canonical_id(&execution) {
					tracing::info!(tx_id = %truncate_id(&id), "Canonical id in execution");
					return Ok(Resolution::canonical(id));
				}
			},
			Some(Err(e)) => tracing::warn!(error = %e, "Execution lookup failed"),
			None => {},
		}

		for attempt in 1..=self.confirm_scan_attempts {
			if let Some(id) = self.scan_once(program_id, anchor).await {
				tracing::info!(attempt, tx_id = %truncate_id(&id), "Resolved by confirmation scan");
				return Ok(Resolution::canonical(id));
			}
			if attempt < self.confirm_scan_attempts {
				sleep(self.poll_interval).await;
			}
		}

		tracing::warn!("Completed without canonical id, returning tracking id");
		Ok(Resolution::best_effort(raw_id))
	}

	/// Scans the chain every poll interval until a match turns up. Starts
	/// immediately when it is the only strategy, otherwise after the first
	/// wallet round had its chance.
	async fn track_chain(&self, program_id: &str, anchor: &OnceCell<u64>, delayed: bool) -> String {
		if delayed {
			sleep(self.poll_interval).await;
		}
		loop {
			if let Some(id) = self.scan_once(program_id, anchor).await {
				return id;
			}
			sleep(self.poll_interval).await;
		}
	}

	async fn scan_once(&self, program_id: &str, anchor: &OnceCell<u64>) -> Option<String> {
		let from_height = match anchor
			.get_or_try_init(|| self.chain.latest_height())
			.await
		{
			Ok(height) => *height,
			Err(e) => {
				tracing::warn!(error = %e, "Could not anchor chain scan");
				return None;
			},
		};

		match self.scanner.scan(program_id, from_height).await {
			Ok(found) => found,
			Err(e) => {
				tracing::warn!(error = %e, "Chain scan failed");
				None
			},
		}
	}

	/// Watches for a canonical id to appear on chain. The outcome is only
	/// logged; the resolution has already been returned.
	fn spawn_confirmation_watch(&self, id: String, cancel: CancellationToken) {
		let chain = self.chain.clone();
		let poll_interval = self.poll_interval;
		let deadline = Instant::now() + self.max_wait;

		tokio::spawn(async move {
			let watch = async {
				loop {
					match chain.transaction_exists(&id).await {
						Ok(true) => return,
						Ok(false) => {},
						Err(e) => tracing::debug!(error = %e, "Confirmation lookup failed"),
					}
					sleep(poll_interval).await;
				}
			};

			tokio::select! {
				_ = watch => {
					tracing::info!(tx_id = %truncate_id(&id), "Transaction observed on chain");
				},
				_ = sleep_until(deadline) => {
					tracing::warn!(tx_id = %truncate_id(&id), "Transaction not observed on chain before deadline");
				},
				_ = cancel.cancelled() => {},
			}
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use axis_chain::implementations::memory::MemoryChain;
	use axis_types::{ChainBlock, ChainTransaction, ResolutionKind, WalletCapabilities};
	use axis_wallet::implementations::scripted::ScriptedWallet;
	use axis_wallet::WalletError;

	const PROGRAM: &str = "axis_lending_v2.aleo";

	fn canonical(fill: char) -> String {
		format!("at1{}", fill.to_string().repeat(60))
	}

	fn resolver(chain: Arc<MemoryChain>) -> IdentifierResolver {
		IdentifierResolver::new(chain, &ResolverConfig::default(), &ScannerConfig::default())
	}

	fn tracking_wallet() -> ScriptedWallet {
		ScriptedWallet::new("aleo1owner").with_capabilities(WalletCapabilities::all())
	}

	fn gateway(wallet: &ScriptedWallet) -> WalletGateway {
		WalletGateway::new(Box::new(wallet.clone()))
	}

	#[tokio::test(start_paused = true)]
	async fn test_canonical_raw_id_returns_immediately() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet().on_status(Ok("Pending".into()));
		let id = canonical('q');

		let start = Instant::now();
		let resolution = resolver(chain.clone())
			.resolve(Some(&gateway(&wallet)), &id, PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id.clone()));
		assert_eq!(start.elapsed(), Duration::ZERO);
		assert_eq!(wallet.status_calls(), 0);
		assert!(chain.block_fetches().await.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_watch_polls_until_observed() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('w');

		resolver(chain.clone())
			.resolve(None, &id, PROGRAM, None, &CancellationToken::never())
			.await
			.unwrap();

		sleep(Duration::from_secs(7)).await;
		chain.add_transaction(id.clone()).await;
		sleep(Duration::from_secs(30)).await;

		// Polled at 0, 3, 6 and 9 s, then stopped once the id was seen.
		assert_eq!(chain.transaction_lookups().await.len(), 4);
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_watch_gives_up_at_deadline() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('d');

		resolver(chain.clone())
			.resolve(None, &id, PROGRAM, None, &CancellationToken::never())
			.await
			.unwrap();

		sleep(Duration::from_secs(130)).await;
		let lookups = chain.transaction_lookups().await.len();
		assert!((40..=41).contains(&lookups));

		sleep(Duration::from_secs(170)).await;
		assert_eq!(chain.transaction_lookups().await.len(), lookups);
	}

	#[tokio::test(start_paused = true)]
	async fn test_confirmation_watch_stops_on_cancel() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let (handle, token) = crate::cancel::cancellation();
		let id = canonical('c');

		resolver(chain.clone())
			.resolve(None, &id, PROGRAM, None, &token)
			.await
			.unwrap();

		sleep(Duration::from_secs(7)).await;
		handle.cancel();
		sleep(Duration::from_secs(30)).await;

		// Polled at 0, 3 and 6 s only.
		assert_eq!(chain.transaction_lookups().await.len(), 3);
	}

	#[tokio::test(start_paused = true)]
	async fn test_unanchored_scan_retries_until_height_is_available() {
		let chain = Arc::new(MemoryChain::at_height(100));
		chain.fail_latest_height(true).await;
		let id = canonical('k');

		let chain_for_updates = chain.clone();
		let block_id = id.clone();
		tokio::spawn(async move {
			sleep(Duration::from_secs(10)).await;
			chain_for_updates.set_latest_height(140).await;
			chain_for_updates.fail_latest_height(false).await;
			sleep(Duration::from_secs(10)).await;
			chain_for_updates
				.push_block(ChainBlock {
					height: 141,
					transactions: vec![ChainTransaction::new(block_id, [PROGRAM])],
				})
				.await;
		});

		let start = Instant::now();
		let resolution = resolver(chain.clone())
			.resolve(None, "abc-123", PROGRAM, None, &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
		// Scans at 0, 3, 6 and 9 s could not anchor; the one at 12 s anchored
		// on 140 and the one at 21 s saw the new block.
		assert_eq!(start.elapsed().as_secs(), 21);
		let fetches = chain.block_fetches().await;
		assert_eq!(fetches.first(), Some(&140));
		assert!(fetches.iter().all(|h| (138..=141).contains(h)));
	}

	#[tokio::test(start_paused = true)]
	async fn test_status_embedding_canonical_id() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('e');
		let wallet = tracking_wallet()
			.on_status(Ok("Pending".into()))
			.on_status(Ok(format!("Finalized: {}", id).into()));

		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
		assert_eq!(wallet.status_calls(), 2);
		assert_eq!(wallet.execution_calls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_failed_status_stops_without_scanning() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet().on_status(Ok("REJECTED by validator".into()));

		let result = resolver(chain.clone())
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await;

		assert_eq!(
			result,
			Err(ResolveError::TransactionFailedOnChain("REJECTED by validator".into()))
		);
		assert_eq!(wallet.status_calls(), 1);
		assert_eq!(wallet.execution_calls(), 0);
		assert!(chain.block_fetches().await.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_completed_status_uses_execution_lookup() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('x');
		let wallet = tracking_wallet()
			.on_status(Ok("Pending".into()))
			.on_status(Ok("Pending".into()))
			.on_status(Ok("Completed".into()))
			.on_execution(Ok(execution_payload(&id).into()));

		let start = Instant::now();
		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
		assert_eq!(wallet.status_calls(), 3);
		assert_eq!(wallet.execution_calls(), 1);
		assert!(start.elapsed() < Duration::from_secs(9));
	}

	fn execution_payload(id: &str) -> String {
		format!(r#"{{"transitions":[{{"program":"{}"}}],"transactionId":"{}"}}"#, PROGRAM, id)
	}

	#[tokio::test(start_paused = true)]
	async fn test_completed_without_id_scans_then_degrades() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet()
			.on_status(Ok("Finalized".into()))
			.on_execution(Ok("{}".into()));

		let start = Instant::now();
		let resolution = resolver(chain.clone())
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution.kind, ResolutionKind::BestEffort);
		assert_eq!(resolution.id, "abc-123");
		// Three confirmation scans, two intervals apart.
		assert_eq!(start.elapsed().as_secs(), 6);
		assert!(!chain.block_fetches().await.is_empty());
	}

	#[tokio::test(start_paused = true)]
	async fn test_completed_then_scan_finds_transaction() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('s');
		chain
			.push_block(ChainBlock {
				height: 101,
				transactions: vec![ChainTransaction::new(id.clone(), [PROGRAM])],
			})
			.await;
		let wallet = tracking_wallet()
			.on_status(Ok("accepted".into()))
			.on_execution(Err(WalletError::Network("unreachable".into())));

		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
	}

	#[tokio::test(start_paused = true)]
	async fn test_endless_pending_times_out_with_tracking_id() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet().on_status(Ok("Pending".into()));

		let start = Instant::now();
		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::best_effort("abc-123"));
		assert_eq!(start.elapsed().as_secs(), 120);
	}

	#[tokio::test(start_paused = true)]
	async fn test_chain_scan_wins_race_against_pending_wallet() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet().on_status(Ok("Pending".into()));
		let id = canonical('r');

		let chain_for_block = chain.clone();
		let block_id = id.clone();
		tokio::spawn(async move {
			sleep(Duration::from_secs(10)).await;
			chain_for_block
				.push_block(ChainBlock {
					height: 102,
					transactions: vec![ChainTransaction::new(block_id, [PROGRAM])],
				})
				.await;
		});

		let start = Instant::now();
		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
		assert_eq!(start.elapsed().as_secs(), 12);
	}

	#[tokio::test(start_paused = true)]
	async fn test_execution_only_wallet_polls_execution() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('o');
		let wallet = ScriptedWallet::new("aleo1owner")
			.with_capabilities(WalletCapabilities {
				submit_transaction: true,
				execution_by_tracking_id: true,
				..Default::default()
			})
			.on_execution(Ok("null".into()))
			.on_execution(Ok(id.clone().into()));

		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
		assert_eq!(wallet.execution_calls(), 2);
		assert_eq!(wallet.status_calls(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_chain_only_scans_immediately_and_degrades() {
		let chain = Arc::new(MemoryChain::at_height(100));

		let start = Instant::now();
		let resolution = resolver(chain.clone())
			.resolve(None, "abc-123", PROGRAM, None, &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::best_effort("abc-123"));
		assert_eq!(start.elapsed().as_secs(), 120);
		let fetches = chain.block_fetches().await;
		// Anchored on the first observed height, so every scan covers 98..=100.
		assert_eq!(&fetches[..3], &[100, 99, 98]);
		assert!(fetches.iter().all(|h| (98..=100).contains(h)));
	}

	#[tokio::test(start_paused = true)]
	async fn test_transient_status_errors_are_retried() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let id = canonical('t');
		let wallet = tracking_wallet()
			.on_status(Err(WalletError::Network("offline".into())))
			.on_status(Ok(id.clone().into()));

		let resolution = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &CancellationToken::never())
			.await
			.unwrap();

		assert_eq!(resolution, Resolution::canonical(id));
	}

	#[tokio::test(start_paused = true)]
	async fn test_cancellation_stops_resolution() {
		let chain = Arc::new(MemoryChain::at_height(100));
		let wallet = tracking_wallet().on_status(Ok("Pending".into()));
		let (handle, token) = crate::cancel::cancellation();

		tokio::spawn(async move {
			sleep(Duration::from_secs(5)).await;
			handle.cancel();
		});

		let start = Instant::now();
		let result = resolver(chain)
			.resolve(Some(&gateway(&wallet)), "abc-123", PROGRAM, Some(100), &token)
			.await;

		assert_eq!(result, Err(ResolveError::Cancelled));
		assert_eq!(start.elapsed().as_secs(), 5);
	}
}

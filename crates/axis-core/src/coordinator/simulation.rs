//! Dry-run execution.
//!
//! Walks the full status sequence with fixed delays and ends in a
//! best-effort success carrying a generated `at1demo…` tracking id. Neither
//! the wallet nor the chain is contacted.

use super::{elapsed_ms, CoordinatorError, TransactionCoordinator};
use crate::cancel::CancellationToken;
use axis_types::identifier::CANONICAL_PREFIX;
use axis_types::{Resolution, TransactionStatus};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Instant};
use uuid::Uuid;

const PROVING_DELAY: Duration = Duration::from_millis(1500);
const BROADCAST_DELAY: Duration = Duration::from_millis(800);
const CONFIRM_DELAY: Duration = Duration::from_millis(1200);

impl TransactionCoordinator {
	pub(super) async fn simulate(
		&self,
		request_id: Uuid,
		cancel: &CancellationToken,
	) -> Result<Resolution, CoordinatorError> {
		self.advance(request_id, TransactionStatus::Proving, |_| {})?;
		let started = Instant::now();
		tokio::select! {
			_ = sleep(PROVING_DELAY) => {},
			_ = cancel.cancelled() => return Err(CoordinatorError::Abandoned(request_id)),
		}
		let proof_duration_ms = elapsed_ms(started);

		let raw_id = demo_tracking_id();
		self.advance(request_id, TransactionStatus::Broadcasting, |state| {
			state.raw_tracking_id = Some(raw_id.clone());
			state.proof_duration_ms = Some(proof_duration_ms);
		})?;
		tokio::select! {
			_ = sleep(BROADCAST_DELAY) => {},
			_ = cancel.cancelled() => return Err(CoordinatorError::Abandoned(request_id)),
		}

		self.advance(request_id, TransactionStatus::Confirming, |_| {})?;
		tokio::select! {
			_ = sleep(CONFIRM_DELAY) => {},
			_ = cancel.cancelled() => return Err(CoordinatorError::Abandoned(request_id)),
		}

		tracing::info!(tracking_id = %raw_id, "Dry run finished");
		self.succeed(request_id, Resolution::best_effort(raw_id))
	}
}

/// `at1demo` followed by the base-36 clock in milliseconds and a random tail.
fn demo_tracking_id() -> String {
	let millis = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_millis())
		.unwrap_or_default();
	let tail = Uuid::new_v4().simple().to_string();
	format!("{}demo{}{}", CANONICAL_PREFIX, to_base36(millis), &tail[..8])
}

fn to_base36(mut value: u128) -> String {
	const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
	if value == 0 {
		return "0".to_string();
	}
	let mut out = Vec::new();
	while value > 0 {
		out.push(DIGITS[(value % 36) as usize]);
		value /= 36;
	}
	out.reverse();
	String::from_utf8(out).unwrap_or_default()
}

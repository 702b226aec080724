//! Transaction lifecycle coordinator.
//!
//! Owns at most one in-flight request and walks it through
//! `preparing → proving → broadcasting → confirming → success|error`.
//! Each request gets an id and a cancellation handle. Every state write is
//! checked against the id currently owning the state, so a request abandoned
//! by [`TransactionCoordinator::reset`] can finish its stray work without
//! touching whatever came after it.

mod simulation;

use crate::cancel::{cancellation, CancellationHandle, CancellationToken};
use crate::event_bus::EventBus;
use crate::resolver::{IdentifierResolver, ResolveError};
use crate::state::is_valid_transition;
use axis_chain::ChainQueryInterface;
use axis_config::Config;
use axis_types::programs::ProgramCall;
use axis_types::{
	truncate_id, Resolution, TransactionEvent, TransactionRequest, TransactionState,
	TransactionStatus, WalletTransaction,
};
use axis_wallet::{WalletError, WalletGateway};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::instrument;
use uuid::Uuid;

const EVENT_BUS_CAPACITY: usize = 64;

/// Errors returned by [`TransactionCoordinator::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
	/// No signer is attached. Nothing was attempted.
	#[error("Wallet not connected")]
	WalletNotConnected,
	/// Another request is still in flight.
	#[error("Another transaction is already in progress")]
	Busy,
	/// The wallet refused the submission or returned no identifier.
	#[error("Wallet rejected transaction: {0}")]
	WalletRejected(String),
	/// The wallet reported the broadcast transaction as failed.
	#[error("Transaction failed on chain: {0}")]
	TransactionFailedOnChain(String),
	/// The request was reset before it finished.
	#[error("Request {0} was abandoned")]
	Abandoned(Uuid),
	/// A state write broke the lifecycle order.
	#[error("Invalid status transition from {from} to {to}")]
	InvalidTransition {
		from: TransactionStatus,
		to: TransactionStatus,
	},
}

struct ActiveRequest {
	id: Uuid,
	cancel: CancellationHandle,
}

/// Submission defaults applied to every request.
#[derive(Debug, Clone)]
struct Settings {
	network: String,
	default_fee: u64,
	fee_private: bool,
	dry_run: bool,
}

pub struct TransactionCoordinator {
	wallet: Arc<WalletGateway>,
	chain: Arc<dyn ChainQueryInterface>,
	resolver: IdentifierResolver,
	settings: Settings,
	state: watch::Sender<TransactionState>,
	active: Mutex<Option<ActiveRequest>>,
	events: EventBus,
}

impl TransactionCoordinator {
	pub fn new(
		wallet: Arc<WalletGateway>,
		chain: Arc<dyn ChainQueryInterface>,
		config: &Config,
	) -> Self {
		let (state, _) = watch::channel(TransactionState::default());
		Self {
			resolver: IdentifierResolver::new(chain.clone(), &config.resolver, &config.scanner),
			wallet,
			chain,
			settings: Settings {
				network: config.chain.network.clone(),
				default_fee: config.transaction.default_fee,
				fee_private: config.transaction.fee_private,
				dry_run: config.transaction.dry_run,
			},
			state,
			active: Mutex::new(None),
			events: EventBus::new(EVENT_BUS_CAPACITY),
		}
	}

	/// Switches simulated execution on or off.
	pub fn with_dry_run(mut self, dry_run: bool) -> Self {
		self.settings.dry_run = dry_run;
		self
	}

	/// Snapshot of the current state.
	pub fn state(&self) -> TransactionState {
		self.state.borrow().clone()
	}

	/// Receiver that always holds the latest state.
	pub fn subscribe_state(&self) -> watch::Receiver<TransactionState> {
		self.state.subscribe()
	}

	/// Event bus carrying every status change.
	pub fn events(&self) -> &EventBus {
		&self.events
	}

	/// Executes `function_name` on `program_id`. `fee` falls back to the
	/// configured default.
	pub async fn execute(
		&self,
		program_id: &str,
		function_name: &str,
		inputs: Vec<String>,
		fee: Option<u64>,
	) -> Result<Resolution, CoordinatorError> {
		let request = TransactionRequest::new(
			program_id,
			function_name,
			inputs,
			fee.unwrap_or(self.settings.default_fee),
		);
		self.execute_request(self.apply_fee_mode(request)).await
	}

	/// Executes a prepared program call.
	pub async fn execute_call(
		&self,
		call: ProgramCall,
		fee: Option<u64>,
	) -> Result<Resolution, CoordinatorError> {
		let request = call.into_request(fee.unwrap_or(self.settings.default_fee));
		self.execute_request(self.apply_fee_mode(request)).await
	}

	/// Runs a request through the full lifecycle.
	///
	/// Returns the canonical identifier, or the wallet tracking id flagged as
	/// best-effort when the canonical one could not be found in time.
	#[instrument(skip_all, fields(program = %request.program_id, function = %request.function_name))]
	pub async fn execute_request(
		&self,
		request: TransactionRequest,
	) -> Result<Resolution, CoordinatorError> {
		let Some(address) = self.wallet.address() else {
			tracing::warn!("Execute called without a connected wallet");
			return Err(CoordinatorError::WalletNotConnected);
		};

		let (request_id, cancel) = self.begin()?;
		tracing::info!(request_id = %request_id, dry_run = self.settings.dry_run, "Request started");

		let result = if self.settings.dry_run {
			self.simulate(request_id, &cancel).await
		} else {
			self.run(request_id, &cancel, &address, &request).await
		};

		self.finish(request_id);
		result
	}

	/// Returns to `idle` and abandons the in-flight request, if any.
	pub fn reset(&self) {
		let abandoned = self.lock_active().take().map(|active| {
			active.cancel.cancel();
			active.id
		});
		self.state.send_replace(TransactionState::default());
		if let Some(id) = abandoned {
			tracing::info!(request_id = %id, "Request abandoned by reset");
		}
		self.events.publish(TransactionEvent::Reset { abandoned }).ok();
	}

	async fn run(
		&self,
		request_id: Uuid,
		cancel: &CancellationToken,
		address: &str,
		request: &TransactionRequest,
	) -> Result<Resolution, CoordinatorError> {
		self.advance(request_id, TransactionStatus::Proving, |_| {})?;
		let tx = WalletTransaction::from_request(address, &self.settings.network, request);
		let started = Instant::now();
		let submission = async {
			let submitted = self.wallet.submit(&tx).await;
			(submitted, elapsed_ms(started))
		};
		let ((submitted, proof_duration_ms), submission_height) = tokio::select! {
			joined = async { tokio::join!(submission, self.submission_height()) } => joined,
			_ = cancel.cancelled() => return Err(CoordinatorError::Abandoned(request_id)),
		};

		let raw_id = match submitted {
			Ok(raw_id) => raw_id,
			Err(e) => {
				let reason = match e {
					WalletError::Rejected(reason) => reason,
					other => other.to_string(),
				};
				return self.fail(request_id, CoordinatorError::WalletRejected(reason));
			},
		};

		self.advance(request_id, TransactionStatus::Broadcasting, |state| {
			state.raw_tracking_id = Some(raw_id.clone());
			state.proof_duration_ms = Some(proof_duration_ms);
		})?;
		tracing::info!(
			tracking_id = %truncate_id(&raw_id),
			proof_duration_ms,
			"Wallet accepted submission"
		);
		self.events
			.publish(TransactionEvent::Submitted {
				request_id,
				raw_tracking_id: raw_id.clone(),
				proof_duration_ms,
			})
			.ok();

		self.advance(request_id, TransactionStatus::Confirming, |_| {})?;
		let resolution = match self
			.resolver
			.resolve(
				Some(self.wallet.as_ref()),
				&raw_id,
				&request.program_id,
				submission_height,
				cancel,
			)
			.await
		{
			Ok(resolution) => resolution,
			Err(ResolveError::Cancelled) => return Err(CoordinatorError::Abandoned(request_id)),
			Err(ResolveError::TransactionFailedOnChain(status)) => {
				return self.fail(request_id, CoordinatorError::TransactionFailedOnChain(status));
			},
		};

		self.succeed(request_id, resolution)
	}

	/// Height at submission time. Best effort; the resolver anchors on the
	/// first height it sees otherwise.
	async fn submission_height(&self) -> Option<u64> {
		match self.chain.latest_height().await {
			Ok(height) => Some(height),
			Err(e) => {
				tracing::warn!(error = %e, "Submission height unavailable");
				None
			},
		}
	}

	/// Claims the coordinator for a new request.
	fn begin(&self) -> Result<(Uuid, CancellationToken), CoordinatorError> {
		let mut active = self.lock_active();
		if let Some(current) = active.as_ref() {
			tracing::warn!(request_id = %current.id, "Rejecting execute while busy");
			return Err(CoordinatorError::Busy);
		}

		let id = Uuid::new_v4();
		let (handle, token) = cancellation();
		*active = Some(ActiveRequest { id, cancel: handle });

		self.state.send_replace(TransactionState {
			status: TransactionStatus::Preparing,
			request_id: Some(id),
			..Default::default()
		});
		self.events
			.publish(TransactionEvent::StatusChanged {
				request_id: id,
				status: TransactionStatus::Preparing,
			})
			.ok();

		Ok((id, token))
	}

	/// Releases the coordinator if `request_id` still holds it.
	fn finish(&self, request_id: Uuid) {
		let mut active = self.lock_active();
		if active.as_ref().is_some_and(|a| a.id == request_id) {
			*active = None;
		}
	}

	/// Moves the request to `next` and applies `update`, provided the request
	/// still owns the state and the move follows the lifecycle order.
	fn advance(
		&self,
		request_id: Uuid,
		next: TransactionStatus,
		update: impl FnOnce(&mut TransactionState),
	) -> Result<(), CoordinatorError> {
		let mut outcome = Ok(());
		self.state.send_if_modified(|state| {
			if state.request_id != Some(request_id) {
				outcome = Err(CoordinatorError::Abandoned(request_id));
				return false;
			}
			if !is_valid_transition(state.status, next) {
				outcome = Err(CoordinatorError::InvalidTransition {
					from: state.status,
					to: next,
				});
				return false;
			}
			state.status = next;
			update(state);
			true
		});

		match &outcome {
			Ok(()) => {
				tracing::debug!(request_id = %request_id, status = %next, "Status changed");
				self.events
					.publish(TransactionEvent::StatusChanged {
						request_id,
						status: next,
					})
					.ok();
			},
			Err(CoordinatorError::Abandoned(_)) => {
				tracing::debug!(request_id = %request_id, status = %next, "Dropping stale write");
			},
			Err(e) => tracing::error!(request_id = %request_id, error = %e, "Rejected status write"),
		}
		outcome
	}

	fn succeed(
		&self,
		request_id: Uuid,
		resolution: Resolution,
	) -> Result<Resolution, CoordinatorError> {
		self.advance(request_id, TransactionStatus::Success, |state| {
			if resolution.is_canonical() {
				state.canonical_id = Some(resolution.id.clone());
			} else {
				state.degraded = true;
			}
		})?;
		tracing::info!(
			request_id = %request_id,
			tx_id = %truncate_id(&resolution.id),
			degraded = !resolution.is_canonical(),
			"Transaction succeeded"
		);
		self.events
			.publish(TransactionEvent::Resolved {
				request_id,
				resolution: resolution.clone(),
			})
			.ok();
		Ok(resolution)
	}

	fn fail(
		&self,
		request_id: Uuid,
		error: CoordinatorError,
	) -> Result<Resolution, CoordinatorError> {
		let message = error.to_string();
		self.advance(request_id, TransactionStatus::Error, |state| {
			state.error_message = Some(message.clone());
		})?;
		tracing::error!(request_id = %request_id, error = %message, "Transaction failed");
		self.events
			.publish(TransactionEvent::Failed {
				request_id,
				error: message,
			})
			.ok();
		Err(error)
	}

	fn apply_fee_mode(&self, request: TransactionRequest) -> TransactionRequest {
		if self.settings.fee_private {
			request.with_private_fee()
		} else {
			request
		}
	}

	fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRequest>> {
		self.active.lock().unwrap_or_else(|e| e.into_inner())
	}
}

fn elapsed_ms(started: Instant) -> u64 {
	u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

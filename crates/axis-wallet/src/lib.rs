//! Wallet gateway module for the AXIS transaction lifecycle.
//!
//! This module wraps the connected signing extension. Extensions differ in
//! which operations they expose, so every call first probes the wallet's
//! capabilities and skips whatever is missing instead of failing. All raw
//! responses are flattened to plain strings here, so callers never deal with
//! response shapes.

use async_trait::async_trait;
use axis_types::{truncate_id, WalletCapabilities, WalletResponse, WalletTransaction};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod scripted;
}

/// Errors that can occur during wallet operations.
#[derive(Debug, Clone, Error)]
pub enum WalletError {
	/// The wallet does not expose the requested operation.
	#[error("Operation not supported by wallet: {0}")]
	Unsupported(&'static str),
	/// No signer is attached.
	#[error("Wallet not connected")]
	NotConnected,
	/// The wallet refused, or the user cancelled, the request.
	#[error("Wallet rejected transaction: {0}")]
	Rejected(String),
	/// The extension could not reach its backend.
	#[error("Network error: {0}")]
	Network(String),
}

/// Trait defining the interface to a signing extension.
///
/// Only `address` and `capabilities` are mandatory. The four operations are
/// optional and default to [`WalletError::Unsupported`]; callers consult
/// `capabilities` before invoking them.
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Address of the connected signer, or `None` when disconnected.
	fn address(&self) -> Option<String>;

	/// Operations currently exposed by the extension.
	fn capabilities(&self) -> WalletCapabilities;

	/// Signs, proves and broadcasts, answering with an execution identifier.
	async fn submit_and_get_execution(
		&self,
		_tx: &WalletTransaction,
	) -> Result<Option<WalletResponse>, WalletError> {
		Err(WalletError::Unsupported("submit_and_get_execution"))
	}

	/// Signs, proves and broadcasts, answering with a tracking identifier.
	async fn submit_and_get_transaction(
		&self,
		_tx: &WalletTransaction,
	) -> Result<Option<WalletResponse>, WalletError> {
		Err(WalletError::Unsupported("submit_and_get_transaction"))
	}

	/// Free-text status for a tracking identifier.
	async fn status_by_tracking_id(&self, _id: &str) -> Result<WalletResponse, WalletError> {
		Err(WalletError::Unsupported("status_by_tracking_id"))
	}

	/// Execution payload for a tracking identifier.
	async fn execution_by_tracking_id(&self, _id: &str) -> Result<WalletResponse, WalletError> {
		Err(WalletError::Unsupported("execution_by_tracking_id"))
	}
}

/// Service that drives a signing extension through its optional operations.
pub struct WalletGateway {
	wallet: Box<dyn WalletInterface>,
}

impl WalletGateway {
	pub fn new(wallet: Box<dyn WalletInterface>) -> Self {
		Self { wallet }
	}

	/// Address of the attached signer, ignoring blank values.
	pub fn address(&self) -> Option<String> {
		self.wallet
			.address()
			.filter(|address| !address.trim().is_empty())
	}

	pub fn is_connected(&self) -> bool {
		self.address().is_some()
	}

	/// Probes the wallet. Never cached.
	pub fn capabilities(&self) -> WalletCapabilities {
		self.wallet.capabilities()
	}

	/// Submits a transaction and returns the raw identifier the wallet gave.
	///
	/// Execution submission is tried first, then tracking-id submission. An
	/// error or an empty answer from the first is not fatal. Fails with
	/// [`WalletError::NotConnected`] when no signer is attached and with
	/// [`WalletError::Rejected`] when neither operation yields an identifier.
	pub async fn submit(&self, tx: &WalletTransaction) -> Result<String, WalletError> {
		if !self.is_connected() {
			return Err(WalletError::NotConnected);
		}
		let capabilities = self.capabilities();
		if !capabilities.can_submit() {
			return Err(WalletError::Rejected(
				"wallet exposes no submission operation".into(),
			));
		}

		let mut last_error = None;

		if capabilities.submit_execution {
			match self.wallet.submit_and_get_execution(tx).await {
				Ok(response) => match normalize_id(response) {
					Some(id) => return Ok(id),
					None => tracing::debug!("Execution submission returned no identifier"),
				},
				Err(e) => {
					tracing::warn!(error = %e, "Execution submission failed, falling back");
					last_error = Some(e);
				},
			}
		}

		if capabilities.submit_transaction {
			match self.wallet.submit_and_get_transaction(tx).await {
				Ok(response) => match normalize_id(response) {
					Some(id) => return Ok(id),
					None => tracing::debug!("Transaction submission returned no identifier"),
				},
				Err(e) => {
					tracing::warn!(error = %e, "Transaction submission failed");
					last_error = Some(e);
				},
			}
		}

		Err(match last_error {
			Some(WalletError::Rejected(reason)) => WalletError::Rejected(reason),
			Some(e) => WalletError::Rejected(e.to_string()),
			None => WalletError::Rejected("wallet returned no transaction identifier".into()),
		})
	}

	/// Polls the wallet's status for a tracking identifier.
	///
	/// Returns `None` when the wallet has no status lookup.
	pub async fn status(&self, id: &str) -> Option<Result<String, WalletError>> {
		if !self.capabilities().status_by_tracking_id {
			return None;
		}
		let result = self
			.wallet
			.status_by_tracking_id(id)
			.await
			.map(WalletResponse::normalize);
		if let Ok(status) = &result {
			tracing::trace!(tracking_id = %truncate_id(id), status = %status, "Wallet status");
		}
		Some(result)
	}

	/// Fetches the execution payload for a tracking identifier as text.
	///
	/// Returns `None` when the wallet has no execution lookup.
	pub async fn execution(&self, id: &str) -> Option<Result<String, WalletError>> {
		if !self.capabilities().execution_by_tracking_id {
			return None;
		}
		Some(
			self.wallet
				.execution_by_tracking_id(id)
				.await
				.map(WalletResponse::normalize),
		)
	}
}

/// Normalizes a submission answer, treating blank text as no answer.
fn normalize_id(response: Option<WalletResponse>) -> Option<String> {
	let id = response?.normalize();
	let id = id.trim();
	(!id.is_empty()).then(|| id.to_string())
}

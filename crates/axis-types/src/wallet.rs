//! Wallet-facing types: capabilities, submission payload and raw responses.

use crate::TransactionRequest;
use serde::{Deserialize, Serialize};

/// Optional operations a connected signing extension exposes.
///
/// Probed on every call and never cached, since extensions may be upgraded or
/// swapped while the session is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletCapabilities {
	/// Submit and receive an execution identifier.
	pub submit_execution: bool,
	/// Submit and receive a tracking identifier.
	pub submit_transaction: bool,
	/// Free-text status lookup by tracking identifier.
	pub status_by_tracking_id: bool,
	/// Execution payload lookup by tracking identifier.
	pub execution_by_tracking_id: bool,
}

impl WalletCapabilities {
	/// Every operation available.
	pub fn all() -> Self {
		Self {
			submit_execution: true,
			submit_transaction: true,
			status_by_tracking_id: true,
			execution_by_tracking_id: true,
		}
	}

	/// Submission only, no lookups.
	pub fn submit_only() -> Self {
		Self {
			submit_transaction: true,
			..Self::default()
		}
	}

	/// True when the wallet can submit at all.
	pub fn can_submit(&self) -> bool {
		self.submit_execution || self.submit_transaction
	}

	/// True when the wallet can be asked anything about a tracking identifier.
	pub fn can_track(&self) -> bool {
		self.status_by_tracking_id || self.execution_by_tracking_id
	}
}

/// Payload handed to the wallet for signing, proving and broadcasting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletTransaction {
	/// Address of the connected signer.
	pub address: String,
	/// Network the extension should broadcast to.
	pub network: String,
	pub program: String,
	pub function: String,
	pub inputs: Vec<String>,
	pub fee: u64,
	pub fee_private: bool,
}

impl WalletTransaction {
	/// Builds the submission payload for a request signed by `address`.
	pub fn from_request(
		address: impl Into<String>,
		network: impl Into<String>,
		request: &TransactionRequest,
	) -> Self {
		Self {
			address: address.into(),
			network: network.into(),
			program: request.program_id.clone(),
			function: request.function_name.clone(),
			inputs: request.inputs.clone(),
			fee: request.fee,
			fee_private: request.fee_private,
		}
	}
}

/// Raw response from a wallet operation.
///
/// Extensions answer with either plain text or a structured object depending
/// on version and operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WalletResponse {
	Text(String),
	Structured(serde_json::Value),
}

impl WalletResponse {
	/// Flattens the response into a plain string.
	///
	/// Text passes through, JSON strings are unwrapped, `null` becomes empty
	/// and any other JSON value is serialized.
	pub fn normalize(self) -> String {
		match self {
			WalletResponse::Text(text) => text,
			WalletResponse::Structured(serde_json::Value::String(text)) => text,
			WalletResponse::Structured(serde_json::Value::Null) => String::new(),
			WalletResponse::Structured(value) => value.to_string(),
		}
	}
}

impl From<String> for WalletResponse {
	fn from(text: String) -> Self {
		WalletResponse::Text(text)
	}
}

impl From<&str> for WalletResponse {
	fn from(text: &str) -> Self {
		WalletResponse::Text(text.to_string())
	}
}

impl From<serde_json::Value> for WalletResponse {
	fn from(value: serde_json::Value) -> Self {
		WalletResponse::Structured(value)
	}
}

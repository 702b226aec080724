//! Transaction request and lifecycle state types.
//!
//! A request and its state are created together when the coordinator starts
//! executing, and the state advances through a fixed status order until it
//! reaches `Success` or `Error`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A program call to be signed and proven by the wallet.
///
/// Immutable once submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
	/// Program to execute, e.g. `axis_lending_v2.aleo`.
	pub program_id: String,
	/// Function (transition) name inside the program.
	pub function_name: String,
	/// Literal inputs in program order.
	pub inputs: Vec<String>,
	/// Fee in microcredits.
	pub fee: u64,
	/// Whether the fee is paid from a private record instead of the public balance.
	pub fee_private: bool,
}

impl TransactionRequest {
	/// Creates a request paying a public fee.
	pub fn new(
		program_id: impl Into<String>,
		function_name: impl Into<String>,
		inputs: Vec<String>,
		fee: u64,
	) -> Self {
		Self {
			program_id: program_id.into(),
			function_name: function_name.into(),
			inputs,
			fee,
			fee_private: false,
		}
	}

	/// Switches the fee to a private record.
	pub fn with_private_fee(mut self) -> Self {
		self.fee_private = true;
		self
	}
}

/// Lifecycle status exposed to the UI.
///
/// Variants are declared in lifecycle order; `Success` and `Error` share the
/// final rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
	#[default]
	Idle,
	Preparing,
	Proving,
	Broadcasting,
	Confirming,
	Success,
	Error,
}

impl TransactionStatus {
	/// Position of the status in the lifecycle order.
	pub fn rank(&self) -> u8 {
		match self {
			TransactionStatus::Idle => 0,
			TransactionStatus::Preparing => 1,
			TransactionStatus::Proving => 2,
			TransactionStatus::Broadcasting => 3,
			TransactionStatus::Confirming => 4,
			TransactionStatus::Success | TransactionStatus::Error => 5,
		}
	}

	/// Returns true for `Success` and `Error`.
	pub fn is_terminal(&self) -> bool {
		matches!(self, TransactionStatus::Success | TransactionStatus::Error)
	}

	/// Returns the lowercase name used in the UI vocabulary.
	pub fn as_str(&self) -> &'static str {
		match self {
			TransactionStatus::Idle => "idle",
			TransactionStatus::Preparing => "preparing",
			TransactionStatus::Proving => "proving",
			TransactionStatus::Broadcasting => "broadcasting",
			TransactionStatus::Confirming => "confirming",
			TransactionStatus::Success => "success",
			TransactionStatus::Error => "error",
		}
	}
}

impl fmt::Display for TransactionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TransactionStatus {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"idle" => Ok(Self::Idle),
			"preparing" => Ok(Self::Preparing),
			"proving" => Ok(Self::Proving),
			"broadcasting" => Ok(Self::Broadcasting),
			"confirming" => Ok(Self::Confirming),
			"success" => Ok(Self::Success),
			"error" => Ok(Self::Error),
			_ => Err(()),
		}
	}
}

/// How the terminal identifier of a request was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionKind {
	/// A canonical network transaction identifier.
	Canonical,
	/// The wallet tracking id, returned because no canonical id could be found
	/// in time. The operation itself may still have succeeded.
	BestEffort,
}

/// Identifier produced by a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
	pub id: String,
	pub kind: ResolutionKind,
}

impl Resolution {
	pub fn canonical(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind: ResolutionKind::Canonical,
		}
	}

	pub fn best_effort(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			kind: ResolutionKind::BestEffort,
		}
	}

	pub fn is_canonical(&self) -> bool {
		self.kind == ResolutionKind::Canonical
	}
}

/// Snapshot of the request currently owned by a coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
	/// Current lifecycle status.
	pub status: TransactionStatus,
	/// Identity of the request that owns this state, `None` while idle.
	pub request_id: Option<Uuid>,
	/// Opaque identifier returned by the wallet on submission.
	pub raw_tracking_id: Option<String>,
	/// Canonical network identifier, once resolved.
	pub canonical_id: Option<String>,
	/// Set when the request succeeded with a best-effort identifier.
	pub degraded: bool,
	/// Human-readable failure reason for the `Error` status.
	pub error_message: Option<String>,
	/// Wall-clock time spent inside the wallet submission (proof generation).
	pub proof_duration_ms: Option<u64>,
}

impl TransactionState {
	/// The identifier to show the user: canonical if known, otherwise the
	/// tracking id.
	pub fn display_id(&self) -> Option<&str> {
		self.canonical_id
			.as_deref()
			.or(self.raw_tracking_id.as_deref())
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}
}

//! Event types published by the transaction coordinator.
//!
//! Events flow through the coordinator's event bus so the UI (or any other
//! observer) can follow every status change of a request, not just the latest
//! snapshot.

use crate::{Resolution, TransactionStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle events for a single request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionEvent {
	/// The request moved to a new status.
	StatusChanged {
		request_id: Uuid,
		status: TransactionStatus,
	},
	/// The wallet accepted the submission and returned a tracking id.
	Submitted {
		request_id: Uuid,
		raw_tracking_id: String,
		proof_duration_ms: u64,
	},
	/// The request finished with an identifier.
	Resolved {
		request_id: Uuid,
		resolution: Resolution,
	},
	/// The request failed.
	Failed { request_id: Uuid, error: String },
	/// The coordinator was reset; the request, if any, was abandoned.
	Reset { abandoned: Option<Uuid> },
}

impl TransactionEvent {
	/// The request this event belongs to, if any.
	pub fn request_id(&self) -> Option<Uuid> {
		match self {
			TransactionEvent::StatusChanged { request_id, .. }
			| TransactionEvent::Submitted { request_id, .. }
			| TransactionEvent::Resolved { request_id, .. }
			| TransactionEvent::Failed { request_id, .. } => Some(*request_id),
			TransactionEvent::Reset { abandoned } => *abandoned,
		}
	}
}

//! Chain data types as seen by the chain scanner.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A settled transaction reduced to what the scanner needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTransaction {
	/// Canonical network identifier.
	pub canonical_id: String,
	/// Programs referenced by the transaction's execution transitions.
	pub touched_program_ids: BTreeSet<String>,
}

impl ChainTransaction {
	pub fn new<I, S>(canonical_id: impl Into<String>, programs: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			canonical_id: canonical_id.into(),
			touched_program_ids: programs.into_iter().map(Into::into).collect(),
		}
	}

	/// Returns true if any execution transition references `program_id`.
	pub fn touches(&self, program_id: &str) -> bool {
		self.touched_program_ids.contains(program_id)
	}
}

/// A block at a given height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBlock {
	pub height: u64,
	pub transactions: Vec<ChainTransaction>,
}

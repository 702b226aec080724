//! Lifecycle transition rules.
//!
//! Statuses only move forward one step at a time, and any non-terminal
//! status except `Idle` may drop to `Error`. `Success` and `Error` are
//! terminal; leaving them takes a reset or a new request, neither of which
//! goes through this table.

use axis_types::TransactionStatus;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

static TRANSITIONS: Lazy<HashMap<TransactionStatus, HashSet<TransactionStatus>>> =
	Lazy::new(|| {
		use TransactionStatus::*;

		let mut m = HashMap::new();
		m.insert(Idle, HashSet::from([Preparing]));
		m.insert(Preparing, HashSet::from([Proving, Error]));
		m.insert(Proving, HashSet::from([Broadcasting, Error]));
		m.insert(Broadcasting, HashSet::from([Confirming, Error]));
		m.insert(Confirming, HashSet::from([Success, Error]));
		m.insert(Success, HashSet::new()); // terminal
		m.insert(Error, HashSet::new()); // terminal
		m
	});

/// Checks if a status transition is valid.
pub fn is_valid_transition(from: TransactionStatus, to: TransactionStatus) -> bool {
	TRANSITIONS
		.get(&from)
		.is_some_and(|allowed| allowed.contains(&to))
}

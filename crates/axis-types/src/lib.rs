//! Common types module for the AXIS transaction lifecycle.
//!
//! This module defines the data types shared by the wallet gateway, the chain
//! client, the identifier resolver and the transaction coordinator. Keeping
//! them in one place lets every component agree on the status vocabulary and
//! the canonical identifier format.

/// Chain data types returned by the chain query client.
pub mod chain;
/// Event types published by the transaction coordinator.
pub mod events;
/// Canonical identifier recognition and wallet status classification.
pub mod identifier;
/// Request builders for the deployed AXIS programs.
pub mod programs;
/// Transaction request, status and state types.
pub mod transaction;
/// Utility functions for display formatting.
pub mod utils;
/// Wallet capability and payload types.
pub mod wallet;

// Re-export all types for convenient access
pub use chain::*;
pub use events::*;
pub use identifier::{classify_status, extract_canonical_id, is_canonical_id, StatusClass};
pub use transaction::*;
pub use utils::truncate_id;
pub use wallet::*;

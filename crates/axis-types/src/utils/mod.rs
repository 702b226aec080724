//! Utility functions shared across the workspace.

pub mod formatting;

pub use formatting::truncate_id;

//! Core lifecycle engine for AXIS transactions.
//!
//! This module ties the wallet gateway and the chain client together. The
//! [`TransactionCoordinator`] owns the single in-flight request and drives it
//! through `preparing → proving → broadcasting → confirming → success|error`,
//! while the [`IdentifierResolver`] turns the wallet's opaque tracking value
//! into a canonical network identifier, falling back to a bounded chain scan
//! and finally to a best-effort result when nothing better turns up in time.
//!
//! Every status change is published on the [`EventBus`] and mirrored in a
//! `watch` channel holding the latest [`axis_types::TransactionState`].

pub mod cancel;
pub mod coordinator;
pub mod event_bus;
pub mod resolver;
pub mod state;

pub use cancel::{cancellation, CancellationHandle, CancellationToken};
pub use coordinator::{CoordinatorError, TransactionCoordinator};
pub use event_bus::EventBus;
pub use resolver::{IdentifierResolver, ResolveError};

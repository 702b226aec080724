//! Per-request cancellation.
//!
//! The coordinator keeps the handle; the resolver and any task it spawns hold
//! tokens. Dropping the handle without cancelling leaves tokens pending
//! forever, so finished requests never look cancelled.

use tokio::sync::watch;

/// Creates a linked handle and token.
pub fn cancellation() -> (CancellationHandle, CancellationToken) {
	let (tx, rx) = watch::channel(false);
	(CancellationHandle { tx }, CancellationToken { rx })
}

/// Owner side; cancels every token cloned from its pair.
#[derive(Debug)]
pub struct CancellationHandle {
	tx: watch::Sender<bool>,
}

impl CancellationHandle {
	pub fn cancel(&self) {
		self.tx.send_replace(true);
	}
}

/// Observer side.
#[derive(Debug, Clone)]
pub struct CancellationToken {
	rx: watch::Receiver<bool>,
}

impl CancellationToken {
	/// A token that is never cancelled.
	pub fn never() -> Self {
		cancellation().1
	}

	pub fn is_cancelled(&self) -> bool {
		*self.rx.borrow()
	}

	/// Completes once the token is cancelled.
	pub async fn cancelled(&self) {
		let mut rx = self.rx.clone();
		if rx.wait_for(|cancelled| *cancelled).await.is_err() {
			// Handle dropped without cancelling.
			std::future::pending::<()>().await;
		}
	}
}

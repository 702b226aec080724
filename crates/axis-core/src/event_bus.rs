//! Broadcast bus for coordinator events.

use axis_types::TransactionEvent;
use tokio::sync::broadcast;

/// Fan-out channel for [`TransactionEvent`]s.
///
/// Cloning shares the underlying channel. Publishing with no subscribers
/// returns an error that callers are free to ignore.
#[derive(Debug, Clone)]
pub struct EventBus {
	sender: broadcast::Sender<TransactionEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<TransactionEvent> {
		self.sender.subscribe()
	}

	pub fn publish(
		&self,
		event: TransactionEvent,
	) -> Result<(), broadcast::error::SendError<TransactionEvent>> {
		self.sender.send(event)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_publish_reaches_subscribers() {
		let bus = EventBus::new(8);
		let mut rx = bus.subscribe();

		bus.publish(TransactionEvent::Reset { abandoned: None })
			.unwrap();

		assert!(matches!(
			rx.recv().await.unwrap(),
			TransactionEvent::Reset { abandoned: None }
		));
	}

	#[test]
	fn test_publish_without_subscribers_errors() {
		let bus = EventBus::new(8);
		assert!(bus
			.publish(TransactionEvent::Reset { abandoned: None })
			.is_err());
	}
}

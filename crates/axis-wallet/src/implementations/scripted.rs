//! Scripted wallet for tests and dry local runs.
//!
//! Each operation replays a queue of canned answers. Once a lookup queue is
//! down to its last answer, that answer repeats, so a single `Pending` keeps
//! a wallet pending forever. Submission queues return `Ok(None)` when empty.
//! Clones share state, which lets a test keep a handle for inspecting call
//! counts after handing the wallet to a gateway.

use crate::{WalletError, WalletInterface};
use async_trait::async_trait;
use axis_types::{WalletCapabilities, WalletResponse, WalletTransaction};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

type SubmitResult = Result<Option<WalletResponse>, WalletError>;
type LookupResult = Result<WalletResponse, WalletError>;

#[derive(Default)]
struct Script {
	address: Option<String>,
	capabilities: WalletCapabilities,
	submit_delay: Duration,
	submit_execution: VecDeque<SubmitResult>,
	submit_transaction: VecDeque<SubmitResult>,
	status: VecDeque<LookupResult>,
	execution: VecDeque<LookupResult>,
	submitted: Vec<WalletTransaction>,
	submit_execution_calls: usize,
	submit_transaction_calls: usize,
	status_calls: usize,
	execution_calls: usize,
}

/// Wallet answering from pre-recorded scripts.
#[derive(Clone, Default)]
pub struct ScriptedWallet {
	script: Arc<Mutex<Script>>,
}

impl ScriptedWallet {
	/// Connected wallet with no capabilities.
	pub fn new(address: impl Into<String>) -> Self {
		let wallet = Self::default();
		wallet.lock().address = Some(address.into());
		wallet
	}

	pub fn disconnected() -> Self {
		Self::default()
	}

	pub fn with_capabilities(self, capabilities: WalletCapabilities) -> Self {
		self.set_capabilities(capabilities);
		self
	}

	/// Time each submission takes, standing in for local proving.
	pub fn with_submit_delay(self, delay: Duration) -> Self {
		self.lock().submit_delay = delay;
		self
	}

	pub fn on_submit_execution(self, result: SubmitResult) -> Self {
		self.lock().submit_execution.push_back(result);
		self
	}

	pub fn on_submit_transaction(self, result: SubmitResult) -> Self {
		self.lock().submit_transaction.push_back(result);
		self
	}

	pub fn on_status(self, result: LookupResult) -> Self {
		self.lock().status.push_back(result);
		self
	}

	pub fn on_execution(self, result: LookupResult) -> Self {
		self.lock().execution.push_back(result);
		self
	}

	pub fn set_capabilities(&self, capabilities: WalletCapabilities) {
		self.lock().capabilities = capabilities;
	}

	pub fn disconnect(&self) {
		self.lock().address = None;
	}

	/// Payloads received by either submission operation, in call order.
	pub fn submitted(&self) -> Vec<WalletTransaction> {
		self.lock().submitted.clone()
	}

	pub fn submit_execution_calls(&self) -> usize {
		self.lock().submit_execution_calls
	}

	pub fn submit_transaction_calls(&self) -> usize {
		self.lock().submit_transaction_calls
	}

	pub fn status_calls(&self) -> usize {
		self.lock().status_calls
	}

	pub fn execution_calls(&self) -> usize {
		self.lock().execution_calls
	}

	fn lock(&self) -> MutexGuard<'_, Script> {
		self.script.lock().unwrap_or_else(|e| e.into_inner())
	}

	async fn delay_submission(&self) {
		let delay = self.lock().submit_delay;
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
	}
}

/// Pops the next answer, repeating the last one once the queue runs dry.
fn next_sticky(queue: &mut VecDeque<LookupResult>, operation: &'static str) -> LookupResult {
	match queue.len() {
		0 => Err(WalletError::Unsupported(operation)),
		1 => queue[0].clone(),
		_ => queue
			.pop_front()
			.unwrap_or(Err(WalletError::Unsupported(operation))),
	}
}

#[async_trait]
impl WalletInterface for ScriptedWallet {
	fn address(&self) -> Option<String> {
		self.lock().address.clone()
	}

	fn capabilities(&self) -> WalletCapabilities {
		self.lock().capabilities
	}

	async fn submit_and_get_execution(&self, tx: &WalletTransaction) -> SubmitResult {
		self.delay_submission().await;
		let mut script = self.lock();
		script.submit_execution_calls += 1;
		script.submitted.push(tx.clone());
		script.submit_execution.pop_front().unwrap_or(Ok(None))
	}

	async fn submit_and_get_transaction(&self, tx: &WalletTransaction) -> SubmitResult {
		self.delay_submission().await;
		let mut script = self.lock();
		script.submit_transaction_calls += 1;
		script.submitted.push(tx.clone());
		script.submit_transaction.pop_front().unwrap_or(Ok(None))
	}

	async fn status_by_tracking_id(&self, _id: &str) -> LookupResult {
		let mut script = self.lock();
		script.status_calls += 1;
		next_sticky(&mut script.status, "status_by_tracking_id")
	}

	async fn execution_by_tracking_id(&self, _id: &str) -> LookupResult {
		let mut script = self.lock();
		script.execution_calls += 1;
		next_sticky(&mut script.execution, "execution_by_tracking_id")
	}
}

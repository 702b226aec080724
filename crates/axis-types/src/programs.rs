//! Call builders for the deployed AXIS programs.
//!
//! Each builder only formats typed literal inputs in the order the program's
//! transition expects them. Pricing, collateral and scoring rules live in the
//! programs themselves.

use crate::TransactionRequest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Credit score program.
pub const SCORE_PROGRAM: &str = "axis_score_v2.aleo";
/// Lending pool program.
pub const LENDING_PROGRAM: &str = "axis_lending_v2.aleo";

/// Default liquidity lock period for deposits, in days.
pub const DEFAULT_LOCK_DAYS: u64 = 30;

/// Errors raised while building a program call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramCallError {
	/// A bounded input was outside its range.
	#[error("Invalid value for '{field}': {value} (expected {expected})")]
	OutOfRange {
		field: &'static str,
		value: u64,
		expected: &'static str,
	},
	/// A required address was empty.
	#[error("Missing address for '{0}'")]
	MissingAddress(&'static str),
}

/// A program function call without fee information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramCall {
	pub program_id: String,
	pub function_name: String,
	pub inputs: Vec<String>,
}

impl ProgramCall {
	fn new(program_id: &str, function_name: &str, inputs: Vec<String>) -> Self {
		Self {
			program_id: program_id.to_string(),
			function_name: function_name.to_string(),
			inputs,
		}
	}

	/// Attaches a public fee and turns the call into a request.
	pub fn into_request(self, fee: u64) -> TransactionRequest {
		TransactionRequest::new(self.program_id, self.function_name, self.inputs, fee)
	}
}

fn u64_literal(value: u64) -> String {
	format!("{}u64", value)
}

fn u8_literal(value: u8) -> String {
	format!("{}u8", value)
}

fn require_address(field: &'static str, address: &str) -> Result<String, ProgramCallError> {
	let address = address.trim();
	if address.is_empty() {
		return Err(ProgramCallError::MissingAddress(field));
	}
	Ok(address.to_string())
}

/// Inputs to the five-factor credit model, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditFactors {
	/// Share of loans repaid on time.
	pub repayment_history: u64,
	/// Months active, capped.
	pub position_duration: u64,
	/// Current utilization.
	pub utilization_rate: u64,
	/// Interaction frequency, capped.
	pub protocol_interactions: u64,
	/// Collateral diversity index, capped.
	pub collateral_diversity: u64,
}

impl CreditFactors {
	fn validate(&self) -> Result<(), ProgramCallError> {
		let fields = [
			("repayment_history", self.repayment_history),
			("position_duration", self.position_duration),
			("utilization_rate", self.utilization_rate),
			("protocol_interactions", self.protocol_interactions),
			("collateral_diversity", self.collateral_diversity),
		];
		for (field, value) in fields {
			if value > 100 {
				return Err(ProgramCallError::OutOfRange {
					field,
					value,
					expected: "0..=100",
				});
			}
		}
		Ok(())
	}
}

/// Builders for the credit score program.
pub struct ScoreCalls;

impl ScoreCalls {
	/// Computes a private credit score from the five factors.
	pub fn compute_credibility(
		owner: &str,
		factors: &CreditFactors,
		now: u64,
	) -> Result<ProgramCall, ProgramCallError> {
		factors.validate()?;
		Ok(ProgramCall::new(
			SCORE_PROGRAM,
			"compute_credibility",
			vec![
				require_address("owner", owner)?,
				u64_literal(factors.repayment_history),
				u64_literal(factors.position_duration),
				u64_literal(factors.utilization_rate),
				u64_literal(factors.protocol_interactions),
				u64_literal(factors.collateral_diversity),
				u64_literal(now),
			],
		))
	}

	/// Proves the caller's score meets `min_score` without revealing it.
	pub fn verify_threshold(min_score: u64) -> ProgramCall {
		ProgramCall::new(SCORE_PROGRAM, "verify_threshold", vec![u64_literal(min_score)])
	}

	/// Issues an audit token for `verifier` proving `score >= required_score`.
	pub fn create_audit_token(
		verifier: &str,
		required_score: u64,
		now: u64,
	) -> Result<ProgramCall, ProgramCallError> {
		Ok(ProgramCall::new(
			SCORE_PROGRAM,
			"create_audit_token",
			vec![
				require_address("verifier", verifier)?,
				u64_literal(required_score),
				u64_literal(now),
			],
		))
	}

	/// Commits the current score hash on-chain.
	pub fn commit_score() -> ProgramCall {
		ProgramCall::new(SCORE_PROGRAM, "commit_score", Vec::new())
	}
}

/// Borrower tier as understood by the lending program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LendingTier {
	Elite = 1,
	Core = 2,
	#[default]
	Entry = 3,
}

impl TryFrom<u8> for LendingTier {
	type Error = ProgramCallError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(LendingTier::Elite),
			2 => Ok(LendingTier::Core),
			3 => Ok(LendingTier::Entry),
			other => Err(ProgramCallError::OutOfRange {
				field: "tier",
				value: other as u64,
				expected: "1, 2 or 3",
			}),
		}
	}
}

/// Builders for the lending pool program.
pub struct LendingCalls;

impl LendingCalls {
	/// Deposits liquidity into the pool.
	pub fn deposit(
		owner: &str,
		amount: u64,
		lock_days: u64,
		now: u64,
	) -> Result<ProgramCall, ProgramCallError> {
		Ok(ProgramCall::new(
			LENDING_PROGRAM,
			"seed_the_axis",
			vec![
				require_address("owner", owner)?,
				u64_literal(amount),
				u64_literal(lock_days),
				u64_literal(now),
			],
		))
	}

	/// Borrows from the pool at the given tier.
	pub fn borrow(
		owner: &str,
		amount: u64,
		collateral: u64,
		tier: LendingTier,
		now: u64,
	) -> Result<ProgramCall, ProgramCallError> {
		Ok(ProgramCall::new(
			LENDING_PROGRAM,
			"access_liquidity",
			vec![
				require_address("owner", owner)?,
				u64_literal(amount),
				u64_literal(collateral),
				u8_literal(tier as u8),
				u64_literal(now),
			],
		))
	}

	/// Repays a loan in full.
	pub fn repay(amount: u64) -> ProgramCall {
		ProgramCall::new(LENDING_PROGRAM, "repay_loan", vec![u64_literal(amount)])
	}

	/// Withdraws liquidity once the lock period has passed.
	pub fn withdraw(now: u64) -> ProgramCall {
		ProgramCall::new(LENDING_PROGRAM, "withdraw_liquidity", vec![u64_literal(now)])
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const OWNER: &str = "aleo1owner";

	#[test]
	fn test_compute_credibility_inputs() {
		let factors = CreditFactors {
			repayment_history: 95,
			position_duration: 12,
			utilization_rate: 40,
			protocol_interactions: 7,
			collateral_diversity: 3,
		};
		let call = ScoreCalls::compute_credibility(OWNER, &factors, 1_700_000_000).unwrap();
		assert_eq!(call.program_id, SCORE_PROGRAM);
		assert_eq!(
			call.inputs,
			vec![
				"aleo1owner",
				"95u64",
				"12u64",
				"40u64",
				"7u64",
				"3u64",
				"1700000000u64"
			]
		);
	}

	#[test]
	fn test_compute_credibility_rejects_out_of_range_factor() {
		let factors = CreditFactors {
			repayment_history: 101,
			position_duration: 0,
			utilization_rate: 0,
			protocol_interactions: 0,
			collateral_diversity: 0,
		};
		let err = ScoreCalls::compute_credibility(OWNER, &factors, 0).unwrap_err();
		assert!(matches!(
			err,
			ProgramCallError::OutOfRange {
				field: "repayment_history",
				value: 101,
				..
			}
		));
	}

	#[test]
	fn test_borrow_formats_tier_as_u8() {
		let call = LendingCalls::borrow(OWNER, 1_000, 900, LendingTier::default(), 42).unwrap();
		assert_eq!(call.function_name, "access_liquidity");
		assert_eq!(call.inputs[3], "3u8");
		assert_eq!(LendingTier::try_from(1), Ok(LendingTier::Elite));
		assert!(LendingTier::try_from(4).is_err());
	}

	#[test]
	fn test_deposit_requires_owner() {
		assert_eq!(
			LendingCalls::deposit("  ", 10, DEFAULT_LOCK_DAYS, 0),
			Err(ProgramCallError::MissingAddress("owner"))
		);
	}

	#[test]
	fn test_into_request_attaches_fee() {
		let request = LendingCalls::repay(250).into_request(500_000);
		assert_eq!(request.program_id, LENDING_PROGRAM);
		assert_eq!(request.function_name, "repay_loan");
		assert_eq!(request.inputs, vec!["250u64".to_string()]);
		assert_eq!(request.fee, 500_000);
		assert!(!request.fee_private);
		assert!(ScoreCalls::commit_score().inputs.is_empty());
	}
}

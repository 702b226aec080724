//! Canonical transaction identifier recognition and wallet status classification.
//!
//! A canonical identifier is the `at1` prefix followed by 58 to 62 base-36
//! characters, compared case-insensitively. Wallet extensions embed it in free
//! text or serialized payloads, so extraction works on arbitrary strings.

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of every canonical transaction identifier.
pub const CANONICAL_PREFIX: &str = "at1";

static CANONICAL_EXACT: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)^at1[a-z0-9]{58,62}$").expect("canonical id pattern"));

static CANONICAL_EMBEDDED: Lazy<Regex> =
	Lazy::new(|| Regex::new(r"(?i)at1[a-z0-9]{58,62}").expect("canonical id pattern"));

/// Returns true if `value` is exactly a canonical identifier.
pub fn is_canonical_id(value: &str) -> bool {
	CANONICAL_EXACT.is_match(value.trim())
}

/// Finds the first canonical identifier embedded in `text`.
///
/// The match must not be glued to surrounding alphanumerics, so longer
/// base-36 runs (keys, record ciphertexts) are not mistaken for identifiers.
/// The substring is returned verbatim.
pub fn extract_canonical_id(text: &str) -> Option<String> {
	CANONICAL_EMBEDDED
		.find_iter(text)
		.find(|m| {
			let before = text[..m.start()].chars().next_back();
			let after = text[m.end()..].chars().next();
			!before.is_some_and(|c| c.is_ascii_alphanumeric())
				&& !after.is_some_and(|c| c.is_ascii_alphanumeric())
		})
		.map(|m| m.as_str().to_string())
}

/// Coarse meaning of a free-text wallet status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
	/// The wallet reports a failure or rejection.
	Failed,
	/// The wallet considers the transaction settled.
	Confirmed,
	/// Anything else; keep polling.
	Pending,
}

/// Classifies a wallet status by case-insensitive substring match.
///
/// Failure markers win over confirmation markers.
pub fn classify_status(status: &str) -> StatusClass {
	let lowered = status.to_ascii_lowercase();
	if lowered.contains("fail") || lowered.contains("reject") {
		StatusClass::Failed
	} else if lowered.contains("complet") || lowered.contains("final") || lowered.contains("accept") {
		StatusClass::Confirmed
	} else {
		StatusClass::Pending
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn id_of_len(len: usize) -> String {
		format!("at1{}", "q".repeat(len))
	}

	#[test]
	fn test_exact_match_bounds() {
		assert!(!is_canonical_id(&id_of_len(57)));
		assert!(is_canonical_id(&id_of_len(58)));
		assert!(is_canonical_id(&id_of_len(60)));
		assert!(is_canonical_id(&id_of_len(62)));
		assert!(!is_canonical_id(&id_of_len(63)));
	}

	#[test]
	fn test_exact_match_is_case_insensitive_and_trimmed() {
		let id = format!("  AT1{}  ", "Q7".repeat(30));
		assert!(is_canonical_id(&id));
		assert!(!is_canonical_id("abc-123"));
		assert!(!is_canonical_id("at1demo"));
	}

	#[test]
	fn test_extracts_embedded_id_verbatim() {
		let id = format!("at1{}", "z9".repeat(30));
		let status = format!("Completed: transaction {} finalized", id);
		assert_eq!(extract_canonical_id(&status), Some(id.clone()));

		let payload = format!("{{\"transactionId\":\"{}\",\"status\":\"Finalized\"}}", id);
		assert_eq!(extract_canonical_id(&payload), Some(id));
	}

	#[test]
	fn test_rejects_ids_glued_to_longer_runs() {
		let glued = format!("x{}", id_of_len(60));
		assert_eq!(extract_canonical_id(&glued), None);
		assert_eq!(extract_canonical_id(&format!("tx{}", id_of_len(60))), None);
		assert_eq!(
			extract_canonical_id(&format!("tx:{}.", id_of_len(60))),
			Some(id_of_len(60))
		);

		let too_long = id_of_len(70);
		assert_eq!(extract_canonical_id(&too_long), None);

		assert_eq!(extract_canonical_id("Pending"), None);
	}

	#[test]
	fn test_classify_status() {
		assert_eq!(classify_status("Failed"), StatusClass::Failed);
		assert_eq!(classify_status("REJECTED by user"), StatusClass::Failed);
		assert_eq!(classify_status("Completed"), StatusClass::Confirmed);
		assert_eq!(classify_status("Finalized"), StatusClass::Confirmed);
		assert_eq!(classify_status("accepted"), StatusClass::Confirmed);
		assert_eq!(classify_status("Pending"), StatusClass::Pending);
		assert_eq!(classify_status(""), StatusClass::Pending);
		assert_eq!(classify_status("Failed to finalize"), StatusClass::Failed);
	}
}

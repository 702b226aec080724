//! String formatting utilities.
//!
//! Transaction and tracking identifiers are long; logs only show a prefix.

/// Truncates an identifier for display purposes.
///
/// Shows only the first 10 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(10) {
		Some((cut, _)) => format!("{}..", &id[..cut]),
		None => id.to_string(),
	}
}

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// RFC 3986 unreserved characters: `A-Z a-z 0-9 - . _ ~`.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes `value` per RFC 3986 with uppercase hex digits.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn only_unreserved_characters_pass() {
		assert_eq!(percent_encode("AZaz09-._~"), "AZaz09-._~");
		assert_eq!(percent_encode("a b+c&d=e/f"), "a%20b%2Bc%26d%3De%2Ff");
		assert_eq!(percent_encode("ü☃"), "%C3%BC%E2%98%83");
		assert_eq!(percent_encode("*"), "%2A");
	}
}

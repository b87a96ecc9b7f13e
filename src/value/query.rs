// crates.io
use percent_encoding::percent_decode_str;
// self
use crate::{error::FormatError, value::Plain};

pub(super) fn parse(text: &str) -> Result<Plain, FormatError> {
	let text = text.trim();
	let text = text.strip_prefix('?').unwrap_or(text);

	if text.is_empty() {
		return Err(invalid("input is blank"));
	}
	if let Some(c) =
		text.chars().find(|c| c.is_whitespace() || c.is_control() || "<>{}\"".contains(*c))
	{
		return Err(invalid(format!("unexpected character {c:?}")));
	}

	let mut entries = Vec::new();

	for pair in text.split('&').filter(|pair| !pair.is_empty()) {
		let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
		let key = decode(raw_key)?;

		if key.is_empty() {
			return Err(invalid("empty parameter name"));
		}

		Plain::push_grouped(&mut entries, key, Plain::text(decode(raw_value)?));
	}

	if entries.is_empty() {
		return Err(invalid("no parameters"));
	}

	Ok(Plain::Object(entries))
}

fn decode(raw: &str) -> Result<String, FormatError> {
	let spaced = raw.replace('+', " ");

	percent_decode_str(&spaced)
		.decode_utf8()
		.map(|decoded| decoded.into_owned())
		.map_err(|_| invalid("parameter is not UTF-8"))
}

fn invalid(message: impl Into<String>) -> FormatError {
	FormatError::InvalidParameters { message: message.into() }
}

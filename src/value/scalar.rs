//! Scalar payloads and the lenient coercions providers force on callers.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use time::{
	Date, PrimitiveDateTime,
	format_description::well_known::{Rfc2822, Rfc3339},
	macros::format_description,
};
// self
use crate::{_prelude::*, error::FormatError, value::UniValue};

/// Leaf value of the universal response tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
	/// UTF-8 text.
	String(String),
	/// Integer or floating-point number.
	Number(serde_json::Number),
	/// Boolean.
	Bool(bool),
	/// Raw bytes; rendered as standard base64.
	Bytes(Vec<u8>),
	/// Point in time; rendered as RFC 3339.
	DateTime(OffsetDateTime),
}
impl Scalar {
	/// Text rendering used by `Display` and equality against string literals.
	pub fn text(&self) -> String {
		match self {
			Scalar::String(text) => text.clone(),
			Scalar::Number(number) => number.to_string(),
			Scalar::Bool(flag) => flag.to_string(),
			Scalar::Bytes(bytes) => STANDARD.encode(bytes),
			Scalar::DateTime(moment) => format_rfc3339(*moment),
		}
	}

	pub(crate) fn to_json_value(&self) -> serde_json::Value {
		match self {
			Scalar::String(text) => serde_json::Value::String(text.clone()),
			Scalar::Number(number) => serde_json::Value::Number(number.clone()),
			Scalar::Bool(flag) => serde_json::Value::Bool(*flag),
			Scalar::Bytes(_) | Scalar::DateTime(_) => serde_json::Value::String(self.text()),
		}
	}
}
impl From<&str> for Scalar {
	fn from(value: &str) -> Self {
		Self::String(value.to_owned())
	}
}
impl From<String> for Scalar {
	fn from(value: String) -> Self {
		Self::String(value)
	}
}
impl From<bool> for Scalar {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i32> for Scalar {
	fn from(value: i32) -> Self {
		Self::Number(value.into())
	}
}
impl From<i64> for Scalar {
	fn from(value: i64) -> Self {
		Self::Number(value.into())
	}
}
impl From<u32> for Scalar {
	fn from(value: u32) -> Self {
		Self::Number(value.into())
	}
}
impl From<u64> for Scalar {
	fn from(value: u64) -> Self {
		Self::Number(value.into())
	}
}
impl From<f64> for Scalar {
	fn from(value: f64) -> Self {
		// Non-finite floats have no JSON form; keep their text instead.
		serde_json::Number::from_f64(value)
			.map(Self::Number)
			.unwrap_or_else(|| Self::String(value.to_string()))
	}
}
impl From<Vec<u8>> for Scalar {
	fn from(value: Vec<u8>) -> Self {
		Self::Bytes(value)
	}
}
impl From<OffsetDateTime> for Scalar {
	fn from(value: OffsetDateTime) -> Self {
		Self::DateTime(value)
	}
}

impl UniValue {
	/// Text of a scalar node; `None` for `Null` and containers.
	pub fn as_text(&self) -> Option<String> {
		self.scalar().map(|scalar| scalar.text())
	}

	/// Coerces the node to `i64`.
	///
	/// Accepts numbers without a fractional part, booleans, date-times (as Unix seconds), and
	/// text holding a decimal, hexadecimal (`0x`), or integral floating-point number.
	pub fn to_i64(&self) -> Result<i64, FormatError> {
		const TARGET: &str = "i64";

		match self.scalar() {
			Some(Scalar::Number(number)) => number
				.as_i64()
				.or_else(|| number.as_f64().and_then(integral))
				.ok_or_else(|| FormatError::conversion(&number, TARGET)),
			Some(Scalar::Bool(flag)) => Ok(i64::from(flag)),
			Some(Scalar::DateTime(moment)) => Ok(moment.unix_timestamp()),
			Some(Scalar::String(text)) =>
				parse_integer(&text).ok_or_else(|| FormatError::conversion(text, TARGET)),
			_ => Err(FormatError::conversion(self.to_json(), TARGET)),
		}
	}

	/// Coerces the node to `i32`, rejecting values outside its range.
	pub fn to_i32(&self) -> Result<i32, FormatError> {
		let wide = self.to_i64()?;

		i32::try_from(wide).map_err(|_| FormatError::conversion(wide, "i32"))
	}

	/// Coerces the node to `f64`; text may use `,` as the decimal separator.
	pub fn to_f64(&self) -> Result<f64, FormatError> {
		const TARGET: &str = "f64";

		match self.scalar() {
			Some(Scalar::Number(number)) =>
				number.as_f64().ok_or_else(|| FormatError::conversion(&number, TARGET)),
			Some(Scalar::Bool(flag)) => Ok(if flag { 1.0 } else { 0.0 }),
			Some(Scalar::String(text)) =>
				parse_float(&text).ok_or_else(|| FormatError::conversion(text, TARGET)),
			_ => Err(FormatError::conversion(self.to_json(), TARGET)),
		}
	}

	/// Coerces the node to `bool`.
	///
	/// Text accepts `true/false`, `yes/no`, `on/off`, `y/n`, and `1/0` in any case; numbers are
	/// `true` when non-zero.
	pub fn to_bool(&self) -> Result<bool, FormatError> {
		const TARGET: &str = "bool";

		match self.scalar() {
			Some(Scalar::Bool(flag)) => Ok(flag),
			Some(Scalar::Number(number)) => Ok(number.as_f64().is_some_and(|value| value != 0.0)),
			Some(Scalar::String(text)) => match text.trim().to_ascii_lowercase().as_str() {
				"true" | "yes" | "on" | "y" | "1" => Ok(true),
				"false" | "no" | "off" | "n" | "0" => Ok(false),
				_ => Err(FormatError::conversion(text, TARGET)),
			},
			_ => Err(FormatError::conversion(self.to_json(), TARGET)),
		}
	}

	/// Coerces the node to a UTC-normalized date-time.
	///
	/// Numbers are Unix seconds. Text may be RFC 3339, RFC 2822, `YYYY-MM-DD hh:mm:ss`,
	/// `YYYY-MM-DD`, `MM/DD/YYYY`, or Unix seconds.
	pub fn to_datetime(&self) -> Result<OffsetDateTime, FormatError> {
		const TARGET: &str = "date-time";

		match self.scalar() {
			Some(Scalar::DateTime(moment)) => Ok(moment),
			Some(Scalar::Number(number)) => number
				.as_i64()
				.and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
				.ok_or_else(|| FormatError::conversion(&number, TARGET)),
			Some(Scalar::String(text)) =>
				parse_datetime(&text).ok_or_else(|| FormatError::conversion(text, TARGET)),
			_ => Err(FormatError::conversion(self.to_json(), TARGET)),
		}
	}

	/// Decodes a base64 text node, or returns the raw bytes of a bytes node.
	pub fn to_bytes(&self) -> Result<Vec<u8>, FormatError> {
		match self.scalar() {
			Some(Scalar::Bytes(bytes)) => Ok(bytes),
			Some(Scalar::String(text)) =>
				STANDARD.decode(text.trim()).map_err(|_| FormatError::conversion(text, "bytes")),
			_ => Err(FormatError::conversion(self.to_json(), "bytes")),
		}
	}
}

fn integral(value: f64) -> Option<i64> {
	(value.is_finite() && value.fract() == 0.0 && value.abs() < 9.2e18).then_some(value as i64)
}

fn parse_integer(text: &str) -> Option<i64> {
	let text = text.trim();
	let (negative, digits) = match text.strip_prefix('-') {
		Some(rest) => (true, rest),
		None => (false, text.strip_prefix('+').unwrap_or(text)),
	};

	if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
		let magnitude = i64::from_str_radix(hex, 16).ok()?;

		return Some(if negative { -magnitude } else { magnitude });
	}

	text.parse::<i64>().ok().or_else(|| parse_float(text).and_then(integral))
}

fn parse_float(text: &str) -> Option<f64> {
	let text = text.trim();
	let normalized = match (text.contains('.'), text.contains(',')) {
		(true, true) => text.replace(',', ""),
		(false, true) => text.replace(',', "."),
		_ => text.to_owned(),
	};

	normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
	let text = text.trim();

	if let Ok(moment) = OffsetDateTime::parse(text, &Rfc3339) {
		return Some(moment.to_offset(time::UtcOffset::UTC));
	}
	if let Ok(moment) = OffsetDateTime::parse(text, &Rfc2822) {
		return Some(moment.to_offset(time::UtcOffset::UTC));
	}
	if let Ok(moment) = PrimitiveDateTime::parse(
		text,
		format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
	) {
		return Some(moment.assume_utc());
	}
	if let Ok(moment) = PrimitiveDateTime::parse(
		text,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
	) {
		return Some(moment.assume_utc());
	}
	if let Ok(day) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
		return Some(day.midnight().assume_utc());
	}
	if let Ok(day) = Date::parse(text, format_description!("[month]/[day]/[year]")) {
		return Some(day.midnight().assume_utc());
	}

	text.parse::<i64>().ok().and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok())
}

fn format_rfc3339(moment: OffsetDateTime) -> String {
	moment.format(&Rfc3339).unwrap_or_else(|_| moment.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn text(value: &str) -> UniValue {
		UniValue::from(value)
	}

	#[test]
	fn integers_accept_provider_spellings() {
		assert_eq!(text("42").to_i32().expect("Decimal text should coerce."), 42);
		assert_eq!(text(" -7 ").to_i64().expect("Padded text should coerce."), -7);
		assert_eq!(text("0x1F").to_i64().expect("Hex text should coerce."), 31);
		assert_eq!(text("3600.0").to_i64().expect("Integral float text should coerce."), 3600);
		assert_eq!(UniValue::from(true).to_i32().expect("Booleans should coerce."), 1);
		assert!(text("3.5").to_i64().is_err());
		assert!(text("abc").to_i32().is_err());
		assert!(UniValue::from(i64::MAX).to_i32().is_err());
		assert!(UniValue::empty().to_i32().is_err());
	}

	#[test]
	fn floats_accept_comma_decimal_separator() {
		assert_eq!(text("1,5").to_f64().expect("Comma decimal should coerce."), 1.5);
		assert_eq!(text("1,234.5").to_f64().expect("Grouped number should coerce."), 1234.5);
		assert_eq!(UniValue::from(2.25).to_f64().expect("Numbers should coerce."), 2.25);
		assert!(text("NaN").to_f64().is_err());
	}

	#[test]
	fn booleans_accept_word_forms() {
		for truthy in ["true", "Yes", "ON", "1", "y"] {
			assert!(text(truthy).to_bool().expect("Truthy word should coerce."), "{truthy}");
		}
		for falsy in ["false", "no", "Off", "0", "N"] {
			assert!(!text(falsy).to_bool().expect("Falsy word should coerce."), "{falsy}");
		}

		assert!(UniValue::from(2).to_bool().expect("Numbers should coerce."));
		assert!(text("maybe").to_bool().is_err());
	}

	#[test]
	fn datetimes_accept_common_formats() {
		let expected = datetime!(2024-03-01 12:30:00 UTC);

		assert_eq!(
			text("2024-03-01T12:30:00Z").to_datetime().expect("RFC 3339 should parse."),
			expected
		);
		assert_eq!(
			text("2024-03-01T14:30:00+02:00").to_datetime().expect("Offsets should normalize."),
			expected
		);
		assert_eq!(
			text("Fri, 01 Mar 2024 12:30:00 +0000").to_datetime().expect("RFC 2822 should parse."),
			expected
		);
		assert_eq!(
			text("2024-03-01 12:30:00").to_datetime().expect("SQL style should parse."),
			expected
		);
		assert_eq!(
			text("03/01/2024").to_datetime().expect("US dates should parse."),
			datetime!(2024-03-01 0:00 UTC)
		);
		assert_eq!(
			UniValue::from(1_709_296_200_i64).to_datetime().expect("Unix seconds should parse."),
			expected
		);
		assert!(text("yesterday").to_datetime().is_err());
	}

	#[test]
	fn text_rendering_covers_every_scalar() {
		assert_eq!(
			UniValue::from(Scalar::Bytes(vec![0xde, 0xad])).as_text().as_deref(),
			Some("3q0=")
		);
		assert_eq!(
			UniValue::from(datetime!(2024-03-01 12:30:00 UTC)).to_string(),
			"2024-03-01T12:30:00Z"
		);
		assert_eq!(UniValue::from(false).to_string(), "false");
		assert!(UniValue::object().as_text().is_none());
		assert_eq!(text("3q0=").to_bytes().expect("Base64 text should decode."), vec![0xde, 0xad]);
	}
}

// self
use crate::{error::FormatError, value::Plain};

pub(super) fn parse(text: &str) -> Result<Plain, FormatError> {
	serde_json::from_str::<serde_json::Value>(text)
		.map(Plain::from_json)
		.map_err(|e| FormatError::InvalidJson { message: e.to_string() })
}

#[cfg(test)]
mod tests {
	// self
	use crate::{error::FormatError, value::UniValue};

	#[test]
	fn json_types_survive_parsing() {
		let tree = UniValue::parse_json(
			"{\"s\":\"text\",\"i\":3600,\"f\":1.5,\"b\":true,\"n\":null,\"a\":[1,{\"k\":\"v\"}]}",
		)
		.expect("Fixture JSON should parse.");

		assert_eq!(tree.get("s"), "text");
		assert_eq!(tree.get("i").to_i64().expect("Integer should coerce."), 3600);
		assert_eq!(tree.get("f").to_f64().expect("Float should coerce."), 1.5);
		assert!(tree.get("b").to_bool().expect("Boolean should coerce."));
		assert!(tree.get("n").is_null());
		assert!(tree.contains_key("n"));
		assert_eq!(tree.get("a").at(1).get("k"), "v");
		assert_eq!(tree.get("a").to_string(), "[1,{\"k\":\"v\"}]");
	}

	#[test]
	fn malformed_json_is_rejected() {
		let err = UniValue::parse_json("{\"a\":").expect_err("Truncated JSON should fail.");

		assert!(matches!(err, FormatError::InvalidJson { .. }));

		let (ok, value) = UniValue::try_parse_json("not json");

		assert!(!ok);
		assert!(value.is_null());
	}
}

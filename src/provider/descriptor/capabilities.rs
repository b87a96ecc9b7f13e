// self
use crate::_prelude::*;

/// Capability flags consulted before capability-gated operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCapabilities {
	/// Provider can refresh tokens.
	pub supports_refresh: bool,
	/// Provider can revoke tokens.
	pub supports_revoke: bool,
	/// Character joining scope values (`' '` per RFC 6749, `','` for some legacy providers).
	pub scope_separator: char,
	/// Scope requested when the client configures none.
	pub default_scope: Option<String>,
}
impl ProviderCapabilities {
	/// Joins `scopes` with the separator, falling back to the default scope when empty.
	pub fn join_scope<I, S>(&self, scopes: I) -> Option<String>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut buf = String::new();

		for scope in scopes {
			let scope = scope.as_ref().trim();

			if scope.is_empty() {
				continue;
			}
			if !buf.is_empty() {
				buf.push(self.scope_separator);
			}

			buf.push_str(scope);
		}

		if buf.is_empty() { self.default_scope.clone() } else { Some(buf) }
	}
}
impl Default for ProviderCapabilities {
	fn default() -> Self {
		Self {
			supports_refresh: false,
			supports_revoke: false,
			scope_separator: ' ',
			default_scope: None,
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scope_joining_uses_separator_and_default() {
		let mut capabilities = ProviderCapabilities::default();

		assert_eq!(
			capabilities.join_scope(["email", " ", "profile"]),
			Some("email profile".into())
		);
		assert_eq!(capabilities.join_scope(Vec::<String>::new()), None);

		capabilities.scope_separator = ',';
		capabilities.default_scope = Some("basic".into());

		assert_eq!(capabilities.join_scope(["email", "profile"]), Some("email,profile".into()));
		assert_eq!(capabilities.join_scope(Vec::<String>::new()), Some("basic".into()));
	}
}

//! Access-token hierarchy parsed out of provider responses.
//!
//! [`AccessToken`] is either empty, an OAuth 1.0 token/secret pair ([`OAuthAccessToken`]), or an
//! OAuth 2.0 bearer token ([`OAuth2AccessToken`]). Every concrete token keeps the parsed response
//! so provider-specific extras (user ids, screen names, `id_token` claims) stay reachable.

pub mod oauth1;
pub mod oauth2;
pub mod secret;

pub use oauth1::*;
pub use oauth2::*;
pub use secret::*;

// self
use crate::{_prelude::*, error::AccessTokenError, value::UniValue};

/// Token obtained from (or handed back to) a protocol client.
#[derive(Clone, Debug, Default)]
pub enum AccessToken {
	/// No token.
	#[default]
	Empty,
	/// OAuth 1.0 token and token secret.
	OAuth1(OAuthAccessToken),
	/// OAuth 2.0 bearer token.
	OAuth2(OAuth2AccessToken),
}
impl AccessToken {
	/// Parses a response body, detecting OAuth 1.0 (`oauth_token`) or OAuth 2.0 (`access_token`).
	pub fn parse(text: &str) -> Result<Self> {
		let raw = UniValue::parse(text)?;

		Ok(Self::from_value(raw, OffsetDateTime::now_utc())?)
	}

	/// Parses a response body into a specific token kind.
	pub fn parse_as<T>(text: &str) -> Result<T>
	where
		T: TryFrom<AccessToken, Error = AccessTokenError>,
	{
		Ok(T::try_from(Self::parse(text)?)?)
	}

	/// Builds a token from an already parsed response; relative lifetimes count from `issued_at`.
	pub fn from_value(raw: UniValue, issued_at: OffsetDateTime) -> Result<Self, AccessTokenError> {
		if raw.get("oauth_token").has_value() {
			return OAuthAccessToken::from_value(raw, issued_at).map(Self::OAuth1);
		}
		if raw.get("access_token").has_value() {
			return OAuth2AccessToken::from_value(raw, issued_at).map(Self::OAuth2);
		}

		Err(AccessTokenError::UnrecognizedShape)
	}

	/// Human-readable label of the token kind.
	pub const fn kind(&self) -> &'static str {
		match self {
			AccessToken::Empty => EMPTY_KIND,
			AccessToken::OAuth1(_) => OAuthAccessToken::KIND,
			AccessToken::OAuth2(_) => OAuth2AccessToken::KIND,
		}
	}

	/// Token value, if any.
	pub fn value(&self) -> Option<&Secret> {
		match self {
			AccessToken::Empty => None,
			AccessToken::OAuth1(token) => Some(token.value()),
			AccessToken::OAuth2(token) => Some(token.value()),
		}
	}

	/// Parsed provider response the token came from.
	pub fn raw(&self) -> Option<&UniValue> {
		match self {
			AccessToken::Empty => None,
			AccessToken::OAuth1(token) => Some(token.raw()),
			AccessToken::OAuth2(token) => Some(token.raw()),
		}
	}

	/// Returns `true` for [`AccessToken::Empty`] or a token whose value is blank.
	pub fn is_empty(&self) -> bool {
		self.value().is_none_or(Secret::is_blank)
	}

	/// Treats a missing token and an empty token alike.
	pub fn is_null_or_empty(token: Option<&AccessToken>) -> bool {
		token.is_none_or(AccessToken::is_empty)
	}
}
impl From<OAuthAccessToken> for AccessToken {
	fn from(value: OAuthAccessToken) -> Self {
		Self::OAuth1(value)
	}
}
impl From<OAuth2AccessToken> for AccessToken {
	fn from(value: OAuth2AccessToken) -> Self {
		Self::OAuth2(value)
	}
}
impl TryFrom<AccessToken> for OAuthAccessToken {
	type Error = AccessTokenError;

	fn try_from(value: AccessToken) -> Result<Self, Self::Error> {
		match value {
			AccessToken::OAuth1(token) => Ok(token),
			other =>
				Err(AccessTokenError::KindMismatch { expected: Self::KIND, found: other.kind() }),
		}
	}
}
impl TryFrom<AccessToken> for OAuth2AccessToken {
	type Error = AccessTokenError;

	fn try_from(value: AccessToken) -> Result<Self, Self::Error> {
		match value {
			AccessToken::OAuth2(token) => Ok(token),
			other =>
				Err(AccessTokenError::KindMismatch { expected: Self::KIND, found: other.kind() }),
		}
	}
}

const EMPTY_KIND: &str = "empty";

/// Non-blank text at `key`.
pub(crate) fn text_at(raw: &UniValue, key: &str) -> Option<String> {
	raw.get(key).as_text().filter(|text| !text.trim().is_empty())
}

/// Absolute expiry from a relative lifetime in seconds.
///
/// Zero, garbage, or a lifetime past the representable range means "unknown".
pub(crate) fn expiry_at(
	raw: &UniValue,
	key: &str,
	issued_at: OffsetDateTime,
) -> Option<OffsetDateTime> {
	raw.get(key)
		.to_i64()
		.ok()
		.filter(|seconds| *seconds > 0)
		.and_then(|seconds| issued_at.checked_add(Duration::seconds(seconds)))
}

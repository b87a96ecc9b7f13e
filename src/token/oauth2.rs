//! OAuth 2.0 bearer tokens.

// self
use crate::{
	_prelude::*,
	error::AccessTokenError,
	token::{Secret, expiry_at, text_at},
	value::UniValue,
};

/// OAuth 2.0 access token.
#[derive(Clone, Debug)]
pub struct OAuth2AccessToken {
	value: Secret,
	refresh_token: Option<Secret>,
	token_type: Option<String>,
	expires_at: Option<OffsetDateTime>,
	scope: Option<String>,
	id_token: Option<Secret>,
	raw: UniValue,
}
impl OAuth2AccessToken {
	pub(crate) const KIND: &'static str = "OAuth 2.0";

	/// Builds a token from `access_token`, `refresh_token`, `token_type`, `expires_in` (or
	/// `expires`), `scope`, and `id_token`.
	pub fn from_value(raw: UniValue, issued_at: OffsetDateTime) -> Result<Self, AccessTokenError> {
		let value = text_at(&raw, "access_token").ok_or(AccessTokenError::UnrecognizedShape)?;
		let expires_at = expiry_at(&raw, "expires_in", issued_at)
			.or_else(|| expiry_at(&raw, "expires", issued_at));

		Ok(Self {
			value: value.into(),
			refresh_token: text_at(&raw, "refresh_token").map(Secret::from),
			token_type: text_at(&raw, "token_type"),
			expires_at,
			scope: text_at(&raw, "scope"),
			id_token: text_at(&raw, "id_token").map(Secret::from),
			raw,
		})
	}

	/// Keeps `previous` as the refresh token when the response did not rotate it.
	pub(crate) fn or_refresh_token(mut self, previous: Option<&Secret>) -> Self {
		if self.refresh_token.is_none() {
			self.refresh_token = previous.cloned();
		}

		self
	}

	/// `access_token` value.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// `refresh_token` value.
	pub fn refresh_token(&self) -> Option<&Secret> {
		self.refresh_token.as_ref()
	}

	/// `token_type` as reported by the provider (usually `Bearer`).
	pub fn token_type(&self) -> Option<&str> {
		self.token_type.as_deref()
	}

	/// Instant the token stops working, when the provider reports one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Granted scope, when the provider echoes it.
	pub fn scope(&self) -> Option<&str> {
		self.scope.as_deref()
	}

	/// OpenID Connect `id_token`.
	pub fn id_token(&self) -> Option<&Secret> {
		self.id_token.as_ref()
	}

	/// Parsed provider response.
	pub fn raw(&self) -> &UniValue {
		&self.raw
	}

	/// Returns `true` once `expires_at` has passed.
	pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at.is_some_and(|expires_at| expires_at <= now)
	}
}

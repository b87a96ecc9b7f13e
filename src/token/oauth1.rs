//! OAuth 1.0 access tokens and the temporary request token of the three-legged flow.

// self
use crate::{
	_prelude::*,
	error::AccessTokenError,
	token::{Secret, expiry_at, text_at},
	value::UniValue,
};

/// OAuth 1.0 access token: token value, token secret, and optional session handle.
#[derive(Clone, Debug)]
pub struct OAuthAccessToken {
	value: Secret,
	token_secret: Secret,
	session_handle: Option<Secret>,
	expires_at: Option<OffsetDateTime>,
	authorization_expires_at: Option<OffsetDateTime>,
	raw: UniValue,
}
impl OAuthAccessToken {
	pub(crate) const KIND: &'static str = "OAuth 1.0";

	/// Builds a token from `oauth_token`, `oauth_token_secret`, `oauth_session_handle`,
	/// `oauth_expires_in`, and `oauth_authorization_expires_in`.
	pub fn from_value(raw: UniValue, issued_at: OffsetDateTime) -> Result<Self, AccessTokenError> {
		let value = text_at(&raw, "oauth_token").ok_or(AccessTokenError::UnrecognizedShape)?;
		let token_secret =
			raw.get("oauth_token_secret").as_text().ok_or(AccessTokenError::MissingTokenSecret)?;

		Ok(Self {
			value: value.into(),
			token_secret: token_secret.into(),
			session_handle: text_at(&raw, "oauth_session_handle").map(Secret::from),
			expires_at: expiry_at(&raw, "oauth_expires_in", issued_at),
			authorization_expires_at: expiry_at(&raw, "oauth_authorization_expires_in", issued_at),
			raw,
		})
	}

	/// `oauth_token` value.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// `oauth_token_secret` value.
	pub fn token_secret(&self) -> &Secret {
		&self.token_secret
	}

	/// `oauth_session_handle`, required to refresh the token.
	pub fn session_handle(&self) -> Option<&Secret> {
		self.session_handle.as_ref()
	}

	/// Instant the token stops working, when the provider reports one.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}

	/// Instant the session handle stops working, when the provider reports one.
	pub fn authorization_expires_at(&self) -> Option<OffsetDateTime> {
		self.authorization_expires_at
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

/// OAuth 1.0 temporary credentials handed to the user-authorization step.
#[derive(Clone, Debug)]
pub struct RequestToken {
	value: Secret,
	token_secret: Secret,
	callback_confirmed: bool,
	authorization_url: Url,
	raw: UniValue,
}
impl RequestToken {
	/// Builds the token from a request-token response and derives the user-authorization URL
	/// from `authorize_endpoint` plus `extra_params`.
	pub fn from_value(
		raw: UniValue,
		authorize_endpoint: &Url,
		extra_params: &[(String, String)],
	) -> Result<Self, AccessTokenError> {
		let value = text_at(&raw, "oauth_token").ok_or(AccessTokenError::MissingRequestToken)?;
		let token_secret =
			raw.get("oauth_token_secret").as_text().ok_or(AccessTokenError::MissingTokenSecret)?;
		let callback_confirmed = raw.get("oauth_callback_confirmed").to_bool().unwrap_or(false);
		let mut authorization_url = authorize_endpoint.clone();

		{
			let mut pairs = authorization_url.query_pairs_mut();

			pairs.append_pair("oauth_token", &value);

			for (name, param) in extra_params {
				pairs.append_pair(name, param);
			}
		}

		Ok(Self {
			value: value.into(),
			token_secret: token_secret.into(),
			callback_confirmed,
			authorization_url,
			raw,
		})
	}

	/// `oauth_token` value; also the key the token is cached under.
	pub fn value(&self) -> &Secret {
		&self.value
	}

	/// `oauth_token_secret` value.
	pub fn token_secret(&self) -> &Secret {
		&self.token_secret
	}

	/// `oauth_callback_confirmed` flag.
	pub fn callback_confirmed(&self) -> bool {
		self.callback_confirmed
	}

	/// URL the end-user must visit to authorize the token.
	pub fn authorization_url(&self) -> &Url {
		&self.authorization_url
	}

	/// Parsed provider response.
	pub fn raw(&self) -> &UniValue {
		&self.raw
	}
}

//! `Authorization` header material for both protocol generations.
//!
//! OAuth 1.0 requests carry a signed [`OAuthAuthorization`] parameter set; OAuth 2.0 requests
//! carry a bearer token, HTTP Basic client credentials, or a provider-specific scheme.

mod encode;
mod nonce;
mod oauth1;
mod parameter;

pub use encode::*;
pub use nonce::*;
pub use oauth1::*;
pub use parameter::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, token::Secret};

/// Value rendered into an HTTP `Authorization` header.
#[derive(Clone)]
pub enum HttpAuthorization {
	/// Signed OAuth 1.0 parameter set.
	OAuth(OAuthAuthorization),
	/// `Bearer <token>`.
	Bearer(Secret),
	/// `Basic base64(user:password)`; both parts are form-encoded first.
	Basic {
		/// User name (OAuth 2.0 client id).
		username: String,
		/// Password (OAuth 2.0 client secret).
		password: Secret,
	},
	/// `<scheme> <value>` for providers that expect e.g. `OAuth <token>`.
	Custom {
		/// Scheme keyword.
		scheme: String,
		/// Credential value.
		value: Secret,
	},
}
impl HttpAuthorization {
	/// Header value for this credential.
	pub fn header_value(&self) -> String {
		match self {
			HttpAuthorization::OAuth(auth) => auth.header_value(),
			HttpAuthorization::Bearer(token) => format!("Bearer {}", token.expose()),
			HttpAuthorization::Basic { username, password } => {
				let pair =
					format!("{}:{}", percent_encode(username), percent_encode(password.expose()));

				format!("Basic {}", STANDARD.encode(pair))
			},
			HttpAuthorization::Custom { scheme, value } => format!("{scheme} {}", value.expose()),
		}
	}
}
impl Debug for HttpAuthorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			HttpAuthorization::OAuth(auth) => f.debug_tuple("OAuth").field(auth).finish(),
			HttpAuthorization::Bearer(token) => f.debug_tuple("Bearer").field(token).finish(),
			HttpAuthorization::Basic { username, password } => f
				.debug_struct("Basic")
				.field("username", username)
				.field("password", password)
				.finish(),
			HttpAuthorization::Custom { scheme, value } =>
				f.debug_struct("Custom").field("scheme", scheme).field("value", value).finish(),
		}
	}
}
impl From<OAuthAuthorization> for HttpAuthorization {
	fn from(value: OAuthAuthorization) -> Self {
		Self::OAuth(value)
	}
}

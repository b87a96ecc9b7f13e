// self
use crate::_prelude::*;

/// How OAuth 2.0 client credentials reach the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form body parameters `client_id`/`client_secret`.
	#[default]
	ClientSecretPost,
	/// Public clients: `client_id` only.
	None,
}

/// How an OAuth 2.0 access token travels on API calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenDelivery {
	/// `Authorization: <scheme> <token>`.
	Header {
		/// Scheme keyword, `Bearer` for RFC 6750 providers.
		scheme: String,
	},
	/// Query parameter carrying the token.
	Query {
		/// Parameter name, e.g. `access_token` or `oauth_token`.
		name: String,
	},
}
impl TokenDelivery {
	/// RFC 6750 bearer header.
	pub fn bearer() -> Self {
		Self::Header { scheme: "Bearer".into() }
	}
}
impl Default for TokenDelivery {
	fn default() -> Self {
		Self::bearer()
	}
}

/// Provider-specific quirks that influence how requests are shaped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Client authentication at the OAuth 2.0 token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// OAuth 2.0 access-token placement on API calls.
	pub token_delivery: TokenDelivery,
	/// Extra parameters appended to the authorization URL.
	pub extra_authorize_params: Vec<(String, String)>,
	/// OAuth 2.0 provider rejects authorization requests without PKCE.
	pub pkce_required: bool,
	/// OAuth 1.0 `realm` rendered in the `Authorization` header.
	pub realm: Option<String>,
}

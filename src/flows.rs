//! Protocol state machines for OAuth 1.0 and OAuth 2.0 providers.
//!
//! Both clients read a [`ProviderDescriptor`](crate::provider::ProviderDescriptor), talk to the
//! provider through an [`HttpTransport`](crate::http::HttpTransport), and keep the last obtained
//! token in memory. Every operation issues exactly one HTTP call.

pub mod common;
pub mod oauth1;
pub mod oauth2;

pub use oauth1::*;
pub use oauth2::*;

// self
use crate::{
	_prelude::*,
	http::{HeaderMap, HttpResponse, header},
	value::UniValue,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// OAuth 1.0 client specialized for the crate's default reqwest transport stack.
pub type ReqwestOAuthClient = OAuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;
#[cfg(feature = "reqwest")]
/// OAuth 2.0 client specialized for the crate's default reqwest transport stack.
pub type ReqwestOAuth2Client = OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Position of a client in the authorization protocol.
///
/// `Unauthorized → RequestTokenObtained (OAuth 1.0) → AuthorizationPending →
/// AccessTokenObtained`, with `Refreshing` and `Revoking` as transient states around the
/// corresponding calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientState {
	/// No token and no authorization in progress.
	#[default]
	Unauthorized,
	/// OAuth 1.0 temporary credentials were issued.
	RequestTokenObtained,
	/// The user was sent to the authorization endpoint.
	AuthorizationPending,
	/// An access token is held.
	AccessTokenObtained,
	/// A refresh call is in flight.
	Refreshing,
	/// A revocation call is in flight.
	Revoking,
}

/// Successful provider response returned by signed and authorized requests.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response `Content-Type`, when present.
	pub content_type: Option<String>,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Body parsed into a value tree, detecting JSON, XML, or form encoding.
	pub fn parse(&self) -> Result<UniValue> {
		Ok(UniValue::parse(&self.text())?)
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let content_type = response
			.headers()
			.get(header::CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);
		let status = response.status().as_u16();
		let (parts, body) = response.into_parts();

		Self { status, content_type, headers: parts.headers, body }
	}
}

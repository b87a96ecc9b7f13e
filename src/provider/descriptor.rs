//! Provider descriptor data structures shared by both protocol clients.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Capability flags and scope formatting.
pub mod capabilities;
/// Provider-specific wire quirks.
pub mod quirks;

pub use builder::*;
pub use capabilities::*;
pub use quirks::*;

// self
use crate::{
	_prelude::*,
	provider::{ProviderId, UserInfoEndpoint},
};

/// Protocol generation spoken by a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
	/// OAuth 1.0a: request token, user authorization, signed access-token exchange.
	#[serde(rename = "oauth1")]
	OAuth1,
	/// OAuth 2.0: authorization code, bearer tokens.
	#[serde(rename = "oauth2")]
	OAuth2,
}
impl Protocol {
	/// Human-readable protocol label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Protocol::OAuth1 => "OAuth 1.0",
			Protocol::OAuth2 => "OAuth 2.0",
		}
	}
}
impl Display for Protocol {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// User-authorization endpoint the end-user is redirected to.
	pub authorization: Url,
	/// Access-token endpoint (OAuth 1.0) or token endpoint (OAuth 2.0).
	pub token: Url,
	/// OAuth 1.0 request-token endpoint.
	pub request_token: Option<Url>,
	/// Dedicated refresh endpoint; defaults to [`token`](Self::token).
	pub refresh: Option<Url>,
	/// Revocation endpoint.
	pub revocation: Option<Url>,
}

/// Immutable provider descriptor consumed by the protocol clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Protocol generation.
	pub protocol: Protocol,
	/// Endpoint definitions.
	pub endpoints: ProviderEndpoints,
	/// Capability flags and scope defaults.
	pub capabilities: ProviderCapabilities,
	/// Wire quirks.
	pub quirks: ProviderQuirks,
	/// Profile endpoint and its field mapping.
	pub user_info: Option<UserInfoEndpoint>,
}
impl ProviderDescriptor {
	/// Starts an OAuth 1.0 descriptor.
	pub fn oauth1(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, Protocol::OAuth1)
	}

	/// Starts an OAuth 2.0 descriptor.
	pub fn oauth2(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id, Protocol::OAuth2)
	}

	/// Endpoint used for refresh requests.
	pub fn refresh_endpoint(&self) -> &Url {
		self.endpoints.refresh.as_ref().unwrap_or(&self.endpoints.token)
	}

	/// Fails with [`Error::NotSupported`] unless the operation's capability flag is set.
	pub(crate) fn ensure_supported(&self, supported: bool, operation: &'static str) -> Result<()> {
		if supported {
			Ok(())
		} else {
			Err(Error::NotSupported { provider: self.id.to_string(), operation })
		}
	}
}

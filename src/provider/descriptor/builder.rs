// self
use crate::{
	_prelude::*,
	provider::{
		ClientAuthMethod, Protocol, ProviderCapabilities, ProviderDescriptor, ProviderEndpoints,
		ProviderId, ProviderQuirks, TokenDelivery, UserInfoEndpoint,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is mandatory for both protocols.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for both protocols.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// OAuth 1.0 providers must declare where request tokens come from.
	#[error("OAuth 1.0 descriptors require a request-token endpoint.")]
	MissingRequestTokenEndpoint,
	/// OAuth 2.0 has no request-token leg.
	#[error("OAuth 2.0 descriptors cannot declare a request-token endpoint.")]
	UnexpectedRequestTokenEndpoint,
	/// Revocation capability needs somewhere to send the request.
	#[error("The `supports_revoke` flag requires a revocation endpoint.")]
	MissingRevocationEndpoint,
	/// PKCE only exists in OAuth 2.0.
	#[error("The `pkce_required` flag is only valid for OAuth 2.0 descriptors.")]
	PkceRequiresOAuth2,
	/// Endpoints must use HTTPS, except for loopback development hosts.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope separators that are control characters.
	#[error("Scope separator must be a printable character.")]
	InvalidScopeSeparator {
		/// Invalid separator that was supplied.
		separator: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	id: ProviderId,
	protocol: Protocol,
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	request_token_endpoint: Option<Url>,
	refresh_endpoint: Option<Url>,
	revocation_endpoint: Option<Url>,
	capabilities: ProviderCapabilities,
	quirks: ProviderQuirks,
	user_info: Option<UserInfoEndpoint>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder for the given protocol.
	pub fn new(id: ProviderId, protocol: Protocol) -> Self {
		Self {
			id,
			protocol,
			authorization_endpoint: None,
			token_endpoint: None,
			request_token_endpoint: None,
			refresh_endpoint: None,
			revocation_endpoint: None,
			capabilities: ProviderCapabilities::default(),
			quirks: ProviderQuirks::default(),
			user_info: None,
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the OAuth 1.0 request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token_endpoint = Some(url);

		self
	}

	/// Sets a refresh endpoint distinct from the token endpoint.
	///
	/// Refresh stays gated by [`supports_refresh`](Self::supports_refresh).
	pub fn refresh_endpoint(mut self, url: Url) -> Self {
		self.refresh_endpoint = Some(url);

		self
	}

	/// Sets the revocation endpoint and enables revocation.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);
		self.capabilities.supports_revoke = true;

		self
	}

	/// Enables or disables token refresh.
	pub fn supports_refresh(mut self, enabled: bool) -> Self {
		self.capabilities.supports_refresh = enabled;

		self
	}

	/// Sets the scope separator.
	pub fn scope_separator(mut self, separator: char) -> Self {
		self.capabilities.scope_separator = separator;

		self
	}

	/// Sets the scope requested when the client configures none.
	pub fn default_scope(mut self, scope: impl Into<String>) -> Self {
		self.capabilities.default_scope = Some(scope.into());

		self
	}

	/// Overrides the token-endpoint client authentication method.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.quirks.client_auth_method = method;

		self
	}

	/// Overrides how access tokens travel on API calls.
	pub fn token_delivery(mut self, delivery: TokenDelivery) -> Self {
		self.quirks.token_delivery = delivery;

		self
	}

	/// Appends a fixed parameter to every authorization URL.
	pub fn authorize_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.quirks.extra_authorize_params.push((name.into(), value.into()));

		self
	}

	/// Requires PKCE on OAuth 2.0 authorization requests.
	pub fn pkce_required(mut self, required: bool) -> Self {
		self.quirks.pkce_required = required;

		self
	}

	/// Sets the OAuth 1.0 header realm.
	pub fn realm(mut self, realm: impl Into<String>) -> Self {
		self.quirks.realm = Some(realm.into());

		self
	}

	/// Overrides the provider quirks wholesale.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Declares the user-info endpoint.
	pub fn user_info(mut self, endpoint: UserInfoEndpoint) -> Self {
		self.user_info = Some(endpoint);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let endpoints = ProviderEndpoints {
			authorization,
			token,
			request_token: self.request_token_endpoint,
			refresh: self.refresh_endpoint,
			revocation: self.revocation_endpoint,
		};
		let descriptor = ProviderDescriptor {
			id: self.id,
			protocol: self.protocol,
			endpoints,
			capabilities: self.capabilities,
			quirks: self.quirks,
			user_info: self.user_info,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	pub fn validate(&self) -> Result<(), ProviderDescriptorError> {
		match (self.protocol, self.endpoints.request_token.as_ref()) {
			(Protocol::OAuth1, None) => {
				return Err(ProviderDescriptorError::MissingRequestTokenEndpoint);
			},
			(Protocol::OAuth2, Some(_)) => {
				return Err(ProviderDescriptorError::UnexpectedRequestTokenEndpoint);
			},
			_ => {},
		}

		if self.quirks.pkce_required && self.protocol != Protocol::OAuth2 {
			return Err(ProviderDescriptorError::PkceRequiresOAuth2);
		}
		if self.capabilities.supports_revoke && self.endpoints.revocation.is_none() {
			return Err(ProviderDescriptorError::MissingRevocationEndpoint);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		for (name, url) in [
			("request-token", self.endpoints.request_token.as_ref()),
			("refresh", self.endpoints.refresh.as_ref()),
			("revocation", self.endpoints.revocation.as_ref()),
			("user-info", self.user_info.as_ref().map(|endpoint| &endpoint.url)),
		] {
			if let Some(url) = url {
				validate_endpoint(name, url)?;
			}
		}

		validate_scope_separator(self.capabilities.scope_separator)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	let loopback = matches!(
		url.host(),
		Some(url::Host::Domain("localhost"))
			| Some(url::Host::Ipv4(std::net::Ipv4Addr::LOCALHOST))
			| Some(url::Host::Ipv6(std::net::Ipv6Addr::LOCALHOST))
	);

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ =>
			Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn validate_scope_separator(separator: char) -> Result<(), ProviderDescriptorError> {
	if separator.is_control() {
		Err(ProviderDescriptorError::InvalidScopeSeparator { separator })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}

	fn id() -> ProviderId {
		ProviderId::new("demo").expect("Fixture identifier should be valid.")
	}

	fn oauth1() -> ProviderDescriptorBuilder {
		ProviderDescriptor::oauth1(id())
			.authorization_endpoint(url("https://api.example.com/oauth/authorize"))
			.token_endpoint(url("https://api.example.com/oauth/access_token"))
	}

	#[test]
	fn oauth1_requires_request_token_endpoint() {
		assert_eq!(oauth1().build(), Err(ProviderDescriptorError::MissingRequestTokenEndpoint));

		let descriptor = oauth1()
			.request_token_endpoint(url("https://api.example.com/oauth/request_token"))
			.realm("photos")
			.build()
			.expect("Complete OAuth 1.0 descriptor should build.");

		assert_eq!(descriptor.protocol, Protocol::OAuth1);
		assert_eq!(descriptor.refresh_endpoint(), &descriptor.endpoints.token);
		assert_eq!(descriptor.quirks.realm.as_deref(), Some("photos"));
	}

	#[test]
	fn refresh_endpoint_leaves_the_capability_flag_alone() {
		let request_token = url("https://api.example.com/oauth/request_token");
		let renew = url("https://api.example.com/oauth/renew");
		let disabled = oauth1()
			.request_token_endpoint(request_token.clone())
			.supports_refresh(false)
			.refresh_endpoint(renew.clone())
			.build()
			.expect("Descriptor should build.");

		assert!(!disabled.capabilities.supports_refresh);
		assert_eq!(disabled.refresh_endpoint(), &renew);

		let enabled = oauth1()
			.request_token_endpoint(request_token)
			.refresh_endpoint(renew)
			.supports_refresh(true)
			.build()
			.expect("Descriptor should build.");

		assert!(enabled.capabilities.supports_refresh);
	}

	#[test]
	fn oauth2_rejects_request_token_and_oauth1_rejects_pkce() {
		let err = ProviderDescriptor::oauth2(id())
			.authorization_endpoint(url("https://example.com/authorize"))
			.token_endpoint(url("https://example.com/token"))
			.request_token_endpoint(url("https://example.com/request"))
			.build()
			.expect_err("OAuth 2.0 descriptors cannot carry a request-token endpoint.");

		assert_eq!(err, ProviderDescriptorError::UnexpectedRequestTokenEndpoint);

		let err = oauth1()
			.request_token_endpoint(url("https://api.example.com/oauth/request_token"))
			.pkce_required(true)
			.build()
			.expect_err("PKCE must be rejected for OAuth 1.0.");

		assert_eq!(err, ProviderDescriptorError::PkceRequiresOAuth2);
	}

	#[test]
	fn endpoints_must_be_secure_outside_loopback() {
		let err = ProviderDescriptor::oauth2(id())
			.authorization_endpoint(url("http://example.com/authorize"))
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect_err("Plain HTTP must be rejected.");

		assert!(matches!(
			err,
			ProviderDescriptorError::InsecureEndpoint { endpoint: "authorization", .. }
		));

		ProviderDescriptor::oauth2(id())
			.authorization_endpoint(url("http://localhost:8080/authorize"))
			.token_endpoint(url("http://127.0.0.1:8080/token"))
			.build()
			.expect("Loopback hosts may use plain HTTP.");
	}

	#[test]
	fn capability_and_separator_validation() {
		let mut descriptor = ProviderDescriptor::oauth2(id())
			.authorization_endpoint(url("https://example.com/authorize"))
			.token_endpoint(url("https://example.com/token"))
			.build()
			.expect("Minimal descriptor should build.");

		descriptor.capabilities.supports_revoke = true;

		assert_eq!(descriptor.validate(), Err(ProviderDescriptorError::MissingRevocationEndpoint));

		descriptor.capabilities.supports_revoke = false;
		descriptor.capabilities.scope_separator = '\n';

		assert_eq!(
			descriptor.validate(),
			Err(ProviderDescriptorError::InvalidScopeSeparator { separator: '\n' })
		);
	}

	#[test]
	fn descriptors_round_trip_through_serde() {
		let descriptor = ProviderDescriptor::oauth2(id())
			.authorization_endpoint(url("https://example.com/authorize"))
			.token_endpoint(url("https://example.com/token"))
			.revocation_endpoint(url("https://example.com/revoke"))
			.client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.token_delivery(TokenDelivery::Query { name: "access_token".into() })
			.authorize_param("access_type", "offline")
			.build()
			.expect("Descriptor should build.");
		let json = serde_json::to_string(&descriptor).expect("Descriptor should serialize.");
		let restored: ProviderDescriptor =
			serde_json::from_str(&json).expect("Descriptor should deserialize.");

		assert_eq!(restored, descriptor);
		assert!(restored.capabilities.supports_revoke);
	}
}

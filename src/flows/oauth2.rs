//! OAuth 2.0 client: authorization code (with optional PKCE), client credentials, refresh,
//! revocation, and bearer-authorized calls.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	authorization::{HttpAuthorization, HttpParameter},
	error::{AccessTokenError, ApiError, ConfigError},
	flows::{
		ApiResponse, ClientState,
		common::{self, Dispatcher},
	},
	http::{HttpTransport, Method},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	oauth::TransportErrorMapper,
	provider::{
		ClientAuthMethod, Protocol, ProviderDescriptor, ProviderDescriptorError, TokenDelivery,
		UserInfo, UserInfoMethod,
	},
	token::{OAuth2AccessToken, Secret},
	value::UniValue,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;
const JSON: &str = "application/json";

/// PKCE verifier/challenge pair (RFC 7636, `S256`).
#[derive(Clone)]
pub struct PkcePair {
	verifier: Secret,
	challenge: String,
}
impl PkcePair {
	/// `code_challenge_method` sent with the challenge.
	pub const METHOD: &'static str = "S256";

	/// Generates a fresh random verifier.
	pub fn generate() -> Self {
		Self::from_verifier(random_string(PKCE_VERIFIER_LEN))
	}

	/// Derives the challenge for a known verifier.
	pub fn from_verifier(verifier: impl Into<String>) -> Self {
		let verifier = verifier.into();
		let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

		Self { verifier: verifier.into(), challenge }
	}

	/// Secret verifier sent with the code exchange.
	pub fn verifier(&self) -> &Secret {
		&self.verifier
	}

	/// Challenge sent with the authorization request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair").field("challenge", &self.challenge).finish()
	}
}

#[derive(Debug)]
struct PendingAuthorization {
	state: String,
	pkce: Option<PkcePair>,
}

#[derive(Debug, Default)]
struct Session {
	state: ClientState,
	pending: Option<PendingAuthorization>,
	access_token: Option<OAuth2AccessToken>,
}

/// OAuth 2.0 protocol client bound to one provider descriptor.
///
/// Clones share the pending authorization, the held token, and the state.
pub struct OAuth2Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
	descriptor: Arc<ProviderDescriptor>,
	client_id: String,
	client_secret: Option<Secret>,
	return_url: Option<Url>,
	scopes: Vec<String>,
	pkce: bool,
	session: Arc<Mutex<Session>>,
}
impl<C, M> OAuth2Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		if descriptor.protocol != Protocol::OAuth2 {
			return Err(ConfigError::ProtocolMismatch {
				descriptor: descriptor.id.to_string(),
				expected: Protocol::OAuth2.as_str(),
			}
			.into());
		}

		descriptor.validate().map_err(ConfigError::from)?;

		let pkce = descriptor.quirks.pkce_required;

		Ok(Self {
			dispatcher: Dispatcher::new(http_client.into(), mapper.into()),
			descriptor: Arc::new(descriptor),
			client_id: client_id.into(),
			client_secret: None,
			return_url: None,
			scopes: Vec::new(),
			pkce,
			session: Default::default(),
		})
	}

	/// Sets or replaces the client secret used for confidential client auth modes.
	pub fn with_client_secret(mut self, secret: impl Into<Secret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the `redirect_uri`.
	pub fn with_return_url(mut self, url: Url) -> Self {
		self.return_url = Some(url);

		self
	}

	/// Replaces the requested scopes.
	pub fn with_scope<I, S>(mut self, scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes.into_iter().map(Into::into).collect();

		self
	}

	/// Enables PKCE; providers that require it have it enabled regardless.
	pub fn with_pkce(mut self, enabled: bool) -> Self {
		self.pkce = enabled || self.descriptor.quirks.pkce_required;

		self
	}

	/// Provider descriptor driving this client.
	pub fn descriptor(&self) -> &ProviderDescriptor {
		&self.descriptor
	}

	/// Current protocol state.
	pub fn state(&self) -> ClientState {
		self.session.lock().state
	}

	/// Last obtained access token, if any.
	pub fn current_access_token(&self) -> Option<OAuth2AccessToken> {
		self.session.lock().access_token.clone()
	}

	/// Installs a token obtained earlier (for example restored by the caller's own storage).
	pub fn set_access_token(&self, token: OAuth2AccessToken) {
		let mut session = self.session.lock();

		session.access_token = Some(token);
		session.state = ClientState::AccessTokenObtained;
	}

	/// Builds the authorization URL and remembers its `state` (random when not supplied).
	pub fn authorization_url(&self, state: Option<&str>) -> Url {
		let state = state
			.map(str::trim)
			.filter(|state| !state.is_empty())
			.map(str::to_owned)
			.unwrap_or_else(|| random_string(STATE_LEN));
		let pkce = self.pkce.then(PkcePair::generate);
		let mut url = self.descriptor.endpoints.authorization.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("response_type", "code");
			pairs.append_pair("client_id", &self.client_id);

			if let Some(redirect) = self.return_url.as_ref() {
				pairs.append_pair("redirect_uri", redirect.as_str());
			}
			if let Some(scope) = self.scope() {
				pairs.append_pair("scope", &scope);
			}

			pairs.append_pair("state", &state);

			for (name, value) in &self.descriptor.quirks.extra_authorize_params {
				pairs.append_pair(name, value);
			}
			if let Some(pkce) = pkce.as_ref() {
				pairs.append_pair("code_challenge", pkce.challenge());
				pairs.append_pair("code_challenge_method", PkcePair::METHOD);
			}
		}

		let mut session = self.session.lock();

		session.pending = Some(PendingAuthorization { state, pkce });
		session.state = ClientState::AuthorizationPending;

		url
	}

	/// Checks the `state` returned to the redirect against the one issued.
	pub fn validate_state(&self, returned: &str) -> Result<()> {
		match self.session.lock().pending.as_ref() {
			Some(pending) if pending.state == returned => Ok(()),
			_ => Err(Error::InvalidState),
		}
	}

	/// Validates `state` and then exchanges `code`.
	pub async fn exchange_callback(&self, code: &str, state: &str) -> Result<OAuth2AccessToken> {
		self.validate_state(state)?;
		self.exchange_for_access_token(code).await
	}

	/// Exchanges an authorization code for an access token.
	pub async fn exchange_for_access_token(&self, code: &str) -> Result<OAuth2AccessToken> {
		const KIND: FlowKind = FlowKind::AccessToken;

		if code.trim().is_empty() {
			return Err(Error::MissingArgument { name: "code" });
		}

		let verifier = self
			.session
			.lock()
			.pending
			.as_ref()
			.and_then(|pending| pending.pkce.as_ref())
			.map(|pkce| pkce.verifier().clone());
		let span = FlowSpan::new(KIND, "exchange_for_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut form = vec![
					HttpParameter::form("grant_type", "authorization_code"),
					HttpParameter::form("code", code),
				];

				if let Some(redirect) = self.return_url.as_ref() {
					form.push(HttpParameter::form("redirect_uri", redirect.as_str()));
				}
				if let Some(verifier) = verifier {
					form.push(HttpParameter::form("code_verifier", verifier.expose()));
				}

				let token = self.request_token(&self.descriptor.endpoints.token, form).await?;
				let mut session = self.session.lock();

				session.pending = None;
				session.access_token = Some(token.clone());
				session.state = ClientState::AccessTokenObtained;

				Ok(token)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Obtains an application token through the client credentials grant.
	pub async fn client_credentials(&self) -> Result<OAuth2AccessToken> {
		const KIND: FlowKind = FlowKind::ClientCredentials;

		let span = FlowSpan::new(KIND, "client_credentials");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut form = vec![HttpParameter::form("grant_type", "client_credentials")];

				if let Some(scope) = self.scope() {
					form.push(HttpParameter::form("scope", scope));
				}

				let token = self.request_token(&self.descriptor.endpoints.token, form).await?;

				self.set_access_token(token.clone());

				Ok(token)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Renews the access token; a response without `refresh_token` keeps the previous one.
	pub async fn refresh_token(
		&self,
		token: Option<&OAuth2AccessToken>,
	) -> Result<OAuth2AccessToken> {
		const KIND: FlowKind = FlowKind::Refresh;

		self.descriptor.ensure_supported(self.descriptor.capabilities.supports_refresh, "refresh")?;

		let token = self.resolve_token(token)?;
		let refresh = token.refresh_token().cloned().ok_or(AccessTokenError::MissingRefreshToken)?;
		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let previous = self.enter_state(ClientState::Refreshing);
		let result = span
			.instrument(async move {
				let form = vec![
					HttpParameter::form("grant_type", "refresh_token"),
					HttpParameter::form("refresh_token", refresh.expose()),
				];
				let renewed = self.request_token(self.descriptor.refresh_endpoint(), form).await?;

				Ok(renewed.or_refresh_token(Some(&refresh)))
			})
			.await;

		match &result {
			Ok(renewed) => self.set_access_token(renewed.clone()),
			Err(_) => {
				span.note("refresh failed, previous state restored");

				self.session.lock().state = previous;
			},
		}

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Revokes the access token (RFC 7009); the client forgets its token.
	pub async fn revoke_token(&self, token: Option<&OAuth2AccessToken>) -> Result<()> {
		const KIND: FlowKind = FlowKind::Revoke;

		self.descriptor.ensure_supported(self.descriptor.capabilities.supports_revoke, "revoke")?;

		let endpoint = self
			.descriptor
			.endpoints
			.revocation
			.as_ref()
			.ok_or(ProviderDescriptorError::MissingRevocationEndpoint)
			.map_err(ConfigError::from)?;
		let token = self.resolve_token(token)?;
		let span = FlowSpan::new(KIND, "revoke_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let previous = self.enter_state(ClientState::Revoking);
		let result = span
			.instrument(async move {
				let mut form = vec![
					HttpParameter::form("token", token.value().expose()),
					HttpParameter::form("token_type_hint", "access_token"),
				];
				let authorization = self.client_auth(&mut form);
				let request = common::build_request(
					Method::POST,
					endpoint,
					authorization.as_ref(),
					None,
					&form,
				)?;

				self.dispatcher.send(request).await.map(|_| ())
			})
			.await;
		let mut session = self.session.lock();

		match &result {
			Ok(()) => {
				session.access_token = None;
				session.state = ClientState::Unauthorized;
			},
			Err(_) => {
				span.note("revocation failed, previous state restored");

				session.state = previous;
			},
		}

		drop(session);

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Fetches and maps the user profile.
	pub async fn user_info(&self, token: Option<&OAuth2AccessToken>) -> Result<UserInfo> {
		const KIND: FlowKind = FlowKind::UserInfo;

		let endpoint = self.descriptor.user_info.as_ref().ok_or_else(|| Error::NotSupported {
			provider: self.descriptor.id.to_string(),
			operation: "user_info",
		})?;
		let token = self.resolve_token(token)?;
		let span = FlowSpan::new(KIND, "user_info");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let method = match endpoint.method {
					UserInfoMethod::Get => Method::GET,
					UserInfoMethod::Post => Method::POST,
				};
				let response =
					self.send_with_token(&token, method, &endpoint.url, &[], Some(JSON)).await?;

				Ok(endpoint.mapping.apply(response.parse()?)?)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Sends an arbitrary API request carrying the held access token.
	pub async fn authorized_request(
		&self,
		method: Method,
		url: &Url,
		parameters: &[HttpParameter],
	) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::SignedRequest;

		let token = self.resolve_token(None)?;
		let span = FlowSpan::new(KIND, "authorized_request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			span.instrument(self.send_with_token(&token, method, url, parameters, None)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn send_with_token(
		&self,
		token: &OAuth2AccessToken,
		method: Method,
		url: &Url,
		parameters: &[HttpParameter],
		accept: Option<&str>,
	) -> Result<ApiResponse> {
		let mut parameters = parameters.to_vec();
		let authorization = match &self.descriptor.quirks.token_delivery {
			TokenDelivery::Header { scheme } if scheme.eq_ignore_ascii_case("bearer") =>
				Some(HttpAuthorization::Bearer(token.value().clone())),
			TokenDelivery::Header { scheme } => Some(HttpAuthorization::Custom {
				scheme: scheme.clone(),
				value: token.value().clone(),
			}),
			TokenDelivery::Query { name } => {
				parameters.push(HttpParameter::url(name.as_str(), token.value().expose()));

				None
			},
		};
		let request =
			common::build_request(method, url, authorization.as_ref(), accept, &parameters)?;

		self.dispatcher.send(request).await
	}

	async fn request_token(
		&self,
		endpoint: &Url,
		mut form: Vec<HttpParameter>,
	) -> Result<OAuth2AccessToken> {
		let authorization = self.client_auth(&mut form);
		let request = common::build_request(
			Method::POST,
			endpoint,
			authorization.as_ref(),
			Some(JSON),
			&form,
		)?;
		let issued_at = OffsetDateTime::now_utc();
		let response = self.dispatcher.send(request).await?;
		let raw = response.parse()?;

		ensure_no_error(&raw)?;

		Ok(OAuth2AccessToken::from_value(raw, issued_at)?)
	}

	/// Applies the provider's client authentication method.
	fn client_auth(&self, form: &mut Vec<HttpParameter>) -> Option<HttpAuthorization> {
		match (self.descriptor.quirks.client_auth_method, self.client_secret.as_ref()) {
			(ClientAuthMethod::ClientSecretBasic, Some(secret)) => Some(HttpAuthorization::Basic {
				username: self.client_id.clone(),
				password: secret.clone(),
			}),
			(ClientAuthMethod::ClientSecretPost, Some(secret)) => {
				form.push(HttpParameter::form("client_id", self.client_id.as_str()));
				form.push(HttpParameter::form("client_secret", secret.expose()));

				None
			},
			_ => {
				form.push(HttpParameter::form("client_id", self.client_id.as_str()));

				None
			},
		}
	}

	fn scope(&self) -> Option<String> {
		self.descriptor.capabilities.join_scope(&self.scopes)
	}

	fn resolve_token(&self, token: Option<&OAuth2AccessToken>) -> Result<OAuth2AccessToken> {
		let token = match token {
			Some(token) => token.clone(),
			None => self.current_access_token().ok_or(AccessTokenError::Missing)?,
		};

		if token.value().is_blank() {
			return Err(AccessTokenError::Missing.into());
		}

		Ok(token)
	}

	fn enter_state(&self, state: ClientState) -> ClientState {
		std::mem::replace(&mut self.session.lock().state, state)
	}
}
#[cfg(feature = "reqwest")]
impl OAuth2Client<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by its own reqwest transport.
	pub fn new(descriptor: ProviderDescriptor, client_id: impl Into<String>) -> Result<Self> {
		Self::with_http_client(
			descriptor,
			client_id,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Clone for OAuth2Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			dispatcher: self.dispatcher.clone(),
			descriptor: Arc::clone(&self.descriptor),
			client_id: self.client_id.clone(),
			client_secret: self.client_secret.clone(),
			return_url: self.return_url.clone(),
			scopes: self.scopes.clone(),
			pkce: self.pkce,
			session: Arc::clone(&self.session),
		}
	}
}
impl<C, M> Debug for OAuth2Client<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Client")
			.field("descriptor", &self.descriptor.id)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("return_url", &self.return_url)
			.field("scopes", &self.scopes)
			.field("pkce", &self.pkce)
			.field("state", &self.state())
			.finish()
	}
}

/// A 2xx token response may still carry `error`/`error_description`.
fn ensure_no_error(raw: &UniValue) -> Result<(), ApiError> {
	let code = raw.get("error").to_string();

	if code.trim().is_empty() {
		return Ok(());
	}

	Err(ApiError { code, message: raw.get("error_description").to_string(), raw: raw.clone() })
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

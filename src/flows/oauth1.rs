//! OAuth 1.0a client: request token, user authorization, verifier exchange, signed calls.

// self
use crate::{
	_prelude::*,
	authorization::{HttpAuthorization, HttpParameter, OAuthAuthorization, ParameterKind},
	cache::RequestTokenCache,
	error::{AccessTokenError, ConfigError},
	flows::{
		ApiResponse, ClientState,
		common::{self, Dispatcher},
	},
	http::{HttpTransport, Method},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	oauth::TransportErrorMapper,
	provider::{Protocol, ProviderDescriptor, ProviderDescriptorError, UserInfo, UserInfoMethod},
	signature::SignatureMethod,
	token::{OAuthAccessToken, RequestToken, Secret},
	value::UniValue,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

const OUT_OF_BAND: &str = "oob";
const SESSION_HANDLE: &str = "oauth_session_handle";
const DEFAULT_REQUEST_TOKEN_TTL: Duration = Duration::minutes(10);

#[derive(Debug, Default)]
struct Session {
	state: ClientState,
	request_token: Option<RequestToken>,
	access_token: Option<OAuthAccessToken>,
}

/// OAuth 1.0a protocol client bound to one provider descriptor.
///
/// Clones share the held request token, access token, and state.
pub struct OAuthClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	dispatcher: Dispatcher<C, M>,
	descriptor: Arc<ProviderDescriptor>,
	consumer_key: String,
	consumer_secret: Secret,
	signature_method: SignatureMethod,
	rsa_private_key: Option<Secret>,
	return_url: Option<Url>,
	cache: Option<Arc<dyn RequestTokenCache>>,
	cache_ttl: Duration,
	session: Arc<Mutex<Session>>,
	request_token_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> OAuthClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		if descriptor.protocol != Protocol::OAuth1 {
			return Err(ConfigError::ProtocolMismatch {
				descriptor: descriptor.id.to_string(),
				expected: Protocol::OAuth1.as_str(),
			}
			.into());
		}

		descriptor.validate().map_err(ConfigError::from)?;

		Ok(Self {
			dispatcher: Dispatcher::new(http_client.into(), mapper.into()),
			descriptor: Arc::new(descriptor),
			consumer_key: consumer_key.into(),
			consumer_secret: consumer_secret.into(),
			signature_method: SignatureMethod::default(),
			rsa_private_key: None,
			return_url: None,
			cache: None,
			cache_ttl: DEFAULT_REQUEST_TOKEN_TTL,
			session: Default::default(),
			request_token_guard: Default::default(),
		})
	}

	/// Sets the callback URL sent as `oauth_callback`; `oob` is used otherwise.
	pub fn with_return_url(mut self, url: Url) -> Self {
		self.return_url = Some(url);

		self
	}

	/// Attaches a cache that keeps request tokens alive across the authorize redirect.
	pub fn with_request_token_cache(
		mut self,
		cache: Arc<dyn RequestTokenCache>,
		ttl: Duration,
	) -> Self {
		self.cache = Some(cache);
		self.cache_ttl = ttl;

		self
	}

	/// Overrides the signature method (HMAC-SHA1 by default).
	pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;

		self
	}

	/// Sets the PEM private key used by RSA-SHA1.
	pub fn with_rsa_private_key(mut self, pem: impl Into<Secret>) -> Self {
		self.rsa_private_key = Some(pem.into());

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

	/// Request token awaiting authorization, if any.
	pub fn current_request_token(&self) -> Option<RequestToken> {
		self.session.lock().request_token.clone()
	}

	/// Last obtained access token, if any.
	pub fn current_access_token(&self) -> Option<OAuthAccessToken> {
		self.session.lock().access_token.clone()
	}

	/// Installs a token obtained earlier (for example restored by the caller's own storage).
	pub fn set_access_token(&self, token: OAuthAccessToken) {
		let mut session = self.session.lock();

		session.access_token = Some(token);
		session.state = ClientState::AccessTokenObtained;
	}

	/// Returns the user-authorization URL, fetching a request token first when none is held.
	///
	/// Concurrent callers share a single request-token round trip.
	pub async fn authorization_url(&self) -> Result<Url> {
		if let Some(url) = self.pending_authorization_url() {
			return Ok(url);
		}

		let _guard = self.request_token_guard.lock().await;

		if let Some(url) = self.pending_authorization_url() {
			return Ok(url);
		}

		let token = self.request_token().await?;

		self.session.lock().state = ClientState::AuthorizationPending;

		Ok(token.authorization_url().clone())
	}

	/// Fetches temporary credentials from the request-token endpoint.
	pub async fn request_token(&self) -> Result<RequestToken> {
		const KIND: FlowKind = FlowKind::RequestToken;

		let span = FlowSpan::new(KIND, "request_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let endpoint = self
					.descriptor
					.endpoints
					.request_token
					.as_ref()
					.ok_or(ProviderDescriptorError::MissingRequestTokenEndpoint)
					.map_err(ConfigError::from)?;
				let mut authorization = self.authorization();

				authorization.prepare_for_request_token();
				authorization.set_callback(
					self.return_url.as_ref().map(Url::as_str).unwrap_or(OUT_OF_BAND),
				);

				let response = self
					.send_signed(authorization, Method::POST, endpoint, &[], Some("text/plain"))
					.await?;
				let raw = UniValue::parse_query_string(&response.text())?;
				let token = RequestToken::from_value(
					raw,
					&self.descriptor.endpoints.authorization,
					&self.descriptor.quirks.extra_authorize_params,
				)?;

				if let Some(cache) = self.cache.as_ref() {
					cache.put(token.value().expose(), token.clone(), self.cache_ttl).await?;
				}

				{
					let mut session = self.session.lock();

					session.request_token = Some(token.clone());
					session.state = ClientState::RequestTokenObtained;
				}

				Ok(token)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Exchanges the verifier for an access token using the held request token.
	pub async fn exchange_for_access_token(&self, verifier: &str) -> Result<OAuthAccessToken> {
		if verifier.trim().is_empty() {
			return Err(Error::MissingArgument { name: "verifier" });
		}

		let request_token = self
			.current_request_token()
			.ok_or(AccessTokenError::MissingRequestToken)?;

		self.exchange(request_token, verifier).await
	}

	/// Completes the callback leg: `oauth_token` and `oauth_verifier` as returned to the callback.
	///
	/// The request token is taken from this client or, failing that, from the attached cache.
	pub async fn exchange_callback(
		&self,
		oauth_token: &str,
		verifier: &str,
	) -> Result<OAuthAccessToken> {
		if oauth_token.trim().is_empty() {
			return Err(Error::MissingArgument { name: "oauth_token" });
		}
		if verifier.trim().is_empty() {
			return Err(Error::MissingArgument { name: "verifier" });
		}

		let held = self
			.current_request_token()
			.filter(|token| token.value().expose() == oauth_token);
		let cached = match self.cache.as_ref() {
			Some(cache) => cache.take(oauth_token).await?,
			None => None,
		};
		let request_token = held.or(cached).ok_or(AccessTokenError::MissingRequestToken)?;

		self.exchange(request_token, verifier).await
	}

	/// Renews the access token through `oauth_session_handle`.
	pub async fn refresh_token(
		&self,
		token: Option<&OAuthAccessToken>,
	) -> Result<OAuthAccessToken> {
		const KIND: FlowKind = FlowKind::Refresh;

		self.descriptor.ensure_supported(self.descriptor.capabilities.supports_refresh, "refresh")?;

		let token = self.resolve_token(token)?;
		let handle = token.session_handle().ok_or(AccessTokenError::MissingRefreshToken)?.clone();
		let span = FlowSpan::new(KIND, "refresh_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let previous = self.enter_state(ClientState::Refreshing);
		let result = span
			.instrument(async move {
				let mut authorization = self.authorization();

				authorization.prepare_for_access_token();
				authorization.set_token(token.value().expose(), token.token_secret().clone());
				authorization.set(SESSION_HANDLE, handle.expose());

				let issued_at = OffsetDateTime::now_utc();
				let response = self
					.send_signed(
						authorization,
						Method::POST,
						self.descriptor.refresh_endpoint(),
						&[],
						None,
					)
					.await?;
				let raw = response.parse()?;

				Ok(OAuthAccessToken::from_value(raw, issued_at)?)
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

	/// Revokes the access token; the client forgets its token and returns to `Unauthorized`.
	pub async fn revoke_token(&self, token: Option<&OAuthAccessToken>) -> Result<()> {
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
				let mut authorization = self.authorization();

				authorization.prepare_for_access_token();
				authorization.set_token(token.value().expose(), token.token_secret().clone());

				self.send_signed(authorization, Method::POST, endpoint, &[], None).await.map(|_| ())
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
	pub async fn user_info(&self, token: Option<&OAuthAccessToken>) -> Result<UserInfo> {
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
				let response = self.send_with_token(&token, method, &endpoint.url, &[]).await?;

				Ok(endpoint.mapping.apply(response.parse()?)?)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	/// Sends an arbitrary API request signed with the held access token.
	///
	/// A raw body outside form encoding is covered by `oauth_body_hash`.
	pub async fn signed_request(
		&self,
		method: Method,
		url: &Url,
		parameters: &[HttpParameter],
	) -> Result<ApiResponse> {
		const KIND: FlowKind = FlowKind::SignedRequest;

		let token = self.resolve_token(None)?;
		let span = FlowSpan::new(KIND, "signed_request");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			span.instrument(self.send_with_token(&token, method, url, parameters)).await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn exchange(
		&self,
		request_token: RequestToken,
		verifier: &str,
	) -> Result<OAuthAccessToken> {
		const KIND: FlowKind = FlowKind::AccessToken;

		let span = FlowSpan::new(KIND, "exchange_for_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut authorization = self.authorization();

				authorization.prepare_for_access_token();
				authorization.set_token(
					request_token.value().expose(),
					request_token.token_secret().clone(),
				);
				authorization.set_verifier(verifier);

				let issued_at = OffsetDateTime::now_utc();
				let response = self
					.send_signed(
						authorization,
						Method::POST,
						&self.descriptor.endpoints.token,
						&[],
						None,
					)
					.await?;
				let token = OAuthAccessToken::from_value(response.parse()?, issued_at)?;
				let mut session = self.session.lock();

				session.request_token = None;
				session.access_token = Some(token.clone());
				session.state = ClientState::AccessTokenObtained;

				Ok(token)
			})
			.await;

		obs::record_flow_outcome(KIND, FlowOutcome::of(&result));

		result
	}

	async fn send_with_token(
		&self,
		token: &OAuthAccessToken,
		method: Method,
		url: &Url,
		parameters: &[HttpParameter],
	) -> Result<ApiResponse> {
		let mut authorization = self
			.authorization()
			.with_token(token.value().expose(), token.token_secret().clone());
		let content_type = common::body_content_type(&method, parameters);
		let form_encoded = content_type
			.as_deref()
			.is_some_and(|value| value.starts_with(common::FORM_CONTENT_TYPE));

		let raw_body = parameters
			.iter()
			.find(|parameter| parameter.kind == ParameterKind::RawBody)
			.filter(|_| !form_encoded);

		if let Some(body) = raw_body {
			authorization = authorization.with_body_hash(body.text().as_bytes());
		}

		self.send_signed(authorization, method, url, parameters, None).await
	}

	async fn send_signed(
		&self,
		mut authorization: OAuthAuthorization,
		method: Method,
		url: &Url,
		parameters: &[HttpParameter],
		accept: Option<&str>,
	) -> Result<ApiResponse> {
		let content_type = common::body_content_type(&method, parameters);

		authorization.build(method.as_str(), url, content_type.as_deref(), parameters)?;

		let authorization = HttpAuthorization::OAuth(authorization);
		let request = common::build_request(method, url, Some(&authorization), accept, parameters)?;

		self.dispatcher.send(request).await
	}

	fn authorization(&self) -> OAuthAuthorization {
		let mut authorization =
			OAuthAuthorization::new(self.consumer_key.clone(), self.consumer_secret.clone())
				.with_signature_method(self.signature_method);

		if let Some(pem) = self.rsa_private_key.as_ref() {
			authorization = authorization.with_rsa_private_key(pem.clone());
		}
		if let Some(realm) = self.descriptor.quirks.realm.as_ref() {
			authorization = authorization.with_realm(realm.clone());
		}

		authorization
	}

	fn pending_authorization_url(&self) -> Option<Url> {
		let mut session = self.session.lock();
		let url = session.request_token.as_ref().map(|token| token.authorization_url().clone())?;

		session.state = ClientState::AuthorizationPending;

		Some(url)
	}

	fn resolve_token(&self, token: Option<&OAuthAccessToken>) -> Result<OAuthAccessToken> {
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
impl OAuthClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by its own reqwest transport.
	pub fn new(
		descriptor: ProviderDescriptor,
		consumer_key: impl Into<String>,
		consumer_secret: impl Into<Secret>,
	) -> Result<Self> {
		Self::with_http_client(
			descriptor,
			consumer_key,
			consumer_secret,
			ReqwestHttpClient::new()?,
			ReqwestTransportErrorMapper,
		)
	}
}
impl<C, M> Clone for OAuthClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			dispatcher: self.dispatcher.clone(),
			descriptor: Arc::clone(&self.descriptor),
			consumer_key: self.consumer_key.clone(),
			consumer_secret: self.consumer_secret.clone(),
			signature_method: self.signature_method,
			rsa_private_key: self.rsa_private_key.clone(),
			return_url: self.return_url.clone(),
			cache: self.cache.clone(),
			cache_ttl: self.cache_ttl,
			session: Arc::clone(&self.session),
			request_token_guard: Arc::clone(&self.request_token_guard),
		}
	}
}
impl<C, M> Debug for OAuthClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthClient")
			.field("descriptor", &self.descriptor.id)
			.field("consumer_key", &self.consumer_key)
			.field("signature_method", &self.signature_method)
			.field("return_url", &self.return_url)
			.field("cache_set", &self.cache.is_some())
			.field("state", &self.state())
			.finish()
	}
}

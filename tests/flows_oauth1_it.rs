#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use time::Duration;
use url::Url;
// self
use oauth_switchboard::{
	authorization::HttpParameter,
	cache::{CacheError, CacheFuture, MemoryRequestTokenCache, RequestTokenCache},
	error::{AccessTokenError, Error, RequestError},
	flows::{ClientState, ReqwestOAuthClient},
	http::Method,
	provider::{ProviderDescriptor, ProviderId, UserInfoEndpoint, UserInfoMapping, field},
	token::{AccessToken, RequestToken},
};

const CONSUMER_KEY: &str = "consumer-it";
const CONSUMER_SECRET: &str = "consumer-secret-it";
const REQUEST_TOKEN_BODY: &str =
	"oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true";
const ACCESS_TOKEN_BODY: &str = "oauth_token=acc-token&oauth_token_secret=acc-secret&oauth_session_handle=handle-1&oauth_expires_in=3600";

struct OfflineCache;
impl RequestTokenCache for OfflineCache {
	fn put<'a>(&'a self, _: &'a str, _: RequestToken, _: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async { Err(CacheError::Backend { message: "offline".into() }) })
	}

	fn take<'a>(&'a self, _: &'a str) -> CacheFuture<'a, Option<RequestToken>> {
		Box::pin(async { Err(CacheError::Backend { message: "offline".into() }) })
	}
}

// `MockServer::url` picks TLS with a self-signed certificate; loopback HTTP needs no trust setup.
fn endpoint(server: &MockServer, path: &str) -> Url {
	Url::parse(&format!("http://{}{path}", server.address()))
		.expect("Mock endpoint should parse successfully.")
}

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	let provider_id =
		ProviderId::new("mock-oauth1").expect("Provider identifier should be valid for OAuth 1.0.");

	ProviderDescriptor::oauth1(provider_id)
		.request_token_endpoint(endpoint(server, "/request_token"))
		.authorization_endpoint(endpoint(server, "/authorize"))
		.token_endpoint(endpoint(server, "/access_token"))
		.refresh_endpoint(endpoint(server, "/access_token"))
		.supports_refresh(true)
		.authorize_param("perms", "read")
		.user_info(
			UserInfoEndpoint::new(endpoint(server, "/account")).with_mapping(
				UserInfoMapping::default()
					.with_field(field::ID, "user.id")
					.with_field(field::USER_NAME, "user.screen_name"),
			),
		)
		.build()
		.expect("OAuth 1.0 descriptor should build successfully.")
}

fn build_client(descriptor: ProviderDescriptor) -> ReqwestOAuthClient {
	ReqwestOAuthClient::new(descriptor, CONSUMER_KEY, CONSUMER_SECRET)
		.expect("OAuth 1.0 client should build successfully.")
		.with_return_url(
			Url::parse("https://app.example.com/callback").expect("Callback URL should parse."),
		)
}

#[tokio::test]
async fn full_three_legged_flow_obtains_and_uses_access_token() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let request_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/request_token").header_prefix("authorization", "OAuth ");
			then.status(200).header("content-type", "text/plain").body(REQUEST_TOKEN_BODY);
		})
		.await;
	let authorize_url =
		client.authorization_url().await.expect("Authorization URL should be produced.");

	request_token_mock.assert_async().await;

	assert_eq!(client.state(), ClientState::AuthorizationPending);
	assert_eq!(authorize_url.path(), "/authorize");

	let pairs = authorize_url.query_pairs().into_owned().collect::<Vec<_>>();

	assert!(pairs.contains(&("oauth_token".into(), "req-token".into())));
	assert!(pairs.contains(&("perms".into(), "read".into())));

	let request_token = client.current_request_token().expect("Request token should be held.");

	assert!(request_token.callback_confirmed());
	assert_eq!(request_token.token_secret().expose(), "req-secret");

	let access_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/access_token").header_prefix("authorization", "OAuth ");
			then.status(200).header("content-type", "text/plain").body(ACCESS_TOKEN_BODY);
		})
		.await;
	let access_token = client
		.exchange_for_access_token("verifier-1")
		.await
		.expect("Verifier exchange should succeed.");

	access_token_mock.assert_async().await;

	assert_eq!(access_token.value().expose(), "acc-token");
	assert_eq!(access_token.token_secret().expose(), "acc-secret");
	assert_eq!(access_token.session_handle().map(|handle| handle.expose()), Some("handle-1"));
	assert!(access_token.expires_at().is_some());
	assert_eq!(client.state(), ClientState::AccessTokenObtained);
	assert!(client.current_request_token().is_none());

	let api_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/statuses")
				.query_param("count", "5")
				.header_prefix("authorization", "OAuth ");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"statuses\":[{\"id\":1},{\"id\":2}]}");
		})
		.await;
	let response = client
		.signed_request(
			Method::GET,
			&endpoint(&server, "/api/statuses"),
			&[HttpParameter::url("count", 5)],
		)
		.await
		.expect("Signed API call should succeed.");

	api_mock.assert_async().await;

	let body = response.parse().expect("API response should parse.");

	assert_eq!(body.lookup(&["statuses", "1", "id"]).to_i64().ok(), Some(2));
}

#[tokio::test]
async fn concurrent_authorization_urls_share_one_request_token() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/request_token");
			then.status(200).body(REQUEST_TOKEN_BODY);
		})
		.await;
	let (first, second) = tokio::join!(client.authorization_url(), client.authorization_url());
	let first = first.expect("First caller should receive a URL.");
	let second = second.expect("Second caller should receive a URL.");

	mock.assert_calls_async(1).await;

	assert_eq!(first, second);
}

#[tokio::test]
async fn callback_exchange_recovers_request_token_from_cache() {
	let server = MockServer::start_async().await;
	let descriptor = build_descriptor(&server);
	let cache = Arc::new(MemoryRequestTokenCache::default());
	let starter = build_client(descriptor.clone())
		.with_request_token_cache(cache.clone(), Duration::minutes(5));
	let request_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/request_token");
			then.status(200).body(REQUEST_TOKEN_BODY);
		})
		.await;

	starter.request_token().await.expect("Request token should be fetched.");
	request_token_mock.assert_async().await;

	assert_eq!(cache.len(), 1);

	// A different process-level client handles the redirect.
	let finisher =
		build_client(descriptor).with_request_token_cache(cache.clone(), Duration::minutes(5));
	let access_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/access_token");
			then.status(200).body(ACCESS_TOKEN_BODY);
		})
		.await;
	let token = finisher
		.exchange_callback("req-token", "verifier-2")
		.await
		.expect("Callback exchange should succeed.");

	access_token_mock.assert_async().await;

	assert_eq!(token.value().expose(), "acc-token");
	assert!(cache.is_empty(), "Cached request tokens are single-use.");

	let missing = cache.take("req-token").await.expect("Cache lookup should succeed.");

	assert!(missing.is_none());
}

#[tokio::test]
async fn callback_exchange_without_request_token_fails() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let err = client
		.exchange_callback("unknown", "verifier")
		.await
		.expect_err("Unknown request tokens should be rejected.");

	assert!(matches!(err, Error::AccessToken(AccessTokenError::MissingRequestToken)));

	let err = client
		.exchange_for_access_token("  ")
		.await
		.expect_err("Blank verifiers should be rejected.");

	assert!(matches!(err, Error::MissingArgument { name: "verifier" }));
}

#[tokio::test]
async fn refresh_uses_session_handle_and_user_info_maps_fields() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let access_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/access_token");
			then.status(200).body(ACCESS_TOKEN_BODY);
		})
		.await;
	let token = AccessToken::parse_as(ACCESS_TOKEN_BODY)
		.expect("Fixture should parse as an OAuth 1.0 token.");

	client.set_access_token(token);

	let renewed = client.refresh_token(None).await.expect("Refresh should succeed.");

	access_token_mock.assert_async().await;

	assert_eq!(renewed.value().expose(), "acc-token");
	assert_eq!(client.state(), ClientState::AccessTokenObtained);

	let account_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/account").header_prefix("authorization", "OAuth ");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"user\":{\"id\":42,\"screen_name\":\"octo\"}}");
		})
		.await;
	let user = client.user_info(None).await.expect("User info should be fetched.");

	account_mock.assert_async().await;

	assert_eq!(user.id(), Some("42"));
	assert_eq!(user.user_name(), Some("octo"));
	assert_eq!(user.email(), None);
}

#[tokio::test]
async fn revoke_requires_capability_and_failures_surface_status() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let token = AccessToken::parse_as(ACCESS_TOKEN_BODY)
		.expect("Fixture should parse as an OAuth 1.0 token.");

	client.set_access_token(token);

	let err = client.revoke_token(None).await.expect_err("Revocation is not configured.");

	assert!(matches!(err, Error::NotSupported { operation: "revoke", .. }));

	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/private");
			then.status(401)
				.header("content-type", "text/plain")
				.body("oauth_problem=token_rejected");
		})
		.await;
	let err = client
		.signed_request(Method::GET, &endpoint(&server, "/api/private"), &[])
		.await
		.expect_err("Unauthorized responses should fail.");

	mock.assert_async().await;

	match err {
		Error::Request(RequestError::Status { status, body, .. }) => {
			assert_eq!(status, 401);
			assert_eq!(body, "oauth_problem=token_rejected");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(client.state(), ClientState::AccessTokenObtained);
}

#[tokio::test]
async fn cache_backend_failures_surface_and_leave_no_pending_token() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server))
		.with_request_token_cache(Arc::new(OfflineCache), Duration::minutes(5));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/request_token");
			then.status(200).body(REQUEST_TOKEN_BODY);
		})
		.await;
	let err = client.authorization_url().await.expect_err("Cache writes should fail.");

	mock.assert_async().await;

	assert!(matches!(err, Error::Cache(CacheError::Backend { .. })));
	assert!(client.current_request_token().is_none());
	assert_eq!(client.state(), ClientState::Unauthorized);

	let err = client
		.exchange_callback("req-token", "verifier")
		.await
		.expect_err("Cache reads should fail.");

	assert!(matches!(err, Error::Cache(_)));
}

#[tokio::test]
async fn refresh_without_session_handle_is_rejected_before_any_request() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/access_token");
			then.status(200).body(ACCESS_TOKEN_BODY);
		})
		.await;
	let token = AccessToken::parse_as("oauth_token=acc-token&oauth_token_secret=acc-secret")
		.expect("Fixture should parse as an OAuth 1.0 token.");

	client.set_access_token(token);

	let err = client.refresh_token(None).await.expect_err("A session handle is required.");

	assert!(matches!(err, Error::AccessToken(AccessTokenError::MissingRefreshToken)));
	assert_eq!(client.state(), ClientState::AccessTokenObtained);

	mock.assert_calls_async(0).await;
}

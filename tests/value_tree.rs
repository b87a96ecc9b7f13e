// self
use oauth_switchboard::{
	token::{AccessToken, OAuth2AccessToken, OAuthAccessToken},
	value::{UniValue, ValueKind},
};

#[test]
fn the_same_payload_reads_alike_in_every_format() {
	let json = UniValue::parse("{\"user\":{\"id\":\"7\",\"name\":\"Ann\"}}")
		.expect("JSON payload should parse.");
	let xml = UniValue::parse("<user><id>7</id><name>Ann</name></user>")
		.expect("XML payload should parse.");
	let query = UniValue::parse("user=7&name=Ann").expect("Query payload should parse.");

	assert_eq!(json.lookup(&["user", "id"]), "7");
	assert_eq!(xml.lookup(&["user", "id"]), "7");
	assert_eq!(query.get("user"), "7");
	assert_eq!(json.lookup(&["user", "name"]), xml.lookup(&["user", "name"]));
	assert_eq!(query.get("name").to_string(), "Ann");
}

#[test]
fn missing_paths_are_empty_until_written() {
	let tree = UniValue::parse_json("{\"profile\":{}}").expect("Fixture should parse.");
	let missing = tree.lookup(&["profile", "links", "home"]);

	assert!(missing.is_null());
	assert_eq!(missing.to_string(), "");
	assert!(!tree.get("profile").contains_key("links"));

	missing.set("https://example.com");

	assert_eq!(tree.to_json(), "{\"profile\":{\"links\":{\"home\":\"https://example.com\"}}}");
	assert_eq!(tree.lookup(&["profile", "links"]).kind(), ValueKind::Object);
}

#[test]
fn repeated_query_keys_collect_into_arrays() {
	let tree = UniValue::parse_query_string("scope=read&scope=write&state=abc")
		.expect("Fixture should parse.");
	let scopes = tree.get("scope").iter().map(|scope| scope.to_string()).collect::<Vec<_>>();

	assert_eq!(scopes, vec!["read", "write"]);
	assert_eq!(tree.get("state").iter().count(), 1);
}

#[test]
fn lenient_coercions_cover_provider_quirks() {
	let tree = UniValue::parse_json(
		"{\"expires_in\":\"3600\",\"verified\":\"yes\",\"ratio\":\"0,5\",\"created\":\"2024-01-02\"}",
	)
	.expect("Fixture should parse.");

	assert_eq!(tree.get("expires_in").to_i64().ok(), Some(3600));
	assert_eq!(tree.get("verified").to_bool().ok(), Some(true));
	assert_eq!(tree.get("ratio").to_f64().ok(), Some(0.5));
	assert_eq!(
		tree.get("created").to_datetime().map(|moment| moment.unix_timestamp()).ok(),
		Some(1_704_153_600)
	);
	assert!(tree.get("verified").to_i64().is_err());
}

#[test]
fn token_responses_are_detected_by_shape() {
	let oauth1 = AccessToken::parse_as::<OAuthAccessToken>(
		"oauth_token=t&oauth_token_secret=s&user_id=12&screen_name=octo",
	)
	.expect("OAuth 1.0 response should parse.");

	assert_eq!(oauth1.token_secret().expose(), "s");
	assert_eq!(oauth1.raw().get("screen_name"), "octo");

	let oauth2 = AccessToken::parse_as::<OAuth2AccessToken>(
		"<response><access_token>a</access_token><expires_in>60</expires_in></response>",
	);

	assert!(oauth2.is_err(), "XML token responses nest under their root element.");

	let oauth2 = AccessToken::parse_as::<OAuth2AccessToken>("access_token=a&expires_in=60")
		.expect("Form-encoded OAuth 2.0 response should parse.");

	assert!(oauth2.expires_at().is_some());
}

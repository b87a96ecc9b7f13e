//! Reads the same user profile out of JSON, XML, and form-encoded provider responses, then
//! signs a request offline so the OAuth 1.0 header can be inspected.

// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth_switchboard::{
	authorization::{HttpParameter, NonceTimestamp, OAuthAuthorization},
	provider::{UserInfoMapping, field},
	token::{AccessToken, OAuth2AccessToken},
	value::UniValue,
};

const RESPONSES: [(&str, &str); 3] = [
	("json", "{\"user\":{\"id\":7,\"name\":\"Ann\",\"emails\":[{\"value\":\"ann@example.com\"}]}}"),
	(
		"xml",
		"<user id=\"7\"><name>Ann</name><emails><value>ann@example.com</value></emails></user>",
	),
	("form", "user.id=7&user.name=Ann"),
];

fn main() -> Result<()> {
	color_eyre::install()?;

	for (label, body) in RESPONSES {
		let tree = UniValue::parse(body)?;

		println!("{label}: keys {:?}, canonical {}", tree.keys(), tree.to_json());
	}

	let mapping = UserInfoMapping::default()
		.with_field(field::ID, "user.id")
		.with_field(field::DISPLAY_NAME, "user.name")
		.with_field(field::EMAIL, "user.emails.0.value");
	let user = mapping.apply(UniValue::parse(RESPONSES[0].1)?)?;

	println!("Mapped user {:?} <{:?}>.", user.display_name(), user.email());

	let token = AccessToken::parse_as::<OAuth2AccessToken>(
		"access_token=demo&token_type=bearer&expires_in=3600",
	)?;

	println!("OAuth 2.0 token expires at {:?}.", token.expires_at());

	let mut authorization = OAuthAuthorization::new("demo-consumer", "demo-secret")
		.with_token("demo-token", "demo-token-secret")
		.with_nonce_timestamp(NonceTimestamp::now());
	let url = Url::parse("https://api.provider.example.com/1/statuses/update.json")?;
	let parameters = [HttpParameter::form("status", "Hello Ladies + Gentlemen")];

	authorization.build("POST", &url, Some("application/x-www-form-urlencoded"), &parameters)?;

	println!("Authorization: {}", authorization.header_value());

	Ok(())
}

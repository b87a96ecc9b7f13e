//! Three-legged OAuth 1.0a walkthrough: request token, user authorization, verifier exchange,
//! and one signed API call.

// std
use std::io::{self, Write};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth_switchboard::{
	authorization::HttpParameter,
	flows::ReqwestOAuthClient,
	http::Method,
	provider::{ProviderDescriptor, ProviderId},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let consumer_key = prompt("Enter your consumer key", Some("demo-consumer"))?;
	let consumer_secret = prompt("Enter your consumer secret", Some("demo-secret"))?;
	let descriptor = ProviderDescriptor::oauth1(ProviderId::new("demo-oauth1")?)
		.request_token_endpoint(Url::parse("https://api.provider.example.com/oauth/request_token")?)
		.authorization_endpoint(Url::parse("https://api.provider.example.com/oauth/authorize")?)
		.token_endpoint(Url::parse("https://api.provider.example.com/oauth/access_token")?)
		.build()?;
	let client = ReqwestOAuthClient::new(descriptor, consumer_key, consumer_secret)?;
	let authorize_url = client.authorization_url().await?;

	println!("Authorize URL: {authorize_url}");

	let verifier = prompt("Paste the PIN or `oauth_verifier` shown by the provider", None)?;
	let token = client.exchange_for_access_token(&verifier).await?;

	println!(
		"Access token obtained; session handle present: {}.",
		token.session_handle().is_some()
	);

	let response = client
		.signed_request(
			Method::GET,
			&Url::parse("https://api.provider.example.com/1/account/verify_credentials.json")?,
			&[HttpParameter::url("include_email", true)],
		)
		.await?;

	println!("Account: {}.", response.parse()?.to_json());

	Ok(())
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
	match default {
		Some(default) => print!("{label} [{default}]: "),
		None => print!("{label}: "),
	}

	io::stdout().flush()?;

	let mut input = String::new();

	io::stdin().read_line(&mut input)?;

	let input = input.trim();

	Ok(if input.is_empty() { default.unwrap_or_default().to_owned() } else { input.to_owned() })
}

//! Interactive authorization-code + PKCE walkthrough against any OAuth 2.0 provider.
//!
//! The demo prints the authorize URL, waits for the `code` and `state` from the redirect, then
//! exchanges them and prints what the provider returned.

// std
use std::io::{self, Write};
// crates.io
use color_eyre::Result;
use url::Url;
// self
use oauth_switchboard::{
	flows::ReqwestOAuth2Client,
	provider::{ClientAuthMethod, ProviderDescriptor, ProviderId},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let client_id = prompt("Enter your client ID", Some("demo-client"))?;
	let client_secret = prompt("Enter your client secret (leave blank for PKCE-only)", None)?;
	let redirect_uri =
		Url::parse(&prompt("Enter the redirect URI", Some("https://app.example.com/callback"))?)?;
	let descriptor = ProviderDescriptor::oauth2(ProviderId::new("demo-provider")?)
		.authorization_endpoint(Url::parse("https://provider.example.com/oauth2/authorize")?)
		.token_endpoint(Url::parse("https://provider.example.com/oauth2/token")?)
		.supports_refresh(true)
		.client_auth_method(ClientAuthMethod::ClientSecretBasic)
		.pkce_required(true)
		.build()?;
	let mut client = ReqwestOAuth2Client::new(descriptor, client_id)?
		.with_return_url(redirect_uri)
		.with_scope(["openid", "profile", "offline_access"]);

	if !client_secret.is_empty() {
		client = client.with_client_secret(client_secret);
	}

	println!("Authorize URL: {}", client.authorization_url(None));

	let state = prompt("Paste the `state` parameter from the redirect", None)?;
	let code = prompt("Paste the `code` parameter (leave blank to stop here)", None)?;

	if code.is_empty() {
		client.validate_state(&state)?;
		println!("State matches; run again with a code to finish the exchange.");

		return Ok(());
	}

	let token = client.exchange_callback(&code, &state).await?;

	println!("Token type: {}.", token.token_type().unwrap_or("unknown"));
	println!("Expires at: {:?}.", token.expires_at());
	println!("Refresh token issued: {}.", token.refresh_token().is_some());
	println!("Raw response: {}.", token.raw().to_json());

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

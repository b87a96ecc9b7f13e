// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha1::{Digest, Sha1};
// self
use crate::{
	_prelude::*,
	authorization::{HttpParameter, NonceTimestamp, percent_encode},
	error::SignatureError,
	signature::{self, SignatureMethod},
	token::Secret,
};

/// `oauth_version` sent with every request.
pub const OAUTH_VERSION: &str = "1.0";

const CONSUMER_KEY: &str = "oauth_consumer_key";
const TOKEN: &str = "oauth_token";
const NONCE: &str = "oauth_nonce";
const TIMESTAMP: &str = "oauth_timestamp";
const SIGNATURE_METHOD: &str = "oauth_signature_method";
const SIGNATURE: &str = "oauth_signature";
const VERSION: &str = "oauth_version";
const CALLBACK: &str = "oauth_callback";
const VERIFIER: &str = "oauth_verifier";
const BODY_HASH: &str = "oauth_body_hash";

/// OAuth 1.0 protocol parameter set for one request.
///
/// Secrets (consumer secret, token secret, RSA key) only feed the signing key and never appear in
/// [`parameters`](Self::parameters) or the rendered header.
#[derive(Clone)]
pub struct OAuthAuthorization {
	params: BTreeMap<String, String>,
	consumer_secret: Secret,
	token_secret: Secret,
	rsa_private_key: Option<Secret>,
	signature_method: SignatureMethod,
	realm: Option<String>,
}
impl OAuthAuthorization {
	/// Creates a parameter set for the given consumer credentials using HMAC-SHA1.
	pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<Secret>) -> Self {
		let mut params = BTreeMap::new();

		params.insert(CONSUMER_KEY.into(), consumer_key.into());
		params.insert(SIGNATURE_METHOD.into(), SignatureMethod::default().as_str().into());
		params.insert(VERSION.into(), OAUTH_VERSION.into());

		Self {
			params,
			consumer_secret: consumer_secret.into(),
			token_secret: Secret::default(),
			rsa_private_key: None,
			signature_method: SignatureMethod::default(),
			realm: None,
		}
	}

	/// Overrides the signature method.
	pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
		self.signature_method = method;
		self.params.insert(SIGNATURE_METHOD.into(), method.as_str().into());

		self
	}

	/// Sets the PEM private key used by RSA-SHA1.
	pub fn with_rsa_private_key(mut self, pem: impl Into<Secret>) -> Self {
		self.rsa_private_key = Some(pem.into());

		self
	}

	/// Adds a `realm` rendered first in the header; it never takes part in the signature.
	pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
		self.realm = Some(realm.into());

		self
	}

	/// Sets `oauth_token` and the secret that completes the signing key.
	pub fn with_token(mut self, token: &str, token_secret: impl Into<Secret>) -> Self {
		self.set_token(token, token_secret);

		self
	}

	/// Freezes nonce and timestamp to known values.
	pub fn with_nonce_timestamp(mut self, pair: NonceTimestamp) -> Self {
		self.params.insert(NONCE.into(), pair.nonce);
		self.params.insert(TIMESTAMP.into(), pair.timestamp.to_string());

		self
	}

	/// Sets `oauth_body_hash` to the base64 SHA-1 digest of `body`.
	pub fn with_body_hash(mut self, body: &[u8]) -> Self {
		self.params.insert(BODY_HASH.into(), STANDARD.encode(Sha1::digest(body)));

		self
	}

	/// Sets `oauth_token` and the secret that completes the signing key.
	pub fn set_token(&mut self, token: &str, token_secret: impl Into<Secret>) {
		self.params.insert(TOKEN.into(), token.to_owned());

		self.token_secret = token_secret.into();
	}

	/// Sets `oauth_callback`.
	pub fn set_callback(&mut self, callback: &str) {
		self.set(CALLBACK, callback);
	}

	/// Sets `oauth_verifier`.
	pub fn set_verifier(&mut self, verifier: &str) {
		self.set(VERIFIER, verifier);
	}

	/// Sets an arbitrary protocol parameter such as `oauth_session_handle`.
	pub fn set(&mut self, name: &str, value: &str) {
		self.params.insert(name.to_owned(), value.to_owned());
	}

	/// Reads a protocol parameter.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.params.get(name).map(String::as_str)
	}

	/// Removes a protocol parameter.
	pub fn remove(&mut self, name: &str) -> Option<String> {
		self.params.remove(name)
	}

	/// Protocol parameters in sorted order.
	pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
		self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
	}

	/// Active signature method.
	pub fn signature_method(&self) -> SignatureMethod {
		self.signature_method
	}

	/// `oauth_signature` computed by the last [`build`](Self::build).
	pub fn signature(&self) -> Option<&str> {
		self.get(SIGNATURE)
	}

	/// Nonce and timestamp for this request, generated on first read and frozen afterwards.
	pub fn nonce_timestamp(&mut self) -> NonceTimestamp {
		if !self.params.contains_key(NONCE) || !self.params.contains_key(TIMESTAMP) {
			let pair = NonceTimestamp::now();

			self.params.insert(NONCE.into(), pair.nonce);
			self.params.insert(TIMESTAMP.into(), pair.timestamp.to_string());
		}

		NonceTimestamp {
			nonce: self.params.get(NONCE).cloned().unwrap_or_default(),
			timestamp: self
				.params
				.get(TIMESTAMP)
				.and_then(|timestamp| timestamp.parse().ok())
				.unwrap_or_default(),
		}
	}

	/// Resets per-request state before asking for temporary credentials.
	pub fn prepare_for_request_token(&mut self) {
		self.reset_request_state();
		self.params.remove(TOKEN);
		self.params.remove(CALLBACK);

		self.token_secret = Secret::default();
	}

	/// Resets per-request state before exchanging or refreshing a token.
	pub fn prepare_for_access_token(&mut self) {
		self.reset_request_state();
		self.params.remove(TOKEN);
	}

	/// Signature base string: `METHOD&encoded-url&encoded-parameters`.
	///
	/// Protocol parameters (minus `oauth_signature`), signed request parameters, and the URL's own
	/// query participate. The joined parameter string is encoded once more as a whole.
	pub fn signature_base(
		&mut self,
		method: &str,
		url: &Url,
		content_type: Option<&str>,
		parameters: &[HttpParameter],
	) -> String {
		self.nonce_timestamp();

		let multipart = content_type.is_some_and(|value| {
			value.trim().to_ascii_lowercase().starts_with("multipart/form-data")
		});
		let mut pairs = self
			.params
			.iter()
			.filter(|(name, _)| name.as_str() != SIGNATURE)
			.map(|(name, value)| (percent_encode(name), percent_encode(value)))
			.collect::<Vec<_>>();

		pairs.extend(
			parameters
				.iter()
				.filter(|parameter| parameter.is_signed(multipart))
				.map(|parameter| {
					(percent_encode(&parameter.name), percent_encode(&parameter.text()))
				}),
		);
		pairs.extend(
			url.query_pairs().map(|(name, value)| (percent_encode(&name), percent_encode(&value))),
		);
		pairs.sort();

		let joined = pairs
			.iter()
			.map(|(name, value)| format!("{name}={value}"))
			.collect::<Vec<_>>()
			.join("&");

		format!(
			"{}&{}&{}",
			method.to_ascii_uppercase(),
			percent_encode(&normalize_url(url)),
			percent_encode(&joined)
		)
	}

	/// Signs the request and stores the result as `oauth_signature`.
	pub fn build(
		&mut self,
		method: &str,
		url: &Url,
		content_type: Option<&str>,
		parameters: &[HttpParameter],
	) -> Result<(), SignatureError> {
		self.params.remove(SIGNATURE);

		let base = self.signature_base(method, url, content_type, parameters);
		let key = match self.signature_method {
			SignatureMethod::RsaSha1 => self
				.rsa_private_key
				.as_ref()
				.map(|pem| pem.expose().to_owned())
				.unwrap_or_default(),
			SignatureMethod::Plaintext | SignatureMethod::HmacSha1 => self.signing_key(),
		};
		let signature = signature::sign(self.signature_method, &key, &base)?;

		self.params.insert(SIGNATURE.into(), signature);

		Ok(())
	}

	/// `Authorization` header value: `OAuth realm="..", k="v", ...` with encoded values.
	pub fn header_value(&self) -> String {
		let realm = self.realm.iter().map(|realm| format!("realm=\"{realm}\""));
		let params = self
			.params
			.iter()
			.map(|(name, value)| format!("{}=\"{}\"", percent_encode(name), percent_encode(value)));

		format!("OAuth {}", realm.chain(params).collect::<Vec<_>>().join(", "))
	}

	/// `consumer_secret&token_secret`, both verbatim.
	fn signing_key(&self) -> String {
		format!("{}&{}", self.consumer_secret.expose(), self.token_secret.expose())
	}

	fn reset_request_state(&mut self) {
		for name in [NONCE, TIMESTAMP, VERIFIER, SIGNATURE, BODY_HASH] {
			self.params.remove(name);
		}
	}
}
impl Debug for OAuthAuthorization {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuthAuthorization")
			.field("consumer_key", &self.get(CONSUMER_KEY))
			.field("signature_method", &self.signature_method)
			.field("token_set", &self.params.contains_key(TOKEN))
			.field("realm", &self.realm)
			.finish()
	}
}

/// `scheme://host[:port]/path` with default ports, query, and fragment removed.
pub fn normalize_url(url: &Url) -> String {
	let mut normalized =
		format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default().to_ascii_lowercase());

	if let Some(port) = url.port() {
		normalized.push_str(&format!(":{port}"));
	}

	normalized.push_str(url.path());

	normalized
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::signature::TEST_RSA_PEM;

	fn fixture() -> OAuthAuthorization {
		OAuthAuthorization::new("12345", "1234567890")
			.with_token("xyz", "abc")
			.with_nonce_timestamp(NonceTimestamp {
				nonce: "000000".into(),
				timestamp: 1_111_111_111,
			})
	}

	fn url(text: &str) -> Url {
		Url::parse(text).expect("Fixture URL should parse.")
	}

	fn localhost() -> Url {
		url("https://localhost/test")
	}

	#[test]
	fn hmac_sha1_signature_matches_known_vector() {
		let mut auth = fixture();

		auth.build("get", &localhost(), None, &[]).expect("Signing should succeed.");

		assert_eq!(auth.signature(), Some("vYE8cEP5ynznQRDqTxx307kc6rY="));
	}

	#[test]
	fn body_hash_joins_the_signature() {
		let mut auth = fixture().with_body_hash(b"");

		assert_eq!(auth.get("oauth_body_hash"), Some("2jmj7l5rSw0yVb/vlWAYkK/YBwk="));

		auth.build("GET", &localhost(), None, &[]).expect("Signing should succeed.");

		assert_eq!(auth.signature(), Some("D7p1gERjGAHaLCLXh1//7awumvw="));
	}

	#[test]
	fn base_string_merges_query_and_form_parameters() {
		let mut auth = OAuthAuthorization::new("k", "s")
			.with_nonce_timestamp(NonceTimestamp { nonce: "n".into(), timestamp: 1 });
		let parameters = [
			HttpParameter::form("c", "x y"),
			HttpParameter::file("upload", "a.bin", vec![1, 2, 3]),
			HttpParameter::header("X-Trace", "t"),
		];
		let target = url("https://Example.COM:443/path?b=2&a=1#frag");
		let form = Some("application/x-www-form-urlencoded");
		let base = auth.signature_base("post", &target, form, &parameters);

		assert_eq!(
			base,
			"POST&https%3A%2F%2Fexample.com%2Fpath&a%3D1%26b%3D2%26c%3Dx%2520y%26oauth_consumer_key%3Dk%26oauth_nonce%3Dn%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1%26oauth_version%3D1.0"
		);

		let multipart = Some("multipart/form-data; boundary=x");
		let multipart = auth.signature_base("POST", &target, multipart, &parameters);

		assert!(!multipart.contains("c%3D"), "Multipart form fields must not be signed.");
	}

	#[test]
	fn url_normalization_keeps_non_default_ports() {
		assert_eq!(
			normalize_url(&url("http://LOCALHOST:8080/a/b?x=1")),
			"http://localhost:8080/a/b"
		);
		assert_eq!(normalize_url(&url("http://localhost:80/")), "http://localhost/");
	}

	#[test]
	fn nonce_is_generated_once_then_frozen() {
		let mut auth = OAuthAuthorization::new("k", "s");
		let first = auth.nonce_timestamp();

		assert_eq!(auth.nonce_timestamp(), first);

		auth.prepare_for_access_token();

		assert_ne!(auth.nonce_timestamp().nonce, first.nonce);
	}

	#[test]
	fn prepare_steps_strip_per_request_state() {
		let mut auth = fixture();

		auth.set_callback("https://app.example/cb");
		auth.set_verifier("v");
		auth.build("GET", &localhost(), None, &[]).expect("Signing should succeed.");
		auth.prepare_for_access_token();

		assert!(auth.get("oauth_verifier").is_none());
		assert!(auth.signature().is_none());
		assert!(auth.get("oauth_token").is_none());
		assert_eq!(auth.get("oauth_callback"), Some("https://app.example/cb"));

		auth.prepare_for_request_token();

		assert!(auth.get("oauth_callback").is_none());
		assert_eq!(auth.signing_key(), "1234567890&");
	}

	#[test]
	fn header_renders_realm_first_and_hides_secrets() {
		let mut auth = fixture().with_realm("Photos");

		auth.build("GET", &localhost(), None, &[]).expect("Signing should succeed.");

		let header = auth.header_value();

		assert!(header.starts_with("OAuth realm=\"Photos\", oauth_consumer_key=\"12345\""));
		assert!(header.contains("oauth_signature=\"vYE8cEP5ynznQRDqTxx307kc6rY%3D\""));
		assert!(!header.contains("1234567890"));
		assert!(!header.contains("abc"));
		assert!(!format!("{auth:?}").contains("1234567890"));
	}

	#[test]
	fn plaintext_and_rsa_use_their_own_keys() {
		let mut plaintext = fixture().with_signature_method(SignatureMethod::Plaintext);

		plaintext.build("GET", &localhost(), None, &[]).expect("Signing should succeed.");

		assert_eq!(plaintext.signature(), Some("1234567890&abc"));
		assert_eq!(plaintext.get("oauth_signature_method"), Some("PLAINTEXT"));

		let mut reserved = OAuthAuthorization::new("12345", "a&b")
			.with_token("xyz", "c d")
			.with_signature_method(SignatureMethod::Plaintext);

		reserved.build("GET", &localhost(), None, &[]).expect("Signing should succeed.");

		assert_eq!(reserved.signing_key(), "a&b&c d");
		assert_eq!(reserved.signature(), Some("a&b&c d"));

		let mut rsa = fixture().with_signature_method(SignatureMethod::RsaSha1);
		let err = rsa
			.build("GET", &localhost(), None, &[])
			.expect_err("RSA without a key must fail.");

		assert!(matches!(err, SignatureError::InvalidRsaKey { source: None }));

		let mut rsa = rsa.with_rsa_private_key(TEST_RSA_PEM);

		rsa.build("GET", &localhost(), None, &[]).expect("Fixture key should sign.");

		assert!(rsa.signature().is_some_and(|signature| signature.len() == 172));
	}
}

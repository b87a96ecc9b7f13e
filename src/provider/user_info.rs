//! User-info endpoint declaration and response field mapping.

// self
use crate::{_prelude::*, error::ApiError, value::UniValue};

/// Well-known normalized field names.
pub mod field {
	/// Provider-side user identifier.
	pub const ID: &str = "id";
	/// Login or handle.
	pub const USER_NAME: &str = "user_name";
	/// Human-readable name.
	pub const DISPLAY_NAME: &str = "display_name";
	/// Primary email address.
	pub const EMAIL: &str = "email";
	/// Avatar image URL.
	pub const AVATAR_URL: &str = "avatar_url";
}

/// HTTP method used against the user-info endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserInfoMethod {
	/// `GET` (the common case).
	#[default]
	Get,
	/// `POST`, used by a few legacy providers.
	Post,
}

/// Profile endpoint plus the mapping applied to its responses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoEndpoint {
	/// Endpoint URL.
	pub url: Url,
	/// HTTP method.
	#[serde(default)]
	pub method: UserInfoMethod,
	/// Response mapping.
	#[serde(default)]
	pub mapping: UserInfoMapping,
}
impl UserInfoEndpoint {
	/// Creates a `GET` endpoint with an empty mapping.
	pub fn new(url: Url) -> Self {
		Self { url, method: UserInfoMethod::Get, mapping: UserInfoMapping::default() }
	}

	/// Overrides the HTTP method.
	pub fn with_method(mut self, method: UserInfoMethod) -> Self {
		self.method = method;

		self
	}

	/// Replaces the response mapping.
	pub fn with_mapping(mut self, mapping: UserInfoMapping) -> Self {
		self.mapping = mapping;

		self
	}
}

/// Normalized field to value-tree path table.
///
/// Paths are dot separated; numeric segments index arrays (`emails.0.value`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfoMapping {
	/// Normalized field name to response path.
	pub fields: BTreeMap<String, String>,
	/// Path whose presence marks an application-level error.
	pub error_code: Option<String>,
	/// Path holding the error message.
	pub error_message: Option<String>,
}
impl UserInfoMapping {
	/// Maps `name` to `path`.
	pub fn with_field(mut self, name: impl Into<String>, path: impl Into<String>) -> Self {
		self.fields.insert(name.into(), path.into());

		self
	}

	/// Declares where the provider reports errors inside 2xx responses.
	pub fn with_error_paths(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
		self.error_code = Some(code.into());
		self.error_message = Some(message.into());

		self
	}

	/// Applies the mapping to a parsed response.
	pub fn apply(&self, raw: UniValue) -> Result<UserInfo, ApiError> {
		let code = self.error_code.as_deref().map(|path| resolve(&raw, path)).unwrap_or_default();

		if !code.is_empty() {
			let message =
				self.error_message.as_deref().map(|path| resolve(&raw, path)).unwrap_or_default();

			return Err(ApiError { code, message, raw });
		}

		let fields = self
			.fields
			.iter()
			.filter_map(|(name, path)| {
				let value = resolve(&raw, path);

				(!value.is_empty()).then(|| (name.clone(), value))
			})
			.collect();

		Ok(UserInfo { fields, raw })
	}
}

fn resolve(raw: &UniValue, path: &str) -> String {
	let segments = path.split('.').filter(|segment| !segment.is_empty()).collect::<Vec<_>>();

	raw.lookup(&segments).to_string().trim().to_owned()
}

/// Normalized profile extracted from a user-info response.
#[derive(Clone, Debug)]
pub struct UserInfo {
	fields: BTreeMap<String, String>,
	raw: UniValue,
}
impl UserInfo {
	/// Mapped field by normalized name.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	/// Provider-side user identifier.
	pub fn id(&self) -> Option<&str> {
		self.get(field::ID)
	}

	/// Login or handle.
	pub fn user_name(&self) -> Option<&str> {
		self.get(field::USER_NAME)
	}

	/// Human-readable name.
	pub fn display_name(&self) -> Option<&str> {
		self.get(field::DISPLAY_NAME)
	}

	/// Primary email.
	pub fn email(&self) -> Option<&str> {
		self.get(field::EMAIL)
	}

	/// Avatar URL.
	pub fn avatar_url(&self) -> Option<&str> {
		self.get(field::AVATAR_URL)
	}

	/// All mapped fields.
	pub fn fields(&self) -> &BTreeMap<String, String> {
		&self.fields
	}

	/// Parsed provider response.
	pub fn raw(&self) -> &UniValue {
		&self.raw
	}
}

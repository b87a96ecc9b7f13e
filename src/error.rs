//! Engine-level error types shared across the value tree, signing, and protocol flows.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Malformed JSON/XML/query-string input or an un-coercible scalar.
	#[error(transparent)]
	Format(#[from] FormatError),
	/// Signature computation failed or the method is unknown.
	#[error(transparent)]
	Signature(#[from] SignatureError),
	/// Protocol endpoint answered with a non-2xx status or could not be reached.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// A token (or one of its secrets) required by the operation is missing.
	#[error(transparent)]
	AccessToken(#[from] AccessTokenError),
	/// Provider returned a well-formed payload carrying an application-level error.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Request-token cache backend failure.
	#[error(transparent)]
	Cache(#[from] crate::cache::CacheError),

	/// Capability-gated operation invoked on a provider that does not support it.
	#[error("Provider `{provider}` does not support the {operation} operation.")]
	NotSupported {
		/// Provider identifier string.
		provider: String,
		/// Operation label.
		operation: &'static str,
	},
	/// A required caller-supplied argument was absent or blank.
	#[error("Argument `{name}` is required.")]
	MissingArgument {
		/// Name of the missing argument.
		name: &'static str,
	},
	/// The `state` parameter returned by the provider does not match the issued one.
	#[error("Authorization state mismatch.")]
	InvalidState,
}

/// Failure kinds raised by the value tree parsers and coercions.
#[derive(Debug, ThisError)]
pub enum FormatError {
	/// Input is not valid JSON.
	#[error("Invalid JSON: {message}.")]
	InvalidJson {
		/// Parser diagnostic.
		message: String,
	},
	/// Input is not well-formed XML.
	#[error("Invalid XML: {message}.")]
	InvalidXml {
		/// Parser diagnostic.
		message: String,
	},
	/// Input is not a valid `key=value&...` parameter string.
	#[error("Invalid parameters: {message}.")]
	InvalidParameters {
		/// Parser diagnostic.
		message: String,
	},
	/// A scalar could not be represented as the requested type.
	#[error("Cannot convert `{value}` to {target}.")]
	Conversion {
		/// Text form of the offending value.
		value: String,
		/// Requested target type label.
		target: &'static str,
	},
	/// The tree does not match the shape of the requested type.
	#[error("Value tree does not match the requested type.")]
	Deserialize(#[source] serde_path_to_error::Error<serde_json::Error>),
}
impl FormatError {
	pub(crate) fn conversion(value: impl Display, target: &'static str) -> Self {
		Self::Conversion { value: value.to_string(), target }
	}
}

/// Signature engine failures.
#[derive(Debug, ThisError)]
pub enum SignatureError {
	/// The signature method name is not one of PLAINTEXT, HMAC-SHA1, RSA-SHA1.
	#[error("Unsupported signature method `{method}`.")]
	UnsupportedSignatureMethod {
		/// Method name as supplied.
		method: String,
	},
	/// RSA-SHA1 was requested but the private key is missing or not PEM.
	#[error("RSA private key is missing or malformed.")]
	InvalidRsaKey {
		/// Underlying decoding failure, when one was reported.
		#[source]
		source: Option<BoxError>,
	},
	/// HMAC rejected the signing key.
	#[error("HMAC signing key was rejected.")]
	InvalidHmacKey,
	/// The RSA primitive rejected the signing operation.
	#[error("RSA signing failed.")]
	RsaSigning {
		/// Underlying signing failure.
		#[source]
		source: BoxError,
	},
}

/// HTTP-level failures reported by protocol endpoints.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// Endpoint answered with a non-2xx status.
	#[error("Endpoint returned HTTP {status}: {body}")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Response `Content-Type`, when present.
		content_type: Option<String>,
		/// Raw response body for provider-specific diagnostics.
		body: String,
	},
	/// Network, TLS, or IO failure inside the transport.
	#[error("Transport failure while calling the endpoint.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// The outgoing HTTP request could not be assembled.
	#[error(transparent)]
	Build(#[from] oauth2::http::Error),
}
impl RequestError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}

	/// Returns the HTTP status code for [`RequestError::Status`].
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for RequestError {
	fn from(e: ReqwestError) -> Self {
		Self::transport(e)
	}
}

/// Missing or mismatched token material.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AccessTokenError {
	/// No access token is available for the operation.
	#[error("Access token is required.")]
	Missing,
	/// The token carries no refresh value.
	#[error("Access token has no refresh token.")]
	MissingRefreshToken,
	/// The OAuth 1.0 token carries no token secret.
	#[error("Access token has no token secret.")]
	MissingTokenSecret,
	/// No request token is available for the OAuth 1.0 exchange.
	#[error("Request token is required; call request_token() first.")]
	MissingRequestToken,
	/// The response is neither an OAuth 1.0 nor an OAuth 2.0 token payload.
	#[error("Response does not contain an access token.")]
	UnrecognizedShape,
	/// The parsed token is not of the requested kind.
	#[error("Expected an {expected} access token but found {found}.")]
	KindMismatch {
		/// Requested kind label.
		expected: &'static str,
		/// Detected kind label.
		found: &'static str,
	},
}

/// Application-level error carried by a 2xx provider response.
#[derive(Debug, ThisError)]
#[error("Provider API error {code}: {message}")]
pub struct ApiError {
	/// Provider error code.
	pub code: String,
	/// Provider error message (may be empty).
	pub message: String,
	/// Full parsed response.
	pub raw: crate::value::UniValue,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Descriptor speaks a different protocol than the client.
	#[error("Descriptor `{descriptor}` is not an {expected} provider.")]
	ProtocolMismatch {
		/// Provider identifier string.
		descriptor: String,
		/// Protocol the client expected.
		expected: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn status_error_keeps_raw_body() {
		let err: Error = RequestError::Status {
			status: 401,
			content_type: Some("application/json".into()),
			body: "{\"error\":\"invalid_client\"}".into(),
		}
		.into();

		assert!(err.to_string().contains("401"));
		assert!(err.to_string().contains("invalid_client"));

		match err {
			Error::Request(inner) => assert_eq!(inner.status(), Some(401)),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn transport_error_is_wrapped_once() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
		let err: Error = RequestError::transport(io).into();
		let source = err.source().expect("Request error should expose the transport source.");

		assert_eq!(source.to_string(), "reset by peer");
		assert!(source.source().is_none(), "Transport failures must not be re-wrapped.");
	}
}

//! Transport error mapping shared by both protocol clients.

pub use oauth2;

// crates.io
use oauth2::HttpClientError;
// self
use crate::{_prelude::*, error::RequestError};

/// Maps HTTP transport failures into [`RequestError`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a request error.
	fn map_transport_error(&self, error: HttpClientError<E>) -> RequestError;
}

/// Mapper for any transport: the failure is boxed once as the error source.
#[derive(Clone, Debug, Default)]
pub struct BoxedTransportErrorMapper;
impl<E> TransportErrorMapper<E> for BoxedTransportErrorMapper
where
	E: 'static + Send + Sync + StdError,
{
	fn map_transport_error(&self, error: HttpClientError<E>) -> RequestError {
		map_common(error)
	}
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(&self, error: HttpClientError<ReqwestError>) -> RequestError {
		match error {
			HttpClientError::Reqwest(inner) => RequestError::from(*inner),
			other => map_common(other),
		}
	}
}

fn map_common<E>(error: HttpClientError<E>) -> RequestError
where
	E: 'static + Send + Sync + StdError,
{
	match error {
		HttpClientError::Reqwest(inner) => RequestError::Transport { source: inner },
		HttpClientError::Http(inner) => RequestError::Build(inner),
		HttpClientError::Io(inner) => RequestError::transport(inner),
		HttpClientError::Other(message) => RequestError::Transport { source: message.into() },
		_ => RequestError::Transport { source: "Unknown HTTP client failure.".into() },
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::error::Error as _;
	// self
	use super::*;

	#[test]
	fn io_and_message_failures_become_transport_errors() {
		let mapper = BoxedTransportErrorMapper;
		let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
		let mapped = TransportErrorMapper::<std::io::Error>::map_transport_error(
			&mapper,
			HttpClientError::Io(io),
		);

		assert!(matches!(&mapped, RequestError::Transport { .. }));
		assert_eq!(mapped.source().map(|e| e.to_string()), Some("timed out".into()));

		let mapped = TransportErrorMapper::<std::io::Error>::map_transport_error(
			&mapper,
			HttpClientError::Other("connection refused".into()),
		);

		assert_eq!(mapped.source().map(|e| e.to_string()), Some("connection refused".into()));
	}

	#[test]
	fn boxed_transport_errors_are_not_rewrapped() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
		let mapped =
			BoxedTransportErrorMapper.map_transport_error(HttpClientError::Reqwest(Box::new(io)));
		let source = mapped.source().expect("Transport error should expose its source.");

		assert_eq!(source.to_string(), "reset");
		assert!(source.source().is_none());
	}
}

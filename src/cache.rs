//! Request-token cache carrying OAuth 1.0 temporary credentials across the authorize redirect.
//!
//! The user-authorization step usually lands on a different client instance (another request,
//! another worker) than the one that fetched the request token. Attach a cache to the OAuth 1.0
//! client and the callback handler can recover the token secret by its `oauth_token` value.

pub mod memory;

pub use memory::MemoryRequestTokenCache;

// self
use crate::{_prelude::*, token::RequestToken};

/// Future returned by [`RequestTokenCache`] operations.
pub type CacheFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CacheError>> + 'a + Send>>;

/// Storage contract for pending request tokens.
pub trait RequestTokenCache
where
	Self: Send + Sync,
{
	/// Stores `token` under `key` until `ttl` elapses.
	fn put<'a>(&'a self, key: &'a str, token: RequestToken, ttl: Duration) -> CacheFuture<'a, ()>;

	/// Removes and returns the live token stored under `key`.
	///
	/// Request tokens are single use, so a successful take leaves nothing behind.
	fn take<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<RequestToken>>;
}

/// Error type produced by [`RequestTokenCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CacheError {
	/// Backend-level failure for the cache engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

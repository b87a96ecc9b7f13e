//! Thread-safe in-memory [`RequestTokenCache`] implementation.

// self
use crate::{
	_prelude::*,
	cache::{CacheError, CacheFuture, RequestTokenCache},
	token::RequestToken,
};

type CacheMap = Arc<RwLock<HashMap<String, (RequestToken, OffsetDateTime)>>>;

/// In-process cache for single-node deployments, tests, and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryRequestTokenCache(CacheMap);
impl MemoryRequestTokenCache {
	/// Number of entries currently held, expired ones included until the next write.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn put_now(
		map: &CacheMap,
		key: &str,
		token: RequestToken,
		expires_at: OffsetDateTime,
		now: OffsetDateTime,
	) {
		let mut guard = map.write();

		guard.retain(|_, (_, expiry)| *expiry > now);

		if expires_at > now {
			guard.insert(key.to_owned(), (token, expires_at));
		}
	}

	fn take_now(map: &CacheMap, key: &str, now: OffsetDateTime) -> Option<RequestToken> {
		match map.write().remove(key) {
			Some((token, expires_at)) if expires_at > now => Some(token),
			_ => None,
		}
	}
}
impl RequestTokenCache for MemoryRequestTokenCache {
	fn put<'a>(&'a self, key: &'a str, token: RequestToken, ttl: Duration) -> CacheFuture<'a, ()> {
		Box::pin(async move {
			let now = OffsetDateTime::now_utc();

			Self::put_now(&self.0, key, token, now.saturating_add(ttl), now);

			Ok::<_, CacheError>(())
		})
	}

	fn take<'a>(&'a self, key: &'a str) -> CacheFuture<'a, Option<RequestToken>> {
		Box::pin(async move { Ok(Self::take_now(&self.0, key, OffsetDateTime::now_utc())) })
	}
}

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::_prelude::*;

const NONCE_LEN: usize = 32;

/// Per-request `oauth_nonce` / `oauth_timestamp` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonceTimestamp {
	/// Random alphanumeric nonce.
	pub nonce: String,
	/// Unix seconds.
	pub timestamp: i64,
}
impl NonceTimestamp {
	/// Derives a pair from an explicit clock reading and random source.
	pub fn generate<R>(now: OffsetDateTime, rng: &mut R) -> Self
	where
		R: Rng,
	{
		let nonce = (0..NONCE_LEN).map(|_| char::from(rng.sample(Alphanumeric))).collect();

		Self { nonce, timestamp: now.unix_timestamp() }
	}

	/// Pair for the current instant using the thread-local CSPRNG.
	pub fn now() -> Self {
		Self::generate(OffsetDateTime::now_utc(), &mut rand::rng())
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use rand::{SeedableRng, rngs::StdRng};
	use time::macros::datetime;
	// self
	use super::*;

	#[test]
	fn generation_is_a_pure_function_of_inputs() {
		let now = datetime!(2005-03-18 1:58:31 UTC);
		let first = NonceTimestamp::generate(now, &mut StdRng::seed_from_u64(7));
		let second = NonceTimestamp::generate(now, &mut StdRng::seed_from_u64(7));

		assert_eq!(first, second);
		assert_eq!(first.timestamp, 1_111_111_111);
		assert_eq!(first.nonce.len(), NONCE_LEN);
		assert!(first.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(NonceTimestamp::now().nonce, NonceTimestamp::now().nonce);
	}
}

//! Optional observability hooks for protocol operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth_switchboard.flow` with the `flow`
//!   (operation) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oauth_switchboard_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Protocol operations observed by the clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// OAuth 1.0 temporary credential request.
	RequestToken,
	/// Verifier or authorization-code exchange.
	AccessToken,
	/// OAuth 2.0 client credentials grant.
	ClientCredentials,
	/// Token refresh.
	Refresh,
	/// Token revocation.
	Revoke,
	/// Profile lookup through the user-info endpoint.
	UserInfo,
	/// Caller-supplied request signed with the current token.
	SignedRequest,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::RequestToken => "request_token",
			FlowKind::AccessToken => "access_token",
			FlowKind::ClientCredentials => "client_credentials",
			FlowKind::Refresh => "refresh",
			FlowKind::Revoke => "revoke",
			FlowKind::UserInfo => "user_info",
			FlowKind::SignedRequest => "signed_request",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps an operation result onto its terminal outcome label.
	pub fn of<T, E>(result: &std::result::Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

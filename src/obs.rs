//! Observability helpers for token flows.
//!
//! Every flow runs inside a `tracing` span named `oauth2_token_cache.flow` carrying the `flow`
//! (grant) and `stage` (call site) fields.
//!
//! # Feature Flags
//!
//! - Enable `metrics` to increment the `oauth2_token_cache_flow_total` counter for every
//!   attempt/success/failure/cache hit, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Token flows observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Generic form-parameter grant.
	Generic,
	/// Browser-based authorization code grant.
	Web,
	/// JWT bearer assertion grant.
	Jwt,
	/// Caller-registered grant.
	Custom,
	/// Refresh token exchange.
	Refresh,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Generic => "generic",
			FlowKind::Web => "web",
			FlowKind::Jwt => "jwt",
			FlowKind::Custom => "custom",
			FlowKind::Refresh => "refresh",
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
	/// Entry to a flow.
	Attempt,
	/// A cached token was returned without contacting the token endpoint.
	CacheHit,
	/// Successful completion.
	Success,
	/// Failure, either propagated or absorbed by a fallback.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::CacheHit => "cache_hit",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

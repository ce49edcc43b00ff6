//! Claims decoded from an access token, used only to estimate its remaining lifetime.

// crates.io
use time::format_description::well_known::{Iso8601, Rfc2822, Rfc3339};
// self
use crate::_prelude::*;

/// Claims extracted from an opaque token by a [`TokenDecoder`](crate::decode::TokenDecoder).
///
/// Never persisted; rebuilt from the cached access token on every lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedClaims(JsonMap);
impl DecodedClaims {
	/// Wraps a decoded claims object.
	pub fn new(claims: JsonMap) -> Self {
		Self(claims)
	}

	/// Claim lookup by name.
	pub fn get(&self, name: &str) -> Option<&JsonValue> {
		self.0.get(name)
	}

	/// Every decoded claim.
	pub fn as_map(&self) -> &JsonMap {
		&self.0
	}

	/// Expiry instant from the `expires_at` timestamp or the `exp` epoch-seconds claim.
	///
	/// `expires_at` wins when both are present and parseable. Unparseable values count as
	/// missing.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.get("expires_at")
			.and_then(JsonValue::as_str)
			.and_then(parse_timestamp)
			.or_else(|| {
				self.get("exp")
					.and_then(JsonValue::as_i64)
					.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
			})
	}

	/// Remaining lifetime relative to `now`; negative once expired.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Option<Duration> {
		self.expires_at().map(|expires_at| expires_at - now)
	}
}
impl From<JsonMap> for DecodedClaims {
	fn from(claims: JsonMap) -> Self {
		Self(claims)
	}
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	OffsetDateTime::parse(raw, &Rfc3339)
		.or_else(|_| OffsetDateTime::parse(raw, &Iso8601::DEFAULT))
		.or_else(|_| OffsetDateTime::parse(raw, &Rfc2822))
		.ok()
}

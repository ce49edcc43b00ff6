//! Per-client counters describing how authorizations were served.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how authorizations were served.
#[derive(Debug, Default)]
pub struct FlowMetrics {
	attempts: AtomicU64,
	cache_hits: AtomicU64,
	refreshes: AtomicU64,
	refresh_failures: AtomicU64,
	creations: AtomicU64,
	failures: AtomicU64,
}
impl FlowMetrics {
	/// Returns the total number of authorization requests.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of requests served from the cache unchanged.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of successful refresh token exchanges.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh attempts that fell back to a full grant.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens created through the configured grant.
	pub fn creations(&self) -> u64 {
		self.creations.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_creation(&self) {
		self.creations.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

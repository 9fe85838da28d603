//! Sliding-window [`RateLimitPolicy`] with per-identity critical sections.

// std
use std::collections::VecDeque;
// crates.io
use time::PrimitiveDateTime;
// self
use crate::{
	_prelude::*,
	config::DispatchConfig,
	identity::IdentityId,
	limit::{RateLimitContext, RateLimitDecision, RateLimitPolicy, RetryDirective},
};

type WindowHandle = Arc<Mutex<RateWindow>>;

const LATEST_INSTANT: OffsetDateTime = PrimitiveDateTime::MAX.assume_utc();

/// Recent attempt instants for one identity.
#[derive(Clone, Debug, Default)]
pub struct RateWindow {
	timestamps: VecDeque<OffsetDateTime>,
}
impl RateWindow {
	/// Drops every instant that is not strictly within `window` of `now`.
	pub fn prune(&mut self, now: OffsetDateTime, window: Duration) {
		self.timestamps.retain(|instant| now - *instant < window);
	}

	/// Number of retained attempts.
	pub fn len(&self) -> usize {
		self.timestamps.len()
	}

	/// Whether the window holds no attempts.
	pub fn is_empty(&self) -> bool {
		self.timestamps.is_empty()
	}

	fn oldest(&self) -> Option<OffsetDateTime> {
		self.timestamps.iter().min().copied()
	}
}

/// Process-local sliding-window limiter keyed by [`IdentityId`].
///
/// The identity map sits behind a reader/writer lock that is only held long enough to look up
/// (or lazily create) the identity's window. The prune-count-append sequence then runs under
/// that window's own mutex, so callers for different identities never wait on each other.
#[derive(Debug)]
pub struct RateLimiter {
	max_requests: usize,
	window: Duration,
	windows: RwLock<HashMap<IdentityId, WindowHandle>>,
}
impl RateLimiter {
	/// Creates a limiter allowing `max_requests` attempts per `window`.
	pub fn new(max_requests: usize, window: Duration) -> Self {
		Self { max_requests, window, windows: RwLock::default() }
	}

	/// Creates a limiter from [`DispatchConfig`] budget values.
	pub fn from_config(config: &DispatchConfig) -> Self {
		Self::new(config.max_requests, config.window())
	}

	/// Convenience wrapper evaluating `identity` at the current instant.
	pub fn allow(&self, identity: &IdentityId) -> RateLimitDecision {
		self.evaluate(&RateLimitContext::new(identity.clone()))
	}

	/// Configured budget per window.
	pub fn max_requests(&self) -> usize {
		self.max_requests
	}

	/// Configured window length.
	pub fn window(&self) -> Duration {
		self.window
	}

	/// Number of identities with a live window.
	pub fn tracked_identities(&self) -> usize {
		self.windows.read().len()
	}

	/// Forgets every recorded attempt for `identity`.
	pub fn reset(&self, identity: &IdentityId) {
		self.windows.write().remove(identity);
	}

	/// Evicts windows with no attempts left inside the window as of `now`.
	///
	/// Windows currently borrowed by an in-flight evaluation are kept. Returns the number of
	/// evicted identities.
	pub fn purge_idle(&self, now: OffsetDateTime) -> usize {
		let window = self.window;
		let mut guard = self.windows.write();
		let before = guard.len();

		guard.retain(|_, handle| {
			if Arc::strong_count(handle) > 1 {
				return true;
			}

			let mut state = handle.lock();

			state.prune(now, window);

			!state.is_empty()
		});

		before - guard.len()
	}

	fn window_for(&self, identity: &IdentityId) -> WindowHandle {
		if let Some(handle) = self.windows.read().get(identity) {
			return handle.clone();
		}

		self.windows.write().entry(identity.clone()).or_default().clone()
	}

	fn deny_reason(&self) -> String {
		if self.window == Duration::MINUTE {
			format!("Rate limit exceeded. Max {} webhook requests per minute.", self.max_requests)
		} else {
			format!(
				"Rate limit exceeded. Max {} webhook requests per {} seconds.",
				self.max_requests,
				self.window.whole_seconds()
			)
		}
	}
}
impl Default for RateLimiter {
	fn default() -> Self {
		Self::from_config(&DispatchConfig::default())
	}
}
impl RateLimitPolicy for RateLimiter {
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitDecision {
		let handle = self.window_for(&context.identity);
		let now = context.observed_at;
		let mut state = handle.lock();

		state.prune(now, self.window);

		if state.len() >= self.max_requests {
			let earliest_retry_at = state.oldest().map_or(now, |oldest| {
				oldest.checked_add(self.window).unwrap_or(LATEST_INSTANT)
			});

			return RateLimitDecision::Deny(RetryDirective::new(
				earliest_retry_at,
				self.deny_reason(),
			));
		}

		state.timestamps.push_back(now);

		RateLimitDecision::Allow
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn at(offset_secs: i64) -> OffsetDateTime {
		macros::datetime!(2025-11-10 12:00 UTC) + Duration::seconds(offset_secs)
	}

	fn check(limiter: &RateLimiter, identity: &IdentityId, offset_secs: i64) -> RateLimitDecision {
		limiter.evaluate(&RateLimitContext::new(identity.clone()).with_observed_at(at(offset_secs)))
	}

	#[test]
	fn denies_after_budget_and_recovers_after_window() {
		let limiter = RateLimiter::default();
		let user = IdentityId::from(1_u64);

		for second in 0..10 {
			assert!(check(&limiter, &user, second).is_allowed(), "Attempt {second} should pass.");
		}

		match check(&limiter, &user, 30) {
			RateLimitDecision::Deny(directive) => {
				assert_eq!(
					directive.reason,
					"Rate limit exceeded. Max 10 webhook requests per minute."
				);
				assert_eq!(directive.earliest_retry_at, at(60));
			},
			other => panic!("Eleventh attempt should be denied, got {other:?}."),
		}

		assert!(check(&limiter, &user, 60).is_allowed(), "Oldest attempt has left the window.");
	}

	#[test]
	fn identities_are_isolated() {
		let limiter = RateLimiter::new(1, Duration::seconds(60));
		let x = IdentityId::from(1_u64);
		let y = IdentityId::from(2_u64);

		assert!(check(&limiter, &x, 0).is_allowed());
		assert!(!check(&limiter, &x, 1).is_allowed());
		assert!(check(&limiter, &y, 1).is_allowed());
	}

	#[test]
	fn denied_attempts_are_not_recorded() {
		let limiter = RateLimiter::new(1, Duration::seconds(10));
		let user = IdentityId::from(9_u64);

		assert!(check(&limiter, &user, 0).is_allowed());

		for second in 1..10 {
			assert!(!check(&limiter, &user, second).is_allowed());
		}

		assert!(check(&limiter, &user, 10).is_allowed());
	}

	#[test]
	fn custom_window_reason_names_seconds() {
		let limiter = RateLimiter::new(0, Duration::seconds(5));

		match limiter.allow(&IdentityId::from(3_u64)) {
			RateLimitDecision::Deny(directive) => assert_eq!(
				directive.reason,
				"Rate limit exceeded. Max 0 webhook requests per 5 seconds."
			),
			RateLimitDecision::Allow => panic!("A zero budget must deny."),
		}
	}

	#[test]
	fn oversized_window_saturates_retry_instant() {
		let limiter = RateLimiter::new(1, Duration::MAX);
		let user = IdentityId::from(1_u64);

		assert!(check(&limiter, &user, 0).is_allowed());

		match check(&limiter, &user, 1) {
			RateLimitDecision::Deny(directive) =>
				assert_eq!(directive.earliest_retry_at, LATEST_INSTANT),
			other => panic!("Second attempt should be denied, got {other:?}."),
		}
	}

	#[test]
	fn purge_idle_evicts_expired_windows_only() {
		let limiter = RateLimiter::new(5, Duration::seconds(60));
		let stale = IdentityId::from(1_u64);
		let live = IdentityId::from(2_u64);

		check(&limiter, &stale, 0);
		check(&limiter, &live, 50);

		assert_eq!(limiter.tracked_identities(), 2);
		assert_eq!(limiter.purge_idle(at(61)), 1);
		assert_eq!(limiter.tracked_identities(), 1);

		limiter.reset(&live);

		assert_eq!(limiter.tracked_identities(), 0);
	}

	#[test]
	fn concurrent_callers_share_one_budget() {
		let limiter = RateLimiter::new(10, Duration::seconds(60));
		let user = IdentityId::from(5_u64);
		let allowed = AtomicUsize::new(0);

		std::thread::scope(|scope| {
			for _ in 0..8 {
				scope.spawn(|| {
					for _ in 0..5 {
						if check(&limiter, &user, 0).is_allowed() {
							allowed.fetch_add(1, Ordering::Relaxed);
						}
					}
				});
			}
		});

		assert_eq!(allowed.load(Ordering::Relaxed), 10);
	}
}

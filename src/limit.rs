//! Rate limit contracts consulted before any outbound webhook is attempted.
//!
//! The dispatcher only depends on [`RateLimitPolicy`]; [`RateLimiter`] is the built-in
//! sliding-window implementation keyed by [`IdentityId`].

pub mod window;

pub use window::*;

// self
use crate::{_prelude::*, identity::IdentityId};

/// Strategy that decides whether an identity may dispatch right now.
///
/// Implementations are shared across concurrent callers, so `evaluate` must be atomic with
/// respect to other calls for the same identity without serializing unrelated identities.
pub trait RateLimitPolicy
where
	Self: Send + Sync,
{
	/// Evaluates (and, when allowed, records) one dispatch attempt.
	fn evaluate(&self, context: &RateLimitContext) -> RateLimitDecision;
}

/// Context shared with a [`RateLimitPolicy`] before an outbound call is made.
#[derive(Clone, Debug)]
pub struct RateLimitContext {
	/// Caller identity for the attempt.
	pub identity: IdentityId,
	/// Timestamp the dispatcher observed before invoking the policy.
	pub observed_at: OffsetDateTime,
}
impl RateLimitContext {
	/// Creates a new context for the given identity, observed now.
	pub fn new(identity: IdentityId) -> Self {
		Self { identity, observed_at: OffsetDateTime::now_utc() }
	}

	/// Overrides the timestamp associated with the observation.
	pub fn with_observed_at(mut self, instant: OffsetDateTime) -> Self {
		self.observed_at = instant;

		self
	}
}

/// Result emitted by a [`RateLimitPolicy`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
	/// The request may proceed immediately; the attempt has been recorded.
	Allow,
	/// The identity exhausted its budget.
	Deny(RetryDirective),
}
impl RateLimitDecision {
	/// Returns `true` for [`RateLimitDecision::Allow`].
	pub fn is_allowed(&self) -> bool {
		matches!(self, Self::Allow)
	}
}

/// Advises callers when to retry after a [`RateLimitDecision::Deny`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryDirective {
	/// Instant when the oldest recorded attempt leaves the window.
	pub earliest_retry_at: OffsetDateTime,
	/// Human-readable reason naming the limit.
	pub reason: String,
}
impl RetryDirective {
	/// Creates a new directive.
	pub fn new(earliest_retry_at: OffsetDateTime, reason: impl Into<String>) -> Self {
		Self { earliest_retry_at, reason: reason.into() }
	}
}

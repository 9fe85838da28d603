//! Dispatcher configuration values.
//!
//! Every knob the dispatch pipeline consults lives on [`DispatchConfig`] and is read once when
//! the [`Dispatcher`](crate::dispatch::Dispatcher) and its collaborators are constructed. The
//! only environment-driven switch, `ALLOW_LOCALHOST_WEBHOOKS`, is resolved by
//! [`DispatchConfig::from_env`] rather than during validation.
//!
//! # Operator note
//!
//! Loopback destinations are permitted by default to support local development. Production
//! deployments should set `allow_local_destinations = false` (or
//! `ALLOW_LOCALHOST_WEBHOOKS=false`).

// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable controlling [`DispatchConfig::allow_local_destinations`].
pub const ALLOW_LOCAL_ENV: &str = "ALLOW_LOCALHOST_WEBHOOKS";
/// User agent sent with every outbound webhook.
pub const DEFAULT_USER_AGENT: &str = "Ops-CSV-Cleaner/1.0";

/// Tunables for rate limiting, destination policy, and HTTP delivery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
	/// Maximum dispatches per identity within one window.
	pub max_requests: usize,
	/// Sliding window length in seconds.
	pub window_seconds: u64,
	/// Hard deadline for the whole HTTP exchange in seconds.
	pub timeout_seconds: u64,
	/// Whether loopback/local destinations are accepted.
	pub allow_local_destinations: bool,
	/// `User-Agent` header value.
	pub user_agent: String,
}
impl DispatchConfig {
	/// Default per-identity request budget.
	pub const DEFAULT_MAX_REQUESTS: usize = 10;
	/// Default sliding window.
	pub const DEFAULT_WINDOW_SECONDS: u64 = 60;
	/// Default delivery deadline.
	pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
	/// Longest accepted sliding window (one day).
	pub const MAX_WINDOW_SECONDS: u64 = 86_400;
	/// Longest accepted delivery deadline.
	pub const MAX_TIMEOUT_SECONDS: u64 = 300;

	/// Builds the default configuration, then applies `ALLOW_LOCALHOST_WEBHOOKS` when set.
	pub fn from_env() -> Self {
		let mut config = Self::default();

		if let Ok(raw) = std::env::var(ALLOW_LOCAL_ENV) {
			config.allow_local_destinations = parse_allow_flag(&raw);
		}

		config
	}

	/// Overrides the rate-limit budget.
	pub fn with_rate_limit(mut self, max_requests: usize, window_seconds: u64) -> Self {
		self.max_requests = max_requests;
		self.window_seconds = window_seconds;

		self
	}

	/// Overrides the delivery deadline.
	pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
		self.timeout_seconds = timeout_seconds;

		self
	}

	/// Overrides the local-destination policy switch.
	pub fn with_allow_local_destinations(mut self, allow: bool) -> Self {
		self.allow_local_destinations = allow;

		self
	}

	/// Returns the window as a [`Duration`].
	pub fn window(&self) -> Duration {
		Duration::seconds(i64::try_from(self.window_seconds).unwrap_or(i64::MAX))
	}

	/// Returns the delivery deadline as a [`StdDuration`].
	pub fn timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.timeout_seconds)
	}

	/// Rejects values that would disable or overflow the limiter or the deadline.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.max_requests == 0 {
			return Err(ConfigError::InvalidValue {
				field: "max_requests",
				reason: "must be greater than zero",
			});
		}
		if self.window_seconds == 0 {
			return Err(ConfigError::InvalidValue {
				field: "window_seconds",
				reason: "must be greater than zero",
			});
		}
		if self.window_seconds > Self::MAX_WINDOW_SECONDS {
			return Err(ConfigError::InvalidValue {
				field: "window_seconds",
				reason: "must not exceed 86400",
			});
		}
		if self.timeout_seconds == 0 {
			return Err(ConfigError::InvalidValue {
				field: "timeout_seconds",
				reason: "must be greater than zero",
			});
		}
		if self.timeout_seconds > Self::MAX_TIMEOUT_SECONDS {
			return Err(ConfigError::InvalidValue {
				field: "timeout_seconds",
				reason: "must not exceed 300",
			});
		}

		Ok(())
	}
}
impl Default for DispatchConfig {
	fn default() -> Self {
		Self {
			max_requests: Self::DEFAULT_MAX_REQUESTS,
			window_seconds: Self::DEFAULT_WINDOW_SECONDS,
			timeout_seconds: Self::DEFAULT_TIMEOUT_SECONDS,
			allow_local_destinations: true,
			user_agent: DEFAULT_USER_AGENT.into(),
		}
	}
}

fn parse_allow_flag(raw: &str) -> bool {
	raw.trim().eq_ignore_ascii_case("true")
}

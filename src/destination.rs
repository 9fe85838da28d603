//! Destination checks performed before any network call.
//!
//! Validation is syntactic plus a loopback denylist; no DNS resolution or resolved-IP range
//! checks happen here. Stronger SSRF protection belongs at the same call site as an additional
//! layer.

// self
use crate::{_prelude::*, config::DispatchConfig};

const LOCAL_MARKERS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "::1"];

/// Reason a destination was rejected; `Display` is the caller-facing message.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DestinationError {
	/// No URL was supplied.
	#[error("URL is required")]
	Missing,
	/// Scheme is not `http://` or `https://`.
	#[error("URL must start with http:// or https://")]
	UnsupportedScheme,
	/// URL is not a parseable absolute URL.
	#[error("URL is invalid: {reason}")]
	Malformed {
		/// Parser message.
		reason: String,
	},
	/// URL targets a local address while local destinations are disabled.
	#[error("Cannot send webhooks to {marker}")]
	LocalDestination {
		/// Denylist entry that matched.
		marker: &'static str,
	},
}

/// Destination validator with its policy fixed at construction time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DestinationPolicy {
	/// Whether URLs containing loopback markers are accepted.
	pub allow_local: bool,
}
impl DestinationPolicy {
	/// Creates a policy with an explicit local-destination switch.
	pub const fn new(allow_local: bool) -> Self {
		Self { allow_local }
	}

	/// Reads the local-destination switch from [`DispatchConfig`].
	pub fn from_config(config: &DispatchConfig) -> Self {
		Self::new(config.allow_local_destinations)
	}

	/// Validates `url`, returning the parsed destination.
	pub fn validate(&self, url: &str) -> Result<Url, DestinationError> {
		if url.is_empty() {
			return Err(DestinationError::Missing);
		}
		if !(url.starts_with("http://") || url.starts_with("https://")) {
			return Err(DestinationError::UnsupportedScheme);
		}
		if !self.allow_local {
			let lowered = url.to_ascii_lowercase();

			if let Some(marker) = LOCAL_MARKERS.into_iter().find(|marker| lowered.contains(marker))
			{
				return Err(DestinationError::LocalDestination { marker });
			}
		}

		Url::parse(url).map_err(|e| DestinationError::Malformed { reason: e.to_string() })
	}
}
impl Default for DestinationPolicy {
	fn default() -> Self {
		Self::new(true)
	}
}

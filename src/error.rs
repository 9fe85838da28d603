//! Crate-level error types shared by configuration, stores, payload decoding, and transports.
//!
//! Dispatch itself never returns these errors; the [`Dispatcher`](crate::dispatch::Dispatcher)
//! folds every lower-level failure into a [`DispatchResult`](crate::dispatch::DispatchResult).

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs outside the dispatch boundary.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure (usage, audit, or target stores).
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::identity::IdentifierError),
	/// Inbound payload could not be decoded.
	#[error(transparent)]
	Payload(#[from] crate::payload::PayloadError),
}

/// Configuration and validation failures raised while wiring the dispatcher.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A configuration value is out of range.
	#[error("Configuration value `{field}` is invalid: {reason}.")]
	InvalidValue {
		/// Offending field name.
		field: &'static str,
		/// Human-readable reason.
		reason: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Error type produced by the usage, audit, and target store contracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Transport-level failures raised before a complete HTTP response is available.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The exchange exceeded its deadline.
	#[error("request timed out")]
	Timeout,
	/// DNS, TCP, or TLS failure before any response arrived.
	#[error("{source}")]
	Connect {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The surrounding request context was cancelled mid-flight.
	#[error("request cancelled")]
	Cancelled,
	/// The outbound request could not be assembled (e.g., malformed header).
	#[error("{message}")]
	InvalidRequest {
		/// Human-readable description of the rejected request part.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn connect(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Connect { source: Box::new(src) }
	}

	/// Builds an [`TransportError::InvalidRequest`] from any displayable cause.
	pub fn invalid_request(cause: impl Display) -> Self {
		Self::InvalidRequest { message: cause.to_string() }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() {
			Self::Timeout
		} else if e.is_builder() {
			Self::invalid_request(e)
		} else {
			Self::connect(e)
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "database unreachable".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("database unreachable"));

		let source = StdError::source(&error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn transport_error_messages_surface_cause() {
		let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");

		assert_eq!(TransportError::connect(io).to_string(), "connection refused");
		assert_eq!(TransportError::Cancelled.to_string(), "request cancelled");
		assert_eq!(TransportError::invalid_request("bad header").to_string(), "bad header");
	}
}

//! Closed result type for every dispatch outcome.

// self
use crate::_prelude::*;

/// Maximum number of remote-body characters embedded in a result message.
pub const REMOTE_BODY_PREVIEW_CHARS: usize = 200;

/// Failure taxonomy shared by results, logs, and metrics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
	/// Rate limit exceeded (429), destination rejected (400), empty or disabled (400).
	PolicyDenied,
	/// Remote endpoint answered with a non-2xx status.
	RemoteRejected,
	/// Exchange exceeded the deadline (408).
	Timeout,
	/// DNS/TCP/TLS failure or cancellation before any response (503).
	TransportFailure,
	/// Unanticipated fault while assembling or sending the request (500).
	InternalFault,
}
impl FailureKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FailureKind::PolicyDenied => "policy_denied",
			FailureKind::RemoteRejected => "remote_rejected",
			FailureKind::Timeout => "timeout",
			FailureKind::TransportFailure => "transport_failure",
			FailureKind::InternalFault => "internal_fault",
		}
	}
}
impl Display for FailureKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal outcome of one dispatch attempt.
///
/// Serializes to the caller-facing `{ "success", "message", "status_code" }` shape.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "DispatchResponse")]
pub enum DispatchResult {
	/// Remote endpoint accepted the payload with a 2xx status.
	Delivered {
		/// HTTP status returned by the endpoint.
		status: u16,
		/// Human-readable summary.
		message: String,
	},
	/// Dispatch did not succeed.
	Failed {
		/// Failure classification.
		kind: FailureKind,
		/// Remote status or synthesized code.
		status: u16,
		/// Human-readable summary.
		message: String,
	},
}
impl DispatchResult {
	/// Success after a 2xx exchange carrying `rows` rows.
	pub fn delivered(status: u16, rows: usize) -> Self {
		Self::Delivered { status, message: format!("Successfully sent {rows} rows to webhook") }
	}

	/// Rate limiter denial (429).
	pub fn rate_limited(reason: impl Into<String>) -> Self {
		Self::failed(FailureKind::PolicyDenied, 429, reason)
	}

	/// Locally rejected request (400).
	pub fn rejected(reason: impl Into<String>) -> Self {
		Self::failed(FailureKind::PolicyDenied, 400, reason)
	}

	/// Non-2xx answer; the body is truncated to [`REMOTE_BODY_PREVIEW_CHARS`] characters.
	pub fn remote_rejected(status: u16, body: &str) -> Self {
		let preview: String = body.chars().take(REMOTE_BODY_PREVIEW_CHARS).collect();

		Self::failed(
			FailureKind::RemoteRejected,
			status,
			format!("Webhook returned status {status}: {preview}"),
		)
	}

	/// Deadline exceeded (408).
	pub fn timed_out(timeout: StdDuration) -> Self {
		Self::failed(
			FailureKind::Timeout,
			408,
			format!("Webhook request timed out after {} seconds", timeout.as_secs()),
		)
	}

	/// Connection-level failure (503).
	pub fn transport_failure(cause: impl Display) -> Self {
		Self::failed(
			FailureKind::TransportFailure,
			503,
			format!("Failed to connect to webhook: {cause}"),
		)
	}

	/// Unanticipated fault (500).
	pub fn internal_fault(cause: impl Display) -> Self {
		Self::failed(FailureKind::InternalFault, 500, format!("Unexpected error: {cause}"))
	}

	/// Whether the payload was delivered.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Delivered { .. })
	}

	/// Remote or synthesized status code.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Delivered { status, .. } | Self::Failed { status, .. } => *status,
		}
	}

	/// Human-readable summary.
	pub fn message(&self) -> &str {
		match self {
			Self::Delivered { message, .. } | Self::Failed { message, .. } => message,
		}
	}

	/// Failure classification, `None` when delivered.
	pub fn failure_kind(&self) -> Option<FailureKind> {
		match self {
			Self::Delivered { .. } => None,
			Self::Failed { kind, .. } => Some(*kind),
		}
	}

	fn failed(kind: FailureKind, status: u16, message: impl Into<String>) -> Self {
		Self::Failed { kind, status, message: message.into() }
	}
}

/// Wire shape returned to callers of the send endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchResponse {
	/// Whether the payload was delivered.
	pub success: bool,
	/// Human-readable summary.
	pub message: String,
	/// Remote or synthesized status code.
	pub status_code: Option<u16>,
}
impl From<DispatchResult> for DispatchResponse {
	fn from(result: DispatchResult) -> Self {
		Self {
			success: result.is_success(),
			status_code: Some(result.status_code()),
			message: match result {
				DispatchResult::Delivered { message, .. } | DispatchResult::Failed { message, .. } =>
					message,
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn remote_body_is_truncated_by_characters() {
		let body = "é".repeat(300);
		let result = DispatchResult::remote_rejected(500, &body);
		let expected = format!("Webhook returned status 500: {}", "é".repeat(200));

		assert_eq!(result.message(), expected);
		assert_eq!(result.failure_kind(), Some(FailureKind::RemoteRejected));
		assert!(!result.is_success());
	}

	#[test]
	fn unreadable_remote_body_is_named() {
		let result = DispatchResult::remote_rejected(502, crate::http::UNREADABLE_BODY);

		assert_eq!(result.message(), "Webhook returned status 502: <unreadable body>");
	}

	#[test]
	fn synthesized_codes_match_taxonomy() {
		assert_eq!(DispatchResult::rate_limited("slow down").status_code(), 429);
		assert_eq!(DispatchResult::rejected("No data to send").status_code(), 400);
		assert_eq!(DispatchResult::timed_out(StdDuration::from_secs(30)).status_code(), 408);
		assert_eq!(DispatchResult::transport_failure("refused").status_code(), 503);
		assert_eq!(DispatchResult::internal_fault("boom").status_code(), 500);
		assert_eq!(
			DispatchResult::timed_out(StdDuration::from_secs(30)).message(),
			"Webhook request timed out after 30 seconds"
		);
	}

	#[test]
	fn serializes_to_response_shape() {
		let json = serde_json::to_value(DispatchResult::delivered(200, 1))
			.expect("Result should serialize.");

		assert_eq!(
			json,
			serde_json::json!({
				"success": true,
				"message": "Successfully sent 1 rows to webhook",
				"status_code": 200,
			})
		);
	}
}

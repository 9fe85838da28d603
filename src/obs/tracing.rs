// self
use crate::{_prelude::*, dispatch::DispatchResult, identity::IdentityId};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedDispatch<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedDispatch<F> = F;

/// A span builder used by the dispatcher and the send service.
#[derive(Clone, Debug)]
pub struct DispatchSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl DispatchSpan {
	/// Creates a new span tagged with the caller identity + stage.
	pub fn new(identity: &IdentityId, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("webhook_dispatch.dispatch", identity = %identity, stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (identity, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedDispatch<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs the terminal result of a dispatch inside the current span.
pub fn emit_dispatch_result(result: &DispatchResult) {
	#[cfg(feature = "tracing")]
	{
		match result.failure_kind() {
			None => tracing::info!(status = result.status_code(), "webhook delivered"),
			Some(kind) => tracing::warn!(
				status = result.status_code(),
				kind = kind.as_str(),
				message = result.message(),
				"webhook dispatch failed"
			),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = result;
	}
}

/// Logs a failed audit write; audit failures never alter the dispatch result.
pub fn emit_audit_failure(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(error = %error, "audit entry could not be recorded");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Logs a response whose body could not be read; the status is still reported.
pub fn emit_unreadable_body(error: &dyn StdError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "webhook response body could not be read");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn dispatch_span_noop_without_tracing() {
		let span = DispatchSpan::new(&IdentityId::from(1_u64), "test");

		emit_dispatch_result(&DispatchResult::delivered(200, 1));

		let _ = span;
	}

	#[cfg(feature = "tracing")]
	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = DispatchSpan::new(&IdentityId::from(1_u64), "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}

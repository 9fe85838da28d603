//! Optional observability helpers for dispatches.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to run each dispatch inside a `webhook_dispatch.dispatch` span with the
//!   `identity` and `stage` fields, and to log the terminal result (`info` when delivered,
//!   `warn` otherwise). Rows and secrets are never recorded.
//! - Enable `metrics` to increment the `webhook_dispatch_total` counter for every
//!   attempt/delivery/failure, labeled by `outcome` + `kind`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Outcome labels recorded for each dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
	/// Entry to the dispatcher.
	Attempt,
	/// Remote endpoint answered with a 2xx status.
	Delivered,
	/// Any terminal failure.
	Failed,
}
impl DispatchOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			DispatchOutcome::Attempt => "attempt",
			DispatchOutcome::Delivered => "delivered",
			DispatchOutcome::Failed => "failed",
		}
	}
}
impl Display for DispatchOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

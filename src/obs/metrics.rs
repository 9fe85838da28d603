// self
use crate::{dispatch::FailureKind, obs::DispatchOutcome};

/// Records a dispatch outcome via the global metrics recorder (when enabled).
pub fn record_dispatch_outcome(outcome: DispatchOutcome, kind: Option<FailureKind>) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"webhook_dispatch_total",
			"outcome" => outcome.as_str(),
			"kind" => kind.map_or("none", FailureKind::as_str)
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (outcome, kind);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_dispatch_outcome_noop_without_metrics() {
		record_dispatch_outcome(DispatchOutcome::Failed, Some(FailureKind::Timeout));
		record_dispatch_outcome(DispatchOutcome::Attempt, None);
	}
}

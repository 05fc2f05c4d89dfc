// self
use crate::{
	gateway::TerminationReason,
	obs::{CallKind, CallOutcome},
};

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"pos_gateway_call_total",
			"kind" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a terminated session via the global metrics recorder (when enabled).
pub fn count_session_terminated(reason: TerminationReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("pos_gateway_session_terminated_total", "reason" => reason.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_noop_without_metrics() {
		record_call_outcome(CallKind::Refresh, CallOutcome::Failure);
		count_session_terminated(TerminationReason::MissingRefreshToken);
	}
}

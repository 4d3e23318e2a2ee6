// self
use crate::obs::RequestOutcome;

/// Records a call outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(method: &str, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"carehq_request_total",
			"method" => method.to_owned(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (method, outcome);
	}
}

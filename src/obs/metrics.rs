// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{CallKind, CallOutcome};

/// Increments `admin_api_client_call_total` (when the `metrics` feature is enabled).
pub fn record_call_outcome(kind: CallKind, outcome: CallOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		"admin_api_client_call_total",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome);
}

/// Records the wall time of a finished call in `admin_api_client_call_seconds`.
pub fn record_call_latency(kind: CallKind, outcome: CallOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!(
		"admin_api_client_call_seconds",
		"call" => kind.as_str(),
		"outcome" => outcome.as_str()
	)
	.record(elapsed.as_secs_f64());
	#[cfg(not(feature = "metrics"))]
	let _ = (kind, outcome, elapsed);
}

/// Publishes how many callers are parked behind the in-flight refresh.
pub fn record_refresh_waiters(waiters: usize) {
	#[cfg(feature = "metrics")]
	metrics::gauge!("admin_api_client_refresh_waiters").set(waiters as f64);
	#[cfg(not(feature = "metrics"))]
	let _ = waiters;
}

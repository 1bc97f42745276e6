//! Optional observability for client calls.
//!
//! # Feature Flags
//!
//! - `tracing`: every call runs inside an `admin_api_client.call` span carrying `call` and
//!   `stage`; each backend response emits a debug event with its route and status, and the
//!   refresh gate logs its transitions.
//! - `metrics`: `admin_api_client_call_total{call,outcome}` counts attempts and results,
//!   `admin_api_client_call_seconds{call,outcome}` records latency, and the
//!   `admin_api_client_refresh_waiters` gauge tracks callers parked behind a refresh.
//!
//! Without either feature all of this compiles to no-ops.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Operations observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallKind {
	/// Ordinary API request issued through [`ApiClient::send`](crate::client::ApiClient::send).
	Request,
	/// Credential refresh.
	Refresh,
	/// Username/password login.
	Login,
	/// Stored-session validation.
	Validate,
	/// Logout.
	Logout,
}
impl CallKind {
	/// Stable label for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Request => "request",
			Self::Refresh => "refresh",
			Self::Login => "login",
			Self::Validate => "validate",
			Self::Logout => "logout",
		}
	}
}
impl Display for CallKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded per call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallOutcome {
	/// Entry to a client operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl CallOutcome {
	/// Stable label for span fields and metric labels.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Attempt => "attempt",
			Self::Success => "success",
			Self::Failure => "failure",
		}
	}

	fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Self::Success } else { Self::Failure }
	}
}
impl Display for CallOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `call` inside a [`CallSpan`], counting the attempt, its outcome, and its latency.
pub(crate) async fn observe<F, T, E>(kind: CallKind, stage: &'static str, call: F) -> Result<T, E>
where
	F: Future<Output = Result<T, E>>,
{
	let started = Instant::now();

	record_call_outcome(kind, CallOutcome::Attempt);

	let result = CallSpan::new(kind, stage).instrument(call).await;
	let outcome = CallOutcome::of(&result);

	record_call_outcome(kind, outcome);
	record_call_latency(kind, outcome, started.elapsed());

	result
}
